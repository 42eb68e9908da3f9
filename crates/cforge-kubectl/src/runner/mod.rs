//! Process execution
//!
//! The [`CommandRunner`] trait is the only place a process is spawned.
//! [`ProcessRunner`] runs real binaries through `tokio::process`;
//! [`MockRunner`] replays scripted results for tests.

mod mock;

pub use mock::{MockRunner, RecordedInvocation};

use async_trait::async_trait;
use std::fmt;
use std::process::Stdio;

use crate::error::{KubectlError, Result};

/// Captured result of one process execution
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InvocationResult {
    /// Exit code; `-1` when the process was terminated by a signal
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl InvocationResult {
    pub fn new(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Successful result with the given stdout
    pub fn success(stdout: impl Into<String>) -> Self {
        Self::new(0, stdout, "")
    }

    /// Failed result with the given exit code and stderr
    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self::new(exit_code, "", stderr)
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// A fully resolved program invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

/// Renders as `program "arg1" "arg2"` for logs
impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " \"{}\"", arg)?;
        }
        Ok(())
    }
}

/// Executes command lines
///
/// Implementations must be Send + Sync for use across async tasks.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion, capturing output
    ///
    /// Only fails when the process cannot be started; a non-zero exit is
    /// reported through [`InvocationResult::exit_code`].
    async fn run(&self, command: &CommandLine) -> Result<InvocationResult>;
}

/// Runs real processes
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &CommandLine) -> Result<InvocationResult> {
        let output = tokio::process::Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| KubectlError::Spawn {
                program: command.program.clone(),
                source,
            })?;

        Ok(InvocationResult {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
