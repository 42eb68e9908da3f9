//! Error types for cforge-kubectl

use thiserror::Error;

/// Result type for cforge-kubectl operations
pub type Result<T> = std::result::Result<T, KubectlError>;

/// Maximum number of characters of raw output kept in a decode error
pub const MAX_DECODE_OUTPUT: usize = 512;

/// Errors that can occur while driving kubectl
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KubectlError {
    /// Caller-supplied options violate an invariant; nothing was executed
    #[error("invalid options: {0}")]
    Validation(String),

    /// The kubectl binary could not be launched
    #[error("failed to spawn '{program}': {source}\nHint: Make sure kubectl is installed and on your PATH, or pass --kubectl")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// kubectl ran and exited with a non-zero code
    #[error("{}", non_zero_exit_message(.command, *.code, .stdout, .stderr))]
    NonZeroExit {
        command: String,
        code: i32,
        stdout: String,
        stderr: String,
    },

    /// Query output was not valid JSON
    #[error("failed to decode kubectl output: {message}\nOutput: {output}")]
    Decode { message: String, output: String },

    /// A queried object does not exist or lacks a required field
    #[error("not found: {0}")]
    NotFound(String),

    /// kubectl's own timeout expired before the condition was met
    #[error("timed out while waiting for {target}")]
    WaitTimedOut { target: String },

    /// kubectl wait failed for a reason other than a timeout
    #[error("failed waiting for {target}: {message}")]
    WaitFailed { target: String, message: String },

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn non_zero_exit_message(command: &str, code: i32, stdout: &str, stderr: &str) -> String {
    let mut parts = Vec::with_capacity(3);
    if !stdout.is_empty() {
        parts.push(stdout.to_string());
    }
    if !stderr.is_empty() {
        parts.push(stderr.to_string());
    }
    parts.push(format!("kubectl '{}' command failed with exit code: {}", command, code));
    parts.join("\n")
}

impl From<serde_yaml::Error> for KubectlError {
    fn from(e: serde_yaml::Error) -> Self {
        KubectlError::Config(e.to_string())
    }
}

impl KubectlError {
    /// Build a decode error, keeping at most [`MAX_DECODE_OUTPUT`] characters of output
    pub fn decode(err: &serde_json::Error, output: &str) -> Self {
        let mut truncated: String = output.chars().take(MAX_DECODE_OUTPUT).collect();
        if output.chars().count() > MAX_DECODE_OUTPUT {
            truncated.push_str("...");
        }
        KubectlError::Decode {
            message: err.to_string(),
            output: truncated,
        }
    }

    /// Check if this error was raised before any process was spawned
    pub fn is_validation(&self) -> bool {
        matches!(self, KubectlError::Validation(_))
    }

    /// Check if this is a wait timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, KubectlError::WaitTimedOut { .. })
    }
}
