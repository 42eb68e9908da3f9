//! CLI error types with exit code handling
//!
//! This module provides a unified error type for CLI operations that
//! maps errors to appropriate exit codes.

use cforge_kubectl::KubectlError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Options rejected before kubectl ran
    #[error("Validation failed: {message}")]
    #[diagnostic(code(cforge::cli::validation))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// kubectl could not be started, exited non-zero, or returned unreadable output
    #[error("{message}")]
    #[diagnostic(code(cforge::cli::kubectl))]
    Kubectl {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// A wait ran into kubectl's timeout
    #[error("Timed out waiting for {target}")]
    #[diagnostic(
        code(cforge::cli::timeout),
        help("Increase --timeout or inspect the resource with --dump-on-failure")
    )]
    WaitTimedOut { target: String },

    /// Invalid or unreadable configuration
    #[error("Configuration error: {message}")]
    #[diagnostic(code(cforge::cli::config))]
    Config { message: String },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(cforge::cli::io))]
    Io { message: String },

    /// Internal error (runtime, unexpected failure)
    #[error("Internal error: {message}")]
    #[diagnostic(code(cforge::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Validation { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Kubectl { .. } => exit_codes::KUBECTL_ERROR,
            CliError::WaitTimedOut { .. } => exit_codes::WAIT_TIMEOUT,
            CliError::Config { .. } | CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create an input error (user provided invalid input)
    pub fn input(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            help: None,
        }
    }

    /// Create a validation error with help text
    pub fn validation_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

impl From<KubectlError> for CliError {
    fn from(err: KubectlError) -> Self {
        match err {
            KubectlError::Validation(message) => CliError::Validation {
                message,
                help: None,
            },
            KubectlError::WaitTimedOut { target } => CliError::WaitTimedOut { target },
            KubectlError::Spawn { .. } => CliError::Kubectl {
                message: err.to_string(),
                help: Some("Install kubectl or point --kubectl at the binary".into()),
            },
            KubectlError::Config(message) => CliError::Config { message },
            KubectlError::Io(e) => CliError::Io {
                message: e.to_string(),
            },
            other => CliError::Kubectl {
                message: other.to_string(),
                help: None,
            },
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::internal(err.to_string())
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_follow_error_kind() {
        let cases = [
            (KubectlError::Validation("bad".into()), exit_codes::VALIDATION_ERROR),
            (
                KubectlError::WaitTimedOut {
                    target: "deployment/web".into(),
                },
                exit_codes::WAIT_TIMEOUT,
            ),
            (
                KubectlError::WaitFailed {
                    target: "deployment/web".into(),
                    message: "not found".into(),
                },
                exit_codes::KUBECTL_ERROR,
            ),
            (
                KubectlError::NonZeroExit {
                    command: "apply".into(),
                    code: 1,
                    stdout: String::new(),
                    stderr: "denied".into(),
                },
                exit_codes::KUBECTL_ERROR,
            ),
            (KubectlError::Config("verbosity".into()), exit_codes::IO_ERROR),
        ];

        for (err, code) in cases {
            assert_eq!(CliError::from(err).exit_code(), code);
        }
    }

    #[test]
    fn test_kubectl_message_is_kept() {
        let err = CliError::from(KubectlError::NotFound("deployment/ghost".into()));
        assert_eq!(err.to_string(), "not found: deployment/ghost");
    }
}
