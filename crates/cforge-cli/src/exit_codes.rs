//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// Success - operation completed without errors
pub const SUCCESS: i32 = 0;

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Validation error - invalid options, nothing was executed
pub const VALIDATION_ERROR: i32 = 2;

/// kubectl error - kubectl could not be run, failed, or printed unreadable output
pub const KUBECTL_ERROR: i32 = 3;

/// Wait timeout - kubectl's own timeout expired before the condition was met
pub const WAIT_TIMEOUT: i32 = 4;

/// IO error - file not found, permission denied, invalid configuration
pub const IO_ERROR: i32 = 5;

/// Usage error - invalid arguments or options (following sysexits.h convention)
pub const USAGE_ERROR: i32 = 64;
