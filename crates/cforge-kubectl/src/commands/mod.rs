//! Typed kubectl subcommands

pub mod apply;
pub mod get;
pub mod wait;

pub use apply::{AffectedResource, ApplyCommand, ApplyOptions, ApplyOutcome};
pub use get::{GetCommand, GetFormat, GetOptions, PrintCommand, PrintOptions};
pub use wait::{
    TIMEOUT_MARKER, TargetSelection, WaitCommand, WaitFailureHook, WaitOptions, WaitOutcome,
    WaitPhase, WaitTarget, classify_wait, classify_wait_failure,
};
