//! cforge-kubectl - typed kubectl orchestration
//!
//! This crate sits between task logic and the `kubectl` binary:
//! - **Option schemas**: Typed option structs resolved into ordered `--flag=value` arguments
//! - **Command invoker**: One awaited process per call, through a swappable [`CommandRunner`]
//! - **Apply parsing**: `kind/name status` lines grouped by status, never failing
//! - **Wait protocol**: Validated targets classified into succeeded, timed out or failed
//! - **Deploy**: Apply or create, then sequential waits that stop at the first failure
//! - **Queries**: Pods of a deployment, events and logs decoded into `k8s-openapi` types
//! - **Diagnostics**: Deployment state dumps attached to failed waits

pub mod commands;
pub mod config;
pub mod deploy;
pub mod diagnostics;
pub mod error;
pub mod invoker;
pub mod kubectl;
pub mod logging;
pub mod options;
pub mod queries;
pub mod runner;

pub use commands::{
    AffectedResource, ApplyCommand, ApplyOptions, ApplyOutcome, GetCommand, GetFormat,
    GetOptions, PrintCommand, PrintOptions, TIMEOUT_MARKER, TargetSelection, WaitCommand,
    WaitFailureHook, WaitOptions, WaitOutcome, WaitPhase, WaitTarget, classify_wait,
    classify_wait_failure,
};
pub use config::{DEFAULT_KUBECTL, KubectlConfig};
pub use deploy::{DeployCommand, DeployReport, Deployer, DeploymentOptions, WaitStep};
pub use diagnostics::DeploymentStateLogger;
pub use error::{KubectlError, Result};
pub use invoker::CommandInvoker;
pub use kubectl::Kubectl;
pub use logging::{LogLevel, Logger, Logging};
pub use options::{
    CommandOptions, OptionDescriptor, OptionSchema, OptionValue, TypedOptions,
};
pub use queries::{ResourceQueries, SelectorJoin};
pub use runner::{
    CommandLine, CommandRunner, InvocationResult, MockRunner, ProcessRunner, RecordedInvocation,
};
