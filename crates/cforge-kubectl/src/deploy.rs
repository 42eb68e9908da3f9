//! Apply-or-create followed by sequential waits

use std::fmt;
use std::sync::Arc;

use crate::commands::apply::{ApplyCommand, ApplyOptions, ApplyOutcome};
use crate::commands::wait::{WaitCommand, WaitFailureHook, WaitOptions, WaitTarget};
use crate::error::{KubectlError, Result};
use crate::invoker::CommandInvoker;
use crate::logging::{Logger, Logging};

/// How manifests are submitted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeployCommand {
    #[default]
    Apply,
    Create,
}

impl fmt::Display for DeployCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployCommand::Apply => write!(f, "apply"),
            DeployCommand::Create => write!(f, "create"),
        }
    }
}

/// One wait run after the manifests are submitted
#[derive(Clone)]
pub struct WaitStep {
    pub options: WaitOptions,
    /// Runs once if this wait times out or fails
    pub on_failure: Option<Arc<dyn WaitFailureHook>>,
}

impl WaitStep {
    pub fn new(options: WaitOptions) -> Self {
        Self {
            options,
            on_failure: None,
        }
    }

    pub fn with_hook(mut self, hook: Arc<dyn WaitFailureHook>) -> Self {
        self.on_failure = Some(hook);
        self
    }
}

impl fmt::Debug for WaitStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitStep")
            .field("options", &self.options)
            .field("on_failure", &self.on_failure.is_some())
            .finish()
    }
}

/// A manifest path plus the waits that must pass after it is submitted
#[derive(Debug, Clone, Default)]
pub struct DeploymentOptions {
    pub command: DeployCommand,
    pub path: String,
    /// Treat `path` as a kustomization directory
    pub kustomize: bool,
    pub waits: Vec<WaitStep>,
}

impl DeploymentOptions {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_wait(mut self, step: WaitStep) -> Self {
        self.waits.push(step);
        self
    }
}

/// What a successful deploy did
#[derive(Debug, Clone, PartialEq)]
pub struct DeployReport {
    /// Parsed apply output; `None` for `create`
    pub applied: Option<ApplyOutcome>,
    /// Wait targets that succeeded, in order
    pub waited: Vec<WaitTarget>,
}

/// Runs deployments
pub struct Deployer<'a> {
    invoker: &'a CommandInvoker,
    logging: Logging,
    log: Logger,
}

impl<'a> Deployer<'a> {
    pub fn new(invoker: &'a CommandInvoker, logging: &Logging) -> Self {
        Self {
            invoker,
            logging: logging.clone(),
            log: logging.logger("kubernetes"),
        }
    }

    /// Submit manifests, then run each wait in order
    ///
    /// Every wait is validated before anything runs. The first wait that
    /// does not succeed stops the deploy and becomes its error.
    pub async fn deploy(&self, options: &DeploymentOptions) -> Result<DeployReport> {
        if options.path.trim().is_empty() {
            return Err(KubectlError::Validation(
                "A manifest path is required to deploy.".into(),
            ));
        }
        for step in &options.waits {
            step.options.validate()?;
        }

        let applied = match options.command {
            DeployCommand::Apply => {
                let apply = if options.kustomize {
                    ApplyOptions::kustomization(options.path.as_str())
                } else {
                    ApplyOptions::files([options.path.as_str()])
                };
                Some(ApplyCommand::new(self.invoker, &self.logging).execute(&apply).await?)
            }
            DeployCommand::Create => {
                self.create(&options.path, options.kustomize).await?;
                None
            }
        };

        let wait = WaitCommand::new(self.invoker, &self.logging);
        let mut waited = Vec::with_capacity(options.waits.len());
        for step in &options.waits {
            let outcome = wait
                .execute(&step.options, step.on_failure.as_deref())
                .await?;
            waited.push(outcome.into_result()?);
        }

        Ok(DeployReport { applied, waited })
    }

    /// `kubectl create -f <path>` (or `-k` for a kustomization)
    pub async fn create(&self, path: &str, kustomize: bool) -> Result<()> {
        self.log.info(format!("Creating: {}", path));
        let flag = if kustomize { "-k" } else { "-f" };
        let result = self
            .invoker
            .run_args(vec!["create".into(), flag.into(), path.to_string()])
            .await?;
        if !result.is_success() {
            return Err(KubectlError::NonZeroExit {
                command: "create".into(),
                code: result.exit_code,
                stdout: result.stdout.trim().to_string(),
                stderr: result.stderr.trim().to_string(),
            });
        }
        Ok(())
    }
}
