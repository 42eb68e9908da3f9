//! Facade tying the invoker, commands and queries together

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use k8s_openapi::api::core::v1::{Event, Pod};

use crate::commands::apply::{ApplyCommand, ApplyOptions, ApplyOutcome};
use crate::commands::get::{GetCommand, GetOptions, PrintCommand, PrintOptions};
use crate::commands::wait::{WaitCommand, WaitFailureHook, WaitOptions, WaitOutcome};
use crate::config::KubectlConfig;
use crate::deploy::{DeployReport, Deployer, DeploymentOptions};
use crate::diagnostics::DeploymentStateLogger;
use crate::error::Result;
use crate::invoker::CommandInvoker;
use crate::logging::Logging;
use crate::queries::{ResourceQueries, SelectorJoin};
use crate::runner::{CommandRunner, InvocationResult, ProcessRunner};

/// Entry point for driving kubectl
///
/// # Example
///
/// ```no_run
/// use cforge_kubectl::{Kubectl, KubectlConfig, Logging, WaitOptions};
///
/// # async fn run() -> cforge_kubectl::Result<()> {
/// let kubectl = Kubectl::new(KubectlConfig::load()?, Logging::from_env());
/// let outcome = kubectl
///     .wait(&WaitOptions::named("deployment", "flux").in_namespace("flux"), None)
///     .await?;
/// outcome.into_result()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Kubectl {
    invoker: CommandInvoker,
    logging: Logging,
    selector_join: SelectorJoin,
}

impl Kubectl {
    /// Drive the `kubectl` found on `PATH`
    pub fn new(config: KubectlConfig, logging: Logging) -> Self {
        Self::with_runner(Arc::new(ProcessRunner), config, logging)
    }

    /// Drive kubectl through a custom runner
    pub fn with_runner(
        runner: Arc<dyn CommandRunner>,
        config: KubectlConfig,
        logging: Logging,
    ) -> Self {
        let invoker = CommandInvoker::new(runner, logging.logger("kubernetes")).with_config(config);
        Self {
            invoker,
            logging,
            selector_join: SelectorJoin::default(),
        }
    }

    /// Use a different kubectl binary
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.invoker = self.invoker.with_program(program);
        self
    }

    pub fn with_selector_join(mut self, join: SelectorJoin) -> Self {
        self.selector_join = join;
        self
    }

    pub fn invoker(&self) -> &CommandInvoker {
        &self.invoker
    }

    pub fn logging(&self) -> &Logging {
        &self.logging
    }

    fn queries(&self) -> ResourceQueries<'_> {
        ResourceQueries::new(&self.invoker, &self.logging).with_selector_join(self.selector_join)
    }

    pub async fn apply(&self, options: &ApplyOptions) -> Result<ApplyOutcome> {
        ApplyCommand::new(&self.invoker, &self.logging)
            .execute(options)
            .await
    }

    pub async fn wait(
        &self,
        options: &WaitOptions,
        hook: Option<&dyn WaitFailureHook>,
    ) -> Result<WaitOutcome> {
        WaitCommand::new(&self.invoker, &self.logging)
            .execute(options, hook)
            .await
    }

    pub async fn deploy(&self, options: &DeploymentOptions) -> Result<DeployReport> {
        Deployer::new(&self.invoker, &self.logging)
            .deploy(options)
            .await
    }

    pub async fn create(&self, path: &str, kustomize: bool) -> Result<()> {
        Deployer::new(&self.invoker, &self.logging)
            .create(path, kustomize)
            .await
    }

    pub async fn is_pending(&self, path: &str, condition: &str) -> Result<bool> {
        WaitCommand::new(&self.invoker, &self.logging)
            .is_pending(path, condition)
            .await
    }

    pub async fn get(&self, kind: &str, options: &GetOptions) -> Result<Value> {
        GetCommand::new(&self.invoker).execute(kind, options).await
    }

    pub async fn print(&self, kind: &str, options: &PrintOptions) -> Result<String> {
        PrintCommand::new(&self.invoker, &self.logging)
            .execute(kind, options)
            .await
    }

    pub async fn resources_of_kind<T: DeserializeOwned>(
        &self,
        kind: &str,
        extra: &[String],
    ) -> Result<Vec<T>> {
        self.queries().resources_of_kind(kind, extra).await
    }

    pub async fn pods_for_deployment(&self, name: &str, namespace: Option<&str>) -> Result<Vec<Pod>> {
        self.queries().pods_for_deployment(name, namespace).await
    }

    pub async fn events_for(
        &self,
        kind: &str,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<Vec<Event>> {
        self.queries().events_for(kind, name, namespace).await
    }

    pub async fn logs_for_pod(
        &self,
        name: &str,
        namespace: Option<&str>,
        container: Option<&str>,
        tail: Option<u32>,
    ) -> Result<Vec<String>> {
        self.queries()
            .logs_for_pod(name, namespace, container, tail)
            .await
    }

    /// Run raw arguments with the configured global flags
    pub async fn run(&self, args: Vec<String>) -> Result<InvocationResult> {
        self.invoker.run_args(args).await
    }

    /// A failure hook dumping deployment state through this facade's runner
    pub fn state_logger(&self) -> DeploymentStateLogger {
        DeploymentStateLogger::new(self.invoker.clone(), &self.logging)
            .with_selector_join(self.selector_join)
    }
}
