//! Deployment state dumps for failed waits

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;

use crate::commands::wait::{TargetSelection, WaitFailureHook, WaitTarget};
use crate::invoker::CommandInvoker;
use crate::logging::{Logger, Logging};
use crate::queries::{DEFAULT_NAMESPACE, ResourceQueries, SelectorJoin};

/// Number of log lines shown per container
pub const LOG_TAIL_LINES: u32 = 10;

/// Logs pods, container statuses, events and recent logs of a deployment
///
/// Everything is written at debug level. Query failures are logged as
/// warnings and never returned, so a dump cannot mask the wait failure.
#[derive(Clone)]
pub struct DeploymentStateLogger {
    invoker: CommandInvoker,
    logging: Logging,
    log: Logger,
    selector_join: SelectorJoin,
}

impl DeploymentStateLogger {
    pub fn new(invoker: CommandInvoker, logging: &Logging) -> Self {
        Self {
            invoker,
            logging: logging.clone(),
            log: logging.logger("kubernetes"),
            selector_join: SelectorJoin::default(),
        }
    }

    pub fn with_selector_join(mut self, join: SelectorJoin) -> Self {
        self.selector_join = join;
        self
    }

    fn queries(&self) -> ResourceQueries<'_> {
        ResourceQueries::new(&self.invoker, &self.logging).with_selector_join(self.selector_join)
    }

    /// Dump the state of every pod belonging to a deployment
    pub async fn log_deployment_state(&self, name: &str, namespace: Option<&str>) {
        let queries = self.queries();
        let pods = match queries.pods_for_deployment(name, namespace).await {
            Ok(pods) => pods,
            Err(e) => {
                self.log
                    .warn(format!("Could not list pods for deployment/{}: {}", name, e));
                return;
            }
        };
        if pods.is_empty() {
            self.log.debug(format!("No pods found for deployment/{}", name));
        }
        for pod in &pods {
            self.dump_pod_state(&queries, pod).await;
        }
    }

    async fn dump_pod_state(&self, queries: &ResourceQueries<'_>, pod: &Pod) {
        let Some(pod_name) = pod.metadata.name.as_deref() else {
            return;
        };
        let namespace = pod
            .metadata
            .namespace
            .as_deref()
            .unwrap_or(DEFAULT_NAMESPACE);

        self.log.debug(format!("Details for pod: {}", pod_name));
        let statuses = pod
            .status
            .as_ref()
            .and_then(|s| s.container_statuses.as_deref())
            .unwrap_or_default();

        for status in statuses {
            self.log.debug(format!("  container: {}", status.name));
            self.log
                .debug(format!("    restartCount: {}", status.restart_count));
            let state = serde_json::to_string(&status.state).unwrap_or_default();
            self.log.debug(format!("    state: {}", state));

            self.log.debug("    Logs:");
            match queries
                .logs_for_pod(pod_name, Some(namespace), Some(&status.name), Some(LOG_TAIL_LINES))
                .await
            {
                Ok(lines) => {
                    for line in lines {
                        self.log.debug(format!("      {}", line));
                    }
                }
                Err(e) => self.log.warn(format!(
                    "Could not read logs of {}/{}: {}",
                    pod_name, status.name, e
                )),
            }
        }

        self.log.debug("  Events:");
        match queries.events_for("Pod", pod_name, Some(namespace)).await {
            Ok(events) => {
                for event in events {
                    self.log.debug(format!(
                        "    [{}]: {}",
                        event.reason.as_deref().unwrap_or("No Reason"),
                        event.message.as_deref().unwrap_or("No Message")
                    ));
                }
            }
            Err(e) => self
                .log
                .warn(format!("Could not read events of pod {}: {}", pod_name, e)),
        }
    }
}

/// Whether a kind names a Deployment (`deployment`, `deployments`, `deployment.apps`, ...)
fn is_deployment_kind(kind: &str) -> bool {
    let base = kind.split('.').next().unwrap_or(kind);
    base.eq_ignore_ascii_case("deployment") || base.eq_ignore_ascii_case("deployments")
}

#[async_trait]
impl WaitFailureHook for DeploymentStateLogger {
    async fn on_wait_failure(&self, target: &WaitTarget) {
        match &target.selection {
            TargetSelection::Named { kind, name } if is_deployment_kind(kind) => {
                self.log_deployment_state(name, target.namespace.as_deref())
                    .await
            }
            _ => self
                .log
                .debug(format!("No state dump available for {}", target)),
        }
    }
}
