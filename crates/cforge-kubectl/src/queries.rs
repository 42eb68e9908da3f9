//! Read-only cluster queries over `kubectl get -o json` and `kubectl logs`

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Event, Pod};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::{KubectlError, Result};
use crate::invoker::CommandInvoker;
use crate::logging::{Logger, Logging};
use crate::runner::InvocationResult;

/// Namespace used when a query does not name one
pub const DEFAULT_NAMESPACE: &str = "default";

/// How `key=value` terms are joined into a `--selector` value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectorJoin {
    /// `app=web,tier=fe`, the syntax kubectl accepts
    #[default]
    Comma,
    /// `app=webtier=fe`, reproducing the legacy invocation byte for byte
    Concatenate,
}

impl SelectorJoin {
    pub fn join(&self, terms: &[String]) -> String {
        match self {
            SelectorJoin::Comma => terms.join(","),
            SelectorJoin::Concatenate => terms.concat(),
        }
    }
}

#[derive(Deserialize)]
struct List<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

fn namespace_flag(namespace: &str) -> Option<String> {
    let namespace = namespace.trim();
    (!namespace.is_empty()).then(|| format!("--namespace={}", namespace))
}

fn non_zero_exit(command: &str, result: InvocationResult) -> KubectlError {
    KubectlError::NonZeroExit {
        command: command.to_string(),
        code: result.exit_code,
        stdout: result.stdout.trim().to_string(),
        stderr: result.stderr.trim().to_string(),
    }
}

/// Convenience lookups for pods, deployments, events and logs
pub struct ResourceQueries<'a> {
    invoker: &'a CommandInvoker,
    selector_join: SelectorJoin,
    log: Logger,
}

impl<'a> ResourceQueries<'a> {
    pub fn new(invoker: &'a CommandInvoker, logging: &Logging) -> Self {
        Self {
            invoker,
            selector_join: SelectorJoin::default(),
            log: logging.logger("kubernetes"),
        }
    }

    pub fn with_selector_join(mut self, join: SelectorJoin) -> Self {
        self.selector_join = join;
        self
    }

    /// `kubectl get <kind> --output=json <extra...>`, decoded as a list of `T`
    pub async fn resources_of_kind<T: DeserializeOwned>(
        &self,
        kind: &str,
        extra: &[String],
    ) -> Result<Vec<T>> {
        let mut args = vec!["get".to_string(), kind.to_string(), "--output=json".to_string()];
        args.extend(extra.iter().cloned());

        let result = self.invoker.run_args(args).await?;
        if !result.is_success() {
            return Err(non_zero_exit("get", result));
        }
        let list: List<T> = serde_json::from_str(&result.stdout)
            .map_err(|e| KubectlError::decode(&e, &result.stdout))?;
        Ok(list.items)
    }

    /// Pods selected by a deployment's `matchLabels`
    pub async fn pods_for_deployment(
        &self,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<Vec<Pod>> {
        let namespace = namespace.unwrap_or(DEFAULT_NAMESPACE);
        self.log.debug(format!(
            "Retrieving pods for deployment \"{}\" in namespace \"{}\"",
            name, namespace
        ));

        let mut extra: Vec<String> = namespace_flag(namespace).into_iter().collect();
        extra.push(format!("--field-selector=metadata.name={}", name));
        let deployments: Vec<Deployment> = self.resources_of_kind("deployments", &extra).await?;

        let match_labels = deployments
            .into_iter()
            .next()
            .and_then(|d| d.spec)
            .and_then(|spec| spec.selector.match_labels)
            // An empty selector would match every pod in the namespace
            .filter(|labels| !labels.is_empty())
            .ok_or_else(|| {
                KubectlError::NotFound(format!(
                    "Failed to find matchLabels for deployment/{} in namespace: {}",
                    name, namespace
                ))
            })?;

        let terms: Vec<String> = match_labels
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();

        let mut extra: Vec<String> = namespace_flag(namespace).into_iter().collect();
        extra.push(format!("--selector={}", self.selector_join.join(&terms)));
        self.resources_of_kind("pods", &extra).await
    }

    /// Events whose involved object is `<kind>/<name>`
    pub async fn events_for(
        &self,
        kind: &str,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<Vec<Event>> {
        let namespace = namespace.unwrap_or(DEFAULT_NAMESPACE);
        let mut extra: Vec<String> = namespace_flag(namespace).into_iter().collect();
        extra.push(format!(
            "--field-selector=involvedObject.kind={},involvedObject.name={},involvedObject.namespace={}",
            kind, name, namespace
        ));
        self.resources_of_kind("events", &extra).await
    }

    /// Log lines of a pod; all containers unless one is named
    ///
    /// `tail` of `None` returns the whole log.
    pub async fn logs_for_pod(
        &self,
        name: &str,
        namespace: Option<&str>,
        container: Option<&str>,
        tail: Option<u32>,
    ) -> Result<Vec<String>> {
        let mut args = vec!["logs".to_string(), name.to_string()];
        args.extend(namespace.and_then(namespace_flag));
        args.push(format!("--tail={}", tail.map(i64::from).unwrap_or(-1)));
        match container.map(str::trim).filter(|c| !c.is_empty()) {
            Some(container) => args.push(format!("--container={}", container)),
            None => args.push("--all-containers=true".to_string()),
        }

        let result = self.invoker.run_args(args).await?;
        if !result.is_success() {
            return Err(non_zero_exit("logs", result));
        }
        Ok(result.stdout.lines().map(str::to_string).collect())
    }
}
