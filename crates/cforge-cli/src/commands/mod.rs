//! CLI commands

pub mod apply;
pub mod deploy;
pub mod get;
pub mod pods;
pub mod wait;

use cforge_kubectl::Kubectl;

/// Namespace from the flag, then the configuration
pub fn namespace_or_configured(kubectl: &Kubectl, flag: Option<String>) -> Option<String> {
    flag.or_else(|| kubectl.invoker().config().and_then(|c| c.namespace.clone()))
}
