//! Deploy command - submit manifests and wait for resources

use cforge_kubectl::{
    DeployCommand, DeploymentOptions, Kubectl, WaitFailureHook, WaitOptions, WaitOutcome, WaitStep,
};
use clap::Args;
use std::sync::Arc;

use crate::commands::namespace_or_configured;
use crate::commands::wait::{split_target, wait_timeout};
use crate::display::{format_apply_outcome, format_wait_outcome};
use crate::error::{CliError, Result};

#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Manifest file, directory or kustomization
    path: String,

    /// Treat the path as a kustomization directory
    #[arg(short = 'k', long)]
    kustomize: bool,

    /// Use `kubectl create` instead of `kubectl apply`
    #[arg(long)]
    create: bool,

    /// Wait for KIND/NAME after submitting (repeatable, runs first)
    #[arg(long = "wait", value_name = "KIND/NAME")]
    waits: Vec<String>,

    /// Wait for KIND:KEY=VALUE[,KEY=VALUE...] after submitting (repeatable)
    #[arg(long = "wait-selector", value_name = "KIND:SELECTOR")]
    wait_selectors: Vec<String>,

    /// Namespace of the wait targets
    #[arg(short = 'n', long)]
    namespace: Option<String>,

    /// Condition each wait target must reach
    #[arg(long, default_value = "available")]
    condition: String,

    /// Seconds to wait per target
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Log pods, events and logs of a deployment that does not become ready
    #[arg(long)]
    dump_on_failure: bool,
}

/// `KIND/NAME` into a named wait
fn named_wait(spec: &str) -> Result<WaitOptions> {
    match split_target(spec) {
        (kind, Some(name)) => Ok(WaitOptions::named(kind, name)),
        _ => Err(CliError::input(format!(
            "invalid --wait '{}': expected KIND/NAME",
            spec
        ))),
    }
}

/// `KIND:KEY=VALUE[,KEY=VALUE...]` into a labeled wait
fn selector_wait(spec: &str) -> Result<WaitOptions> {
    match spec.split_once(':') {
        Some((kind, selector)) if !kind.is_empty() && !selector.is_empty() => {
            Ok(WaitOptions::labeled(kind, selector.split(',')))
        }
        _ => Err(CliError::validation_with_help(
            format!("invalid --wait-selector '{}'", spec),
            "expected KIND:KEY=VALUE[,KEY=VALUE...], e.g. deployment:app=flux",
        )),
    }
}

/// Run the deploy command
pub async fn run(kubectl: &Kubectl, args: DeployArgs) -> Result<()> {
    let timeout = wait_timeout(kubectl, args.timeout);
    let namespace = namespace_or_configured(kubectl, args.namespace);
    let hook: Option<Arc<dyn WaitFailureHook>> = args
        .dump_on_failure
        .then(|| Arc::new(kubectl.state_logger()) as Arc<dyn WaitFailureHook>);

    let mut options = DeploymentOptions {
        command: if args.create {
            DeployCommand::Create
        } else {
            DeployCommand::Apply
        },
        kustomize: args.kustomize,
        ..DeploymentOptions::new(args.path)
    };

    let configure = |mut wait: WaitOptions| {
        if let Some(namespace) = &namespace {
            wait = wait.in_namespace(namespace.as_str());
        }
        if let Some(timeout) = timeout {
            wait = wait.with_timeout(timeout);
        }
        wait.with_condition(&args.condition)
    };

    for spec in &args.waits {
        let mut step = WaitStep::new(configure(named_wait(spec)?));
        if let Some(hook) = &hook {
            step = step.with_hook(Arc::clone(hook));
        }
        options = options.with_wait(step);
    }
    for spec in &args.wait_selectors {
        options = options.with_wait(WaitStep::new(configure(selector_wait(spec)?)));
    }

    let report = kubectl.deploy(&options).await?;

    if let Some(applied) = &report.applied {
        println!("{}", format_apply_outcome(applied));
    }
    for target in report.waited {
        println!("{}", format_wait_outcome(&WaitOutcome::Succeeded(target)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cforge_kubectl::TargetSelection;

    #[test]
    fn test_named_wait() {
        let target = named_wait("deployment/flux").unwrap().validate().unwrap();
        assert_eq!(
            target.selection,
            TargetSelection::Named {
                kind: "deployment".into(),
                name: "flux".into()
            }
        );
        assert_eq!(named_wait("deployment").unwrap_err().exit_code(), 2);
    }

    #[test]
    fn test_selector_wait() {
        let target = selector_wait("deployment:app=flux,tier=ops")
            .unwrap()
            .validate()
            .unwrap();
        assert_eq!(
            target.selection,
            TargetSelection::Labeled {
                kind: "deployment".into(),
                selector: vec!["app=flux".into(), "tier=ops".into()]
            }
        );
        assert!(selector_wait("deployment").is_err());
        assert!(selector_wait(":app=flux").is_err());
    }
}
