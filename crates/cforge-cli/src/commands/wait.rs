//! Wait and pending commands

use cforge_kubectl::{Kubectl, WaitFailureHook, WaitOptions};
use clap::Args;
use console::style;
use std::time::Duration;

use crate::commands::namespace_or_configured;
use crate::display::format_wait_outcome;
use crate::error::Result;

#[derive(Args, Debug)]
pub struct WaitArgs {
    /// `kind/name`, or `kind` together with --selector
    target: Option<String>,

    /// Manifest files whose resources to wait for
    #[arg(short = 'f', long = "filename", value_delimiter = ',')]
    files: Vec<String>,

    /// Process directories recursively
    #[arg(short = 'R', long)]
    recursive: bool,

    /// Label selector terms (key=value)
    #[arg(short = 'l', long = "selector", value_delimiter = ',')]
    selector: Vec<String>,

    /// Field selector terms
    #[arg(long, value_delimiter = ',')]
    field_selector: Vec<String>,

    /// Namespace of the target
    #[arg(short = 'n', long)]
    namespace: Option<String>,

    /// Wait across all namespaces
    #[arg(short = 'A', long)]
    all_namespaces: bool,

    /// Raw condition: `delete` or `<key>=<value>`
    #[arg(long = "for")]
    wait_for: Option<String>,

    /// Condition name, shorthand for --for=condition=<name>
    #[arg(long, conflicts_with = "wait_for")]
    condition: Option<String>,

    /// Seconds to wait before giving up
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Log pods, events and logs of a deployment that does not become ready
    #[arg(long)]
    dump_on_failure: bool,
}

/// Split `kind/name` into its parts; a bare `kind` has no name
pub fn split_target(target: &str) -> (String, Option<String>) {
    match target.split_once('/') {
        Some((kind, name)) => (kind.to_string(), Some(name.to_string())),
        None => (target.to_string(), None),
    }
}

/// Wait timeout from the flag, then the configuration
pub fn wait_timeout(kubectl: &Kubectl, seconds: Option<u64>) -> Option<Duration> {
    seconds
        .map(Duration::from_secs)
        .or_else(|| kubectl.invoker().config().and_then(|c| c.wait_timeout))
}

/// Run the wait command
pub async fn run(kubectl: &Kubectl, args: WaitArgs) -> Result<()> {
    let (kind, name) = match args.target.as_deref() {
        Some(target) => {
            let (kind, name) = split_target(target);
            (Some(kind), name)
        }
        None => (None, None),
    };

    let mut options = WaitOptions {
        files: args.files,
        recursive: args.recursive,
        kind,
        name,
        label_selector: args.selector,
        field_selector: args.field_selector,
        all_namespaces: args.all_namespaces,
        namespace: namespace_or_configured(kubectl, args.namespace),
        wait_for: args.wait_for,
        timeout: wait_timeout(kubectl, args.timeout),
    };
    if let Some(condition) = args.condition.as_deref() {
        options = options.with_condition(condition);
    }

    let state_logger = args.dump_on_failure.then(|| kubectl.state_logger());
    let hook = state_logger.as_ref().map(|h| h as &dyn WaitFailureHook);

    let outcome = kubectl.wait(&options, hook).await?;
    println!("{}", format_wait_outcome(&outcome));
    outcome.into_result()?;
    Ok(())
}

#[derive(Args, Debug)]
pub struct PendingArgs {
    /// Manifest file to check
    path: String,

    /// Condition the resources should have reached
    #[arg(long, default_value = "available")]
    condition: String,
}

/// Run the pending command
pub async fn pending(kubectl: &Kubectl, args: PendingArgs) -> Result<()> {
    if kubectl.is_pending(&args.path, &args.condition).await? {
        println!(
            "{} {} has not reached condition {}",
            style("…").yellow().bold(),
            style(&args.path).cyan(),
            style(&args.condition).yellow()
        );
    } else {
        println!(
            "{} {} has reached condition {}",
            style("✓").green().bold(),
            style(&args.path).cyan(),
            style(&args.condition).yellow()
        );
    }
    Ok(())
}
