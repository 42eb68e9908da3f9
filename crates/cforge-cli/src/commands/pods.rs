//! Pods, logs and events commands

use cforge_kubectl::{Kubectl, SelectorJoin};
use clap::Args;

use crate::commands::namespace_or_configured;
use crate::display::{format_events, format_pods};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct PodsArgs {
    /// Deployment name
    deployment: String,

    /// Namespace of the deployment (default: default)
    #[arg(short = 'n', long)]
    namespace: Option<String>,

    /// Join selector terms without separators, as older releases did
    #[arg(long)]
    legacy_selector_join: bool,

    /// Output the pods as JSON
    #[arg(long)]
    json: bool,
}

/// Run the pods command
pub async fn run(kubectl: &Kubectl, args: PodsArgs) -> Result<()> {
    let join = if args.legacy_selector_join {
        SelectorJoin::Concatenate
    } else {
        SelectorJoin::Comma
    };
    let pods = kubectl
        .clone()
        .with_selector_join(join)
        .pods_for_deployment(
            &args.deployment,
            namespace_or_configured(kubectl, args.namespace).as_deref(),
        )
        .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&pods)?);
    } else {
        println!("{}", format_pods(&pods));
    }
    Ok(())
}

#[derive(Args, Debug)]
pub struct LogsArgs {
    /// Pod name
    pod: String,

    /// Namespace of the pod
    #[arg(short = 'n', long)]
    namespace: Option<String>,

    /// Container to read (default: all containers)
    #[arg(short = 'c', long)]
    container: Option<String>,

    /// Number of most recent lines to show
    #[arg(long)]
    tail: Option<u32>,
}

/// Run the logs command
pub async fn logs(kubectl: &Kubectl, args: LogsArgs) -> Result<()> {
    let namespace = namespace_or_configured(kubectl, args.namespace);
    let lines = kubectl
        .logs_for_pod(
            &args.pod,
            namespace.as_deref(),
            args.container.as_deref(),
            args.tail,
        )
        .await?;
    for line in lines {
        println!("{}", line);
    }
    Ok(())
}

#[derive(Args, Debug)]
pub struct EventsArgs {
    /// Kind of the involved object (e.g. Pod, Deployment)
    kind: String,

    /// Name of the involved object
    name: String,

    /// Namespace of the involved object (default: default)
    #[arg(short = 'n', long)]
    namespace: Option<String>,
}

/// Run the events command
pub async fn events(kubectl: &Kubectl, args: EventsArgs) -> Result<()> {
    let namespace = namespace_or_configured(kubectl, args.namespace);
    let events = kubectl
        .events_for(&args.kind, &args.name, namespace.as_deref())
        .await?;
    println!("{}", format_events(&events));
    Ok(())
}
