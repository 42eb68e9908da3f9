//! cforge CLI - Bootstrap and manage Kubernetes clusters through kubectl

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;

use cforge_kubectl::{DEFAULT_KUBECTL, Kubectl, KubectlConfig, Logging};

mod commands;
mod display;
mod error;
mod exit_codes;

use error::Result;

#[derive(Parser)]
#[command(name = "cforge")]
#[command(author = "cforge Contributors")]
#[command(version)]
#[command(about = "Bootstrap and manage Kubernetes clusters through kubectl", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalArgs,
}

/// Connection flags shared by every subcommand
#[derive(Args, Debug, Clone)]
struct GlobalArgs {
    /// kubectl binary to run
    #[arg(long, global = true, env = "CFORGE_KUBECTL", default_value = DEFAULT_KUBECTL)]
    kubectl: String,

    /// Configuration file (default: <config dir>/cforge/config.yaml)
    #[arg(long, global = true, env = "CFORGE_CONFIG")]
    config: Option<PathBuf>,

    /// kubeconfig cluster to use
    #[arg(long, global = true, env = "CFORGE_CLUSTER")]
    cluster: Option<String>,

    /// kubeconfig context to use
    #[arg(long, global = true, env = "CFORGE_CONTEXT")]
    context: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long, global = true)]
    insecure_skip_tls_verify: bool,

    /// Per-request timeout in seconds
    #[arg(long, global = true, value_name = "SECONDS")]
    request_timeout: Option<u64>,

    /// kubectl log verbosity (0-9)
    #[arg(long, global = true)]
    verbosity: Option<u8>,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply manifest files or a kustomization
    Apply(commands::apply::ApplyArgs),

    /// Wait for resources to reach a condition
    Wait(commands::wait::WaitArgs),

    /// Apply or create manifests, then wait for resources in order
    Deploy(commands::deploy::DeployArgs),

    /// Get resources as JSON
    Get(commands::get::GetArgs),

    /// Print resources as kubectl formats them
    Print(commands::get::PrintArgs),

    /// List the pods of a deployment
    Pods(commands::pods::PodsArgs),

    /// Show the logs of a pod
    Logs(commands::pods::LogsArgs),

    /// Show the events of a resource
    Events(commands::pods::EventsArgs),

    /// Check whether manifests have not reached a condition yet
    Pending(commands::wait::PendingArgs),
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let env = std::env::var("CFORGE_LOG").unwrap_or_else(|_| default.to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Build the kubectl facade from the config file and global flags
fn connect(global: &GlobalArgs) -> Result<Kubectl> {
    let file = match &global.config {
        Some(path) => KubectlConfig::load_from(path)?,
        None => KubectlConfig::load()?,
    };
    let overrides = KubectlConfig {
        cluster: global.cluster.clone(),
        context: global.context.clone(),
        insecure_skip_tls_verify: global.insecure_skip_tls_verify,
        request_timeout: global.request_timeout.map(Duration::from_secs),
        verbosity: global.verbosity,
        ..Default::default()
    };
    let config = file.merged_with(&overrides);
    config.validate()?;
    tracing::debug!(
        kubectl = %global.kubectl,
        flags = ?config.global_flags(),
        "resolved kubectl configuration"
    );

    let logging = Logging::new(global.debug || std::env::var_os("DEBUG").is_some());
    Ok(Kubectl::new(config, logging).with_program(global.kubectl.as_str()))
}

async fn run(cli: Cli) -> Result<()> {
    let kubectl = connect(&cli.global)?;

    match cli.command {
        Commands::Apply(args) => commands::apply::run(&kubectl, args).await,
        Commands::Wait(args) => commands::wait::run(&kubectl, args).await,
        Commands::Deploy(args) => commands::deploy::run(&kubectl, args).await,
        Commands::Get(args) => commands::get::run(&kubectl, args).await,
        Commands::Print(args) => commands::get::print(&kubectl, args).await,
        Commands::Pods(args) => commands::pods::run(&kubectl, args).await,
        Commands::Logs(args) => commands::pods::logs(&kubectl, args).await,
        Commands::Events(args) => commands::pods::events(&kubectl, args).await,
        Commands::Pending(args) => commands::wait::pending(&kubectl, args).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(exit_codes::USAGE_ERROR as u8)
            } else {
                ExitCode::from(exit_codes::SUCCESS as u8)
            };
        }
    };

    init_tracing(cli.global.debug);

    match run(cli).await {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            ExitCode::from(code as u8)
        }
    }
}
