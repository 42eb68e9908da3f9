//! Apply command - apply manifest files or a kustomization

use cforge_kubectl::{ApplyOptions, Kubectl};
use clap::Args;

use crate::display::format_apply_outcome;
use crate::error::Result;

#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Manifest files or directories
    #[arg(short = 'f', long = "filename", value_delimiter = ',')]
    files: Vec<String>,

    /// Kustomization directory
    #[arg(short = 'k', long)]
    kustomize: Option<String>,

    /// Process directories recursively
    #[arg(short = 'R', long)]
    recursive: bool,

    /// Only print what would be applied
    #[arg(long)]
    dry_run: bool,

    /// Submit to the server without persisting
    #[arg(long)]
    server_dry_run: bool,

    /// Validate manifests against the server schema
    #[arg(long)]
    validate: Option<bool>,

    /// Overwrite conflicting fields
    #[arg(long)]
    overwrite: Option<bool>,

    /// Output the outcome as JSON
    #[arg(long)]
    json: bool,
}

/// Run the apply command
pub async fn run(kubectl: &Kubectl, args: ApplyArgs) -> Result<()> {
    let options = ApplyOptions {
        files: args.files,
        recursive: args.recursive,
        kustomization: args.kustomize,
        validate: args.validate,
        dry_run: args.dry_run,
        server_dry_run: args.server_dry_run,
        overwrite: args.overwrite,
    };

    let outcome = kubectl.apply(&options).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{}", format_apply_outcome(&outcome));
    }
    Ok(())
}
