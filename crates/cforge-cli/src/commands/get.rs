//! Get and print commands

use cforge_kubectl::{GetFormat, GetOptions, Kubectl, PrintOptions};
use clap::Args;

use crate::commands::namespace_or_configured;
use crate::error::Result;

/// Selection flags shared by get and print
#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Namespace to query
    #[arg(short = 'n', long)]
    namespace: Option<String>,

    /// Label selector terms (key=value)
    #[arg(short = 'l', long = "selector", value_delimiter = ',')]
    selector: Vec<String>,

    /// Field selector terms
    #[arg(long, value_delimiter = ',')]
    field_selector: Vec<String>,

    /// Query all namespaces
    #[arg(short = 'A', long)]
    all_namespaces: bool,

    /// List chunk size (0 disables chunking)
    #[arg(long)]
    chunk_size: Option<u32>,

    /// JSONPath sort expression
    #[arg(long)]
    sort_by: Option<String>,
}

impl From<QueryArgs> for GetOptions {
    fn from(args: QueryArgs) -> Self {
        GetOptions {
            namespace: args.namespace,
            label_selector: args.selector,
            field_selector: args.field_selector,
            all_namespaces: args.all_namespaces,
            chunk_size: args.chunk_size,
            sort_by: args.sort_by,
        }
    }
}

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Resource kind (e.g. pods, deployments.apps)
    kind: String,

    #[command(flatten)]
    query: QueryArgs,
}

/// Run the get command
pub async fn run(kubectl: &Kubectl, args: GetArgs) -> Result<()> {
    let mut options = GetOptions::from(args.query);
    options.namespace = namespace_or_configured(kubectl, options.namespace);
    let value = kubectl.get(&args.kind, &options).await?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

#[derive(Args, Debug)]
pub struct PrintArgs {
    /// Resource kind (e.g. pods, deployments.apps)
    kind: String,

    #[command(flatten)]
    query: QueryArgs,

    /// Output format: json, yaml, wide, name or custom-columns=<spec>
    #[arg(short = 'o', long)]
    output: Option<GetFormat>,

    /// Labels to show as columns
    #[arg(short = 'L', long, value_delimiter = ',')]
    label_columns: Vec<String>,

    /// Omit the header row
    #[arg(long)]
    no_headers: bool,

    /// Prefix names with their kind
    #[arg(long)]
    show_kind: bool,

    /// Show all labels as the last column
    #[arg(long)]
    show_labels: bool,
}

/// Run the print command
pub async fn print(kubectl: &Kubectl, args: PrintArgs) -> Result<()> {
    let mut get = GetOptions::from(args.query);
    get.namespace = namespace_or_configured(kubectl, get.namespace);
    let options = PrintOptions {
        get,
        format: args.output,
        label_columns: args.label_columns,
        print_headers: args.no_headers.then_some(false),
        show_kind: args.show_kind,
        show_labels: args.show_labels,
    };

    let output = kubectl.print(&args.kind, &options).await?;
    print!("{}", output);
    Ok(())
}
