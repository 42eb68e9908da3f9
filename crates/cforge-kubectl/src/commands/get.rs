//! `kubectl get`, decoded as JSON or printed as text

use once_cell::sync::Lazy;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{KubectlError, Result};
use crate::invoker::CommandInvoker;
use crate::logging::{LogLevel, Logger, Logging};
use crate::options::{
    CommandOptions, GLOBAL_OPTIONS, OptionSchema, OptionValue, QUERY_OPTIONS, TypedOptions,
    comma_delimited, negated,
};
use crate::runner::InvocationResult;

static GET_OPTIONS: Lazy<OptionSchema> = Lazy::new(|| {
    OptionSchema::new()
        .extend(&GLOBAL_OPTIONS)
        .extend(&QUERY_OPTIONS)
        .structured("chunk_size", "chunk-size", Some(OptionValue::Number(0)), None)
        .simple("sort_by", "sort-by")
});

static PRINT_OPTIONS: Lazy<OptionSchema> = Lazy::new(|| {
    OptionSchema::new()
        .extend(&GET_OPTIONS)
        .simple("format", "output")
        .structured("label_columns", "label-columns", None, Some(comma_delimited))
        .structured("print_headers", "no-headers", None, Some(negated))
        .simple("show_kind", "show-kind")
        .simple("show_labels", "show-labels")
});

/// Options for `kubectl get`
///
/// `chunk_size` defaults to 0, which disables chunked list retrieval.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetOptions {
    pub namespace: Option<String>,
    pub label_selector: Vec<String>,
    pub field_selector: Vec<String>,
    pub all_namespaces: bool,
    pub chunk_size: Option<u32>,
    pub sort_by: Option<String>,
}

impl GetOptions {
    pub fn in_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            ..Default::default()
        }
    }
}

impl TypedOptions for GetOptions {
    fn schema() -> &'static OptionSchema {
        &GET_OPTIONS
    }

    fn to_command_options(&self) -> CommandOptions {
        CommandOptions::new()
            .set("namespace", OptionValue::string(self.namespace.as_deref()))
            .set("label_selector", OptionValue::list(&self.label_selector))
            .set("field_selector", OptionValue::list(&self.field_selector))
            .set("all_namespaces", OptionValue::flag(self.all_namespaces))
            .set(
                "chunk_size",
                self.chunk_size.map(|n| OptionValue::Number(i64::from(n))),
            )
            .set("sort_by", OptionValue::string(self.sort_by.as_deref()))
    }
}

/// Output format for [`PrintOptions`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GetFormat {
    Json,
    Yaml,
    Wide,
    Name,
    /// `custom-columns=<spec>`
    CustomColumns(String),
}

impl fmt::Display for GetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GetFormat::Json => write!(f, "json"),
            GetFormat::Yaml => write!(f, "yaml"),
            GetFormat::Wide => write!(f, "wide"),
            GetFormat::Name => write!(f, "name"),
            GetFormat::CustomColumns(spec) => write!(f, "custom-columns={}", spec),
        }
    }
}

impl FromStr for GetFormat {
    type Err = KubectlError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "json" => Ok(GetFormat::Json),
            "yaml" => Ok(GetFormat::Yaml),
            "wide" => Ok(GetFormat::Wide),
            "name" => Ok(GetFormat::Name),
            other => match other.strip_prefix("custom-columns=") {
                Some(spec) if !spec.is_empty() => Ok(GetFormat::CustomColumns(spec.to_string())),
                _ => Err(KubectlError::Validation(format!(
                    "unknown output format '{}', expected one of [json, yaml, wide, name, custom-columns=<spec>]",
                    other
                ))),
            },
        }
    }
}

/// Options for printing `kubectl get` output as text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrintOptions {
    pub get: GetOptions,
    pub format: Option<GetFormat>,
    pub label_columns: Vec<String>,
    /// `Some(false)` becomes `--no-headers=true`
    pub print_headers: Option<bool>,
    pub show_kind: bool,
    pub show_labels: bool,
}

impl TypedOptions for PrintOptions {
    fn schema() -> &'static OptionSchema {
        &PRINT_OPTIONS
    }

    fn to_command_options(&self) -> CommandOptions {
        self.get.to_command_options().merge(
            CommandOptions::new()
                .set(
                    "format",
                    self.format.as_ref().map(|f| OptionValue::String(f.to_string())),
                )
                .set("label_columns", OptionValue::list(&self.label_columns))
                .set("print_headers", self.print_headers.map(OptionValue::Bool))
                .set("show_kind", OptionValue::flag(self.show_kind))
                .set("show_labels", OptionValue::flag(self.show_labels)),
        )
    }
}

fn non_zero_exit(result: &InvocationResult) -> KubectlError {
    KubectlError::NonZeroExit {
        command: "get".into(),
        code: result.exit_code,
        stdout: result.stdout.trim().to_string(),
        stderr: result.stderr.trim().to_string(),
    }
}

/// Runs `kubectl get <kind> --output=json`
pub struct GetCommand<'a> {
    invoker: &'a CommandInvoker,
}

impl<'a> GetCommand<'a> {
    pub fn new(invoker: &'a CommandInvoker) -> Self {
        Self { invoker }
    }

    pub async fn execute(&self, kind: &str, options: &GetOptions) -> Result<Value> {
        let result = self
            .invoker
            .execute_typed("get", options, &[kind.to_string(), "--output=json".into()])
            .await?;
        if !result.is_success() {
            return Err(non_zero_exit(&result));
        }
        serde_json::from_str(&result.stdout).map_err(|e| KubectlError::decode(&e, &result.stdout))
    }
}

/// Runs `kubectl get <kind>` and returns its text output
pub struct PrintCommand<'a> {
    invoker: &'a CommandInvoker,
    log: Logger,
}

impl<'a> PrintCommand<'a> {
    pub fn new(invoker: &'a CommandInvoker, logging: &Logging) -> Self {
        Self {
            invoker,
            log: logging.logger("print"),
        }
    }

    pub async fn execute(&self, kind: &str, options: &PrintOptions) -> Result<String> {
        let result = self
            .invoker
            .execute_typed("get", options, &[kind.to_string()])
            .await?;
        if !result.is_success() {
            return Err(non_zero_exit(&result));
        }
        self.log.lines(LogLevel::Error, &result.stderr);
        self.log.lines(LogLevel::Debug, &result.stdout);
        Ok(result.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::MockRunner;
    use std::sync::Arc;

    fn invoker(runner: &MockRunner) -> CommandInvoker {
        CommandInvoker::new(Arc::new(runner.clone()), Logging::new(false).logger("kubernetes"))
    }

    #[test]
    fn test_chunk_size_defaults_to_zero() {
        let flags = GetOptions::schema().resolve(&GetOptions::default().to_command_options());
        assert_eq!(flags, vec!["--chunk-size=0"]);
    }

    #[test]
    fn test_print_flags() {
        let options = PrintOptions {
            get: GetOptions {
                label_selector: vec!["app=web".into()],
                sort_by: Some(".metadata.name".into()),
                ..GetOptions::in_namespace("bootstrap")
            },
            format: Some(GetFormat::Wide),
            label_columns: vec!["app".into(), "tier".into()],
            print_headers: Some(false),
            show_kind: true,
            ..Default::default()
        };

        assert_eq!(
            PrintOptions::schema().resolve(&options.to_command_options()),
            vec![
                "--namespace=bootstrap",
                "--selector=app=web",
                "--chunk-size=0",
                "--sort-by=.metadata.name",
                "--output=wide",
                "--label-columns=app,tier",
                "--no-headers=true",
                "--show-kind=true",
            ]
        );
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("yaml".parse::<GetFormat>().unwrap(), GetFormat::Yaml);
        let custom: GetFormat = "custom-columns=NAME:.metadata.name".parse().unwrap();
        assert_eq!(custom.to_string(), "custom-columns=NAME:.metadata.name");
        assert!("custom-columns=".parse::<GetFormat>().is_err());
        assert!("table".parse::<GetFormat>().unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn test_get_decodes_json() {
        let runner = MockRunner::with_responses(vec![InvocationResult::success(
            r#"{"kind":"List","items":[{"metadata":{"name":"default"}}]}"#,
        )]);

        let value = GetCommand::new(&invoker(&runner))
            .execute("namespaces", &GetOptions::default())
            .await
            .unwrap();

        assert_eq!(value["items"][0]["metadata"]["name"], "default");
        assert_eq!(
            runner.invocations()[0].args,
            vec!["get", "namespaces", "--output=json", "--chunk-size=0"]
        );
    }

    #[tokio::test]
    async fn test_get_reports_invalid_json() {
        let runner = MockRunner::with_responses(vec![InvocationResult::success("not json")]);

        let err = GetCommand::new(&invoker(&runner))
            .execute("pods", &GetOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, KubectlError::Decode { ref output, .. } if output == "not json"));
    }

    #[tokio::test]
    async fn test_print_returns_stdout() {
        let table = "NAME   READY\nweb    1/1\n";
        let runner = MockRunner::with_responses(vec![InvocationResult::success(table)]);

        let output = PrintCommand::new(&invoker(&runner), &Logging::new(false))
            .execute("deployments", &PrintOptions::default())
            .await
            .unwrap();

        assert_eq!(output, table);
        assert!(!runner.invocations()[0].has_arg("--output=json"));
    }

    #[tokio::test]
    async fn test_print_fails_on_non_zero_exit() {
        let runner = MockRunner::with_responses(vec![InvocationResult::failure(
            1,
            "error: the server doesn't have a resource type \"widgets\"\n",
        )]);

        let err = PrintCommand::new(&invoker(&runner), &Logging::new(false))
            .execute("widgets", &PrintOptions::default())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("kubectl 'get' command failed with exit code: 1"));
    }
}
