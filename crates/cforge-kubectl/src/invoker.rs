//! Builds kubectl argument vectors and runs them

use std::sync::Arc;

use crate::config::{DEFAULT_KUBECTL, KubectlConfig};
use crate::error::Result;
use crate::logging::Logger;
use crate::options::{CommandOptions, OptionSchema, TypedOptions};
use crate::runner::{CommandLine, CommandRunner, InvocationResult};

/// Executes kubectl subcommands
///
/// The invoker never interprets exit codes; callers decide what a non-zero
/// exit means for their command.
#[derive(Clone)]
pub struct CommandInvoker {
    runner: Arc<dyn CommandRunner>,
    program: String,
    config: Option<KubectlConfig>,
    log: Logger,
}

impl CommandInvoker {
    pub fn new(runner: Arc<dyn CommandRunner>, log: Logger) -> Self {
        Self {
            runner,
            program: DEFAULT_KUBECTL.to_string(),
            config: None,
            log,
        }
    }

    /// Use a different kubectl binary
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Prepend this configuration's global flags to every invocation
    pub fn with_config(mut self, config: KubectlConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn config(&self) -> Option<&KubectlConfig> {
        self.config.as_ref()
    }

    /// Assemble `[global flags] <subcommand> <positional...> <flags...>`
    pub fn build_args(
        &self,
        subcommand: &str,
        schema: &OptionSchema,
        options: &CommandOptions,
        positional: &[String],
    ) -> Vec<String> {
        let mut args = vec![subcommand.to_string()];
        args.extend(positional.iter().cloned());
        self.log
            .debug(format!("Initial args: {}", args.join(" ")));

        let flags = schema.resolve(options);
        for flag in &flags {
            self.log.debug(format!("Pushing kubectl option: {}", flag));
        }
        args.extend(flags);
        self.with_global_flags(args)
    }

    fn with_global_flags(&self, args: Vec<String>) -> Vec<String> {
        match &self.config {
            Some(config) => {
                let mut full = config.global_flags();
                full.extend(args);
                full
            }
            None => args,
        }
    }

    /// Run a subcommand with schema-resolved options
    pub async fn execute(
        &self,
        subcommand: &str,
        schema: &OptionSchema,
        options: &CommandOptions,
        positional: &[String],
    ) -> Result<InvocationResult> {
        let args = self.build_args(subcommand, schema, options, positional);
        self.run(args).await
    }

    /// Run a subcommand from a typed option set
    pub async fn execute_typed<O: TypedOptions>(
        &self,
        subcommand: &str,
        options: &O,
        positional: &[String],
    ) -> Result<InvocationResult> {
        self.execute(
            subcommand,
            O::schema(),
            &options.to_command_options(),
            positional,
        )
        .await
    }

    /// Run pre-built arguments, prepending global flags
    ///
    /// Blank arguments are dropped.
    pub async fn run_args(&self, args: Vec<String>) -> Result<InvocationResult> {
        let args = args.into_iter().filter(|a| !a.trim().is_empty()).collect();
        self.run(self.with_global_flags(args)).await
    }

    async fn run(&self, args: Vec<String>) -> Result<InvocationResult> {
        let command = CommandLine::new(self.program.clone(), args);
        self.log.debug(format!("Executing: {}", command));
        let result = self.runner.run(&command).await?;
        self.log
            .debug(format!("Exit code {}: {}", result.exit_code, command.program));
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::Logging;
    use crate::options::{MANIFEST_FILE_OPTIONS, OptionValue};
    use crate::runner::MockRunner;

    fn invoker(runner: &MockRunner) -> CommandInvoker {
        CommandInvoker::new(Arc::new(runner.clone()), Logging::new(true).logger("kubernetes"))
    }

    #[test]
    fn test_flags_follow_positionals() {
        let runner = MockRunner::new();
        let options = CommandOptions::new()
            .with("files", vec!["a.yaml".to_string(), "b.yaml".to_string()])
            .set("recursive", OptionValue::flag(false));

        let args = invoker(&runner).build_args(
            "delete",
            &MANIFEST_FILE_OPTIONS,
            &options,
            &["--wait=false".to_string()],
        );

        assert_eq!(args, vec!["delete", "--wait=false", "--filename=a.yaml,b.yaml"]);
    }

    #[test]
    fn test_global_flags_are_prepended() {
        let runner = MockRunner::new();
        let config = KubectlConfig {
            context: Some("kind-dev".into()),
            insecure_skip_tls_verify: true,
            ..Default::default()
        };

        let args = invoker(&runner).with_config(config).build_args(
            "get",
            &OptionSchema::new(),
            &CommandOptions::new(),
            &["pods".to_string()],
        );

        assert_eq!(
            args,
            vec![
                "--insecure-skip-tls-verify=true",
                "--context=kind-dev",
                "get",
                "pods"
            ]
        );
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_returned_not_raised() {
        let runner = MockRunner::with_responses(vec![InvocationResult::failure(1, "denied")]);

        let result = invoker(&runner)
            .with_program("/opt/bin/kubectl")
            .execute("get", &OptionSchema::new(), &CommandOptions::new(), &[])
            .await
            .unwrap();

        assert_eq!(result.exit_code, 1);
        assert_eq!(result.stderr, "denied");
        let calls = runner.invocations();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "/opt/bin/kubectl");
    }

    #[tokio::test]
    async fn test_run_args_drops_blank_arguments() {
        let runner = MockRunner::new();

        invoker(&runner)
            .run_args(vec![
                "logs".into(),
                "web-1".into(),
                "".into(),
                "--tail=10".into(),
            ])
            .await
            .unwrap();

        assert_eq!(runner.invocations()[0].args, vec!["logs", "web-1", "--tail=10"]);
    }
}
