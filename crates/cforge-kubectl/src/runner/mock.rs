//! Mock runner for testing
//!
//! Replays scripted results in order and records every command line, useful
//! for unit tests without a kubectl binary or a cluster.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

use super::{CommandLine, CommandRunner, InvocationResult};
use crate::error::Result;

/// One recorded call to [`MockRunner::run`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedInvocation {
    pub program: String,
    pub args: Vec<String>,
}

impl RecordedInvocation {
    /// The kubectl subcommand, skipping leading global flags
    pub fn subcommand(&self) -> Option<&str> {
        self.args
            .iter()
            .map(String::as_str)
            .find(|arg| !arg.starts_with('-'))
    }

    /// Whether any argument equals `arg`
    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }
}

/// In-memory runner returning scripted results
#[derive(Clone, Default)]
pub struct MockRunner {
    /// Results handed out in order; an empty queue yields success with no output
    responses: Arc<RwLock<VecDeque<InvocationResult>>>,
    /// Every command line seen
    invocations: Arc<RwLock<Vec<RecordedInvocation>>>,
}

impl MockRunner {
    /// Create a runner with no scripted responses
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with responses returned in order
    pub fn with_responses(responses: Vec<InvocationResult>) -> Self {
        let runner = Self::new();
        runner.responses.write().unwrap().extend(responses);
        runner
    }

    /// Queue another response
    pub fn push_response(&self, response: InvocationResult) {
        self.responses.write().unwrap().push_back(response);
    }

    /// All invocations so far
    pub fn invocations(&self) -> Vec<RecordedInvocation> {
        self.invocations.read().unwrap().clone()
    }

    /// Number of invocations so far
    pub fn invocation_count(&self) -> usize {
        self.invocations.read().unwrap().len()
    }

    /// Invocations of a given subcommand
    pub fn invocations_of(&self, subcommand: &str) -> Vec<RecordedInvocation> {
        self.invocations()
            .into_iter()
            .filter(|i| i.subcommand() == Some(subcommand))
            .collect()
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(&self, command: &CommandLine) -> Result<InvocationResult> {
        self.invocations.write().unwrap().push(RecordedInvocation {
            program: command.program.clone(),
            args: command.args.clone(),
        });
        let response = self.responses.write().unwrap().pop_front();
        Ok(response.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_in_order_and_records() {
        let runner = MockRunner::with_responses(vec![
            InvocationResult::success("first"),
            InvocationResult::failure(1, "second"),
        ]);

        let line = CommandLine::new("kubectl", vec!["--context=x".into(), "get".into()]);
        let first = runner.run(&line).await.unwrap();
        let second = runner.run(&line).await.unwrap();
        let third = runner.run(&line).await.unwrap();

        assert_eq!(first.stdout, "first");
        assert_eq!(second.exit_code, 1);
        assert_eq!(third, InvocationResult::default());
        assert_eq!(runner.invocation_count(), 3);
        assert_eq!(runner.invocations_of("get").len(), 3);
        assert!(runner.invocations()[0].has_arg("--context=x"));
    }
}
