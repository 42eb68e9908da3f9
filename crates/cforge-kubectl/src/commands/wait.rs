//! `kubectl wait` with typed targets and outcome classification
//!
//! Polling is left entirely to kubectl and its `--timeout` flag. This module
//! validates the target before anything runs, then classifies the single exit
//! into [`WaitOutcome::Succeeded`], [`WaitOutcome::TimedOut`] or
//! [`WaitOutcome::Failed`].

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::time::Duration;

use crate::error::{KubectlError, Result};
use crate::invoker::CommandInvoker;
use crate::logging::{LogLevel, Logger, Logging};
use crate::options::{
    CommandOptions, GLOBAL_OPTIONS, MANIFEST_FILE_OPTIONS, OptionSchema, OptionValue,
    QUERY_OPTIONS, TypedOptions, seconds,
};
use crate::runner::InvocationResult;

/// Condition used when none is given
pub const DEFAULT_WAIT_FOR: &str = "condition=available";

/// Timeout used when none is given
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(60);

/// Text kubectl prints on stderr when `--timeout` expires
///
/// This literal is the only signal separating a timeout from any other
/// failure. If kubectl rewords its message, update it here.
pub const TIMEOUT_MARKER: &str = "timed out";

static WAIT_FOR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(delete|[^=]+=.+)$").expect("valid regex"));

static WAIT_OPTIONS: Lazy<OptionSchema> = Lazy::new(|| {
    OptionSchema::new()
        .extend(&GLOBAL_OPTIONS)
        .extend(&QUERY_OPTIONS)
        .extend(&MANIFEST_FILE_OPTIONS)
        .structured(
            "timeout",
            "timeout",
            Some(OptionValue::Number(DEFAULT_WAIT_TIMEOUT.as_secs() as i64)),
            Some(seconds),
        )
        .structured(
            "wait_for",
            "for",
            Some(OptionValue::from(DEFAULT_WAIT_FOR)),
            None,
        )
});

/// Raw options for `kubectl wait`
///
/// Either `files`, or `kind` plus exactly one of `name` and `label_selector`.
/// [`WaitOptions::validate`] enforces this and produces a [`WaitTarget`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WaitOptions {
    pub files: Vec<String>,
    pub recursive: bool,
    pub kind: Option<String>,
    pub name: Option<String>,
    pub label_selector: Vec<String>,
    pub field_selector: Vec<String>,
    pub all_namespaces: bool,
    pub namespace: Option<String>,
    /// `delete` or `<key>=<value>`, e.g. `condition=available`
    pub wait_for: Option<String>,
    pub timeout: Option<Duration>,
}

impl WaitOptions {
    /// Wait on a single named object
    pub fn named(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Wait on every object of a kind matching the label selector terms
    pub fn labeled<I, S>(kind: impl Into<String>, selector: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: Some(kind.into()),
            label_selector: selector.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Wait on the objects defined in manifest files
    pub fn files<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            files: files.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Wait for a named condition (`available` becomes `condition=available`)
    pub fn with_condition(mut self, condition: &str) -> Self {
        self.wait_for = Some(format!("condition={}", condition));
        self
    }

    /// Wait for a raw `--for` expression
    pub fn with_wait_for(mut self, wait_for: impl Into<String>) -> Self {
        self.wait_for = Some(wait_for.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The `--for` expression that will be used
    pub fn effective_wait_for(&self) -> &str {
        self.wait_for.as_deref().unwrap_or(DEFAULT_WAIT_FOR)
    }

    /// Check targeting rules and build the target
    pub fn validate(&self) -> Result<WaitTarget> {
        let wait_for = self.effective_wait_for();
        if !WAIT_FOR_PATTERN.is_match(wait_for) {
            return Err(KubectlError::Validation(format!(
                "waitFor condition must match [delete|condition=condition-name], was: {}",
                wait_for
            )));
        }

        let has_files = self.files.iter().any(|f| is_defined(f));
        let kind = self.kind.as_deref().filter(|k| is_defined(k));
        let name = self.name.as_deref().filter(|n| is_defined(n));
        let has_selector = self.label_selector.iter().any(|s| is_defined(s));

        let selection = if has_files {
            if kind.is_some() || name.is_some() || has_selector {
                return Err(KubectlError::Validation(
                    "When specifying manifest files, you may not also specify any of [kind, name, labelSelector].".into(),
                ));
            }
            TargetSelection::Manifests {
                files: defined(&self.files),
                recursive: self.recursive,
            }
        } else {
            let Some(kind) = kind else {
                return Err(KubectlError::Validation(
                    "You must specify exactly one of [files, kind].".into(),
                ));
            };
            match (name, has_selector) {
                (Some(_), true) => {
                    return Err(KubectlError::Validation(
                        "You may specify only one of [name, labelSelector].".into(),
                    ));
                }
                (None, false) => {
                    return Err(KubectlError::Validation(
                        "When specifying \"kind\", one of [name, labelSelector] is required."
                            .into(),
                    ));
                }
                (Some(name), false) => TargetSelection::Named {
                    kind: kind.to_string(),
                    name: name.to_string(),
                },
                (None, true) => TargetSelection::Labeled {
                    kind: kind.to_string(),
                    selector: defined(&self.label_selector),
                },
            }
        };

        Ok(WaitTarget {
            selection,
            namespace: self.namespace.clone().filter(|n| is_defined(n)),
            wait_for: wait_for.to_string(),
            timeout: self.timeout.unwrap_or(DEFAULT_WAIT_TIMEOUT),
        })
    }
}

fn is_defined(value: &str) -> bool {
    !value.trim().is_empty()
}

fn defined(values: &[String]) -> Vec<String> {
    values.iter().filter(|v| is_defined(v)).cloned().collect()
}

impl TypedOptions for WaitOptions {
    fn schema() -> &'static OptionSchema {
        &WAIT_OPTIONS
    }

    // kind and name have no flag; they travel as positional arguments.
    fn to_command_options(&self) -> CommandOptions {
        CommandOptions::new()
            .set("namespace", OptionValue::string(self.namespace.as_deref()))
            .set("kind", OptionValue::string(self.kind.as_deref()))
            .set("name", OptionValue::string(self.name.as_deref()))
            .set("label_selector", OptionValue::list(&self.label_selector))
            .set("field_selector", OptionValue::list(&self.field_selector))
            .set("all_namespaces", OptionValue::flag(self.all_namespaces))
            .set("files", OptionValue::list(&self.files))
            .set("recursive", OptionValue::flag(self.recursive))
            .set(
                "timeout",
                self.timeout.map(OptionValue::duration),
            )
            .set("wait_for", OptionValue::string(self.wait_for.as_deref()))
    }
}

/// What a wait is scoped to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSelection {
    Manifests { files: Vec<String>, recursive: bool },
    Named { kind: String, name: String },
    Labeled { kind: String, selector: Vec<String> },
}

/// A validated wait target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitTarget {
    pub selection: TargetSelection,
    pub namespace: Option<String>,
    pub wait_for: String,
    pub timeout: Duration,
}

impl WaitTarget {
    /// Positional arguments selecting the target
    pub fn positional(&self) -> Vec<String> {
        match &self.selection {
            TargetSelection::Manifests { .. } => Vec::new(),
            TargetSelection::Named { kind, name } => vec![format!("{}/{}", kind, name)],
            TargetSelection::Labeled { kind, .. } => vec![kind.clone()],
        }
    }
}

impl fmt::Display for WaitTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.selection {
            TargetSelection::Manifests { files, .. } => {
                write!(f, "resources in [{}]", files.join(", "))?
            }
            TargetSelection::Named { kind, name } => write!(f, "{}/{}", kind, name)?,
            TargetSelection::Labeled { kind, selector } => {
                write!(f, "{}s having labels [{}]", kind, selector.join(","))?
            }
        }
        if let Some(namespace) = &self.namespace {
            write!(f, " in namespace \"{}\"", namespace)?;
        }
        Ok(())
    }
}

/// Lifecycle of one wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPhase {
    Idle,
    Running,
    Succeeded,
    TimedOut,
    Failed,
}

impl WaitPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WaitPhase::Succeeded | WaitPhase::TimedOut | WaitPhase::Failed
        )
    }
}

impl fmt::Display for WaitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WaitPhase::Idle => "idle",
            WaitPhase::Running => "running",
            WaitPhase::Succeeded => "succeeded",
            WaitPhase::TimedOut => "timed-out",
            WaitPhase::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Terminal result of a wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    Succeeded(WaitTarget),
    TimedOut(WaitTarget),
    Failed { target: WaitTarget, message: String },
}

impl WaitOutcome {
    pub fn target(&self) -> &WaitTarget {
        match self {
            WaitOutcome::Succeeded(target) | WaitOutcome::TimedOut(target) => target,
            WaitOutcome::Failed { target, .. } => target,
        }
    }

    pub fn phase(&self) -> WaitPhase {
        match self {
            WaitOutcome::Succeeded(_) => WaitPhase::Succeeded,
            WaitOutcome::TimedOut(_) => WaitPhase::TimedOut,
            WaitOutcome::Failed { .. } => WaitPhase::Failed,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, WaitOutcome::Succeeded(_))
    }

    /// Treat anything but success as an error
    pub fn into_result(self) -> Result<WaitTarget> {
        match self {
            WaitOutcome::Succeeded(target) => Ok(target),
            WaitOutcome::TimedOut(target) => Err(KubectlError::WaitTimedOut {
                target: target.to_string(),
            }),
            WaitOutcome::Failed { target, message } => Err(KubectlError::WaitFailed {
                target: target.to_string(),
                message: message.trim().to_string(),
            }),
        }
    }
}

/// Classify a finished `kubectl wait`
pub fn classify_wait(target: WaitTarget, result: &InvocationResult) -> WaitOutcome {
    if result.is_success() {
        WaitOutcome::Succeeded(target)
    } else {
        classify_wait_failure(target, &result.stderr)
    }
}

/// Classify a non-zero `kubectl wait` exit from its stderr
///
/// A timeout is recognized solely by [`TIMEOUT_MARKER`] appearing in stderr
/// (case-sensitive). Everything else is a failure carrying stderr verbatim.
pub fn classify_wait_failure(target: WaitTarget, stderr: &str) -> WaitOutcome {
    if stderr.contains(TIMEOUT_MARKER) {
        WaitOutcome::TimedOut(target)
    } else {
        WaitOutcome::Failed {
            target,
            message: stderr.to_string(),
        }
    }
}

/// Diagnostic side effect run when a wait times out or fails
///
/// Hooks observe the target; they never change the outcome.
#[async_trait]
pub trait WaitFailureHook: Send + Sync {
    async fn on_wait_failure(&self, target: &WaitTarget);
}

/// Runs `kubectl wait`
pub struct WaitCommand<'a> {
    invoker: &'a CommandInvoker,
    log: Logger,
}

impl<'a> WaitCommand<'a> {
    pub fn new(invoker: &'a CommandInvoker, logging: &Logging) -> Self {
        Self {
            invoker,
            log: logging.logger("wait"),
        }
    }

    /// Validate, wait, classify, and run the hook on failure
    ///
    /// Only validation and spawn failures are errors; timeouts and failed
    /// waits are reported as outcomes.
    pub async fn execute(
        &self,
        options: &WaitOptions,
        hook: Option<&dyn WaitFailureHook>,
    ) -> Result<WaitOutcome> {
        let mut phase = WaitPhase::Idle;
        let target = options.validate()?;

        self.log.info(format!(
            "Waiting up to {:?} for {}...",
            target.timeout,
            target
        ));
        self.transition(&mut phase, WaitPhase::Running);

        let result = self
            .invoker
            .execute(
                "wait",
                WaitOptions::schema(),
                &options.to_command_options(),
                &target.positional(),
            )
            .await?;

        let outcome = classify_wait(target, &result);
        self.transition(&mut phase, outcome.phase());

        match &outcome {
            WaitOutcome::Succeeded(_) => self.log.info("All resources available."),
            WaitOutcome::TimedOut(target) => {
                self.log
                    .warn(format!("Timed out while waiting for {}", target));
            }
            WaitOutcome::Failed { target, message } => {
                self.log.error(format!("Failed waiting for {}:", target));
                self.log.lines(LogLevel::Error, message);
            }
        }

        if !outcome.is_success()
            && let Some(hook) = hook
        {
            hook.on_wait_failure(outcome.target()).await;
        }

        Ok(outcome)
    }

    /// Whether the objects in `path` have not reached `condition` yet
    pub async fn is_pending(&self, path: &str, condition: &str) -> Result<bool> {
        let options = WaitOptions::files([path])
            .with_condition(condition)
            .with_timeout(Duration::ZERO);
        options.validate()?;
        let result = self.invoker.execute_typed("wait", &options, &[]).await?;
        Ok(!result.is_success())
    }

    fn transition(&self, phase: &mut WaitPhase, next: WaitPhase) {
        self.log.debug(format!("wait: {} -> {}", phase, next));
        *phase = next;
    }
}
