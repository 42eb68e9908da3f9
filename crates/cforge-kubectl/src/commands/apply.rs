//! `kubectl apply` on a kustomization or a set of manifest files
//!
//! Output lines of the form `<kind>/<name> <status>` are grouped by status.
//! Anything else is kept verbatim as unparseable output, since newer kubectl
//! versions may change the format.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::{KubectlError, Result};
use crate::invoker::CommandInvoker;
use crate::logging::{LogLevel, Logger, Logging};
use crate::options::{
    CommandOptions, OptionSchema, OptionValue, TypedOptions, UPDATE_FROM_MANIFEST_OPTIONS,
};

/// `<kind>/<name> <status>`; greedy, so the last `/` before the status splits kind and name.
/// A stray carriage return inside a line makes it unparseable.
static RESOURCE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([^\r\n]+)/([^\r\n]+) ([^\r\n]+)$").expect("valid regex")
});

static APPLY_OPTIONS: Lazy<OptionSchema> = Lazy::new(|| {
    OptionSchema::new()
        .extend(&UPDATE_FROM_MANIFEST_OPTIONS)
        .simple("kustomization", "kustomize")
});

/// Options for `kubectl apply`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Manifest files or directories
    pub files: Vec<String>,
    /// Process directories in `files` recursively
    pub recursive: bool,
    /// Kustomization directory
    pub kustomization: Option<String>,
    /// Explicit schema validation setting
    pub validate: Option<bool>,
    pub dry_run: bool,
    pub server_dry_run: bool,
    pub overwrite: Option<bool>,
}

impl ApplyOptions {
    /// Apply the given manifest files
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

    /// Apply a kustomization directory
    pub fn kustomization(path: impl Into<String>) -> Self {
        Self {
            kustomization: Some(path.into()),
            ..Default::default()
        }
    }

    fn has_files(&self) -> bool {
        self.files.iter().any(|f| !f.trim().is_empty())
    }

    fn has_kustomization(&self) -> bool {
        self.kustomization
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }

    /// Exactly one of files and kustomization must be given
    pub fn validate(&self) -> Result<()> {
        match (self.has_files(), self.has_kustomization()) {
            (true, true) => Err(KubectlError::Validation(
                "Only one of [files, kustomization] may be specified.".into(),
            )),
            (false, false) => Err(KubectlError::Validation(
                "You must specify one of \"files\" or \"kustomization\".".into(),
            )),
            _ => Ok(()),
        }
    }
}

impl TypedOptions for ApplyOptions {
    fn schema() -> &'static OptionSchema {
        &APPLY_OPTIONS
    }

    fn to_command_options(&self) -> CommandOptions {
        CommandOptions::new()
            .set("files", OptionValue::list(&self.files))
            .set("recursive", OptionValue::flag(self.recursive))
            .set(
                "kustomization",
                OptionValue::string(self.kustomization.as_deref()),
            )
            .set("validate", self.validate.map(OptionValue::Bool))
            .set("dry_run", OptionValue::flag(self.dry_run))
            .set("server_dry_run", OptionValue::flag(self.server_dry_run))
            .set("overwrite", self.overwrite.map(OptionValue::Bool))
    }
}

/// A single resource affected by an apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AffectedResource {
    /// The kind, or resource group (`deployment.apps`)
    pub kind: String,
    pub name: String,
    /// How the resource was affected: `created`, `configured`, `unchanged`, ...
    pub status: String,
}

/// Resource changes reported by an apply
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyOutcome {
    /// Affected resources grouped by status, in first-seen order
    pub resources_by_status: IndexMap<String, Vec<AffectedResource>>,
    /// Output lines that did not look like `<kind>/<name> <status>`
    pub unparseable_lines: Vec<String>,
}

impl ApplyOutcome {
    /// Parse apply output; never fails
    pub fn parse(stdout: &str, stderr: &str) -> Self {
        let mut outcome = Self::default();
        let output = format!("{}\n{}", stdout.trim(), stderr.trim());

        for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match RESOURCE_LINE.captures(line) {
                Some(caps) => {
                    let resource = AffectedResource {
                        kind: caps[1].to_string(),
                        name: caps[2].to_string(),
                        status: caps[3].to_string(),
                    };
                    outcome
                        .resources_by_status
                        .entry(resource.status.clone())
                        .or_default()
                        .push(resource);
                }
                None => outcome.unparseable_lines.push(line.to_string()),
            }
        }
        outcome
    }

    /// Resources with a given status
    pub fn with_status(&self, status: &str) -> &[AffectedResource] {
        self.resources_by_status
            .get(status)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of parsed resources across all groups
    pub fn total(&self) -> usize {
        self.resources_by_status.values().map(Vec::len).sum()
    }

    /// `status: count` pairs, e.g. `configured: 2, unchanged: 5`
    pub fn summary(&self) -> String {
        self.resources_by_status
            .iter()
            .map(|(status, resources)| format!("{}: {}", status, resources.len()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Runs `kubectl apply`
pub struct ApplyCommand<'a> {
    invoker: &'a CommandInvoker,
    log: Logger,
    output_log: Logger,
}

impl<'a> ApplyCommand<'a> {
    pub fn new(invoker: &'a CommandInvoker, logging: &Logging) -> Self {
        Self {
            invoker,
            log: logging.logger("kubernetes"),
            output_log: logging.logger("apply"),
        }
    }

    /// Validate, apply and parse the result
    ///
    /// Output is parsed and logged even when kubectl fails, before the
    /// failure is returned.
    pub async fn execute(&self, options: &ApplyOptions) -> Result<ApplyOutcome> {
        options.validate()?;
        match &options.kustomization {
            Some(kustomization) if options.files.is_empty() => self
                .log
                .info(format!("Applying kustomization: [{}]", kustomization)),
            _ => self
                .log
                .info(format!("Applying manifest files: [{}]", options.files.join(","))),
        }

        let result = self.invoker.execute_typed("apply", options, &[]).await?;
        let outcome = ApplyOutcome::parse(&result.stdout, &result.stderr);
        self.log_outcome(&outcome);

        if !result.is_success() {
            return Err(KubectlError::NonZeroExit {
                command: "apply".into(),
                code: result.exit_code,
                stdout: result.stdout.trim().to_string(),
                stderr: result.stderr.trim().to_string(),
            });
        }
        Ok(outcome)
    }

    fn log_outcome(&self, outcome: &ApplyOutcome) {
        if self.output_log.is_enabled(LogLevel::Warn) {
            for line in &outcome.unparseable_lines {
                self.output_log
                    .warn(format!("Unparseable 'kubectl' output: {}", line));
            }
        }
        if self.log.is_enabled(LogLevel::Debug) {
            for (status, resources) in &outcome.resources_by_status {
                self.output_log.debug(format!("{}:", status));
                for resource in resources {
                    self.output_log
                        .debug(format!("  {}/{}", resource.kind, resource.name));
                }
            }
        }
        self.log.info(format!(
            "`kubectl apply` results summary: {}",
            outcome.summary()
        ));
    }
}
