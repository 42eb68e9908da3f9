//! Declarative mapping from typed option fields to kubectl flags
//!
//! An [`OptionSchema`] describes, per field, which flag the field becomes and
//! how its value is rendered. Typed option structs turn themselves into an
//! ordered [`CommandOptions`] record, and [`OptionSchema::resolve`] turns that
//! record into `--flag=value` arguments.
//!
//! The shared schemas mirror the option groups kubectl itself uses: global
//! connection flags, query selectors, update modifiers and manifest inputs.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use std::fmt;
use std::time::Duration;

/// A single option value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    String(String),
    List(Vec<String>),
    Number(i64),
    Bool(bool),
}

impl OptionValue {
    /// Wrap a string, treating blank strings as unset
    pub fn string(value: Option<&str>) -> Option<Self> {
        value
            .filter(|v| !v.trim().is_empty())
            .map(|v| OptionValue::String(v.to_string()))
    }

    /// Wrap a list, dropping blank entries; unset when none remain
    pub fn list(values: &[String]) -> Option<Self> {
        let items: Vec<String> = values
            .iter()
            .filter(|v| !v.trim().is_empty())
            .cloned()
            .collect();
        (!items.is_empty()).then_some(OptionValue::List(items))
    }

    /// Wrap a duration: whole seconds as a number, anything finer in milliseconds
    ///
    /// Milliseconds are rounded up, so a non-zero duration never renders as `0s`.
    pub fn duration(value: Duration) -> Self {
        if value.subsec_nanos() == 0 {
            OptionValue::Number(value.as_secs() as i64)
        } else {
            OptionValue::String(format!("{}ms", value.as_nanos().div_ceil(1_000_000)))
        }
    }

    /// Wrap a flag that should only be emitted when true
    pub fn flag(value: bool) -> Option<Self> {
        value.then_some(OptionValue::Bool(true))
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::String(s) => write!(f, "{}", s),
            OptionValue::List(items) => write!(f, "{}", items.join(",")),
            OptionValue::Number(n) => write!(f, "{}", n),
            OptionValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::String(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::String(value)
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Number(value)
    }
}

impl From<Vec<String>> for OptionValue {
    fn from(value: Vec<String>) -> Self {
        OptionValue::List(value)
    }
}

/// Renders a value for the command line
pub type Transform = fn(&OptionValue) -> String;

/// How one field maps to a flag
#[derive(Debug, Clone)]
pub enum OptionDescriptor {
    /// `--<flag>=<value>`
    Simple(&'static str),
    /// `--<flag>=<transform(value or default)>`
    Structured {
        flag: &'static str,
        default: Option<OptionValue>,
        transform: Option<Transform>,
    },
}

impl OptionDescriptor {
    /// The flag name, without leading dashes
    pub fn flag(&self) -> &'static str {
        match self {
            OptionDescriptor::Simple(flag) => flag,
            OptionDescriptor::Structured { flag, .. } => flag,
        }
    }

    fn default_value(&self) -> Option<&OptionValue> {
        match self {
            OptionDescriptor::Simple(_) => None,
            OptionDescriptor::Structured { default, .. } => default.as_ref(),
        }
    }

    fn render(&self, value: &OptionValue) -> String {
        match self {
            OptionDescriptor::Simple(flag) => format!("--{}={}", flag, value),
            OptionDescriptor::Structured {
                flag,
                transform: Some(transform),
                ..
            } => format!("--{}={}", flag, transform(value)),
            OptionDescriptor::Structured { flag, .. } => format!("--{}={}", flag, value),
        }
    }
}

/// Ordered field-to-descriptor mapping for one command
#[derive(Debug, Clone, Default)]
pub struct OptionSchema {
    entries: IndexMap<&'static str, OptionDescriptor>,
}

impl OptionSchema {
    /// Create an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `field` to `--<flag>=<value>`
    pub fn simple(self, field: &'static str, flag: &'static str) -> Self {
        self.with(field, OptionDescriptor::Simple(flag))
    }

    /// Map `field` to a structured descriptor
    pub fn structured(
        self,
        field: &'static str,
        flag: &'static str,
        default: Option<OptionValue>,
        transform: Option<Transform>,
    ) -> Self {
        self.with(
            field,
            OptionDescriptor::Structured {
                flag,
                default,
                transform,
            },
        )
    }

    /// Add a descriptor, replacing any previous one for the same field
    ///
    /// # Panics
    ///
    /// Panics on an empty field, an empty flag, or a flag that already
    /// carries leading dashes. Schemas are built once from static data, so
    /// these are programming errors.
    pub fn with(mut self, field: &'static str, descriptor: OptionDescriptor) -> Self {
        assert!(!field.is_empty(), "option field name must not be empty");
        let flag = descriptor.flag();
        assert!(
            !flag.is_empty(),
            "option '{}' must map to a non-empty flag",
            field
        );
        assert!(
            !flag.starts_with('-'),
            "flag for option '{}' must not include leading dashes: {}",
            field,
            flag
        );
        self.entries.insert(field, descriptor);
        self
    }

    /// Layer another schema on top of this one
    pub fn extend(mut self, other: &OptionSchema) -> Self {
        for (field, descriptor) in &other.entries {
            self.entries.insert(*field, descriptor.clone());
        }
        self
    }

    /// Look up the descriptor for a field
    pub fn get(&self, field: &str) -> Option<&OptionDescriptor> {
        self.entries.get(field)
    }

    /// Whether the schema knows the field
    pub fn contains(&self, field: &str) -> bool {
        self.entries.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve an options record into flags, in record order
    ///
    /// Fields without a descriptor are ignored. Unset fields fall back to the
    /// descriptor default and are skipped when there is none.
    pub fn resolve(&self, options: &CommandOptions) -> Vec<String> {
        options
            .iter()
            .filter_map(|(field, value)| {
                let descriptor = self.entries.get(field)?;
                let effective = value.or(descriptor.default_value())?;
                Some(descriptor.render(effective))
            })
            .collect()
    }
}

/// Ordered record of option values keyed by field name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOptions {
    values: IndexMap<String, Option<OptionValue>>,
}

impl CommandOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, keeping its position if already present
    pub fn set(mut self, field: &str, value: Option<OptionValue>) -> Self {
        self.values.insert(field.to_string(), value);
        self
    }

    /// Set a field to a concrete value
    pub fn with(self, field: &str, value: impl Into<OptionValue>) -> Self {
        self.set(field, Some(value.into()))
    }

    pub fn get(&self, field: &str) -> Option<&OptionValue> {
        self.values.get(field).and_then(Option::as_ref)
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&OptionValue>)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    /// Append all entries of another record
    pub fn merge(mut self, other: CommandOptions) -> Self {
        for (field, value) in other.values {
            self.values.insert(field, value);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Typed option sets that know their schema
pub trait TypedOptions {
    /// Schema used to resolve this option set
    fn schema() -> &'static OptionSchema;

    /// Ordered record of this option set's values
    fn to_command_options(&self) -> CommandOptions;
}

/// Render a string or list as a comma-delimited list
pub fn comma_delimited(value: &OptionValue) -> String {
    match value {
        OptionValue::List(items) => items.join(","),
        other => other.to_string(),
    }
}

/// Render a number of seconds as a kubectl duration
pub fn seconds(value: &OptionValue) -> String {
    match value {
        OptionValue::Number(n) => format!("{}s", n),
        other => other.to_string(),
    }
}

/// Render the negation of a boolean (`print_headers` -> `--no-headers`)
pub fn negated(value: &OptionValue) -> String {
    match value {
        OptionValue::Bool(b) => (!b).to_string(),
        other => other.to_string(),
    }
}

/// Connection-level flags shared by every command
pub static GLOBAL_OPTIONS: Lazy<OptionSchema> = Lazy::new(|| {
    OptionSchema::new()
        .simple("cluster", "cluster")
        .simple("context", "context")
        .simple("insecure_skip_tls_verify", "insecure-skip-tls-verify")
        .simple("namespace", "namespace")
        .structured("request_timeout", "request-timeout", None, Some(seconds))
        .simple("verbosity", "v")
});

/// Flags for selecting resources
pub static QUERY_OPTIONS: Lazy<OptionSchema> = Lazy::new(|| {
    OptionSchema::new()
        .structured(
            "field_selector",
            "field-selector",
            None,
            Some(comma_delimited),
        )
        .simple("all_namespaces", "all-namespaces")
        .structured("label_selector", "selector", None, Some(comma_delimited))
});

/// Flags modifying how updates are performed
pub static UPDATE_OPTIONS: Lazy<OptionSchema> = Lazy::new(|| {
    OptionSchema::new()
        .simple("dry_run", "dry-run")
        .simple("overwrite", "overwrite")
        .simple("server_dry_run", "server-dry-run")
});

/// Flags for manifest file inputs
pub static MANIFEST_FILE_OPTIONS: Lazy<OptionSchema> = Lazy::new(|| {
    OptionSchema::new()
        .structured("files", "filename", None, Some(comma_delimited))
        .simple("recursive", "recursive")
});

/// Flags for updates driven by manifest files
pub static UPDATE_FROM_MANIFEST_OPTIONS: Lazy<OptionSchema> = Lazy::new(|| {
    OptionSchema::new()
        .extend(&UPDATE_OPTIONS)
        .extend(&MANIFEST_FILE_OPTIONS)
        .simple("validate", "validate")
});

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> OptionSchema {
        OptionSchema::new()
            .simple("name", "name")
            .structured(
                "timeout",
                "timeout",
                Some(OptionValue::Number(60)),
                Some(seconds),
            )
            .structured(
                "wait_for",
                "for",
                Some(OptionValue::from("condition=available")),
                None,
            )
            .structured("labels", "selector", None, Some(comma_delimited))
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let options = CommandOptions::new()
            .with("name", "web")
            .with("kind", "deployment")
            .with("bogus", true);

        let flags = schema().resolve(&options);

        assert_eq!(flags, vec!["--name=web"]);
        assert!(flags.iter().all(|f| !f.contains("kind") && !f.contains("bogus")));
    }

    #[test]
    fn test_default_equals_explicit_value() {
        let defaulted = CommandOptions::new().set("timeout", None).set("wait_for", None);
        let explicit = CommandOptions::new()
            .with("timeout", 60i64)
            .with("wait_for", "condition=available");

        assert_eq!(schema().resolve(&defaulted), schema().resolve(&explicit));
        assert_eq!(
            schema().resolve(&defaulted),
            vec!["--timeout=60s", "--for=condition=available"]
        );
    }

    #[test]
    fn test_unset_without_default_is_omitted() {
        let options = CommandOptions::new().set("name", None).set("labels", None);
        assert!(schema().resolve(&options).is_empty());
    }

    #[test]
    fn test_defaults_only_apply_to_present_fields() {
        assert!(schema().resolve(&CommandOptions::new()).is_empty());
    }

    #[test]
    fn test_flags_follow_record_order() {
        let options = CommandOptions::new()
            .with("labels", vec!["app=web".to_string(), "tier=fe".to_string()])
            .with("name", "web");

        assert_eq!(
            schema().resolve(&options),
            vec!["--selector=app=web,tier=fe", "--name=web"]
        );
    }

    #[test]
    fn test_simple_values_are_stringified() {
        let schema = OptionSchema::new()
            .simple("dry_run", "dry-run")
            .simple("verbosity", "v");
        let options = CommandOptions::new()
            .with("dry_run", false)
            .with("verbosity", 6i64);

        assert_eq!(schema.resolve(&options), vec!["--dry-run=false", "--v=6"]);
    }

    #[test]
    fn test_extend_overrides_existing_field() {
        let base = OptionSchema::new().simple("format", "format");
        let layered = OptionSchema::new().simple("format", "output");
        let schema = base.extend(&layered);

        assert_eq!(schema.len(), 1);
        assert_eq!(schema.get("format").map(OptionDescriptor::flag), Some("output"));
    }

    #[test]
    #[should_panic(expected = "non-empty flag")]
    fn test_empty_flag_panics() {
        let _ = OptionSchema::new().simple("name", "");
    }

    #[test]
    #[should_panic(expected = "leading dashes")]
    fn test_dashed_flag_panics() {
        let _ = OptionSchema::new().simple("name", "--name");
    }

    #[test]
    fn test_transforms() {
        assert_eq!(negated(&OptionValue::Bool(true)), "false");
        assert_eq!(seconds(&OptionValue::Number(0)), "0s");
        assert_eq!(comma_delimited(&OptionValue::from("a")), "a");
        assert_eq!(
            comma_delimited(&OptionValue::List(vec!["a".into(), "b".into()])),
            "a,b"
        );
    }

    #[test]
    fn test_value_helpers() {
        assert_eq!(OptionValue::string(Some("  ")), None);
        assert_eq!(OptionValue::list(&[]), None);
        assert_eq!(OptionValue::flag(false), None);
        assert_eq!(OptionValue::flag(true), Some(OptionValue::Bool(true)));
    }

    #[test]
    fn test_list_drops_blank_entries() {
        assert_eq!(OptionValue::list(&["".to_string(), "  ".to_string()]), None);
        assert_eq!(
            OptionValue::list(&["a.yaml".to_string(), " ".to_string(), "b.yaml".to_string()]),
            Some(OptionValue::List(vec!["a.yaml".into(), "b.yaml".into()]))
        );
    }

    #[test]
    fn test_duration_rendering() {
        let render = |d| seconds(&OptionValue::duration(d));
        assert_eq!(render(Duration::from_secs(90)), "90s");
        assert_eq!(render(Duration::ZERO), "0s");
        assert_eq!(render(Duration::from_millis(500)), "500ms");
        assert_eq!(render(Duration::from_millis(1500)), "1500ms");
        assert_eq!(render(Duration::from_micros(1)), "1ms");
    }

    #[test]
    fn test_shared_schemas_compose() {
        assert!(UPDATE_FROM_MANIFEST_OPTIONS.contains("dry_run"));
        assert!(UPDATE_FROM_MANIFEST_OPTIONS.contains("files"));
        assert!(UPDATE_FROM_MANIFEST_OPTIONS.contains("validate"));
        assert!(!UPDATE_FROM_MANIFEST_OPTIONS.contains("label_selector"));
        assert_eq!(GLOBAL_OPTIONS.get("verbosity").map(OptionDescriptor::flag), Some("v"));
    }
}
