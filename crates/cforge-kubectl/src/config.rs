//! kubectl connection configuration
//!
//! Stored in `~/.config/cforge/config.yaml`:
//!
//! ```yaml
//! context: staging
//! insecureSkipTlsVerify: false
//! requestTimeout: 30s
//! waitTimeout: 3m
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{KubectlError, Result};
use crate::options::{CommandOptions, GLOBAL_OPTIONS, OptionSchema, OptionValue, TypedOptions};

/// Default binary invoked by the command invoker
pub const DEFAULT_KUBECTL: &str = "kubectl";

/// Settings applied to every kubectl invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KubectlConfig {
    /// The kubeconfig cluster to use
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,

    /// The kubeconfig context to use
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Skip TLS certificate verification
    #[serde(default)]
    pub insecure_skip_tls_verify: bool,

    /// Namespace used when a command does not name one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Per-request timeout passed to kubectl
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<Duration>,

    /// kubectl log verbosity (0-9)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<u8>,

    /// Default timeout for waits
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub wait_timeout: Option<Duration>,
}

impl KubectlConfig {
    /// Load configuration from the default location, or defaults when absent
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// Get default configuration path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| KubectlError::Config("could not determine config directory".into()))?;
        Ok(config_dir.join("cforge").join("config.yaml"))
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if let Some(v) = self.verbosity
            && v > 9
        {
            return Err(KubectlError::Config(format!(
                "verbosity must be between 0 and 9, was {}",
                v
            )));
        }
        Ok(())
    }

    /// Overlay values that are set in `other`
    pub fn merged_with(mut self, other: &KubectlConfig) -> Self {
        if other.cluster.is_some() {
            self.cluster = other.cluster.clone();
        }
        if other.context.is_some() {
            self.context = other.context.clone();
        }
        self.insecure_skip_tls_verify |= other.insecure_skip_tls_verify;
        if other.namespace.is_some() {
            self.namespace = other.namespace.clone();
        }
        if other.request_timeout.is_some() {
            self.request_timeout = other.request_timeout;
        }
        if other.verbosity.is_some() {
            self.verbosity = other.verbosity;
        }
        if other.wait_timeout.is_some() {
            self.wait_timeout = other.wait_timeout;
        }
        self
    }

    /// Flags prepended to every invocation
    pub fn global_flags(&self) -> Vec<String> {
        Self::schema().resolve(&self.to_command_options())
    }
}

impl TypedOptions for KubectlConfig {
    fn schema() -> &'static OptionSchema {
        &GLOBAL_OPTIONS
    }

    // Namespace is per-command and never prepended globally.
    fn to_command_options(&self) -> CommandOptions {
        CommandOptions::new()
            .set(
                "insecure_skip_tls_verify",
                OptionValue::flag(self.insecure_skip_tls_verify),
            )
            .set("context", OptionValue::string(self.context.as_deref()))
            .set("cluster", OptionValue::string(self.cluster.as_deref()))
            .set(
                "request_timeout",
                self.request_timeout.map(OptionValue::duration),
            )
            .set(
                "verbosity",
                self.verbosity.map(|v| OptionValue::Number(i64::from(v))),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_config_has_no_global_flags() {
        assert!(KubectlConfig::default().global_flags().is_empty());
    }

    #[test]
    fn test_global_flags_order() {
        let config = KubectlConfig {
            cluster: Some("prod".into()),
            context: Some("admin@prod".into()),
            insecure_skip_tls_verify: true,
            namespace: Some("ignored".into()),
            request_timeout: Some(Duration::from_secs(30)),
            verbosity: Some(4),
            wait_timeout: None,
        };

        assert_eq!(
            config.global_flags(),
            vec![
                "--insecure-skip-tls-verify=true",
                "--context=admin@prod",
                "--cluster=prod",
                "--request-timeout=30s",
                "--v=4",
            ]
        );
    }

    #[test]
    fn test_sub_second_request_timeout() {
        let config = KubectlConfig {
            request_timeout: Some(Duration::from_millis(500)),
            ..Default::default()
        };
        assert_eq!(config.global_flags(), vec!["--request-timeout=500ms"]);
    }

    #[test]
    fn test_blank_context_is_skipped() {
        let config = KubectlConfig {
            context: Some("  ".into()),
            ..Default::default()
        };
        assert!(config.global_flags().is_empty());
    }

    #[test]
    fn test_load_yaml_with_durations() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "context: staging\ninsecureSkipTlsVerify: true\nrequestTimeout: 30s\nwaitTimeout: 3m\n",
        )
        .unwrap();

        let config = KubectlConfig::load_from(&path).unwrap();
        assert_eq!(config.context.as_deref(), Some("staging"));
        assert!(config.insecure_skip_tls_verify);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.wait_timeout, Some(Duration::from_secs(180)));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        let config = KubectlConfig {
            cluster: Some("kind".into()),
            wait_timeout: Some(Duration::from_secs(90)),
            ..Default::default()
        };

        config.save_to(&path).unwrap();
        assert_eq!(KubectlConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_verbosity_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "verbosity: 12\n").unwrap();

        let err = KubectlConfig::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("verbosity"));
    }

    #[test]
    fn test_merge_prefers_overrides() {
        let file = KubectlConfig {
            context: Some("file".into()),
            cluster: Some("file-cluster".into()),
            ..Default::default()
        };
        let flags = KubectlConfig {
            context: Some("flag".into()),
            verbosity: Some(2),
            ..Default::default()
        };

        let merged = file.merged_with(&flags);
        assert_eq!(merged.context.as_deref(), Some("flag"));
        assert_eq!(merged.cluster.as_deref(), Some("file-cluster"));
        assert_eq!(merged.verbosity, Some(2));
    }
}
