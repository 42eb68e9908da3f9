//! Integration tests for CLI commands
//!
//! Commands run against a fake `kubectl` shell script that records its
//! arguments and answers with canned output.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::OnceLock;
use tempfile::TempDir;

const FAKE_KUBECTL: &str = r#"#!/bin/sh
printf '%s\n' "$*" >> "$FAKE_KUBECTL_LOG"
for arg in "$@"; do
  case "$arg" in
    -*) ;;
    *) sub="$arg"; break ;;
  esac
done
case "$sub" in
  apply)
    printf 'deployment.apps/web configured\nservice/web unchanged\nmalformed line here\n'
    ;;
  wait)
    echo "error: timed out waiting for the condition on deployments/web" >&2
    exit 1
    ;;
  get)
    echo '{"apiVersion":"v1","kind":"List","items":[]}'
    ;;
  create)
    echo 'Error from server (AlreadyExists): namespaces "flux" already exists' >&2
    exit 1
    ;;
esac
"#;

/// Write the fake kubectl once, before any test spawns a process
fn fake_kubectl() -> &'static Path {
    static SCRIPT: OnceLock<PathBuf> = OnceLock::new();
    SCRIPT.get_or_init(|| {
        let path = Path::new(env!("CARGO_TARGET_TMPDIR")).join("fake-kubectl");
        fs::write(&path, FAKE_KUBECTL).expect("Failed to write fake kubectl");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("Failed to make fake kubectl executable");
        path
    })
}

/// A scratch directory with a config file and a call log
struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self::with_config("context: kind-test\n")
    }

    fn with_config(config: &str) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        fs::write(dir.path().join("config.yaml"), config).expect("Failed to write config");
        Self { dir }
    }

    fn log_path(&self) -> PathBuf {
        self.dir.path().join("calls.log")
    }

    fn cforge_with(&self, kubectl: &Path, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_cforge"))
            .arg("--kubectl")
            .arg(kubectl)
            .arg("--config")
            .arg(self.dir.path().join("config.yaml"))
            .args(args)
            .env("FAKE_KUBECTL_LOG", self.log_path())
            .env_remove("CFORGE_KUBECTL")
            .env_remove("CFORGE_CONFIG")
            .env_remove("CFORGE_CLUSTER")
            .env_remove("CFORGE_CONTEXT")
            .env_remove("DEBUG")
            .output()
            .expect("Failed to execute cforge")
    }

    fn cforge(&self, args: &[&str]) -> Output {
        self.cforge_with(fake_kubectl(), args)
    }

    /// Argument lines recorded by the fake kubectl
    fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.log_path())
            .map(|log| log.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

mod apply_command {
    use super::*;

    #[test]
    fn test_apply_prints_summary() {
        let ws = Workspace::new();
        let output = ws.cforge(&["apply", "-f", "web.yaml"]);

        assert!(output.status.success(), "Expected success for apply");
        assert!(stdout(&output).contains("configured: 1, unchanged: 1"));
        assert_eq!(ws.calls(), vec!["--context=kind-test apply --filename=web.yaml"]);
    }

    #[test]
    fn test_apply_json_output() {
        let ws = Workspace::new();
        let output = ws.cforge(&["apply", "-k", "overlays/dev", "--json"]);

        let json: serde_json::Value =
            serde_json::from_str(&stdout(&output)).expect("Output should be valid JSON");
        assert_eq!(json["resourcesByStatus"]["configured"][0]["kind"], "deployment.apps");
        assert_eq!(json["resourcesByStatus"]["unchanged"][0]["name"], "web");
        assert_eq!(json["unparseableLines"][0], "malformed line here");
        assert_eq!(ws.calls(), vec!["--context=kind-test apply --kustomize=overlays/dev"]);
    }

    #[test]
    fn test_apply_without_input_is_a_validation_error() {
        let ws = Workspace::new();
        let output = ws.cforge(&["apply"]);

        assert_eq!(output.status.code(), Some(2));
        assert!(ws.calls().is_empty());
    }
}

mod wait_command {
    use super::*;

    #[test]
    fn test_wait_timeout_exit_code() {
        let ws = Workspace::new();
        let output = ws.cforge(&["wait", "deployment/web", "-n", "apps", "--timeout", "5"]);

        assert_eq!(output.status.code(), Some(4));
        assert_eq!(
            ws.calls(),
            vec!["--context=kind-test wait deployment/web --namespace=apps --timeout=5s --for=condition=available"]
        );
    }

    #[test]
    fn test_wait_files_and_target_conflict() {
        let ws = Workspace::new();
        let output = ws.cforge(&["wait", "deployment/web", "-f", "web.yaml"]);

        assert_eq!(output.status.code(), Some(2));
        assert!(ws.calls().is_empty());
    }

    #[test]
    fn test_wait_rejects_malformed_condition() {
        let ws = Workspace::new();
        let output = ws.cforge(&["wait", "deployment/web", "--for", "bogus"]);

        assert_eq!(output.status.code(), Some(2));
        assert!(ws.calls().is_empty());
    }
}

mod deploy_command {
    use super::*;

    #[test]
    fn test_first_failed_wait_stops_deploy() {
        let ws = Workspace::new();
        let output = ws.cforge(&[
            "deploy",
            "flux.yaml",
            "--wait",
            "deployment/flux",
            "--wait",
            "deployment/memcached",
        ]);

        assert_eq!(output.status.code(), Some(4));
        let calls = ws.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].contains("apply --filename=flux.yaml"));
        assert!(calls[1].contains("wait deployment/flux"));
    }

    #[test]
    fn test_create_failure_is_a_kubectl_error() {
        let ws = Workspace::new();
        let output = ws.cforge(&["deploy", "flux.yaml", "--create"]);

        assert_eq!(output.status.code(), Some(3));
        assert_eq!(ws.calls(), vec!["--context=kind-test create -f flux.yaml"]);
    }

    #[test]
    fn test_bad_wait_spec_is_rejected() {
        let ws = Workspace::new();
        let output = ws.cforge(&["deploy", "flux.yaml", "--wait-selector", "deployment"]);

        assert_eq!(output.status.code(), Some(2));
        assert!(ws.calls().is_empty());
    }
}

mod query_commands {
    use super::*;

    #[test]
    fn test_get_prints_json() {
        let ws = Workspace::new();
        let output = ws.cforge(&["get", "namespaces"]);

        assert!(output.status.success());
        let json: serde_json::Value =
            serde_json::from_str(&stdout(&output)).expect("Output should be valid JSON");
        assert_eq!(json["items"], serde_json::json!([]));
        assert_eq!(
            ws.calls(),
            vec!["--context=kind-test get namespaces --output=json --chunk-size=0"]
        );
    }

    #[test]
    fn test_events_with_no_results() {
        let ws = Workspace::new();
        let output = ws.cforge(&["events", "Pod", "web-1"]);

        assert!(output.status.success());
        assert!(stdout(&output).contains("No events found"));
    }

    #[test]
    fn test_configured_namespace_is_the_fallback() {
        let ws = Workspace::with_config("context: kind-test\nnamespace: flux-system\n");
        ws.cforge(&["events", "Pod", "web-1"]);
        ws.cforge(&["events", "Pod", "web-1", "-n", "apps"]);

        let calls = ws.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].contains("--namespace=flux-system"));
        assert!(calls[1].contains("--namespace=apps"));
        assert!(!calls[1].contains("flux-system"));
    }
}

mod global_behavior {
    use super::*;

    #[test]
    fn test_missing_kubectl_binary() {
        let ws = Workspace::new();
        let missing = ws.dir.path().join("no-such-kubectl");
        let output = ws.cforge_with(&missing, &["get", "pods"]);

        assert_eq!(output.status.code(), Some(3));
    }

    #[test]
    fn test_unknown_subcommand_is_usage_error() {
        let ws = Workspace::new();
        let output = ws.cforge(&["frobnicate"]);

        assert_eq!(output.status.code(), Some(64));
    }

    #[test]
    fn test_invalid_config_exit_code() {
        let ws = Workspace::with_config("verbosity: 12\n");
        let output = ws.cforge(&["get", "pods"]);

        assert_eq!(output.status.code(), Some(5));
        assert!(ws.calls().is_empty());
    }

    #[test]
    fn test_flags_override_config() {
        let ws = Workspace::new();
        ws.cforge(&["--context", "prod", "--request-timeout", "30", "get", "pods"]);

        assert_eq!(
            ws.calls(),
            vec!["--context=prod --request-timeout=30s get pods --output=json --chunk-size=0"]
        );
    }
}
