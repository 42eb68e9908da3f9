//! Display formatting for CLI output
//!
//! Provides structured display for:
//! - Apply outcomes grouped by status
//! - Wait outcomes
//! - Pods and events returned by queries

use cforge_kubectl::{ApplyOutcome, WaitOutcome};
use console::style;
use k8s_openapi::api::core::v1::{Event, Pod};

/// Apply outcome, one line per resource under its status
pub fn format_apply_outcome(outcome: &ApplyOutcome) -> String {
    let mut lines = Vec::new();
    for (status, resources) in &outcome.resources_by_status {
        let status_style = match status.as_str() {
            "created" => style(status.as_str()).green(),
            "configured" => style(status.as_str()).yellow(),
            "unchanged" => style(status.as_str()).dim(),
            _ => style(status.as_str()).cyan(),
        };
        lines.push(format!("{} ({})", status_style.bold(), resources.len()));
        for resource in resources {
            lines.push(format!(
                "  {} {}/{}",
                style("→").blue(),
                resource.kind,
                style(&resource.name).cyan()
            ));
        }
    }
    if !outcome.unparseable_lines.is_empty() {
        lines.push(format!("{}", style("unrecognized output").yellow().bold()));
        for line in &outcome.unparseable_lines {
            lines.push(format!("  {} {}", style("⚠").yellow(), line));
        }
    }
    lines.push(format!(
        "{} Applied {} resource(s): {}",
        style("✓").green().bold(),
        outcome.total(),
        outcome.summary()
    ));
    lines.join("\n")
}

/// One-line wait outcome
pub fn format_wait_outcome(outcome: &WaitOutcome) -> String {
    match outcome {
        WaitOutcome::Succeeded(target) => format!(
            "{} {} met {}",
            style("✓").green().bold(),
            target,
            style(&target.wait_for).cyan()
        ),
        WaitOutcome::TimedOut(target) => format!(
            "{} Timed out after {:?} waiting for {}",
            style("✗").red().bold(),
            target.timeout,
            target
        ),
        WaitOutcome::Failed { target, message } => format!(
            "{} Failed waiting for {}: {}",
            style("✗").red().bold(),
            target,
            message.trim()
        ),
    }
}

/// Pod name, phase and restart count
pub fn format_pods(pods: &[Pod]) -> String {
    if pods.is_empty() {
        return format!("{}", style("No pods found").dim());
    }
    pods.iter()
        .map(|pod| {
            let name = pod.metadata.name.as_deref().unwrap_or("<unnamed>");
            let status = pod.status.as_ref();
            let phase = status
                .and_then(|s| s.phase.as_deref())
                .unwrap_or("Unknown");
            let restarts: i32 = status
                .and_then(|s| s.container_statuses.as_ref())
                .map(|cs| cs.iter().map(|c| c.restart_count).sum())
                .unwrap_or(0);
            let phase_style = match phase {
                "Running" | "Succeeded" => style(phase).green(),
                "Pending" => style(phase).yellow(),
                "Failed" => style(phase).red(),
                _ => style(phase).dim(),
            };
            format!(
                "{}  {}  restarts: {}",
                style(name).cyan(),
                phase_style,
                restarts
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `[reason]: message`, one event per line
pub fn format_events(events: &[Event]) -> String {
    if events.is_empty() {
        return format!("{}", style("No events found").dim());
    }
    events
        .iter()
        .map(|event| {
            format!(
                "[{}]: {}",
                style(event.reason.as_deref().unwrap_or("No Reason")).yellow(),
                event.message.as_deref().unwrap_or("No Message")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use cforge_kubectl::WaitOptions;
    use std::time::Duration;

    #[test]
    fn test_apply_outcome_display() {
        console::set_colors_enabled(false);
        let outcome = ApplyOutcome::parse(
            "deployment.apps/web configured\nservice/web unchanged\nmalformed line here",
            "",
        );

        insta::assert_snapshot!(format_apply_outcome(&outcome), @r"
        configured (1)
          → deployment.apps/web
        unchanged (1)
          → service/web
        unrecognized output
          ⚠ malformed line here
        ✓ Applied 2 resource(s): configured: 1, unchanged: 1
        ");
    }

    #[test]
    fn test_wait_outcome_display() {
        console::set_colors_enabled(false);
        let target = WaitOptions::named("deployment", "web")
            .in_namespace("apps")
            .with_timeout(Duration::from_secs(90))
            .validate()
            .unwrap();

        assert_eq!(
            format_wait_outcome(&WaitOutcome::Succeeded(target.clone())),
            "✓ deployment/web in namespace \"apps\" met condition=available"
        );
        assert_eq!(
            format_wait_outcome(&WaitOutcome::TimedOut(target)),
            "✗ Timed out after 90s waiting for deployment/web in namespace \"apps\""
        );
    }

    #[test]
    fn test_empty_queries() {
        console::set_colors_enabled(false);
        assert_eq!(format_pods(&[]), "No pods found");
        assert_eq!(format_events(&[]), "No events found");
    }
}
