use std::fmt::Write as _;
use std::time::Duration;

use action_flow::{ItemOutcome, RunSummary, StopReason};
use anyhow::Result;
use clap::ValueEnum;
use wd_adapter::metrics::WebDriverMetricsSnapshot;

#[derive(Clone, Debug, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    Yaml,
}

fn stop_reason_text(reason: StopReason) -> &'static str {
    match reason {
        StopReason::Exhausted => "all assignments processed",
        StopReason::NoItems => "no assignments found",
        StopReason::MaxItems => "item limit reached",
        StopReason::PageNotReady => "page did not finish loading",
    }
}

/// Rounds to whole seconds so `format_duration` stays readable.
fn human_duration(ms: u64) -> String {
    humantime::format_duration(Duration::from_secs(ms / 1000)).to_string()
}

pub fn render_summary(summary: &RunSummary, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(summary)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(summary)?),
        OutputFormat::Human => {
            let elapsed = (summary.finished_at - summary.started_at)
                .num_milliseconds()
                .max(0) as u64;
            let mut out = String::new();
            writeln!(
                out,
                "Run {} finished: {} ({})",
                summary.run_id,
                stop_reason_text(summary.stop_reason),
                human_duration(elapsed)
            )?;
            writeln!(out, "Succeeded: {}", summary.tally.succeeded)?;
            writeln!(out, "Failed:    {}", summary.tally.failed)?;
            for report in &summary.reports {
                let status = match &report.outcome {
                    ItemOutcome::Done => "done".to_string(),
                    ItemOutcome::Failed {
                        stage,
                        reason,
                        skipped: true,
                    } => format!("skipped at {}: {}", stage, reason),
                    ItemOutcome::Failed { stage, reason, .. } => {
                        format!("failed at {}: {}", stage, reason)
                    }
                };
                writeln!(
                    out,
                    "  #{} {} - {} ({})",
                    report.index + 1,
                    report.name,
                    status,
                    human_duration(report.duration_ms)
                )?;
            }
            Ok(out)
        }
    }
}

/// One-paragraph account of the WebDriver traffic behind a run.
pub fn render_traffic(traffic: &WebDriverMetricsSnapshot) -> String {
    let mut out = format!(
        "WebDriver: {} commands, {} ok, {} misses while polling, {} hard failures",
        traffic.commands, traffic.succeeded, traffic.transient_failures, traffic.hard_failures
    );
    if let Some(mean) = traffic.mean_latency() {
        out.push_str(&format!(", mean round trip {}ms", mean.as_millis()));
    }
    if !traffic.failures_by_kind.is_empty() {
        let kinds: Vec<String> = traffic
            .failures_by_kind
            .iter()
            .map(|(kind, count)| format!("{}={}", kind.as_str(), count))
            .collect();
        out.push_str(&format!("\n  failures by kind: {}", kinds.join(" ")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_flow::{ItemReport, RunTally, WorkflowStage};
    use chrono::{TimeZone, Utc};
    use wd_adapter::AdapterErrorKind;

    fn summary() -> RunSummary {
        let started_at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let finished_at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 2, 5).unwrap();
        RunSummary {
            run_id: "run-1".into(),
            started_at,
            finished_at,
            stop_reason: StopReason::Exhausted,
            tally: RunTally {
                succeeded: 1,
                failed: 1,
            },
            reports: vec![
                ItemReport {
                    index: 0,
                    name: "Chapter 1 Quiz".into(),
                    outcome: ItemOutcome::Done,
                    trace: vec![WorkflowStage::Located, WorkflowStage::Done],
                    started_at,
                    duration_ms: 61_400,
                },
                ItemReport {
                    index: 1,
                    name: "Chapter 2 Quiz".into(),
                    outcome: ItemOutcome::Failed {
                        stage: WorkflowStage::AttemptCheck,
                        reason: "prior attempt in progress".into(),
                        skipped: true,
                    },
                    trace: vec![WorkflowStage::AttemptCheck, WorkflowStage::Failed],
                    started_at,
                    duration_ms: 3_000,
                },
            ],
        }
    }

    #[test]
    fn human_summary_lists_each_item() {
        let text = render_summary(&summary(), &OutputFormat::Human).unwrap();
        assert!(text.starts_with("Run run-1 finished: all assignments processed (2m 5s)"));
        assert!(text.contains("Succeeded: 1"));
        assert!(text.contains("#1 Chapter 1 Quiz - done (1m 1s)"));
        assert!(text.contains("#2 Chapter 2 Quiz - skipped at attempt_check: prior attempt in progress (3s)"));
    }

    #[test]
    fn json_summary_is_machine_readable() {
        let text = render_summary(&summary(), &OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["stop_reason"], "exhausted");
        assert_eq!(value["reports"][1]["outcome"]["status"], "failed");
        assert_eq!(value["reports"][1]["outcome"]["stage"], "attempt_check");
    }

    #[test]
    fn traffic_lists_failure_kinds() {
        let traffic = WebDriverMetricsSnapshot {
            sessions: 1,
            commands: 40,
            succeeded: 30,
            transient_failures: 9,
            hard_failures: 1,
            latency_total_us: 60_000,
            failures_by_kind: vec![
                (AdapterErrorKind::NoSuchElement, 9),
                (AdapterErrorKind::ClickIntercepted, 1),
            ],
        };
        let text = render_traffic(&traffic);
        assert!(text.starts_with(
            "WebDriver: 40 commands, 30 ok, 9 misses while polling, 1 hard failures, mean round trip 2ms"
        ));
        assert!(text.ends_with("failures by kind: no_such_element=9 click_intercepted=1"));
    }

    #[test]
    fn quiet_traffic_has_no_kind_line() {
        let text = render_traffic(&WebDriverMetricsSnapshot::default());
        assert_eq!(text, "WebDriver: 0 commands, 0 ok, 0 misses while polling, 0 hard failures");
    }
}
