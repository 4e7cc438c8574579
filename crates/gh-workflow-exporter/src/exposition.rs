//! Prometheus text exposition (format 0.0.4) of a scrape cycle

use std::time::Duration;

use chrono::{DateTime, Utc};
use gh_workflow_config::property_label_name;
use gh_workflow_metrics::{CycleReport, PropertyLabels, RunLabels};

pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

const REPOSITORY_INFO: &str = "github_repository_info";
const WORKFLOW_INFO: &str = "github_workflow_info";
const RUN_RUNNING: &str = "github_workflow_run_running";
const RUN_RUNNING_START: &str = "github_workflow_run_running_start_time_seconds";
const LATEST_RUN: &str = "github_workflow_latest_run";
const LATEST_RUN_START: &str = "github_workflow_latest_run_start_time_seconds";
const LATEST_RUN_DURATION: &str = "github_workflow_latest_run_duration_seconds";
const CONSECUTIVE_FAILED_RUNS: &str = "github_workflow_consecutive_failed_runs";
const LAST_SUCCESS: &str = "github_workflow_exporter_last_success_timestamp_seconds";
const SCRAPE_DURATION: &str = "github_workflow_exporter_scrape_duration_seconds";

type Labels = Vec<(String, String)>;

/// Outcome of the cycle a snapshot was rendered from
#[derive(Debug, Clone, Copy)]
pub struct CycleStatus {
    pub finished_at: DateTime<Utc>,
    pub duration: Duration,
}

/// Render a complete snapshot: all series of `report` plus exporter self metrics
pub fn render(report: &CycleReport, status: &CycleStatus) -> String {
    let mut out = String::new();

    write_family(
        &mut out,
        REPOSITORY_INFO,
        "GitHub repository info",
        report.repositories.iter().map(|r| {
            let mut labels = vec![
                label("org", &r.org),
                label("repo", &r.repo),
                label("defaultBranch", &r.default_branch),
            ];
            push_properties(&mut labels, &r.properties);
            (labels, 1.0)
        }),
    );

    write_family(
        &mut out,
        WORKFLOW_INFO,
        "GitHub workflow info",
        report.workflows.iter().map(|w| {
            let mut labels = vec![
                label("org", &w.org),
                label("repo", &w.repo),
                label("workflowID", w.workflow_id),
                label("workflow", &w.workflow),
                label("workflowUrl", &w.workflow_url),
                label("state", &w.state),
                label("path", &w.path),
            ];
            push_properties(&mut labels, &w.properties);
            (labels, 1.0)
        }),
    );

    write_family(
        &mut out,
        RUN_RUNNING,
        "GitHub workflow runs currently running",
        report.running.iter().map(|r| {
            let labels = vec![
                label("org", &r.run.org),
                label("repo", &r.run.repo),
                label("workflowID", r.run.workflow_id),
                label("workflowRunNumber", r.run.run_number),
                label("workflow", &r.run.workflow),
                label("workflowUrl", &r.run.workflow_url),
                label("workflowRun", &r.run.run_name),
                label("workflowRunUrl", &r.run.run_url),
                label("event", &r.event),
                label("branch", &r.run.branch),
                label("status", &r.status),
                label("actorLogin", &r.run.actor_login),
                label("actorType", &r.run.actor_type),
            ];
            (labels, 1.0)
        }),
    );

    write_family(
        &mut out,
        RUN_RUNNING_START,
        "Start time of running GitHub workflow runs in unix epoch seconds",
        report
            .running
            .iter()
            .map(|r| (stat_labels(&r.run), epoch_seconds(&r.started_at))),
    );

    write_family(
        &mut out,
        LATEST_RUN,
        "Latest finished GitHub workflow run",
        report.latest.iter().map(|r| {
            let labels = vec![
                label("org", &r.run.org),
                label("repo", &r.run.repo),
                label("workflowID", r.run.workflow_id),
                label("workflowRunNumber", r.run.run_number),
                label("workflow", &r.run.workflow),
                label("workflowUrl", &r.run.workflow_url),
                label("workflowRun", &r.run.run_name),
                label("workflowRunUrl", &r.run.run_url),
                label("event", &r.event),
                label("branch", &r.run.branch),
                label("conclusion", &r.conclusion),
                label("actorLogin", &r.run.actor_login),
                label("actorType", &r.run.actor_type),
            ];
            (labels, 1.0)
        }),
    );

    write_family(
        &mut out,
        LATEST_RUN_START,
        "Start time of the latest finished GitHub workflow run in unix epoch seconds",
        report
            .latest
            .iter()
            .map(|r| (stat_labels(&r.run), epoch_seconds(&r.started_at))),
    );

    write_family(
        &mut out,
        LATEST_RUN_DURATION,
        "Duration of the latest finished GitHub workflow run in seconds",
        report
            .latest
            .iter()
            .map(|r| (stat_labels(&r.run), r.duration_seconds)),
    );

    write_family(
        &mut out,
        CONSECUTIVE_FAILED_RUNS,
        "Consecutive failed GitHub workflow runs since the last success",
        report.consecutive_failures.iter().map(|f| {
            let labels = vec![
                label("org", &f.run.org),
                label("repo", &f.run.repo),
                label("workflowID", f.run.workflow_id),
                label("workflowRunNumber", f.run.run_number),
                label("workflow", &f.run.workflow),
                label("workflowUrl", &f.run.workflow_url),
                label("workflowRun", &f.run.run_name),
                label("workflowRunUrl", &f.run.run_url),
                label("branch", &f.run.branch),
                label("actorLogin", &f.run.actor_login),
                label("actorType", &f.run.actor_type),
            ];
            (labels, f.count as f64)
        }),
    );

    write_family(
        &mut out,
        LAST_SUCCESS,
        "Unix time of the last successful scrape cycle",
        [(Labels::new(), epoch_seconds(&status.finished_at))],
    );

    write_family(
        &mut out,
        SCRAPE_DURATION,
        "Duration of the last successful scrape cycle in seconds",
        [(Labels::new(), status.duration.as_secs_f64())],
    );

    out
}

fn label(name: &str, value: impl ToString) -> (String, String) {
    (name.to_string(), value.to_string())
}

/// Labels shared by the numeric run series
fn stat_labels(run: &RunLabels) -> Labels {
    vec![
        label("org", &run.org),
        label("repo", &run.repo),
        label("workflowID", run.workflow_id),
        label("workflowRunNumber", run.run_number),
    ]
}

fn push_properties(labels: &mut Labels, properties: &PropertyLabels) {
    for (name, value) in properties.iter() {
        labels.push((property_label_name(name), value.to_string()));
    }
}

fn epoch_seconds(time: &DateTime<Utc>) -> f64 {
    time.timestamp_millis() as f64 / 1000.0
}

/// Write HELP, TYPE and all samples of a gauge family; families without
/// samples are left out entirely
fn write_family<I>(out: &mut String, name: &str, help: &str, samples: I)
where
    I: IntoIterator<Item = (Labels, f64)>,
{
    let mut samples = samples.into_iter().peekable();
    if samples.peek().is_none() {
        return;
    }

    out.push_str(&format!("# HELP {} {}\n", name, help));
    out.push_str(&format!("# TYPE {} gauge\n", name));
    for (labels, value) in samples {
        out.push_str(name);
        if !labels.is_empty() {
            let rendered: Vec<String> = labels
                .iter()
                .map(|(k, v)| format!("{}=\"{}\"", k, escape_label_value(v)))
                .collect();
            out.push('{');
            out.push_str(&rendered.join(","));
            out.push('}');
        }
        out.push_str(&format!(" {}\n", value));
    }
}

fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            c => escaped.push(c),
        }
    }
    escaped
}
