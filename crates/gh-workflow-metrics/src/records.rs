//! Structured metric records
//!
//! One record type per exported series family. Records carry named fields
//! only; turning them into label sets is left to the exposition layer.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use gh_client::{Repository, Workflow, WorkflowRun};

/// Label value used when a run references a workflow that was not listed
pub const LABEL_VALUE_UNKNOWN: &str = "<unknown>";

/// Configured custom properties of a repository, in configuration order
///
/// Properties the repository does not set have an empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyLabels(pub Vec<(String, String)>);

impl PropertyLabels {
    /// Pick the configured `names` from the repository's custom properties
    pub fn for_repository(repo: &Repository, names: &[String]) -> Self {
        Self(
            names
                .iter()
                .map(|name| {
                    let value = repo.custom_properties.get(name).cloned().unwrap_or_default();
                    (name.clone(), value)
                })
                .collect(),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// `github_repository_info`
#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryInfo {
    pub org: String,
    pub repo: String,
    pub default_branch: String,
    pub properties: PropertyLabels,
}

/// `github_workflow_info`
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowInfo {
    pub org: String,
    pub repo: String,
    pub workflow_id: u64,
    pub workflow: String,
    pub workflow_url: String,
    pub state: String,
    pub path: String,
    pub properties: PropertyLabels,
}

/// Labels shared by every per-run series
#[derive(Debug, Clone, PartialEq)]
pub struct RunLabels {
    pub org: String,
    pub repo: String,
    pub workflow_id: u64,
    pub run_number: u64,
    pub workflow: String,
    pub workflow_url: String,
    pub run_name: String,
    pub run_url: String,
    pub branch: String,
    pub actor_login: String,
    pub actor_type: String,
}

impl RunLabels {
    /// Describe `run`, resolving its workflow name and URL from `workflows`
    pub fn new(org: &str, repo: &str, run: &WorkflowRun, workflows: &BTreeMap<u64, Workflow>) -> Self {
        let (workflow, workflow_url) = match workflows.get(&run.workflow_id) {
            Some(wf) => (wf.name.clone(), wf.html_url.clone()),
            None => (LABEL_VALUE_UNKNOWN.to_string(), String::new()),
        };

        Self {
            org: org.to_string(),
            repo: repo.to_string(),
            workflow_id: run.workflow_id,
            run_number: run.run_number,
            workflow,
            workflow_url,
            run_name: run.name.clone(),
            run_url: run.html_url.clone(),
            branch: run.head_branch.clone(),
            actor_login: run.actor.login.clone(),
            actor_type: run.actor.kind.clone(),
        }
    }
}

/// `github_workflow_run_running` and its start time gauge
#[derive(Debug, Clone, PartialEq)]
pub struct RunningRun {
    pub run: RunLabels,
    pub event: String,
    pub status: String,
    pub started_at: DateTime<Utc>,
}

/// `github_workflow_latest_run` with start time and duration gauges
#[derive(Debug, Clone, PartialEq)]
pub struct LatestRun {
    pub run: RunLabels,
    pub event: String,
    pub conclusion: String,
    pub started_at: DateTime<Utc>,
    pub duration_seconds: f64,
}

/// `github_workflow_consecutive_failed_runs`
#[derive(Debug, Clone, PartialEq)]
pub struct ConsecutiveFailures {
    pub run: RunLabels,
    pub count: u64,
}

/// Everything one scrape cycle produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    pub repositories: Vec<RepositoryInfo>,
    pub workflows: Vec<WorkflowInfo>,
    pub running: Vec<RunningRun>,
    pub latest: Vec<LatestRun>,
    pub consecutive_failures: Vec<ConsecutiveFailures>,
}

impl CycleReport {
    /// Number of records across all families
    pub fn record_count(&self) -> usize {
        self.repositories.len()
            + self.workflows.len()
            + self.running.len()
            + self.latest.len()
            + self.consecutive_failures.len()
    }
}

/// Start of a run: `run_started_at`, or creation time when not reported
pub fn run_start(run: &WorkflowRun) -> DateTime<Utc> {
    run.run_started_at.unwrap_or(run.created_at)
}

/// Seconds between creation and last update of a run
pub fn run_duration_seconds(run: &WorkflowRun) -> f64 {
    (run.updated_at - run.created_at).num_milliseconds() as f64 / 1000.0
}
