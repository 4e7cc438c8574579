//! Scrape cycle orchestration
//!
//! Walks every repository of the organization, fetches its workflows and
//! recent runs and reduces them into a `CycleReport`. All state lives in the
//! call; nothing is carried over between cycles.

use std::collections::BTreeMap;
use std::time::Duration;

use gh_client::{GitHubClient, Repository, Workflow, WorkflowRun};
use log::{debug, info};

use crate::classify::running_runs;
use crate::fetcher::{fetch_repositories, fetch_workflow_runs, fetch_workflows, ScrapeError};
use crate::latest::latest_runs;
use crate::records::{
    run_duration_seconds, run_start, ConsecutiveFailures, CycleReport, LatestRun,
    PropertyLabels, RepositoryInfo, RunLabels, RunningRun, WorkflowInfo,
};
use crate::streak::failure_streaks;

/// What to scrape
#[derive(Debug, Clone)]
pub struct WalkSettings {
    /// Organization login
    pub organization: String,
    /// How far back runs are fetched
    pub lookback: Duration,
    /// Custom properties exported as repository and workflow labels
    pub custom_properties: Vec<String>,
}

/// Run one full scrape cycle
///
/// Any fetch error other than rate limiting aborts the cycle; no partial
/// report is returned.
pub async fn collect_cycle(
    client: &dyn GitHubClient,
    settings: &WalkSettings,
) -> Result<CycleReport, ScrapeError> {
    let org = settings.organization.as_str();
    let repositories = fetch_repositories(client, org, &settings.custom_properties).await?;

    let mut report = CycleReport::default();
    for repo in &repositories {
        walk_repository(client, settings, repo, &mut report).await?;
    }

    info!(
        "Collected {} repositories, {} workflows, {} running, {} latest runs for {}",
        report.repositories.len(),
        report.workflows.len(),
        report.running.len(),
        report.latest.len(),
        org
    );
    Ok(report)
}

/// Add the records of one repository to `report`
pub async fn walk_repository(
    client: &dyn GitHubClient,
    settings: &WalkSettings,
    repo: &Repository,
    report: &mut CycleReport,
) -> Result<(), ScrapeError> {
    let org = settings.organization.as_str();

    if repo.archived || repo.disabled {
        debug!("Skipping archived or disabled repository {}/{}", org, repo.name);
        return Ok(());
    }

    let properties = PropertyLabels::for_repository(repo, &settings.custom_properties);
    report.repositories.push(RepositoryInfo {
        org: org.to_string(),
        repo: repo.name.clone(),
        default_branch: repo.default_branch.clone(),
        properties: properties.clone(),
    });

    if repo.default_branch.is_empty() {
        debug!("Repository {}/{} has no default branch", org, repo.name);
        return Ok(());
    }

    let workflows = fetch_workflows(client, org, &repo.name).await?;
    report
        .workflows
        .extend(workflows.values().map(|wf| WorkflowInfo {
            org: org.to_string(),
            repo: repo.name.clone(),
            workflow_id: wf.id,
            workflow: wf.name.clone(),
            workflow_url: wf.html_url.clone(),
            state: wf.state.clone(),
            path: wf.path.clone(),
            properties: properties.clone(),
        }));

    if workflows.is_empty() {
        debug!("Repository {}/{} has no workflows", org, repo.name);
        return Ok(());
    }

    let runs = fetch_workflow_runs(client, org, repo, settings.lookback).await?;
    reduce_runs(org, &repo.name, &workflows, &runs, report);
    Ok(())
}

/// Derive running, latest-run and failure-streak records from the runs of
/// one repository
pub fn reduce_runs(
    org: &str,
    repo: &str,
    workflows: &BTreeMap<u64, Workflow>,
    runs: &[WorkflowRun],
    report: &mut CycleReport,
) {
    let labels = |run: &WorkflowRun| RunLabels::new(org, repo, run, workflows);

    report.running.extend(running_runs(runs).map(|run| RunningRun {
        run: labels(run),
        event: run.event.clone(),
        status: run.status.clone(),
        started_at: run_start(run),
    }));

    report
        .latest
        .extend(latest_runs(runs).into_values().map(|run| LatestRun {
            run: labels(run),
            event: run.event.clone(),
            conclusion: run.conclusion.clone(),
            started_at: run_start(run),
            duration_seconds: run_duration_seconds(run),
        }));

    report.consecutive_failures.extend(
        failure_streaks(runs)
            .into_values()
            .map(|streak| ConsecutiveFailures {
                run: labels(streak.run),
                count: streak.count,
            }),
    );
}
