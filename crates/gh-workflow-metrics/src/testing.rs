//! Test fixtures: an in-memory `GitHubClient` and run builders

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use gh_client::{
    Actor, ClientError, GitHubClient, ListPage, Repository, RunFilter, Workflow, WorkflowRun,
};

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// A run of `workflow_id` created `minute` minutes after a fixed base time
/// and last updated five minutes later
pub(crate) fn run(
    workflow_id: u64,
    run_number: u64,
    status: &str,
    conclusion: &str,
    minute: i64,
) -> WorkflowRun {
    let created_at = base_time() + Duration::minutes(minute);
    WorkflowRun {
        id: workflow_id * 1000 + run_number,
        workflow_id,
        run_number,
        name: format!("run {}", run_number),
        html_url: format!("https://github.com/octo-org/api/actions/runs/{}", run_number),
        event: "push".to_string(),
        head_branch: "main".to_string(),
        actor: Actor {
            login: "octocat".to_string(),
            kind: "User".to_string(),
        },
        status: status.to_string(),
        conclusion: conclusion.to_string(),
        created_at,
        updated_at: created_at + Duration::minutes(5),
        run_started_at: None,
    }
}

pub(crate) fn workflow(id: u64, name: &str) -> Workflow {
    let path = format!(".github/workflows/{}.yml", name.to_lowercase());
    Workflow {
        id,
        name: name.to_string(),
        state: "active".to_string(),
        html_url: format!("https://github.com/octo-org/api/blob/main/{}", path),
        path,
    }
}

pub(crate) fn repository(name: &str, default_branch: &str) -> Repository {
    Repository {
        id: name.len() as u64,
        name: name.to_string(),
        default_branch: default_branch.to_string(),
        ..Default::default()
    }
}

/// In-memory GitHub API serving pre-recorded pages
#[derive(Default)]
pub(crate) struct MockClient {
    repositories: Vec<Vec<Repository>>,
    properties: HashMap<String, HashMap<String, String>>,
    workflows: HashMap<String, Vec<Vec<Workflow>>>,
    runs: HashMap<String, Vec<Vec<WorkflowRun>>>,
    failing: HashSet<String>,
    /// Request key -> seconds from the time of the request until the reset
    rate_limited: Mutex<HashMap<String, i64>>,
    calls: Mutex<Vec<String>>,
    call_times: Mutex<Vec<(String, tokio::time::Instant)>>,
    run_filters: Mutex<Vec<RunFilter>>,
}

impl MockClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_repository_pages(mut self, pages: Vec<Vec<Repository>>) -> Self {
        self.repositories = pages;
        self
    }

    pub(crate) fn with_properties(mut self, repo: &str, props: &[(&str, &str)]) -> Self {
        let props = props
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.properties.insert(repo.to_string(), props);
        self
    }

    pub(crate) fn with_workflow_pages(mut self, repo: &str, pages: Vec<Vec<Workflow>>) -> Self {
        self.workflows.insert(repo.to_string(), pages);
        self
    }

    pub(crate) fn with_run_pages(mut self, repo: &str, pages: Vec<Vec<WorkflowRun>>) -> Self {
        self.runs.insert(repo.to_string(), pages);
        self
    }

    /// Fail the request `key` once with a rate limit error whose reset has passed
    pub(crate) fn rate_limit_once(self, key: &str) -> Self {
        self.rate_limit_for(key, -1)
    }

    /// Fail the request `key` once with a rate limit error resetting
    /// `seconds` after the request
    pub(crate) fn rate_limit_for(self, key: &str, seconds: i64) -> Self {
        self.rate_limited
            .lock()
            .unwrap()
            .insert(key.to_string(), seconds);
        self
    }

    /// Fail every request `key` with a non-retryable error
    pub(crate) fn fail_on(mut self, key: &str) -> Self {
        self.failing.insert(key.to_string());
        self
    }

    /// Request keys in the order they were made
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Tokio clock reading of every request, in request order
    pub(crate) fn call_times(&self) -> Vec<(String, tokio::time::Instant)> {
        self.call_times.lock().unwrap().clone()
    }

    pub(crate) fn run_filters(&self) -> Vec<RunFilter> {
        self.run_filters.lock().unwrap().clone()
    }

    fn check(&self, key: String) -> Result<(), ClientError> {
        self.calls.lock().unwrap().push(key.clone());
        self.call_times
            .lock()
            .unwrap()
            .push((key.clone(), tokio::time::Instant::now()));

        if self.failing.contains(&key) {
            return Err(ClientError::Other(anyhow::anyhow!("request {} failed", key)));
        }
        if let Some(seconds) = self.rate_limited.lock().unwrap().remove(&key) {
            return Err(ClientError::RateLimited {
                reset: Utc::now() + Duration::seconds(seconds),
            });
        }
        Ok(())
    }

    fn serve<T: Clone>(
        &self,
        key: String,
        pages: Option<&Vec<Vec<T>>>,
        page: u32,
    ) -> Result<ListPage<T>, ClientError> {
        self.check(key)?;

        let pages = pages.map(Vec::as_slice).unwrap_or(&[]);
        let index = page as usize - 1;
        let items = pages.get(index).cloned().unwrap_or_default();
        let next_page = (index + 1 < pages.len()).then_some(page + 1);

        Ok(ListPage::new(items, next_page))
    }
}

#[async_trait]
impl GitHubClient for MockClient {
    async fn list_org_repositories(
        &self,
        _org: &str,
        page: u32,
    ) -> Result<ListPage<Repository>, ClientError> {
        self.serve(format!("repos:{}", page), Some(&self.repositories), page)
    }

    async fn fetch_custom_properties(
        &self,
        _owner: &str,
        repo: &str,
    ) -> Result<HashMap<String, String>, ClientError> {
        self.check(format!("properties:{}", repo))?;
        Ok(self.properties.get(repo).cloned().unwrap_or_default())
    }

    async fn list_workflows(
        &self,
        _owner: &str,
        repo: &str,
        page: u32,
    ) -> Result<ListPage<Workflow>, ClientError> {
        self.serve(
            format!("workflows:{}:{}", repo, page),
            self.workflows.get(repo),
            page,
        )
    }

    async fn list_workflow_runs(
        &self,
        _owner: &str,
        repo: &str,
        filter: &RunFilter,
        page: u32,
    ) -> Result<ListPage<WorkflowRun>, ClientError> {
        self.run_filters.lock().unwrap().push(filter.clone());
        self.serve(format!("runs:{}:{}", repo, page), self.runs.get(repo), page)
    }
}
