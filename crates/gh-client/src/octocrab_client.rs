//! Octocrab-based GitHub API client
//!
//! Direct implementation of the `GitHubClient` trait using the octocrab library.
//! Responses are deserialized into private wire types and converted into the
//! crate's own DTOs.

use crate::client::GitHubClient;
use crate::error::ClientError;
use crate::types::{
    Actor, ListPage, Repository, RunFilter, Workflow, WorkflowRun, PER_PAGE,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use octocrab::{Octocrab, Page};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Direct GitHub API client using octocrab
#[derive(Debug, Clone)]
pub struct OctocrabClient {
    octocrab: Arc<Octocrab>,
}

impl OctocrabClient {
    /// Create a new client with the given octocrab instance
    pub fn new(octocrab: Arc<Octocrab>) -> Self {
        Self { octocrab }
    }

    /// Check that the organization exists and is visible with the current credentials
    pub async fn verify_organization(&self, org: &str) -> Result<(), ClientError> {
        debug!("Verifying access to organization {}", org);
        match self.octocrab.orgs(org).get().await {
            Ok(_) => Ok(()),
            Err(err) => Err(self.classify_error(err).await),
        }
    }

    /// GET a paginated list endpoint
    async fn get_page<T, P>(&self, route: String, params: &P) -> Result<Page<T>, ClientError>
    where
        T: DeserializeOwned,
        P: Serialize + Sync,
    {
        match self.octocrab.get::<Page<T>, _, _>(route, Some(params)).await {
            Ok(page) => Ok(page),
            Err(err) => Err(self.classify_error(err).await),
        }
    }

    /// Turn an octocrab error into a `ClientError`
    ///
    /// A 403/429 response only counts as rate limiting when the core quota
    /// is actually exhausted; the reset time is read from `/rate_limit`,
    /// which does not count against the quota.
    async fn classify_error(&self, err: octocrab::Error) -> ClientError {
        let status = match &err {
            octocrab::Error::GitHub { source, .. } => source.status_code.as_u16(),
            _ => return ClientError::Api(err),
        };

        if !is_rate_limit_status(status) {
            return ClientError::Api(err);
        }

        match self.octocrab.ratelimit().get().await {
            Ok(limits) if limits.resources.core.remaining == 0 => ClientError::RateLimited {
                reset: reset_time(limits.resources.core.reset),
            },
            Ok(_) => ClientError::Api(err),
            Err(lookup_err) => {
                debug!("Failed to look up rate limit status: {}", lookup_err);
                ClientError::Api(err)
            }
        }
    }
}

#[async_trait]
impl GitHubClient for OctocrabClient {
    async fn list_org_repositories(
        &self,
        org: &str,
        page: u32,
    ) -> Result<ListPage<Repository>, ClientError> {
        debug!("Fetching repositories of {} (page {})", org, page);

        let route = format!("/orgs/{}/repos", org);
        let params = PageParams::new(page);
        let result: Page<RawRepository> = self.get_page(route, &params).await?;

        let next_page = next_page_number(result.next.as_ref().and_then(|uri| uri.query()));
        let repos = result.items.into_iter().map(convert_repository).collect();

        Ok(ListPage::new(repos, next_page))
    }

    async fn fetch_custom_properties(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<HashMap<String, String>, ClientError> {
        debug!("Fetching custom properties for {}/{}", owner, repo);

        let route = format!("/repos/{}/{}/properties/values", owner, repo);
        let values: Vec<RawPropertyValue> = match self.octocrab.get(route, None::<&()>).await {
            Ok(values) => values,
            Err(err) => return Err(self.classify_error(err).await),
        };

        Ok(values
            .into_iter()
            .map(|prop| (prop.property_name, flatten_property_value(&prop.value)))
            .collect())
    }

    async fn list_workflows(
        &self,
        owner: &str,
        repo: &str,
        page: u32,
    ) -> Result<ListPage<Workflow>, ClientError> {
        debug!("Fetching workflows for {}/{} (page {})", owner, repo, page);

        let route = format!("/repos/{}/{}/actions/workflows", owner, repo);
        let params = PageParams::new(page);
        let result: Page<RawWorkflow> = self.get_page(route, &params).await?;

        let next_page = next_page_number(result.next.as_ref().and_then(|uri| uri.query()));
        let workflows = result.items.into_iter().map(convert_workflow).collect();

        Ok(ListPage::new(workflows, next_page))
    }

    async fn list_workflow_runs(
        &self,
        owner: &str,
        repo: &str,
        filter: &RunFilter,
        page: u32,
    ) -> Result<ListPage<WorkflowRun>, ClientError> {
        debug!(
            "Fetching workflow runs for {}/{} on {} (page {})",
            owner, repo, filter.branch, page
        );

        let route = format!("/repos/{}/{}/actions/runs", owner, repo);
        let params = RunParams {
            branch: &filter.branch,
            created: filter.created_query(),
            exclude_pull_requests: filter.exclude_pull_requests,
            per_page: PER_PAGE,
            page,
        };
        let result: Page<RawWorkflowRun> = self.get_page(route, &params).await?;

        let next_page = next_page_number(result.next.as_ref().and_then(|uri| uri.query()));
        let runs = result.items.into_iter().map(convert_workflow_run).collect();

        Ok(ListPage::new(runs, next_page))
    }
}

#[derive(Debug, Serialize)]
struct PageParams {
    per_page: u8,
    page: u32,
}

impl PageParams {
    fn new(page: u32) -> Self {
        Self {
            per_page: PER_PAGE,
            page,
        }
    }
}

#[derive(Debug, Serialize)]
struct RunParams<'a> {
    branch: &'a str,
    created: String,
    exclude_pull_requests: bool,
    per_page: u8,
    page: u32,
}

#[derive(Debug, Deserialize)]
struct RawRepository {
    id: u64,
    name: String,
    #[serde(default)]
    default_branch: Option<String>,
    #[serde(default)]
    archived: bool,
    #[serde(default)]
    disabled: bool,
}

#[derive(Debug, Deserialize)]
struct RawWorkflow {
    id: u64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    path: String,
    #[serde(default)]
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct RawActor {
    #[serde(default)]
    login: String,
    #[serde(default, rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct RawWorkflowRun {
    id: u64,
    workflow_id: u64,
    #[serde(default)]
    run_number: u64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    html_url: String,
    #[serde(default)]
    event: String,
    #[serde(default)]
    head_branch: Option<String>,
    #[serde(default)]
    actor: Option<RawActor>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    conclusion: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    run_started_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct RawPropertyValue {
    property_name: String,
    #[serde(default)]
    value: serde_json::Value,
}

/// Convert a wire repository into our Repository type
fn convert_repository(repo: RawRepository) -> Repository {
    Repository {
        id: repo.id,
        name: repo.name,
        default_branch: repo.default_branch.unwrap_or_default(),
        archived: repo.archived,
        disabled: repo.disabled,
        custom_properties: HashMap::new(),
    }
}

/// Convert a wire workflow into our Workflow type
fn convert_workflow(workflow: RawWorkflow) -> Workflow {
    Workflow {
        id: workflow.id,
        name: workflow.name,
        state: workflow.state,
        path: workflow.path,
        html_url: workflow.html_url,
    }
}

/// Convert a wire workflow run into our WorkflowRun type
fn convert_workflow_run(run: RawWorkflowRun) -> WorkflowRun {
    let actor = run
        .actor
        .map(|a| Actor {
            login: a.login,
            kind: a.kind,
        })
        .unwrap_or_default();

    WorkflowRun {
        id: run.id,
        workflow_id: run.workflow_id,
        run_number: run.run_number,
        name: run.name.unwrap_or_default(),
        html_url: run.html_url,
        event: run.event,
        head_branch: run.head_branch.unwrap_or_default(),
        actor,
        status: run.status.unwrap_or_default(),
        conclusion: run.conclusion.unwrap_or_default(),
        created_at: run.created_at,
        updated_at: run.updated_at,
        run_started_at: run.run_started_at,
    }
}

/// Render a custom property value as a label string
fn flatten_property_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(values) => values
            .iter()
            .filter_map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(","),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Extract the `page` parameter from the query string of a `next` link
fn next_page_number(query: Option<&str>) -> Option<u32> {
    query?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "page")
        .and_then(|(_, value)| value.parse().ok())
}

/// Status codes GitHub uses when a request is throttled
fn is_rate_limit_status(status: u16) -> bool {
    status == 403 || status == 429
}

/// Convert a rate limit reset (unix seconds) to a timestamp
fn reset_time(epoch_seconds: u64) -> DateTime<Utc> {
    i64::try_from(epoch_seconds)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_page_number() {
        assert_eq!(next_page_number(Some("per_page=100&page=3")), Some(3));
        assert_eq!(next_page_number(Some("page=2")), Some(2));
        assert_eq!(next_page_number(Some("per_page=100")), None);
        assert_eq!(next_page_number(Some("page=abc")), None);
        assert_eq!(next_page_number(None), None);
    }

    #[test]
    fn test_convert_workflow_run_in_progress() {
        let json = r#"{
            "id": 30433642,
            "workflow_id": 159038,
            "run_number": 562,
            "name": "Build",
            "html_url": "https://github.com/octo-org/hello-world/actions/runs/30433642",
            "event": "push",
            "head_branch": "main",
            "status": "in_progress",
            "conclusion": null,
            "actor": { "login": "octocat", "type": "User" },
            "created_at": "2020-01-22T19:33:08Z",
            "updated_at": "2020-01-22T19:33:08Z",
            "run_started_at": "2020-01-22T19:33:10Z"
        }"#;
        let raw: RawWorkflowRun = serde_json::from_str(json).unwrap();
        let run = convert_workflow_run(raw);

        assert_eq!(run.workflow_id, 159038);
        assert_eq!(run.run_number, 562);
        assert_eq!(run.status, "in_progress");
        assert_eq!(run.conclusion, "");
        assert_eq!(run.actor.login, "octocat");
        assert_eq!(run.actor.kind, "User");
        assert!(run.run_started_at.is_some());
    }

    #[test]
    fn test_convert_workflow_run_without_actor() {
        let json = r#"{
            "id": 1,
            "workflow_id": 2,
            "status": "completed",
            "conclusion": "failure",
            "created_at": "2020-01-22T19:33:08Z",
            "updated_at": "2020-01-22T19:40:08Z"
        }"#;
        let raw: RawWorkflowRun = serde_json::from_str(json).unwrap();
        let run = convert_workflow_run(raw);

        assert_eq!(run.actor, Actor::default());
        assert_eq!(run.head_branch, "");
        assert_eq!(run.conclusion, "failure");
        assert!(run.run_started_at.is_none());
    }

    #[test]
    fn test_convert_repository_without_default_branch() {
        let json = r#"{ "id": 7, "name": "empty", "default_branch": null }"#;
        let raw: RawRepository = serde_json::from_str(json).unwrap();
        let repo = convert_repository(raw);

        assert_eq!(repo.default_branch, "");
        assert!(!repo.archived);
        assert!(!repo.disabled);
    }

    #[test]
    fn test_flatten_property_value() {
        assert_eq!(flatten_property_value(&serde_json::json!("team-a")), "team-a");
        assert_eq!(
            flatten_property_value(&serde_json::json!(["a", "b"])),
            "a,b"
        );
        assert_eq!(flatten_property_value(&serde_json::Value::Null), "");
        assert_eq!(flatten_property_value(&serde_json::json!(true)), "true");
    }

    #[test]
    fn test_rate_limit_status() {
        assert!(is_rate_limit_status(403));
        assert!(is_rate_limit_status(429));
        assert!(!is_rate_limit_status(404));
        assert!(!is_rate_limit_status(500));
    }

    #[test]
    fn test_reset_time() {
        assert_eq!(reset_time(1_700_000_000).timestamp(), 1_700_000_000);
    }
}
