//! Paginated fetching with rate limit handling
//!
//! Every list request walks pages of `PER_PAGE` items until the API reports
//! no further page. A rate-limited request waits until the quota reset and
//! is retried as-is, without an attempt limit. Any other error ends the
//! fetch.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use gh_client::{ClientError, GitHubClient, ListPage, Repository, RunFilter, Workflow, WorkflowRun};
use log::debug;
use thiserror::Error;

/// A fetch failed with an error other than rate limiting
#[derive(Debug, Error)]
#[error("failed to fetch {resource}")]
pub struct ScrapeError {
    /// What was being fetched (e.g., `workflow runs of octo-org/api`)
    pub resource: String,
    #[source]
    pub source: ClientError,
}

impl ScrapeError {
    fn new(resource: impl Into<String>, source: ClientError) -> Self {
        Self {
            resource: resource.into(),
            source,
        }
    }
}

/// Run `call` until it returns something other than a rate limit error,
/// sleeping until the reported reset between attempts
pub async fn with_rate_limit_retry<T, F, Fut>(request: &str, mut call: F) -> Result<T, ClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    loop {
        match call().await {
            Err(ClientError::RateLimited { reset }) => wait_for_reset(request, reset).await,
            other => return other,
        }
    }
}

async fn wait_for_reset(request: &str, reset: DateTime<Utc>) {
    let wait = (reset - Utc::now()).to_std().unwrap_or(Duration::ZERO);
    debug!(
        "Request {} rate limited, waiting until {} ({}s)",
        request,
        reset,
        wait.as_secs()
    );
    tokio::time::sleep(wait).await;
}

/// Collect every page of a list request, starting at page 1
pub async fn paginate<T, F, Fut>(request: &str, mut fetch_page: F) -> Result<Vec<T>, ClientError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<ListPage<T>, ClientError>>,
{
    let mut items = Vec::new();
    let mut page = 1;

    loop {
        debug!("Fetching {} (page {})", request, page);
        let result = with_rate_limit_retry(request, || fetch_page(page)).await?;
        items.extend(result.items);

        match result.next_page {
            Some(next) => page = next,
            None => break,
        }
    }

    Ok(items)
}

/// List all repositories of `org`
///
/// When `custom_properties` is not empty, each repository's custom property
/// values are fetched as well.
pub async fn fetch_repositories(
    client: &dyn GitHubClient,
    org: &str,
    custom_properties: &[String],
) -> Result<Vec<Repository>, ScrapeError> {
    let mut repositories = paginate("repository list", |page| {
        client.list_org_repositories(org, page)
    })
    .await
    .map_err(|err| ScrapeError::new(format!("repositories of {}", org), err))?;

    if !custom_properties.is_empty() {
        for repo in &mut repositories {
            let name = repo.name.clone();
            repo.custom_properties = with_rate_limit_retry("custom properties", || {
                client.fetch_custom_properties(org, &name)
            })
            .await
            .map_err(|err| {
                ScrapeError::new(format!("custom properties of {}/{}", org, name), err)
            })?;
        }
    }

    debug!("Fetched {} repositories of {}", repositories.len(), org);
    Ok(repositories)
}

/// List all workflows of a repository, keyed by workflow ID
pub async fn fetch_workflows(
    client: &dyn GitHubClient,
    org: &str,
    repo: &str,
) -> Result<BTreeMap<u64, Workflow>, ScrapeError> {
    let workflows = paginate("workflow list", |page| client.list_workflows(org, repo, page))
        .await
        .map_err(|err| ScrapeError::new(format!("workflows of {}/{}", org, repo), err))?;

    Ok(workflows.into_iter().map(|wf| (wf.id, wf)).collect())
}

/// Runs on the default branch of `repo` created within `lookback` of now,
/// excluding pull request runs, newest first
pub async fn fetch_workflow_runs(
    client: &dyn GitHubClient,
    org: &str,
    repo: &Repository,
    lookback: Duration,
) -> Result<Vec<WorkflowRun>, ScrapeError> {
    let filter = RunFilter {
        branch: repo.default_branch.clone(),
        created_since: window_start(Utc::now(), lookback),
        exclude_pull_requests: true,
    };

    let runs = paginate("workflow run list", |page| {
        client.list_workflow_runs(org, &repo.name, &filter, page)
    })
    .await
    .map_err(|err| ScrapeError::new(format!("workflow runs of {}/{}", org, repo.name), err))?;

    debug!(
        "Fetched {} workflow runs of {}/{} since {}",
        runs.len(),
        org,
        repo.name,
        filter.created_since
    );
    Ok(runs)
}

/// `now - lookback`, clamped to the earliest representable instant
fn window_start(now: DateTime<Utc>, lookback: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(lookback)
        .ok()
        .and_then(|delta| now.checked_sub_signed(delta))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{repository, run, workflow, MockClient};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn run_numbers(runs: &[WorkflowRun]) -> Vec<u64> {
        runs.iter().map(|r| r.run_number).collect()
    }

    #[tokio::test]
    async fn test_runs_follow_pages() {
        let mock = MockClient::new().with_run_pages(
            "api",
            vec![
                vec![run(1, 5, "completed", "success", 5), run(1, 4, "completed", "failure", 4)],
                vec![run(1, 3, "completed", "failure", 3)],
                vec![run(1, 2, "completed", "success", 2)],
            ],
        );
        let repo = repository("api", "main");

        let runs = fetch_workflow_runs(&mock, "octo-org", &repo, Duration::from_secs(3600))
            .await
            .unwrap();

        assert_eq!(run_numbers(&runs), vec![5, 4, 3, 2]);
        assert_eq!(mock.calls(), vec!["runs:api:1", "runs:api:2", "runs:api:3"]);
    }

    #[tokio::test]
    async fn test_run_filter() {
        let mock = MockClient::new().with_run_pages("api", vec![vec![]]);
        let repo = repository("api", "develop");
        let before = Utc::now();

        fetch_workflow_runs(&mock, "octo-org", &repo, Duration::from_secs(7200))
            .await
            .unwrap();

        let filters = mock.run_filters();
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].branch, "develop");
        assert!(filters[0].exclude_pull_requests);

        let lower = before - TimeDelta::hours(2) - TimeDelta::seconds(5);
        let upper = Utc::now() - TimeDelta::hours(2);
        assert!(filters[0].created_since >= lower);
        assert!(filters[0].created_since <= upper);
    }

    #[tokio::test]
    async fn test_rate_limit_resumes_same_page() {
        let pages = vec![
            vec![run(1, 3, "completed", "failure", 3)],
            vec![run(1, 2, "completed", "failure", 2)],
            vec![run(1, 1, "completed", "success", 1)],
        ];
        let throttled = MockClient::new()
            .with_run_pages("api", pages.clone())
            .rate_limit_once("runs:api:2");
        let unthrottled = MockClient::new().with_run_pages("api", pages);
        let repo = repository("api", "main");
        let lookback = Duration::from_secs(3600);

        let with_limit = fetch_workflow_runs(&throttled, "octo-org", &repo, lookback)
            .await
            .unwrap();
        let without_limit = fetch_workflow_runs(&unthrottled, "octo-org", &repo, lookback)
            .await
            .unwrap();

        assert_eq!(with_limit, without_limit);
        assert_eq!(
            throttled.calls(),
            vec!["runs:api:1", "runs:api:2", "runs:api:2", "runs:api:3"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_waits_for_future_reset() {
        let mock = MockClient::new()
            .with_run_pages(
                "api",
                vec![
                    vec![run(1, 2, "completed", "failure", 2)],
                    vec![run(1, 1, "completed", "success", 1)],
                ],
            )
            .rate_limit_for("runs:api:2", 60);
        let repo = repository("api", "main");

        let runs = fetch_workflow_runs(&mock, "octo-org", &repo, Duration::from_secs(3600))
            .await
            .unwrap();

        assert_eq!(run_numbers(&runs), vec![2, 1]);
        let times = mock.call_times();
        let keys: Vec<&str> = times.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, vec!["runs:api:1", "runs:api:2", "runs:api:2"]);

        let waited = times[2].1 - times[1].1;
        assert!(waited >= Duration::from_secs(59), "retried after {:?}", waited);
        assert!(waited <= Duration::from_secs(61), "retried after {:?}", waited);
    }

    #[tokio::test]
    async fn test_other_errors_abort() {
        let mock = MockClient::new()
            .with_run_pages("api", vec![vec![run(1, 2, "completed", "failure", 2)], vec![]])
            .fail_on("runs:api:2");
        let repo = repository("api", "main");

        let err = fetch_workflow_runs(&mock, "octo-org", &repo, Duration::from_secs(3600))
            .await
            .unwrap_err();

        assert_eq!(err.resource, "workflow runs of octo-org/api");
        assert!(matches!(err.source, ClientError::Other(_)));
        assert_eq!(mock.calls(), vec!["runs:api:1", "runs:api:2"]);
    }

    #[tokio::test]
    async fn test_workflows_keyed_by_id() {
        let mock = MockClient::new().with_workflow_pages(
            "api",
            vec![vec![workflow(20, "Deploy")], vec![workflow(10, "CI")]],
        );

        let workflows = fetch_workflows(&mock, "octo-org", "api").await.unwrap();

        assert_eq!(workflows.keys().copied().collect::<Vec<_>>(), vec![10, 20]);
        assert_eq!(workflows[&20].name, "Deploy");
    }

    #[tokio::test]
    async fn test_workflows_rate_limited_then_served() {
        let mock = MockClient::new()
            .with_workflow_pages("api", vec![vec![workflow(10, "CI")]])
            .rate_limit_once("workflows:api:1");

        let workflows = fetch_workflows(&mock, "octo-org", "api").await.unwrap();

        assert_eq!(workflows.len(), 1);
        assert_eq!(mock.calls(), vec!["workflows:api:1", "workflows:api:1"]);
    }

    #[tokio::test]
    async fn test_repositories_without_properties() {
        let mock = MockClient::new().with_repository_pages(vec![
            vec![repository("api", "main")],
            vec![repository("web", "main")],
        ]);

        let repos = fetch_repositories(&mock, "octo-org", &[]).await.unwrap();

        assert_eq!(repos.len(), 2);
        assert_eq!(mock.calls(), vec!["repos:1", "repos:2"]);
    }

    #[tokio::test]
    async fn test_repositories_with_properties() {
        let mock = MockClient::new()
            .with_repository_pages(vec![vec![repository("api", "main"), repository("web", "main")]])
            .with_properties("api", &[("team", "platform")])
            .rate_limit_once("properties:web");

        let repos = fetch_repositories(&mock, "octo-org", &["team".to_string()])
            .await
            .unwrap();

        assert_eq!(repos[0].custom_properties["team"], "platform");
        assert!(repos[1].custom_properties.is_empty());
        assert_eq!(
            mock.calls(),
            vec!["repos:1", "properties:api", "properties:web", "properties:web"]
        );
    }

    #[tokio::test]
    async fn test_property_error_aborts() {
        let mock = MockClient::new()
            .with_repository_pages(vec![vec![repository("api", "main")]])
            .fail_on("properties:api");

        let err = fetch_repositories(&mock, "octo-org", &["team".to_string()])
            .await
            .unwrap_err();

        assert_eq!(err.resource, "custom properties of octo-org/api");
    }

    #[test]
    fn test_window_start() {
        let now = Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap();
        assert_eq!(
            window_start(now, Duration::from_secs(7 * 24 * 3600)),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(window_start(now, Duration::MAX), DateTime::<Utc>::MIN_UTC);
    }
}
