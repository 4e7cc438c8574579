//! GitHub client trait
//!
//! This module defines the `GitHubClient` trait that all client
//! implementations must satisfy. Every list operation returns a single
//! page; walking the pages (and waiting out rate limits) is left to the
//! caller.

use crate::error::ClientError;
use crate::types::{ListPage, Repository, RunFilter, Workflow, WorkflowRun};
use async_trait::async_trait;
use std::collections::HashMap;

/// GitHub API client trait
///
/// Defines the read-only subset of the GitHub API needed to scrape
/// GitHub Actions workflow runs of an organization.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow sharing across
/// async tasks and threads.
///
/// # Example
///
/// ```rust,ignore
/// use gh_client::{GitHubClient, ListPage, Workflow};
///
/// async fn first_page(client: &dyn GitHubClient) -> Result<ListPage<Workflow>, ClientError> {
///     client.list_workflows("rust-lang", "rust", 1).await
/// }
/// ```
#[async_trait]
pub trait GitHubClient: Send + Sync {
    /// List the repositories of an organization
    ///
    /// # Arguments
    ///
    /// * `org` - Organization login
    /// * `page` - 1-based page number
    async fn list_org_repositories(
        &self,
        org: &str,
        page: u32,
    ) -> Result<ListPage<Repository>, ClientError>;

    /// Fetch all custom property values of a repository
    ///
    /// Multi-select values are joined with `,`, unset values become an
    /// empty string.
    async fn fetch_custom_properties(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<HashMap<String, String>, ClientError>;

    /// List the workflows of a repository
    ///
    /// # Arguments
    ///
    /// * `owner` - Repository owner
    /// * `repo` - Repository name
    /// * `page` - 1-based page number
    async fn list_workflows(
        &self,
        owner: &str,
        repo: &str,
        page: u32,
    ) -> Result<ListPage<Workflow>, ClientError>;

    /// List workflow runs of a repository matching `filter`
    ///
    /// Runs are returned newest first, as ordered by the API.
    ///
    /// # Arguments
    ///
    /// * `owner` - Repository owner
    /// * `repo` - Repository name
    /// * `filter` - Branch, creation time and pull request filter
    /// * `page` - 1-based page number
    async fn list_workflow_runs(
        &self,
        owner: &str,
        repo: &str,
        filter: &RunFilter,
        page: u32,
    ) -> Result<ListPage<WorkflowRun>, ClientError>;
}
