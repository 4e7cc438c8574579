//! GitHub API data transfer objects
//!
//! These types represent the data returned from the GitHub Actions API.
//! They are intentionally separate from the octocrab models to keep the
//! aggregation code independent of the HTTP client.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Page size used for every list request
pub const PER_PAGE: u8 = 100;

/// A repository of an organization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    /// Repository ID
    pub id: u64,

    /// Repository name (without the owner)
    pub name: String,

    /// Default branch name, empty if the repository has no commits yet
    pub default_branch: String,

    /// Whether the repository is archived
    pub archived: bool,

    /// Whether the repository is disabled
    pub disabled: bool,

    /// Custom property values (only populated when requested)
    #[serde(default)]
    pub custom_properties: HashMap<String, String>,
}

/// A GitHub Actions workflow definition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    /// Workflow ID
    pub id: u64,

    /// Display name of the workflow
    pub name: String,

    /// State (e.g., "active", "disabled_manually")
    pub state: String,

    /// Path of the workflow file (e.g., ".github/workflows/ci.yml")
    pub path: String,

    /// URL to the workflow file in the browser
    pub html_url: String,
}

/// The user or bot that triggered a workflow run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Login name
    pub login: String,

    /// Account type (e.g., "User", "Bot")
    pub kind: String,
}

/// A GitHub Actions workflow run
///
/// `status` and `conclusion` are kept as the raw API strings. The API
/// reports `null` for an unresolved conclusion, which is stored as an empty
/// string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRun {
    /// Workflow run ID
    pub id: u64,
    /// ID of the workflow this run belongs to
    pub workflow_id: u64,
    /// Sequential run number within the workflow
    pub run_number: u64,
    /// Name of the run
    pub name: String,
    /// URL to view the workflow run
    pub html_url: String,
    /// Triggering event (e.g., "push", "schedule")
    pub event: String,
    /// Branch the run was triggered on
    pub head_branch: String,
    /// Who triggered the run
    pub actor: Actor,
    /// Lifecycle status (e.g., "queued", "in_progress", "completed")
    pub status: String,
    /// Outcome (e.g., "success", "failure"), empty while unresolved
    pub conclusion: String,
    /// When the run was created
    pub created_at: DateTime<Utc>,
    /// When the run was last updated
    pub updated_at: DateTime<Utc>,
    /// When the run attempt started executing
    pub run_started_at: Option<DateTime<Utc>>,
}

/// Filter for listing the workflow runs of a repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFilter {
    /// Only runs on this branch
    pub branch: String,
    /// Only runs created at or after this instant
    pub created_since: DateTime<Utc>,
    /// Drop runs triggered by pull requests
    pub exclude_pull_requests: bool,
}

impl RunFilter {
    /// Value for the `created` query parameter (e.g., `>=2024-01-01T00:00:00Z`)
    pub fn created_query(&self) -> String {
        format!(
            ">={}",
            self.created_since.to_rfc3339_opts(SecondsFormat::Secs, true)
        )
    }
}

/// One page of a paginated list response
#[derive(Debug, Clone)]
pub struct ListPage<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Number of the next page, `None` on the last page
    pub next_page: Option<u32>,
}

impl<T> ListPage<T> {
    /// A page followed by `next_page`
    pub fn new(items: Vec<T>, next_page: Option<u32>) -> Self {
        Self { items, next_page }
    }

    /// The final page of a listing
    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, None)
    }
}
