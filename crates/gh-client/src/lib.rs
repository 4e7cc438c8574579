//! GitHub Actions API client
//!
//! This crate provides a trait-based client for the parts of the GitHub API
//! needed to scrape workflow runs of an organization: repository listing,
//! custom properties, workflow listing and workflow-run listing.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │              GitHubClient trait                  │
//! │  - list_org_repositories()                       │
//! │  - fetch_custom_properties()                     │
//! │  - list_workflows()                              │
//! │  - list_workflow_runs()                          │
//! └─────────────────────────────────────────────────┘
//!                        │
//!                        ▼
//!              ┌─────────────────┐
//!              │ OctocrabClient  │
//!              │ (direct API)    │
//!              └─────────────────┘
//! ```
//!
//! Every call returns one page. A throttled request surfaces as
//! [`ClientError::RateLimited`] carrying the quota reset time, so callers can
//! decide how to wait and retry.
//!
//! # Example
//!
//! ```rust,no_run
//! use gh_client::{ConnectOptions, GitHubClient};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = gh_client::connect(&ConnectOptions::default()).await?;
//! let page = client.list_workflows("octo-org", "hello-world", 1).await?;
//! println!("{} workflows", page.items.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod client_manager;
pub mod error;
pub mod octocrab_client;
pub mod types;

/// Default GitHub host (public GitHub)
pub const DEFAULT_HOST: &str = "github.com";

pub use client::GitHubClient;
pub use client_manager::{connect, AppCredentials, ConnectOptions, TokenResolver};
pub use error::ClientError;
pub use octocrab_client::OctocrabClient;
pub use types::{Actor, ListPage, Repository, RunFilter, Workflow, WorkflowRun, PER_PAGE};

// Re-export octocrab so consumers don't need to depend on it directly
pub use octocrab;
