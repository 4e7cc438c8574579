//! Error type for GitHub API calls

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Failure of a single GitHub API request
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request quota is exhausted until `reset`
    #[error("GitHub API rate limit exceeded, resets at {reset}")]
    RateLimited {
        /// When the quota is replenished
        reset: DateTime<Utc>,
    },

    /// Error reported by the GitHub API or the HTTP transport
    #[error(transparent)]
    Api(#[from] octocrab::Error),

    /// Any other failure
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
