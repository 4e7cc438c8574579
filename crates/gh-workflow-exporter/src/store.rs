//! Latest published metrics snapshot
//!
//! The scheduler replaces the rendered text as a whole; readers never see a
//! half written snapshot.

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Snapshot {
    text: String,
    published_at: Option<DateTime<Utc>>,
}

/// Shared between the scheduler (writer) and the HTTP handlers (readers)
#[derive(Debug, Default)]
pub struct MetricStore {
    snapshot: RwLock<Snapshot>,
}

impl MetricStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current snapshot
    pub async fn publish(&self, text: String, at: DateTime<Utc>) {
        let mut snapshot = self.snapshot.write().await;
        snapshot.text = text;
        snapshot.published_at = Some(at);
    }

    /// Exposition text of the last successful cycle, empty before the first one
    pub async fn text(&self) -> String {
        self.snapshot.read().await.text.clone()
    }

    pub async fn last_success(&self) -> Option<DateTime<Utc>> {
        self.snapshot.read().await.published_at
    }

    /// Ready once a cycle has been published
    pub async fn is_ready(&self) -> bool {
        self.last_success().await.is_some()
    }
}
