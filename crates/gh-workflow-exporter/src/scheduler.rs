//! Periodic scrape cycles
//!
//! Cycles run one at a time on a fixed interval. A cycle that outlasts the
//! interval delays the next one instead of overlapping it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use gh_client::GitHubClient;
use gh_workflow_metrics::{collect_cycle, WalkSettings};
use log::{error, info};
use tokio::time::MissedTickBehavior;

use crate::exposition::{self, CycleStatus};
use crate::store::MetricStore;

pub struct Scheduler {
    client: Arc<dyn GitHubClient>,
    settings: WalkSettings,
    interval: Duration,
    store: Arc<MetricStore>,
}

impl Scheduler {
    pub fn new(
        client: Arc<dyn GitHubClient>,
        settings: WalkSettings,
        interval: Duration,
        store: Arc<MetricStore>,
    ) -> Self {
        Self {
            client,
            settings,
            interval,
            store,
        }
    }

    /// Run cycles forever, the first one immediately
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.run_cycle().await;
        }
    }

    /// Run a single cycle and publish its result
    ///
    /// On failure the previous snapshot stays in place. Returns whether a
    /// new snapshot was published.
    pub async fn run_cycle(&self) -> bool {
        info!("Starting scrape cycle for {}", self.settings.organization);
        let started = Instant::now();

        match collect_cycle(self.client.as_ref(), &self.settings).await {
            Ok(report) => {
                let status = CycleStatus {
                    finished_at: Utc::now(),
                    duration: started.elapsed(),
                };
                let text = exposition::render(&report, &status);
                self.store.publish(text, status.finished_at).await;
                info!(
                    "Scrape cycle finished in {:.1}s with {} records",
                    status.duration.as_secs_f64(),
                    report.record_count()
                );
                true
            }
            Err(err) => {
                error!(
                    "Scrape cycle failed, keeping previous metrics: {:#}",
                    anyhow::Error::new(err)
                );
                false
            }
        }
    }
}
