//! Workflow run aggregation
//!
//! Turns the paginated, rate-limited workflow run listing of an
//! organization into three views per workflow:
//!
//! - runs that are currently executing
//! - the most recent finished run
//! - the number of consecutive failures since the last success
//!
//! ```text
//! collect_cycle ─► fetcher ─► RunState::of ─┬─► running_runs
//!                                           ├─► latest_runs
//!                                           └─► failure_streaks
//! ```
//!
//! A cycle either returns a complete [`CycleReport`] or fails with a
//! [`ScrapeError`]; it never returns partial results.

pub mod classify;
pub mod fetcher;
pub mod latest;
pub mod records;
pub mod streak;
pub mod walker;

#[cfg(test)]
pub(crate) mod testing;

pub use classify::{is_running_status, running_runs, terminal_runs, RunState, RUNNING_STATUSES};
pub use fetcher::{
    fetch_repositories, fetch_workflow_runs, fetch_workflows, paginate, with_rate_limit_retry,
    ScrapeError,
};
pub use latest::latest_runs;
pub use records::{
    ConsecutiveFailures, CycleReport, LatestRun, PropertyLabels, RepositoryInfo, RunLabels,
    RunningRun, WorkflowInfo, LABEL_VALUE_UNKNOWN,
};
pub use streak::{failure_streaks, Streak};
pub use walker::{collect_cycle, reduce_runs, walk_repository, WalkSettings};
