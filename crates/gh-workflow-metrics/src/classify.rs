//! Run state classification
//!
//! A run's status and conclusion decide whether it is still executing, has
//! finished, or is in a state none of the reducers should look at.

use gh_client::WorkflowRun;

/// Statuses of a run that has not finished yet
pub const RUNNING_STATUSES: [&str; 5] = [
    "in_progress",
    "action_required",
    "queued",
    "waiting",
    "pending",
];

/// Logical state of a workflow run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Running status and no conclusion yet
    Running,
    /// Finished with a conclusion
    Terminal,
    /// Finished status without a conclusion, or a running status that
    /// already carries one. Ignored by every reducer.
    Indeterminate,
}

impl RunState {
    /// Classify a run
    pub fn of(run: &WorkflowRun) -> Self {
        match (is_running_status(&run.status), run.conclusion.is_empty()) {
            (true, true) => RunState::Running,
            (false, false) => RunState::Terminal,
            _ => RunState::Indeterminate,
        }
    }
}

/// Whether `status` is one of `RUNNING_STATUSES`
pub fn is_running_status(status: &str) -> bool {
    RUNNING_STATUSES.contains(&status)
}

/// Runs that are currently executing, in fetch order
pub fn running_runs(runs: &[WorkflowRun]) -> impl Iterator<Item = &WorkflowRun> {
    runs.iter().filter(|run| RunState::of(run) == RunState::Running)
}

/// Runs that have finished with a conclusion, in fetch order
pub fn terminal_runs(runs: &[WorkflowRun]) -> impl Iterator<Item = &WorkflowRun> {
    runs.iter().filter(|run| RunState::of(run) == RunState::Terminal)
}
