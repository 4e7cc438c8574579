//! Consecutive failure streaks
//!
//! Walks the terminal runs of each workflow newest to oldest (the order the
//! API returns them in) and counts failures until the first success. Runs
//! are never re-sorted: the count depends on fetch order.

use std::collections::BTreeMap;

use gh_client::WorkflowRun;

use crate::classify::terminal_runs;

const CONCLUSION_FAILURE: &str = "failure";
const CONCLUSION_SUCCESS: &str = "success";

/// Current failure streak of one workflow
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Streak<'a> {
    /// Failures since the most recent success
    pub count: u64,
    /// Run describing the streak: the most recent counted failure, or the
    /// newest terminal run when nothing was counted
    pub run: &'a WorkflowRun,
}

#[derive(Debug)]
struct Tally<'a> {
    count: u64,
    resolved: bool,
    newest: &'a WorkflowRun,
    newest_failure: Option<&'a WorkflowRun>,
}

impl<'a> Tally<'a> {
    fn new(newest: &'a WorkflowRun) -> Self {
        Self {
            count: 0,
            resolved: false,
            newest,
            newest_failure: None,
        }
    }

    fn observe(&mut self, run: &'a WorkflowRun) {
        if self.resolved {
            return;
        }

        match run.conclusion.as_str() {
            CONCLUSION_FAILURE => {
                self.count += 1;
                if self.newest_failure.is_none() {
                    self.newest_failure = Some(run);
                }
            }
            CONCLUSION_SUCCESS => self.resolved = true,
            // cancelled, skipped, neutral, timed_out, ... neither extend nor break the streak
            _ => {}
        }
    }

    fn finish(self) -> Streak<'a> {
        Streak {
            count: self.count,
            run: self.newest_failure.unwrap_or(self.newest),
        }
    }
}

/// Count consecutive failures per workflow since its most recent success
///
/// Workflows without any terminal run have no entry.
pub fn failure_streaks(runs: &[WorkflowRun]) -> BTreeMap<u64, Streak<'_>> {
    let mut tallies: BTreeMap<u64, Tally<'_>> = BTreeMap::new();

    for run in terminal_runs(runs) {
        tallies
            .entry(run.workflow_id)
            .or_insert_with(|| Tally::new(run))
            .observe(run);
    }

    tallies
        .into_iter()
        .map(|(workflow_id, tally)| (workflow_id, tally.finish()))
        .collect()
}
