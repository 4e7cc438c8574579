//! Latest completed run per workflow

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use gh_client::WorkflowRun;

use crate::classify::terminal_runs;

/// Select the most recently created terminal run of each workflow
///
/// A retained run is only replaced by a candidate created strictly later,
/// so on equal creation times the run seen first wins.
pub fn latest_runs(runs: &[WorkflowRun]) -> BTreeMap<u64, &WorkflowRun> {
    let mut latest: BTreeMap<u64, &WorkflowRun> = BTreeMap::new();

    for run in terminal_runs(runs) {
        match latest.entry(run.workflow_id) {
            Entry::Vacant(slot) => {
                slot.insert(run);
            }
            Entry::Occupied(mut slot) => {
                if slot.get().created_at < run.created_at {
                    slot.insert(run);
                }
            }
        }
    }

    latest
}
