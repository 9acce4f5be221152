//! Candidate matching: which users were near a task while it was open
//!
//! For every task the match window is `duration / timeslots` minutes long,
//! starting at the task timestamp. A user is a candidate when at least one
//! of their movement samples falls inside that window (both ends inclusive)
//! and within `distance` meters of the task (inclusive). Each user counts
//! once per task.

use std::collections::HashSet;

use mcs_core::{McsError, Result, SimulationResult, Task, UserMovementEvent};
use tracing::{debug, info};

use crate::geo::distance_meters;

/// Match window length in seconds, `None` when the task has no timeslots.
pub fn match_window_seconds(task: &Task) -> Option<f64> {
    if task.timeslots == 0 {
        return None;
    }
    Some((task.duration as f64 / task.timeslots as f64) * 60.0)
}

/// Movement samples indexed by timestamp for window queries
pub struct CandidateMatcher<'a> {
    by_time: Vec<&'a UserMovementEvent>,
}

impl<'a> CandidateMatcher<'a> {
    pub fn new(movements: &'a [UserMovementEvent]) -> Self {
        let mut by_time: Vec<&UserMovementEvent> = movements.iter().collect();
        by_time.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        CandidateMatcher { by_time }
    }

    /// Samples with `from <= timestamp <= to`
    pub fn samples_between(&self, from: f64, to: f64) -> &[&'a UserMovementEvent] {
        if !(from <= to) {
            return &[];
        }
        let lo = self.by_time.partition_point(|e| e.timestamp < from);
        let hi = self.by_time.partition_point(|e| e.timestamp <= to);
        &self.by_time[lo..hi.max(lo)]
    }

    /// Distinct users eligible for `task`
    pub fn candidates_for(&self, task: &Task) -> Result<u32> {
        if !task.timestamp.is_finite() || !task.position().is_finite() || !task.distance.is_finite() {
            return Err(McsError::computation(format!("task {} has non-finite fields", task.task_id)));
        }

        let Some(window) = match_window_seconds(task) else {
            return Ok(0);
        };
        let window_end = task.timestamp + window;
        let users: HashSet<u32> = self
            .samples_between(task.timestamp, window_end)
            .iter()
            .filter(|e| {
                let d = distance_meters(task.latitude, task.longitude, e.latitude, e.longitude);
                (0.0..=task.distance).contains(&d)
            })
            .map(|e| e.user_id)
            .collect();

        Ok(users.len() as u32)
    }
}

/// One result per task, in task order. Either every task gets a result or
/// an error is returned.
pub fn compute_candidates(movements: &[UserMovementEvent], tasks: &[Task]) -> Result<Vec<SimulationResult>> {
    let matcher = CandidateMatcher::new(movements);

    let results = tasks
        .iter()
        .map(|task| {
            let candidates = matcher.candidates_for(task)?;
            debug!("Task {}: {} candidates", task.task_id, candidates);
            Ok(SimulationResult {
                task_id: task.task_id,
                candidates,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    info!(
        "Computed candidates for {} tasks ({} with at least one candidate)",
        results.len(),
        results.iter().filter(|r| r.candidates > 0).count()
    );

    Ok(results)
}
