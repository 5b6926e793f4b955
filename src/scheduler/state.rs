use std::collections::BTreeMap;

use tokio::sync::Mutex;

use crate::store::JobState;

/// Point-in-time copy of the run counters.
///
/// Everything the renderer needs is in here, so drawing never has to hold
/// the run-state lock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSnapshot {
    /// Jobs whose worker is currently running
    pub in_flight: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Jobs whose worker exited but whose file could not be moved out of
    /// pending
    pub stranded: usize,
    /// Size of the dispatch snapshot
    pub total: usize,
    /// Completed jobs per slot, used to scale the slot bars
    pub per_slot: BTreeMap<usize, usize>,
    /// Highest `in_flight` seen during the run
    pub peak_in_flight: usize,
}

impl RunSnapshot {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    /// Jobs that have finished, either way.
    pub fn completed(&self) -> usize {
        self.succeeded + self.failed + self.stranded
    }

    /// Whether every dispatched job has finished.
    pub fn is_complete(&self) -> bool {
        self.completed() == self.total && self.in_flight == 0
    }
}

/// Lock-protected run counters shared by the dispatch loop and every
/// supervising task.
#[derive(Debug)]
pub struct RunState {
    inner: Mutex<RunSnapshot>,
}

impl RunState {
    pub fn new(total: usize) -> Self {
        Self {
            inner: Mutex::new(RunSnapshot::new(total)),
        }
    }

    /// Record a job taking a slot.
    pub async fn job_started(&self) -> RunSnapshot {
        let mut state = self.inner.lock().await;
        state.in_flight += 1;
        state.peak_in_flight = state.peak_in_flight.max(state.in_flight);
        state.clone()
    }

    /// Record a job leaving `slot` with its file now in `outcome`, as one
    /// update. `JobState::Pending` means the file never left pending.
    /// Returns the counters as they stand right after the update.
    ///
    /// Must be called before the job's slot goes back to the pool, or a new
    /// job can start while this one still counts as in flight.
    pub async fn job_finished(&self, slot: usize, outcome: JobState) -> RunSnapshot {
        let mut state = self.inner.lock().await;
        state.in_flight = state.in_flight.saturating_sub(1);
        match outcome {
            JobState::Succeeded => state.succeeded += 1,
            JobState::Failed => state.failed += 1,
            JobState::Pending => state.stranded += 1,
        }
        *state.per_slot.entry(slot).or_insert(0) += 1;
        state.clone()
    }

    pub async fn snapshot(&self) -> RunSnapshot {
        self.inner.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counters_track_starts_and_finishes() {
        let state = RunState::new(3);

        state.job_started().await;
        state.job_started().await;
        let snap = state.job_finished(1, JobState::Succeeded).await;
        assert_eq!(snap.in_flight, 1);
        assert_eq!(snap.succeeded, 1);
        assert_eq!(snap.per_slot.get(&1), Some(&1));

        state.job_started().await;
        state.job_finished(2, JobState::Failed).await;
        let snap = state.job_finished(1, JobState::Succeeded).await;

        assert_eq!(snap.succeeded, 2);
        assert_eq!(snap.failed, 1);
        assert_eq!(snap.in_flight, 0);
        assert_eq!(snap.peak_in_flight, 2);
        assert_eq!(snap.per_slot.get(&1), Some(&2));
        assert!(snap.is_complete());
    }

    #[tokio::test]
    async fn snapshot_is_a_copy() {
        let state = RunState::new(1);
        let before = state.snapshot().await;
        state.job_started().await;
        assert_eq!(before.in_flight, 0);
        assert_eq!(state.snapshot().await.in_flight, 1);
    }

    #[tokio::test]
    async fn unmoved_job_is_counted_apart() {
        let state = RunState::new(2);
        state.job_started().await;
        state.job_started().await;
        state.job_finished(1, JobState::Pending).await;
        let snap = state.job_finished(2, JobState::Failed).await;

        assert_eq!(snap.succeeded, 0);
        assert_eq!(snap.failed, 1);
        assert_eq!(snap.stranded, 1);
        assert_eq!(snap.completed(), 2);
        assert!(snap.is_complete());
    }

    #[test]
    fn empty_run_is_complete() {
        assert!(RunSnapshot::new(0).is_complete());
        assert!(!RunSnapshot::new(1).is_complete());
    }
}
