use crate::error::Result;
use crate::store::job::JobState;
use crate::store::job_store::JobStore;

/// What a retry pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome {
    /// These failed jobs were moved back to pending, in this order.
    Requeued(Vec<String>),
    /// Nothing had failed; the caller should initialize and seed instead.
    NothingToRetry,
}

impl RetryOutcome {
    pub fn is_requeued(&self) -> bool {
        matches!(self, RetryOutcome::Requeued(_))
    }
}

/// Move every failed job back to pending.
pub fn retry(store: &JobStore) -> Result<RetryOutcome> {
    let failed = store.collect_failed()?;
    if failed.is_empty() {
        tracing::debug!("No failed jobs to retry");
        return Ok(RetryOutcome::NothingToRetry);
    }

    for name in &failed {
        store.transition(name, JobState::Failed, JobState::Pending)?;
    }
    tracing::info!(count = failed.len(), "Requeued failed jobs");
    Ok(RetryOutcome::Requeued(failed))
}
