use std::time::Duration;

use serde::Serialize;

use crate::scheduler::state::RunSnapshot;

/// Final tally of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Jobs left in pending because their file could not be moved
    pub stranded: usize,
    pub workers: usize,
    #[serde(rename = "elapsed_secs", serialize_with = "as_secs_f64")]
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn from_snapshot(snapshot: &RunSnapshot, workers: usize, elapsed: Duration) -> Self {
        Self {
            total: snapshot.total,
            succeeded: snapshot.succeeded,
            failed: snapshot.failed,
            stranded: snapshot.stranded,
            workers,
            elapsed,
        }
    }

    /// Summary of a run that found nothing pending.
    pub fn empty(workers: usize) -> Self {
        Self {
            total: 0,
            succeeded: 0,
            failed: 0,
            stranded: 0,
            workers,
            elapsed: Duration::ZERO,
        }
    }

    /// Completed jobs per second of wall time.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.total as f64 / secs
        } else {
            0.0
        }
    }
}

fn as_secs_f64<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:.2} secs for {} jobs by {} workers @ {:.2} jobs/sec",
            self.elapsed.as_secs_f64(),
            self.total,
            self.workers,
            self.throughput()
        )?;
        if self.stranded > 0 {
            write!(f, " ({} left in pending)", self.stranded)?;
        }
        Ok(())
    }
}
