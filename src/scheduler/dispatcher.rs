use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::config::RunConfig;
use crate::error::{Result, VeteError};
use crate::render::DisplayEvent;
use crate::scheduler::delay::pre_start_delay;
use crate::scheduler::slots::{SlotPool, SlotToken};
use crate::scheduler::state::{RunSnapshot, RunState};
use crate::scheduler::summary::RunSummary;
use crate::store::{Job, JobState, JobStore};
use crate::worker::WorkerLauncher;

/// Runs a snapshot of pending jobs through a bounded pool of worker
/// processes.
///
/// For each job, in snapshot order:
/// 1. Wait for a free slot (the only backpressure)
/// 2. Count the job as in flight and hand it to a supervising task
/// 3. The supervising task launches the worker, waits for it, moves the job
///    file by exit status, updates the counters and only then returns the
///    slot
///
/// The dispatch loop never waits on a worker. Once every job has a slot it
/// keeps sending heartbeat snapshots until all supervising tasks are done.
pub struct Dispatcher {
    config: RunConfig,
    store: JobStore,
    launcher: Arc<dyn WorkerLauncher>,
    display: Option<mpsc::UnboundedSender<DisplayEvent>>,
}

impl Dispatcher {
    pub fn new(config: RunConfig, store: JobStore, launcher: Arc<dyn WorkerLauncher>) -> Self {
        Self {
            config,
            store,
            launcher,
            display: None,
        }
    }

    /// Send display updates to `tx` while running.
    pub fn with_display(mut self, tx: mpsc::UnboundedSender<DisplayEvent>) -> Self {
        self.display = Some(tx);
        self
    }

    /// Dispatch `jobs` (pending job names, already in order) and wait for
    /// every worker to finish.
    pub async fn run(self, jobs: Vec<String>) -> Result<RunSummary> {
        self.config.validate()?;
        let workers = self.config.workers;
        let state = Arc::new(RunState::new(jobs.len()));
        let mut pool = SlotPool::new(workers);
        let mut tasks = JoinSet::new();
        let started = Instant::now();

        tracing::info!(jobs = jobs.len(), workers, "Starting run");

        for (position, name) in jobs.into_iter().enumerate() {
            let Some(token) = pool.acquire().await else {
                return Err(VeteError::NoWorkers);
            };
            let slot = token.slot();
            let snapshot = state.job_started().await;
            self.notify(DisplayEvent::Assigned {
                slot,
                job: name.clone(),
            });
            self.notify(DisplayEvent::Progress(snapshot));
            tracing::debug!(job = %name, slot, position, "Job assigned");

            let supervisor = Supervisor {
                config: self.config.clone(),
                store: self.store.clone(),
                launcher: self.launcher.clone(),
                state: state.clone(),
                display: self.display.clone(),
            };
            tasks.spawn(supervisor.supervise(Job::new(name, position), token));
        }

        let mut heartbeat = tokio::time::interval(self.config.heartbeat_interval);
        heartbeat.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut first_error = None;
        loop {
            tokio::select! {
                joined = tasks.join_next() => match joined {
                    None => break,
                    Some(Ok(())) => {}
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "Supervising task failed");
                        first_error.get_or_insert(e);
                    }
                },
                _ = heartbeat.tick() => {
                    self.notify(DisplayEvent::Progress(state.snapshot().await));
                }
            }
        }

        if !pool.is_full() {
            tracing::warn!(
                available = pool.available(),
                workers,
                "Slot pool did not drain back to full"
            );
        }
        if let Some(e) = first_error {
            return Err(e.into());
        }

        let elapsed = started.elapsed();
        let snapshot = state.snapshot().await;
        self.notify(DisplayEvent::Progress(snapshot.clone()));

        let summary = RunSummary::from_snapshot(&snapshot, workers, elapsed);
        tracing::info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            stranded = summary.stranded,
            elapsed_ms = elapsed.as_millis() as u64,
            peak_in_flight = snapshot.peak_in_flight,
            "Run finished"
        );
        Ok(summary)
    }

    fn notify(&self, event: DisplayEvent) {
        notify(&self.display, event);
    }
}

fn notify(display: &Option<mpsc::UnboundedSender<DisplayEvent>>, event: DisplayEvent) {
    if let Some(tx) = display {
        // The renderer going away only means nobody is watching.
        let _ = tx.send(event);
    }
}

/// Everything one supervising task needs, cloned out of the dispatcher.
struct Supervisor {
    config: RunConfig,
    store: JobStore,
    launcher: Arc<dyn WorkerLauncher>,
    state: Arc<RunState>,
    display: Option<mpsc::UnboundedSender<DisplayEvent>>,
}

impl Supervisor {
    async fn supervise(self, job: Job, token: SlotToken) {
        let slot = token.slot();

        if let Some(delay) = pre_start_delay(self.config.delay, job.position, self.config.workers)
        {
            tokio::time::sleep(delay).await;
        }

        let success = self.execute(&job).await;
        let mut outcome = JobState::from_exit(success);

        if let Err(e) = self
            .store
            .transition(&job.name, JobState::Pending, outcome)
        {
            tracing::error!(job = %job.name, error = %e, "Failed to move job file");
            outcome = JobState::Pending;
        }

        // Counters first, slot second: the dispatch loop may start the next
        // job the moment the token is back.
        let snapshot: RunSnapshot = self.state.job_finished(slot, outcome).await;
        drop(token);

        tracing::debug!(job = %job.name, slot, outcome = %outcome, "Job finished");
        notify(&self.display, DisplayEvent::Progress(snapshot));
    }

    /// Launch the worker and wait for it. Only the exit status counts; a
    /// worker that cannot be started or waited on is a failed job.
    async fn execute(&self, job: &Job) -> bool {
        let path = self.store.path(JobState::Pending, &job.name);
        let mut child = match self.launcher.launch(job, &path) {
            Ok(child) => child,
            Err(source) => {
                let e = VeteError::Spawn {
                    job: job.name.clone(),
                    source,
                };
                tracing::error!(error = %e, "Worker did not start");
                return false;
            }
        };

        match child.wait().await {
            Ok(status) => {
                if !status.success() {
                    tracing::debug!(
                        job = %job.name,
                        exit_code = ?status.code(),
                        "Worker exited unsuccessfully"
                    );
                }
                status.success()
            }
            Err(e) => {
                tracing::error!(job = %job.name, error = %e, "Failed to wait for worker");
                false
            }
        }
    }
}
