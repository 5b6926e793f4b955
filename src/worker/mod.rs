//! Process isolation for jobs.
//!
//! Every job runs in its own OS process, so a crash in job code can never
//! take the orchestrator down with it:
//! - **Launching**: [`WorkerLauncher`] starts the child for one job
//! - **Worker mode**: [`run_worker`] runs the host's work hook exactly once
//!   inside the child and exits with the outcome as the status code
//!
//! # Launchers
//!
//! - [`SelfExecLauncher`]: re-executes the current binary with the job path
//!   in `VETE_WORKER_JOB`; the host detects worker mode on startup
//! - [`CommandLauncher`]: runs an external command with the job path appended
//!
//! # Limitations
//!
//! Workers are not killed on interrupt and have no timeout. A worker that
//! never exits holds its slot for the rest of the run.

pub mod executor;
pub mod launcher;

pub use executor::{execute_hook, run_worker, HookError, JobContext, WorkHook};
pub use launcher::{CommandLauncher, SelfExecLauncher, WorkerLauncher};

/// Environment variable carrying the job path into a re-executed worker.
pub const WORKER_JOB_ENV: &str = "VETE_WORKER_JOB";

/// Environment variable carrying the job name into any worker process.
pub const JOB_NAME_ENV: &str = "VETE_JOB_NAME";
