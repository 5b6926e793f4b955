use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use crate::worker::{JOB_NAME_ENV, WORKER_JOB_ENV};

/// Exit status of a worker whose hook returned `Ok`.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit status of a worker whose hook returned an error.
pub const EXIT_FAILURE: i32 = 1;
/// Exit status of a worker whose hook panicked.
pub const EXIT_PANIC: i32 = 101;

/// The job a worker process was started for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobContext {
    pub name: String,
    /// Location of the job file in `pending/`; read its payload from here.
    pub path: PathBuf,
}

impl JobContext {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { name, path }
    }

    /// Worker-mode context from the environment, if this process is a worker.
    pub fn from_env() -> Option<Self> {
        let path = std::env::var_os(WORKER_JOB_ENV)?;
        let mut ctx = Self::new(PathBuf::from(path));
        if let Ok(name) = std::env::var(JOB_NAME_ENV) {
            ctx.name = name;
        }
        Some(ctx)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Per-job work callback, run once inside the worker process.
pub type WorkHook = Box<dyn Fn(&JobContext) -> Result<(), HookError> + Send + Sync>;

/// Invoke `hook` for `ctx` and map the outcome to a process exit status.
/// A panic inside the hook is contained and reported as [`EXIT_PANIC`].
pub fn execute_hook(hook: &WorkHook, ctx: &JobContext) -> i32 {
    match panic::catch_unwind(AssertUnwindSafe(|| hook(ctx))) {
        Ok(Ok(())) => EXIT_SUCCESS,
        Ok(Err(e)) => {
            tracing::warn!(job = %ctx.name, error = %e, "Job failed");
            EXIT_FAILURE
        }
        Err(_) => {
            tracing::error!(job = %ctx.name, "Job panicked");
            EXIT_PANIC
        }
    }
}

/// Worker-mode entry point: run the hook once, then terminate the process
/// so the worker never continues into the host's orchestration code.
pub fn run_worker(hook: &WorkHook, ctx: &JobContext) -> ! {
    let code = execute_hook(hook, ctx);
    std::process::exit(code)
}
