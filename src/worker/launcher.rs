use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::{Child, Command};

use crate::store::Job;
use crate::worker::{JOB_NAME_ENV, WORKER_JOB_ENV};

/// Starts the OS process that runs one job.
///
/// The dispatcher only ever looks at the exit status of the returned child:
/// zero means succeeded, anything else (including death by signal) failed.
pub trait WorkerLauncher: Send + Sync {
    fn launch(&self, job: &Job, path: &Path) -> std::io::Result<Child>;
}

/// Re-executes the current binary in worker mode.
///
/// The child gets the parent's arguments back plus the job path in
/// [`WORKER_JOB_ENV`], so the host program rebuilds the same work hook and
/// runs it for exactly that job. Worker stdout is discarded so it cannot
/// scribble over the live display; stderr is inherited.
#[derive(Debug, Clone)]
pub struct SelfExecLauncher {
    exe: PathBuf,
    args: Vec<OsString>,
}

impl SelfExecLauncher {
    pub fn new(exe: impl Into<PathBuf>, args: Vec<OsString>) -> Self {
        Self {
            exe: exe.into(),
            args,
        }
    }

    /// Launcher for the running executable with its original arguments.
    pub fn current() -> std::io::Result<Self> {
        let exe = std::env::current_exe()?;
        let args = std::env::args_os().skip(1).collect();
        Ok(Self::new(exe, args))
    }
}

impl WorkerLauncher for SelfExecLauncher {
    fn launch(&self, job: &Job, path: &Path) -> std::io::Result<Child> {
        tracing::debug!(job = %job.name, exe = %self.exe.display(), "Re-executing as worker");
        Command::new(&self.exe)
            .args(&self.args)
            .env(WORKER_JOB_ENV, path)
            .env(JOB_NAME_ENV, &job.name)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
    }
}

/// Runs an external command per job: `program args... <job-path>`.
#[derive(Debug, Clone)]
pub struct CommandLauncher {
    program: OsString,
    args: Vec<OsString>,
    quiet: bool,
}

impl CommandLauncher {
    pub fn new<I, S>(program: impl Into<OsString>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            quiet: true,
        }
    }

    /// Convenience for `sh -c <script>`; the job path arrives as `$0`.
    pub fn shell(script: &str) -> Self {
        Self::new("sh", ["-c", script])
    }

    /// Keep the command's stdout instead of discarding it.
    pub fn with_stdout(mut self) -> Self {
        self.quiet = false;
        self
    }
}

impl WorkerLauncher for CommandLauncher {
    fn launch(&self, job: &Job, path: &Path) -> std::io::Result<Child> {
        let stdout = if self.quiet {
            Stdio::null()
        } else {
            Stdio::inherit()
        };
        Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .env(JOB_NAME_ENV, &job.name)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(Stdio::inherit())
            .spawn()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn command_launcher_passes_job_path_last() {
        let launcher = CommandLauncher::shell(
            r#"test "$0" = /tmp/jobs/pending/7 && test "$VETE_JOB_NAME" = 7"#,
        );
        let job = Job::new("7", 0);
        let mut child = launcher
            .launch(&job, Path::new("/tmp/jobs/pending/7"))
            .unwrap();
        assert!(child.wait().await.unwrap().success());
    }

    #[tokio::test]
    async fn command_launcher_reports_nonzero_exit() {
        let launcher = CommandLauncher::shell("exit 4");
        let mut child = launcher
            .launch(&Job::new("x", 0), Path::new("/nonexistent"))
            .unwrap();
        let status = child.wait().await.unwrap();
        assert_eq!(status.code(), Some(4));
    }

    #[test]
    fn missing_program_fails_to_launch() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let _guard = rt.enter();
        let launcher =
            CommandLauncher::new("definitely-not-a-real-program-12345", Vec::<String>::new());
        assert!(launcher
            .launch(&Job::new("x", 0), Path::new("/tmp/x"))
            .is_err());
    }
}
