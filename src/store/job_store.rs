use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::{Result, VeteError};
use crate::store::job::JobState;

/// Directory-backed job queue.
///
/// Every job is one file named after the job, living in exactly one of the
/// `pending/`, `succeeded/` or `failed/` directories under the store root.
/// Moving a job between states is a single `rename(2)`, so a job is never
/// observable in two directories or in none.
#[derive(Debug, Clone)]
pub struct JobStore {
    root: PathBuf,
}

impl JobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding jobs in `state`.
    pub fn dir(&self, state: JobState) -> PathBuf {
        self.root.join(state.dir_name())
    }

    /// Path of job `name` in `state`.
    pub fn path(&self, state: JobState, name: &str) -> PathBuf {
        self.dir(state).join(name)
    }

    /// Wipe the store and recreate empty state directories.
    pub fn initialize(&self) -> Result<()> {
        self.reset()?;
        for state in JobState::ALL {
            let dir = self.dir(state);
            fs::create_dir_all(&dir).map_err(|e| VeteError::io(&dir, e))?;
        }
        tracing::debug!(root = %self.root.display(), "Job store initialized");
        Ok(())
    }

    /// Delete the whole store root. A missing root is not an error.
    pub fn reset(&self) -> Result<()> {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => {
                tracing::debug!(root = %self.root.display(), "Job store removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(VeteError::io(&self.root, e)),
        }
    }

    /// Whether all three state directories exist.
    pub fn exists(&self) -> bool {
        JobState::ALL.iter().all(|s| self.dir(*s).is_dir())
    }

    /// Create a job under `pending/`. Without a payload the file is an empty
    /// marker; an existing marker keeps its contents and gets a fresh mtime.
    pub fn enqueue(&self, name: &str, payload: Option<&[u8]>) -> Result<PathBuf> {
        validate_name(name)?;
        let path = self.path(JobState::Pending, name);
        match payload {
            Some(data) => {
                let mut file = File::create(&path).map_err(|e| VeteError::io(&path, e))?;
                file.write_all(data).map_err(|e| VeteError::io(&path, e))?;
            }
            None => touch(&path)?,
        }
        Ok(path)
    }

    /// Snapshot of pending job names, sorted by name.
    pub fn list_pending(&self) -> Result<Vec<String>> {
        self.list(JobState::Pending)
    }

    /// Sorted job names currently in `state`.
    pub fn list(&self, state: JobState) -> Result<Vec<String>> {
        let dir = self.dir(state);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(VeteError::io(&dir, e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| VeteError::io(&dir, e))?;
            let is_file = entry
                .file_type()
                .map_err(|e| VeteError::io(entry.path(), e))?
                .is_file();
            if !is_file {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            } else {
                tracing::warn!(path = %entry.path().display(), "Skipping job with non UTF-8 name");
            }
        }
        names.sort();
        Ok(names)
    }

    /// Number of jobs currently in `state`.
    pub fn count(&self, state: JobState) -> Result<usize> {
        Ok(self.list(state)?.len())
    }

    /// Atomically move job `name` from `from` to `to`, replacing any job of
    /// the same name already in `to`.
    pub fn transition(&self, name: &str, from: JobState, to: JobState) -> Result<PathBuf> {
        validate_name(name)?;
        let src = self.path(from, name);
        let dst = self.path(to, name);
        fs::rename(&src, &dst).map_err(|e| VeteError::io(&src, e))?;
        tracing::trace!(job = name, from = %from, to = %to, "Job moved");
        Ok(dst)
    }

    /// Sorted names of failed jobs, each with its modification time
    /// refreshed so reused names sort after older entries in later listings.
    pub fn collect_failed(&self) -> Result<Vec<String>> {
        let names = self.list(JobState::Failed)?;
        for name in &names {
            touch(&self.path(JobState::Failed, name))?;
        }
        Ok(names)
    }
}

/// Job names are plain file names: non-empty, no separators, not `.`/`..`.
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Err(VeteError::InvalidJobName(name.to_string()));
    }
    Ok(())
}

/// Create `path` if missing and set its modification time to now.
fn touch(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| VeteError::io(path, e))?;
    file.set_modified(SystemTime::now())
        .map_err(|e| VeteError::io(path, e))
}
