use serde::Serialize;

/// The three mutually exclusive places a job file can live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Succeeded,
    Failed,
}

impl JobState {
    pub const ALL: [JobState; 3] = [JobState::Pending, JobState::Succeeded, JobState::Failed];

    /// Name of the directory holding jobs in this state.
    pub fn dir_name(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Succeeded => "succeeded",
            JobState::Failed => "failed",
        }
    }

    /// Final state for a worker that exited with `success`.
    pub fn from_exit(success: bool) -> Self {
        if success {
            JobState::Succeeded
        } else {
            JobState::Failed
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// A job taken from the pending snapshot, with its position in dispatch order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub name: String,
    pub position: usize,
}

impl Job {
    pub fn new(name: impl Into<String>, position: usize) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }
}
