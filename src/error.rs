use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VeteError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid job name: {0:?}")]
    InvalidJobName(String),

    #[error("invalid delay mode '{0}'")]
    InvalidDelayMode(String),

    #[error("invalid delay time ({0} secs)")]
    InvalidDelayTime(f64),

    #[error("progress bar character must not be empty")]
    EmptyGlyph,

    #[error("worker count must be at least 1")]
    NoWorkers,

    #[error("Failed to spawn worker for job {job}: {source}")]
    Spawn {
        job: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No work hook registered")]
    MissingWorkHook,

    #[error("Supervising task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Terminal error: {0}")]
    Terminal(#[source] std::io::Error),
}

impl VeteError {
    /// Wrap an I/O error with the path it was raised on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        VeteError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, VeteError>;
