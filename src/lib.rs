pub mod config;
pub mod error;
pub mod render;
pub mod runner;
pub mod scheduler;
pub mod shutdown;
pub mod store;
pub mod worker;

pub use config::{DelayMode, DisplayConfig, RunConfig};
pub use error::{Result, VeteError};
pub use runner::Vete;
pub use scheduler::RunSummary;
pub use store::{retry, JobState, JobStore, RetryOutcome};
pub use worker::JobContext;
