//! Directory-backed job queue.
//!
//! Jobs are files moving between three state directories under one root:
//!
//! ```text
//! <root>/pending/<name>
//! <root>/succeeded/<name>
//! <root>/failed/<name>
//! ```
//!
//! - [`JobStore`]: listing, enqueueing, atomic transitions and reset
//! - [`retry()`]: bulk requeue of failed jobs

pub mod job;
pub mod job_store;
pub mod retry;

pub use job::{Job, JobState};
pub use job_store::JobStore;
pub use retry::{retry, RetryOutcome};
