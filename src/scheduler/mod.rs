pub mod delay;
pub mod dispatcher;
pub mod slots;
pub mod state;
pub mod summary;

pub use dispatcher::Dispatcher;
pub use slots::{SlotPool, SlotToken};
pub use state::{RunSnapshot, RunState};
pub use summary::RunSummary;
