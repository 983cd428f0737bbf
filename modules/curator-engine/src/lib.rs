pub mod allocation;
pub mod classify;
pub mod comment;
pub mod coordinator;
pub mod dispatch;
pub mod lease;
pub mod normalize;
pub mod retry;
pub mod scoring;
pub mod selector;
pub mod state;
pub mod steem;
pub mod store;
pub mod traits;
pub mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use coordinator::{EngineConfig, EngineDeps, RunCoordinator};
pub use types::{AbortReason, RunOutcome, RunReport, RunStats};
