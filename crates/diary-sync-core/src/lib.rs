pub mod filter;
pub mod sync;

pub use filter::{filter_since, remove_duplicates, SyncWindow};
pub use sync::{BatchStatus, RunError, RunOptions, SyncOrchestrator, SyncReport};
