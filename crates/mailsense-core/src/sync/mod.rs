//! Incremental mailbox synchronization.

mod lock;
pub mod reconcile;
mod service;

pub use lock::SyncLocks;
pub use service::{SyncReport, SyncService};
