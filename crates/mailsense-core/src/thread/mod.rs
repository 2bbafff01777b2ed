//! Conversation threads aggregated over stored emails.

mod model;
mod repository;

pub use model::{Thread, ThreadDetail, ThreadId, ThreadSummary, ThreadUpsert};
pub use repository::ThreadRepository;
