//! # mailsense-core
//!
//! Core engine for `MailSense`: incremental mailbox synchronization,
//! thread aggregation, and insight caching.
//!
//! This crate provides:
//! - Local storage (`SQLite`) with repositories for users, threads,
//!   emails/attachments, and insights
//! - The reconciler that classifies delta records and applies the
//!   minimal set of store mutations exactly once
//! - Thread aggregation keyed on `(user, conversation)` with pruning of
//!   empty threads
//! - The insight staleness gate deciding when a cached summary may be
//!   served and when the external summarizer must run
//! - Per-user sync serialization so concurrent passes cannot corrupt
//!   the resume cursor

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod email;
mod error;
pub mod feed;
pub mod insight;
pub mod store;
pub mod sync;
pub mod thread;
pub mod user;

pub use email::{Attachment, Email, EmailId, EmailRepository, EmailWithAttachments, Recipient};
pub use error::{Error, Result};
pub use feed::MailFeed;
pub use insight::{
    ActionItem, AttachmentOverview, Insight, InsightDraft, InsightRepository, InsightService,
    InsightStatus, Summarizer, ThreadContext, Urgency, resolve_insight,
};
pub use store::Store;
pub use sync::{SyncLocks, SyncReport, SyncService};
pub use thread::{Thread, ThreadDetail, ThreadId, ThreadRepository, ThreadSummary, ThreadUpsert};
pub use user::{User, UserProfile, UserRepository};
