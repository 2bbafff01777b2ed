//! Thread model types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::email::EmailWithAttachments;
use crate::insight::Insight;

/// Unique identifier for a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadId(pub i64);

impl std::fmt::Display for ThreadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored thread row.
///
/// Subject and `last_message_at` are always a function of the current
/// member emails: the subject of the most recently received member and
/// the maximum received timestamp. A thread with zero members does not
/// persist; it is pruned at the end of the sync pass that emptied it.
#[derive(Debug, Clone)]
pub struct Thread {
    /// Row id.
    pub id: ThreadId,
    /// Owning user.
    pub user_id: String,
    /// Provider conversation key (unique per user).
    pub conversation_id: String,
    /// Subject of the newest member email.
    pub subject: String,
    /// Maximum received timestamp among member emails.
    pub last_message_at: DateTime<Utc>,
}

/// Outcome of a thread upsert.
#[derive(Debug, Clone, Copy)]
pub struct ThreadUpsert {
    /// Resolved thread id.
    pub id: ThreadId,
    /// Whether the upsert created a new row (metrics only).
    pub created: bool,
}

/// Listing projection for one thread.
#[derive(Debug, Clone)]
pub struct ThreadSummary {
    /// Thread id.
    pub id: ThreadId,
    /// Display subject.
    pub subject: String,
    /// Last activity timestamp.
    pub last_message_at: DateTime<Utc>,
    /// Number of member emails.
    pub email_count: i64,
    /// Total attachments across member emails.
    pub attachment_count: i64,
    /// Whether a cached insight exists.
    pub has_insight: bool,
}

/// Detail projection: full emails, attachments, and any cached insight.
#[derive(Debug, Clone)]
pub struct ThreadDetail {
    /// Thread id.
    pub id: ThreadId,
    /// Display subject.
    pub subject: String,
    /// Last activity timestamp.
    pub last_message_at: DateTime<Utc>,
    /// Member emails, newest first.
    pub emails: Vec<EmailWithAttachments>,
    /// Cached insight, if one exists.
    pub insight: Option<Insight>,
}
