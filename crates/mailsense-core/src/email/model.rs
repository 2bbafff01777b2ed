//! Email and attachment models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::thread::ThreadId;

/// Unique identifier for a stored email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailId(pub i64);

impl std::fmt::Display for EmailId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One address on a recipient list (serialized as a JSON column).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    /// Email address.
    pub address: String,
    /// Display name.
    pub name: Option<String>,
}

/// Attachment metadata owned by exactly one email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Filename.
    pub filename: String,
    /// MIME type.
    pub mime_type: String,
    /// Byte size; may be unknown.
    pub size: Option<i64>,
}

/// A normalized email staged for persistence.
///
/// Produced once at the reconciliation boundary with every remote
/// optional already defaulted; aggregation logic never re-checks them.
#[derive(Debug, Clone)]
pub struct NewEmail {
    /// Provider message id (unique, natural dedup key).
    pub message_id: String,
    /// Owning user.
    pub user_id: String,
    /// Sender address.
    pub from_address: String,
    /// Sender display name.
    pub from_name: Option<String>,
    /// To recipients.
    pub to_recipients: Vec<Recipient>,
    /// Cc recipients.
    pub cc_recipients: Vec<Recipient>,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
    /// Received timestamp.
    pub received_at: DateTime<Utc>,
}

/// A stored email row. Immutable once created; only ever deleted.
#[derive(Debug, Clone)]
pub struct Email {
    /// Row id.
    pub id: EmailId,
    /// Provider message id.
    pub message_id: String,
    /// Owning thread.
    pub thread_id: ThreadId,
    /// Sender address.
    pub from_address: String,
    /// Sender display name.
    pub from_name: Option<String>,
    /// To recipients.
    pub to_recipients: Vec<Recipient>,
    /// Cc recipients.
    pub cc_recipients: Vec<Recipient>,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
    /// Received timestamp.
    pub received_at: DateTime<Utc>,
    /// Number of attachments stored alongside.
    pub attachment_count: i64,
}

/// An email together with its attachment rows.
#[derive(Debug, Clone)]
pub struct EmailWithAttachments {
    /// The email.
    pub email: Email,
    /// Its attachments.
    pub attachments: Vec<Attachment>,
}
