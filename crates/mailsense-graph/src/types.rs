//! Wire types for the Graph delta protocol.
//!
//! Raw payloads deserialize into [`DeltaMessage`] with every
//! remote-optional field modeled as an `Option`, then convert exactly
//! once into the tagged [`DeltaRecord`] form that the rest of the
//! system consumes. Nothing downstream sees untyped maps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An email address with an optional display name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailAddress {
    /// Address part (may be absent in malformed provider records).
    #[serde(default)]
    pub address: Option<String>,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
}

/// A recipient wrapper as the provider nests it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    /// The wrapped address.
    #[serde(default)]
    pub email_address: EmailAddress,
}

/// Message body as delivered by the provider.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageBody {
    /// `text` or `html`.
    #[serde(default)]
    pub content_type: Option<String>,
    /// Body content.
    #[serde(default)]
    pub content: Option<String>,
}

/// Removal annotation attached to deleted delta entries.
#[derive(Debug, Clone, Deserialize)]
pub struct RemovalInfo {
    /// Provider-supplied removal reason (`deleted` or `changed`).
    #[serde(default)]
    pub reason: Option<String>,
}

/// Attachment metadata as returned by the attachments endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentMeta {
    /// Provider attachment id.
    #[serde(default)]
    pub id: String,
    /// Filename.
    #[serde(default)]
    pub name: String,
    /// MIME type.
    #[serde(default)]
    pub content_type: String,
    /// Byte size; may be unknown.
    #[serde(default)]
    pub size: Option<i64>,
}

/// Raw delta entry exactly as the provider ships it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaMessage {
    /// Provider message id.
    pub id: String,
    /// Conversation key grouping messages into a thread.
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// Subject line.
    #[serde(default)]
    pub subject: Option<String>,
    /// Sender.
    #[serde(default)]
    pub from: Option<Recipient>,
    /// To recipients.
    #[serde(default)]
    pub to_recipients: Vec<Recipient>,
    /// Cc recipients.
    #[serde(default)]
    pub cc_recipients: Vec<Recipient>,
    /// Body content.
    #[serde(default)]
    pub body: Option<MessageBody>,
    /// Received timestamp.
    #[serde(default)]
    pub received_date_time: Option<DateTime<Utc>>,
    /// Whether the message carries attachments.
    #[serde(default)]
    pub has_attachments: Option<bool>,
    /// Attachment metadata, when the response embeds it inline.
    #[serde(default)]
    pub attachments: Option<Vec<AttachmentMeta>>,
    /// Present when this entry signals a removal.
    #[serde(rename = "@removed", default)]
    pub removed: Option<RemovalInfo>,
}

/// One page of a delta response.
#[derive(Debug, Clone, Deserialize)]
pub struct DeltaPage {
    /// Records on this page.
    #[serde(default)]
    pub value: Vec<DeltaMessage>,
    /// Link to the next page within the current sync round.
    #[serde(rename = "@odata.nextLink", default)]
    pub next_link: Option<String>,
    /// Cursor for the next sync round; only on the final page.
    #[serde(rename = "@odata.deltaLink", default)]
    pub delta_link: Option<String>,
}

/// A live message record staged for reconciliation.
#[derive(Debug, Clone)]
pub struct MessageRecord {
    /// Provider message id (natural key for dedup).
    pub id: String,
    /// Conversation key; records without one cannot be threaded.
    pub conversation_id: Option<String>,
    /// Subject line.
    pub subject: Option<String>,
    /// Sender.
    pub from: Option<EmailAddress>,
    /// To recipients.
    pub to_recipients: Vec<Recipient>,
    /// Cc recipients.
    pub cc_recipients: Vec<Recipient>,
    /// Plain body content.
    pub body: Option<String>,
    /// Received timestamp.
    pub received_at: Option<DateTime<Utc>>,
    /// Whether the message carries attachments.
    pub has_attachments: Option<bool>,
    /// Inline attachment metadata, when the feed embedded it.
    pub attachments: Option<Vec<AttachmentMeta>>,
}

/// A classified delta entry: either a live message or a removal marker.
#[derive(Debug, Clone)]
pub enum DeltaRecord {
    /// The provider removed this message; only the id survives.
    Removed {
        /// Provider message id.
        id: String,
    },
    /// A created or updated message with full fields.
    Message(Box<MessageRecord>),
}

impl From<DeltaMessage> for DeltaRecord {
    fn from(raw: DeltaMessage) -> Self {
        if raw.removed.is_some() {
            return Self::Removed { id: raw.id };
        }

        Self::Message(Box::new(MessageRecord {
            id: raw.id,
            conversation_id: raw.conversation_id,
            subject: raw.subject,
            from: raw.from.map(|r| r.email_address),
            to_recipients: raw.to_recipients,
            cc_recipients: raw.cc_recipients,
            body: raw.body.and_then(|b| b.content),
            received_at: raw.received_date_time,
            has_attachments: raw.has_attachments,
            attachments: raw.attachments,
        }))
    }
}

/// A flattened delta batch: every record of the sync round plus the
/// final cursor for the next round.
#[derive(Debug, Clone)]
pub struct DeltaBatch {
    /// Classified records across all pages of the round.
    pub records: Vec<DeltaRecord>,
    /// Cursor to resume from on the next sync.
    pub delta_link: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_message_entry_converts_to_message_record() {
        let raw: DeltaMessage = serde_json::from_str(
            r#"{
                "id": "msg-1",
                "conversationId": "conv-1",
                "subject": "Quarterly numbers",
                "from": {"emailAddress": {"address": "alice@example.com", "name": "Alice"}},
                "toRecipients": [{"emailAddress": {"address": "bob@example.com", "name": "Bob"}}],
                "body": {"contentType": "text", "content": "See attached."},
                "receivedDateTime": "2026-02-01T09:30:00Z",
                "hasAttachments": true
            }"#,
        )
        .unwrap();

        match DeltaRecord::from(raw) {
            DeltaRecord::Message(record) => {
                assert_eq!(record.id, "msg-1");
                assert_eq!(record.conversation_id.as_deref(), Some("conv-1"));
                assert_eq!(record.body.as_deref(), Some("See attached."));
                assert_eq!(
                    record.from.unwrap().address.as_deref(),
                    Some("alice@example.com")
                );
                assert!(record.received_at.is_some());
                assert_eq!(record.has_attachments, Some(true));
            }
            DeltaRecord::Removed { .. } => panic!("expected message record"),
        }
    }

    #[test]
    fn test_removed_entry_converts_to_removal_marker() {
        let raw: DeltaMessage = serde_json::from_str(
            r#"{"id": "msg-2", "@removed": {"reason": "deleted"}}"#,
        )
        .unwrap();

        match DeltaRecord::from(raw) {
            DeltaRecord::Removed { id } => assert_eq!(id, "msg-2"),
            DeltaRecord::Message(_) => panic!("expected removal marker"),
        }
    }

    #[test]
    fn test_missing_optional_fields_stay_none() {
        let raw: DeltaMessage =
            serde_json::from_str(r#"{"id": "msg-3", "conversationId": "conv-1"}"#).unwrap();

        match DeltaRecord::from(raw) {
            DeltaRecord::Message(record) => {
                assert!(record.subject.is_none());
                assert!(record.body.is_none());
                assert!(record.from.is_none());
                assert!(record.to_recipients.is_empty());
                assert!(record.received_at.is_none());
            }
            DeltaRecord::Removed { .. } => panic!("expected message record"),
        }
    }

    #[test]
    fn test_delta_page_links() {
        let page: DeltaPage = serde_json::from_str(
            r#"{
                "value": [],
                "@odata.deltaLink": "https://graph.microsoft.com/v1.0/me/mailFolders/inbox/messages/delta?$deltatoken=abc"
            }"#,
        )
        .unwrap();

        assert!(page.value.is_empty());
        assert!(page.next_link.is_none());
        assert!(page.delta_link.unwrap().contains("deltatoken=abc"));
    }

    #[test]
    fn test_attachment_meta_defaults() {
        let meta: AttachmentMeta = serde_json::from_str(r#"{"name": "report.pdf"}"#).unwrap();
        assert_eq!(meta.name, "report.pdf");
        assert!(meta.content_type.is_empty());
        assert!(meta.size.is_none());
    }
}
