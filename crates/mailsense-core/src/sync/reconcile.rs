//! Pure classification and normalization of delta records.
//!
//! Everything here is side-effect free so the classification rules are
//! testable without a store or a network.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::email::{NewEmail, Recipient};
use mailsense_graph::types::Recipient as WireRecipient;
use mailsense_graph::{DeltaRecord, MessageRecord};

/// Placeholder for messages arriving without a subject.
pub const NO_SUBJECT: &str = "(No Subject)";

/// Placeholder for messages arriving without a sender address.
pub const UNKNOWN_SENDER: &str = "unknown";

/// A delta batch split into live records and removal markers.
#[derive(Debug)]
pub struct PartitionedBatch {
    /// Live (created/updated) records.
    pub present: Vec<MessageRecord>,
    /// Provider message ids flagged as removed.
    pub removed: Vec<String>,
}

/// Split a batch into removals and live records.
#[must_use]
pub fn partition(records: Vec<DeltaRecord>) -> PartitionedBatch {
    let mut present = Vec::new();
    let mut removed = Vec::new();

    for record in records {
        match record {
            DeltaRecord::Removed { id } => removed.push(id),
            DeltaRecord::Message(message) => present.push(*message),
        }
    }

    PartitionedBatch { present, removed }
}

/// Group live records by conversation key, each group sorted newest
/// first.
///
/// Records without a conversation key cannot be threaded and are
/// dropped here.
#[must_use]
pub fn group_by_conversation(records: Vec<MessageRecord>) -> BTreeMap<String, Vec<MessageRecord>> {
    let mut groups: BTreeMap<String, Vec<MessageRecord>> = BTreeMap::new();
    let mut dropped = 0usize;

    for record in records {
        match record.conversation_id.clone() {
            Some(key) => groups.entry(key).or_default().push(record),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!(dropped, "dropped records without a conversation key");
    }

    for group in groups.values_mut() {
        group.sort_by(|a, b| received_or_epoch(b).cmp(&received_or_epoch(a)));
    }

    groups
}

/// Received timestamp with a deterministic floor for malformed records.
#[must_use]
pub fn received_or_epoch(record: &MessageRecord) -> DateTime<Utc> {
    record.received_at.unwrap_or(DateTime::UNIX_EPOCH)
}

/// Display subject with the missing-subject placeholder applied.
#[must_use]
pub fn subject_or_placeholder(record: &MessageRecord) -> String {
    record
        .subject
        .clone()
        .unwrap_or_else(|| NO_SUBJECT.to_string())
}

/// Normalize a live record into a storable email.
///
/// Every optional remote field gets its documented default exactly
/// once, here: missing subject becomes [`NO_SUBJECT`], missing body
/// becomes empty, missing sender address becomes [`UNKNOWN_SENDER`],
/// and missing recipient lists become empty lists.
#[must_use]
pub fn normalize(user_id: &str, record: MessageRecord) -> NewEmail {
    let received_at = received_or_epoch(&record);
    let subject = subject_or_placeholder(&record);

    let (from_address, from_name) = record.from.map_or_else(
        || (UNKNOWN_SENDER.to_string(), None),
        |from| {
            (
                from.address
                    .filter(|a| !a.is_empty())
                    .unwrap_or_else(|| UNKNOWN_SENDER.to_string()),
                from.name,
            )
        },
    );

    NewEmail {
        message_id: record.id,
        user_id: user_id.to_string(),
        from_address,
        from_name,
        to_recipients: map_recipients(&record.to_recipients),
        cc_recipients: map_recipients(&record.cc_recipients),
        subject,
        body: record.body.unwrap_or_default(),
        received_at,
    }
}

/// Flatten wire recipients into stored address/name pairs.
fn map_recipients(recipients: &[WireRecipient]) -> Vec<Recipient> {
    recipients
        .iter()
        .map(|r| Recipient {
            address: r.email_address.address.clone().unwrap_or_default(),
            name: r.email_address.name.clone(),
        })
        .collect()
}
