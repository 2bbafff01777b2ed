//! The sequential per-user sync pass.

use std::collections::HashSet;

use tracing::{debug, info};

use super::lock::SyncLocks;
use super::reconcile;
use crate::email::{Attachment, EmailRepository};
use crate::feed::MailFeed;
use crate::store::Store;
use crate::thread::{ThreadId, ThreadRepository};
use crate::user::{UserProfile, UserRepository};
use crate::{Error, Result};
use mailsense_graph::{AttachmentMeta, MessageRecord};

/// Counts reported by one sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Threads newly created.
    pub threads_created: u64,
    /// Threads that already existed and were touched.
    pub threads_updated: u64,
    /// Emails persisted.
    pub emails_synced: u64,
    /// Emails deleted from removal markers.
    pub emails_deleted: u64,
    /// Attachments persisted.
    pub attachments_synced: u64,
    /// Whether this pass resumed from a stored cursor.
    pub incremental: bool,
}

/// Drives the full sync pass: fetch, reconcile, delete, prune,
/// aggregate, persist, and finally advance the cursor.
pub struct SyncService<F> {
    feed: F,
    users: UserRepository,
    threads: ThreadRepository,
    emails: EmailRepository,
    locks: SyncLocks,
}

impl<F: MailFeed> SyncService<F> {
    /// Create a service over the store and a delta feed.
    #[must_use]
    pub fn new(store: &Store, feed: F) -> Self {
        Self {
            feed,
            users: store.users(),
            threads: store.threads(),
            emails: store.emails(),
            locks: SyncLocks::new(),
        }
    }

    /// Run one sync pass for a user.
    ///
    /// Passes for the same user are serialized on a per-user lock; the
    /// resume cursor is only advanced after every mutation of the batch
    /// has been applied, so a failed pass resumes from the last
    /// committed cursor and redelivered records are absorbed by
    /// message-id dedup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] when no token is supplied,
    /// [`Error::AccessDenied`] when the provider rejects it, and feed
    /// or database errors otherwise. In every error case the stored
    /// cursor is left at its last committed value.
    pub async fn sync_mailbox(
        &self,
        profile: &UserProfile,
        access_token: Option<&str>,
    ) -> Result<SyncReport> {
        let access_token = access_token.ok_or(Error::NotConnected)?;
        let _guard = self.locks.acquire(&profile.user_id).await;
        let user_id = profile.user_id.as_str();

        self.users.upsert_profile(profile).await?;

        let cursor = self.users.delta_link(user_id).await?;
        let incremental = cursor.is_some();
        let batch = self.feed.fetch_delta(access_token, cursor.as_deref()).await?;

        info!(
            user_id,
            records = batch.records.len(),
            incremental,
            "{} sync",
            if incremental { "incremental" } else { "full" }
        );

        let partitioned = reconcile::partition(batch.records);

        let mut report = SyncReport {
            incremental,
            ..SyncReport::default()
        };

        // Deletions first, then pruning, so a thread that lost its last
        // email in this same pass does not linger in listings.
        let mut touched_threads: HashSet<ThreadId> = HashSet::new();
        for message_id in &partitioned.removed {
            if let Some(thread_id) = self
                .emails
                .delete_by_message_id(user_id, message_id)
                .await?
            {
                report.emails_deleted += 1;
                touched_threads.insert(thread_id);
            }
        }
        self.threads.prune_empty(user_id).await?;
        for thread_id in touched_threads {
            // No-op for pruned threads; survivors get their subject and
            // last-activity recomputed from the remaining emails.
            self.threads.refresh_from_emails(thread_id).await?;
        }

        let groups = reconcile::group_by_conversation(partitioned.present);
        for (conversation_id, records) in groups {
            self.sync_conversation(user_id, access_token, &conversation_id, records, &mut report)
                .await?;
        }

        // Cursor last: advancing it before this point could skip the
        // batch on a crashed pass.
        self.users.set_delta_link(user_id, &batch.delta_link).await?;

        info!(
            user_id,
            threads_created = report.threads_created,
            threads_updated = report.threads_updated,
            emails_synced = report.emails_synced,
            emails_deleted = report.emails_deleted,
            attachments_synced = report.attachments_synced,
            "sync complete"
        );

        Ok(report)
    }

    /// Upsert one conversation's thread and persist its staged emails.
    async fn sync_conversation(
        &self,
        user_id: &str,
        access_token: &str,
        conversation_id: &str,
        records: Vec<MessageRecord>,
        report: &mut SyncReport,
    ) -> Result<()> {
        // Records arrive sorted newest first; the head supplies the
        // thread's display subject and last-activity value.
        let Some(latest) = records.first() else {
            return Ok(());
        };

        let upsert = self
            .threads
            .upsert(
                user_id,
                conversation_id,
                &reconcile::subject_or_placeholder(latest),
                reconcile::received_or_epoch(latest),
            )
            .await?;
        if upsert.created {
            report.threads_created += 1;
        } else {
            report.threads_updated += 1;
        }

        for record in records {
            if self.emails.exists(&record.id).await? {
                debug!(message_id = %record.id, "skipping already-stored message");
                continue;
            }

            let attachments = self.resolve_attachments(access_token, &record).await;
            let email = reconcile::normalize(user_id, record);
            self.emails.create(upsert.id, &email, &attachments).await?;

            report.emails_synced += 1;
            report.attachments_synced += attachments.len() as u64;
        }

        Ok(())
    }

    /// Attachment metadata for one record: inline when the feed
    /// embedded it, otherwise one round trip, skipped entirely when
    /// the record says it has none.
    async fn resolve_attachments(
        &self,
        access_token: &str,
        record: &MessageRecord,
    ) -> Vec<Attachment> {
        let metas: Vec<AttachmentMeta> = match &record.attachments {
            Some(inline) => inline.clone(),
            None if record.has_attachments == Some(false) => Vec::new(),
            None => self.feed.fetch_attachments(access_token, &record.id).await,
        };

        metas
            .into_iter()
            .map(|meta| Attachment {
                filename: meta.name,
                mime_type: meta.content_type,
                size: meta.size,
            })
            .collect()
    }
}
