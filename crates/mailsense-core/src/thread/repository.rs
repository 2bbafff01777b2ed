//! Thread storage repository.

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::SqlitePool;
use tracing::debug;

use super::model::{Thread, ThreadDetail, ThreadId, ThreadSummary, ThreadUpsert};
use crate::Result;
use crate::email::EmailRepository;
use crate::insight::InsightRepository;

/// Repository for thread storage, pruning, and read projections.
pub struct ThreadRepository {
    pool: SqlitePool,
}

impl ThreadRepository {
    /// Create a repository over the shared pool.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Upsert the thread keyed on `(user_id, conversation_id)`.
    ///
    /// Subject and last-activity only move forward: a redelivered batch
    /// whose head message is older than the stored last activity leaves
    /// the row untouched, keeping both fields a function of the newest
    /// member email.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn upsert(
        &self,
        user_id: &str,
        conversation_id: &str,
        subject: &str,
        last_message_at: DateTime<Utc>,
    ) -> Result<ThreadUpsert> {
        let existing =
            sqlx::query("SELECT id FROM threads WHERE user_id = ? AND conversation_id = ?")
                .bind(user_id)
                .bind(conversation_id)
                .fetch_optional(&self.pool)
                .await?;
        let created = existing.is_none();

        sqlx::query(
            r"
            INSERT INTO threads (user_id, conversation_id, subject, last_message_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id, conversation_id) DO UPDATE SET
                subject = excluded.subject,
                last_message_at = excluded.last_message_at,
                updated_at = CURRENT_TIMESTAMP
            WHERE excluded.last_message_at >= threads.last_message_at
            ",
        )
        .bind(user_id)
        .bind(conversation_id)
        .bind(subject)
        .bind(last_message_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        let id = match existing {
            Some(row) => ThreadId(row.get("id")),
            None => {
                let row =
                    sqlx::query("SELECT id FROM threads WHERE user_id = ? AND conversation_id = ?")
                        .bind(user_id)
                        .bind(conversation_id)
                        .fetch_one(&self.pool)
                        .await?;
                ThreadId(row.get("id"))
            }
        };

        Ok(ThreadUpsert { id, created })
    }

    /// Delete every thread of the user that has no member emails.
    ///
    /// Runs strictly after message deletions within a sync pass, so a
    /// thread that lost its last message in the same pass does not
    /// linger. Returns the number of pruned threads.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn prune_empty(&self, user_id: &str) -> Result<u64> {
        let result = sqlx::query(
            r"
            DELETE FROM threads
            WHERE user_id = ?
              AND NOT EXISTS (SELECT 1 FROM emails WHERE emails.thread_id = threads.id)
            ",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        let pruned = result.rows_affected();
        if pruned > 0 {
            debug!(user_id, pruned, "pruned empty threads");
        }
        Ok(pruned)
    }

    /// Recompute subject and last-activity from the surviving emails.
    ///
    /// Used after deletions removed a thread's newest member; a no-op
    /// for threads that were pruned or never lost their head email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn refresh_from_emails(&self, thread_id: ThreadId) -> Result<()> {
        sqlx::query(
            r"
            UPDATE threads SET
                subject = (SELECT subject FROM emails
                           WHERE thread_id = threads.id
                           ORDER BY received_at DESC LIMIT 1),
                last_message_at = (SELECT MAX(received_at) FROM emails
                                   WHERE thread_id = threads.id),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
              AND EXISTS (SELECT 1 FROM emails WHERE thread_id = threads.id)
            ",
        )
        .bind(thread_id.0)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get one thread scoped to a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, user_id: &str, thread_id: ThreadId) -> Result<Option<Thread>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, conversation_id, subject, last_message_at
            FROM threads
            WHERE id = ? AND user_id = ?
            ",
        )
        .bind(thread_id.0)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().and_then(row_to_thread))
    }

    /// List the user's threads, most recent activity first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, user_id: &str) -> Result<Vec<ThreadSummary>> {
        let rows = sqlx::query(
            r"
            SELECT t.id, t.subject, t.last_message_at,
                   COUNT(e.id) AS email_count,
                   COALESCE(SUM(e.attachment_count), 0) AS attachment_count,
                   EXISTS(SELECT 1 FROM thread_insights i WHERE i.thread_id = t.id) AS has_insight
            FROM threads t
            LEFT JOIN emails e ON e.thread_id = t.id
            WHERE t.user_id = ?
            GROUP BY t.id
            ORDER BY t.last_message_at DESC
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let summaries = rows
            .iter()
            .filter_map(|row| {
                let last_message_at_str: String = row.get("last_message_at");
                let last_message_at = DateTime::parse_from_rfc3339(&last_message_at_str)
                    .ok()?
                    .with_timezone(&Utc);

                Some(ThreadSummary {
                    id: ThreadId(row.get("id")),
                    subject: row.get("subject"),
                    last_message_at,
                    email_count: row.get("email_count"),
                    attachment_count: row.get("attachment_count"),
                    has_insight: row.get::<bool, _>("has_insight"),
                })
            })
            .collect();

        Ok(summaries)
    }

    /// Full detail for one thread: emails newest first, attachments,
    /// and the cached insight if present.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn detail(&self, user_id: &str, thread_id: ThreadId) -> Result<Option<ThreadDetail>> {
        let Some(thread) = self.get(user_id, thread_id).await? else {
            return Ok(None);
        };

        let emails = EmailRepository::new(self.pool.clone())
            .list_for_thread(thread.id)
            .await?;
        let insight = InsightRepository::new(self.pool.clone())
            .get(thread.id)
            .await?;

        Ok(Some(ThreadDetail {
            id: thread.id,
            subject: thread.subject,
            last_message_at: thread.last_message_at,
            emails,
            insight,
        }))
    }
}

/// Convert a database row to a Thread.
fn row_to_thread(row: &sqlx::sqlite::SqliteRow) -> Option<Thread> {
    let last_message_at_str: String = row.get("last_message_at");
    let last_message_at = DateTime::parse_from_rfc3339(&last_message_at_str)
        .ok()?
        .with_timezone(&Utc);

    Some(Thread {
        id: ThreadId(row.get("id")),
        user_id: row.get("user_id"),
        conversation_id: row.get("conversation_id"),
        subject: row.get("subject"),
        last_message_at,
    })
}
