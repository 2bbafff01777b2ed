//! Email and attachment storage repository.

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::SqlitePool;

use super::model::{Attachment, Email, EmailId, EmailWithAttachments, NewEmail, Recipient};
use crate::Result;
use crate::thread::ThreadId;

/// Repository for stored emails and their attachments.
pub struct EmailRepository {
    pool: SqlitePool,
}

impl EmailRepository {
    /// Create a repository over the shared pool.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Whether an email with this provider message id is already stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn exists(&self, message_id: &str) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM emails WHERE message_id = ?")
            .bind(message_id)
            .fetch_one(&self.pool)
            .await?;

        let count: i64 = row.get("count");
        Ok(count > 0)
    }

    /// Persist a staged email with its attachments under a thread.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails, including a unique
    /// violation when the message id is already stored; callers are
    /// expected to check [`Self::exists`] first.
    pub async fn create(
        &self,
        thread_id: ThreadId,
        email: &NewEmail,
        attachments: &[Attachment],
    ) -> Result<EmailId> {
        let to_json = serde_json::to_string(&email.to_recipients)?;
        let cc_json = serde_json::to_string(&email.cc_recipients)?;

        let result = sqlx::query(
            r"
            INSERT INTO emails
                (message_id, thread_id, user_id, from_address, from_name,
                 to_recipients, cc_recipients, subject, body, received_at, attachment_count)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(&email.message_id)
        .bind(thread_id.0)
        .bind(&email.user_id)
        .bind(&email.from_address)
        .bind(&email.from_name)
        .bind(to_json)
        .bind(cc_json)
        .bind(&email.subject)
        .bind(&email.body)
        .bind(email.received_at.to_rfc3339())
        .bind(attachments.len() as i64)
        .execute(&self.pool)
        .await?;

        let email_id = EmailId(result.last_insert_rowid());

        for attachment in attachments {
            sqlx::query(
                "INSERT INTO attachments (email_id, filename, mime_type, size) VALUES (?, ?, ?, ?)",
            )
            .bind(email_id.0)
            .bind(&attachment.filename)
            .bind(&attachment.mime_type)
            .bind(attachment.size)
            .execute(&self.pool)
            .await?;
        }

        Ok(email_id)
    }

    /// Delete the email with this provider message id, scoped to a user.
    ///
    /// Attachments go with it via the foreign-key cascade. Returns the
    /// id of the thread that lost the email, if one was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn delete_by_message_id(
        &self,
        user_id: &str,
        message_id: &str,
    ) -> Result<Option<ThreadId>> {
        let row = sqlx::query("SELECT thread_id FROM emails WHERE message_id = ? AND user_id = ?")
            .bind(message_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let thread_id = ThreadId(row.get("thread_id"));

        sqlx::query("DELETE FROM emails WHERE message_id = ? AND user_id = ?")
            .bind(message_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(Some(thread_id))
    }

    /// All emails of a thread, newest first, with their attachments.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn list_for_thread(&self, thread_id: ThreadId) -> Result<Vec<EmailWithAttachments>> {
        let rows = sqlx::query(
            r"
            SELECT id, message_id, thread_id, from_address, from_name,
                   to_recipients, cc_recipients, subject, body, received_at, attachment_count
            FROM emails
            WHERE thread_id = ?
            ORDER BY received_at DESC
            ",
        )
        .bind(thread_id.0)
        .fetch_all(&self.pool)
        .await?;

        let mut emails = Vec::with_capacity(rows.len());
        for row in &rows {
            let Some(email) = row_to_email(row) else {
                continue;
            };
            let attachments = self.attachments_for(email.id).await?;
            emails.push(EmailWithAttachments { email, attachments });
        }

        Ok(emails)
    }

    /// Attachment rows for one email.
    async fn attachments_for(&self, email_id: EmailId) -> Result<Vec<Attachment>> {
        let rows =
            sqlx::query("SELECT filename, mime_type, size FROM attachments WHERE email_id = ?")
                .bind(email_id.0)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .iter()
            .map(|row| Attachment {
                filename: row.get("filename"),
                mime_type: row.get("mime_type"),
                size: row.get("size"),
            })
            .collect())
    }
}

/// Convert a database row to an Email.
fn row_to_email(row: &sqlx::sqlite::SqliteRow) -> Option<Email> {
    let received_at_str: String = row.get("received_at");
    let received_at = DateTime::parse_from_rfc3339(&received_at_str)
        .ok()?
        .with_timezone(&Utc);

    let to_json: String = row.get("to_recipients");
    let cc_json: String = row.get("cc_recipients");
    let to_recipients: Vec<Recipient> = serde_json::from_str(&to_json).unwrap_or_default();
    let cc_recipients: Vec<Recipient> = serde_json::from_str(&cc_json).unwrap_or_default();

    Some(Email {
        id: EmailId(row.get("id")),
        message_id: row.get("message_id"),
        thread_id: ThreadId(row.get("thread_id")),
        from_address: row.get("from_address"),
        from_name: row.get("from_name"),
        to_recipients,
        cc_recipients,
        subject: row.get("subject"),
        body: row.get("body"),
        received_at,
        attachment_count: row.get("attachment_count"),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Store;
    use crate::user::UserProfile;

    async fn seed_thread(store: &Store) -> ThreadId {
        store
            .users()
            .upsert_profile(&UserProfile::new("user-1", "alice@example.com"))
            .await
            .unwrap();
        store
            .threads()
            .upsert("user-1", "conv-1", "Subject", Utc::now())
            .await
            .unwrap()
            .id
    }

    fn sample_email(message_id: &str) -> NewEmail {
        NewEmail {
            message_id: message_id.to_string(),
            user_id: "user-1".to_string(),
            from_address: "bob@example.com".to_string(),
            from_name: Some("Bob".to_string()),
            to_recipients: vec![Recipient {
                address: "alice@example.com".to_string(),
                name: Some("Alice".to_string()),
            }],
            cc_recipients: Vec::new(),
            subject: "Hello".to_string(),
            body: "Body text".to_string(),
            received_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let store = Store::in_memory().await.unwrap();
        let thread_id = seed_thread(&store).await;
        let repo = store.emails();

        let attachments = vec![Attachment {
            filename: "report.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            size: Some(2048),
        }];
        repo.create(thread_id, &sample_email("msg-1"), &attachments)
            .await
            .unwrap();

        let emails = repo.list_for_thread(thread_id).await.unwrap();
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].email.message_id, "msg-1");
        assert_eq!(emails[0].email.attachment_count, 1);
        assert_eq!(emails[0].attachments[0].filename, "report.pdf");
        assert_eq!(
            emails[0].email.to_recipients[0].address,
            "alice@example.com"
        );
    }

    #[tokio::test]
    async fn test_exists_after_create() {
        let store = Store::in_memory().await.unwrap();
        let thread_id = seed_thread(&store).await;
        let repo = store.emails();

        assert!(!repo.exists("msg-1").await.unwrap());
        repo.create(thread_id, &sample_email("msg-1"), &[])
            .await
            .unwrap();
        assert!(repo.exists("msg-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_cascades_to_attachments() {
        let store = Store::in_memory().await.unwrap();
        let thread_id = seed_thread(&store).await;
        let repo = store.emails();

        let attachments = vec![Attachment {
            filename: "a.txt".to_string(),
            mime_type: "text/plain".to_string(),
            size: None,
        }];
        repo.create(thread_id, &sample_email("msg-1"), &attachments)
            .await
            .unwrap();

        let deleted_from = repo
            .delete_by_message_id("user-1", "msg-1")
            .await
            .unwrap();
        assert_eq!(deleted_from, Some(thread_id));
        assert!(!repo.exists("msg-1").await.unwrap());
        assert!(repo.list_for_thread(thread_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_is_scoped_to_user() {
        let store = Store::in_memory().await.unwrap();
        let thread_id = seed_thread(&store).await;
        let repo = store.emails();

        repo.create(thread_id, &sample_email("msg-1"), &[])
            .await
            .unwrap();

        let deleted = repo
            .delete_by_message_id("other-user", "msg-1")
            .await
            .unwrap();
        assert!(deleted.is_none());
        assert!(repo.exists("msg-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_orders_newest_first() {
        let store = Store::in_memory().await.unwrap();
        let thread_id = seed_thread(&store).await;
        let repo = store.emails();

        let mut older = sample_email("msg-old");
        older.received_at = Utc::now() - chrono::Duration::hours(2);
        let mut newer = sample_email("msg-new");
        newer.received_at = Utc::now();

        repo.create(thread_id, &older, &[]).await.unwrap();
        repo.create(thread_id, &newer, &[]).await.unwrap();

        let emails = repo.list_for_thread(thread_id).await.unwrap();
        assert_eq!(emails[0].email.message_id, "msg-new");
        assert_eq!(emails[1].email.message_id, "msg-old");
    }
}
