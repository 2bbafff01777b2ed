//! Insight storage repository.

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::SqlitePool;

use super::model::{Insight, InsightDraft, Urgency};
use crate::Result;
use crate::thread::ThreadId;

/// Repository for cached thread insights.
pub struct InsightRepository {
    pool: SqlitePool,
}

impl InsightRepository {
    /// Create a repository over the shared pool.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the cached insight for a thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, thread_id: ThreadId) -> Result<Option<Insight>> {
        let row = sqlx::query(
            r"
            SELECT thread_id, summary, participants, topics, action_items,
                   urgency, requires_response, attachment_overview, generated_at
            FROM thread_insights
            WHERE thread_id = ?
            ",
        )
        .bind(thread_id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().and_then(row_to_insight))
    }

    /// Replace the thread's insight with a freshly generated one.
    ///
    /// `generated_at` is the as-of marker: the received timestamp of
    /// the newest email the draft reflects.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn replace(
        &self,
        thread_id: ThreadId,
        draft: &InsightDraft,
        generated_at: DateTime<Utc>,
    ) -> Result<Insight> {
        sqlx::query(
            r"
            INSERT INTO thread_insights
                (thread_id, summary, participants, topics, action_items,
                 urgency, requires_response, attachment_overview, generated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(thread_id) DO UPDATE SET
                summary = excluded.summary,
                participants = excluded.participants,
                topics = excluded.topics,
                action_items = excluded.action_items,
                urgency = excluded.urgency,
                requires_response = excluded.requires_response,
                attachment_overview = excluded.attachment_overview,
                generated_at = excluded.generated_at
            ",
        )
        .bind(thread_id.0)
        .bind(&draft.summary)
        .bind(serde_json::to_string(&draft.participants)?)
        .bind(serde_json::to_string(&draft.topics)?)
        .bind(serde_json::to_string(&draft.action_items)?)
        .bind(draft.urgency.as_str())
        .bind(draft.requires_response)
        .bind(serde_json::to_string(&draft.attachment_overview)?)
        .bind(generated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(Insight {
            thread_id,
            summary: draft.summary.clone(),
            participants: draft.participants.clone(),
            topics: draft.topics.clone(),
            action_items: draft.action_items.clone(),
            urgency: draft.urgency,
            requires_response: draft.requires_response,
            attachment_overview: draft.attachment_overview.clone(),
            generated_at,
        })
    }
}

/// Convert a database row to an Insight.
fn row_to_insight(row: &sqlx::sqlite::SqliteRow) -> Option<Insight> {
    let generated_at_str: String = row.get("generated_at");
    let generated_at = DateTime::parse_from_rfc3339(&generated_at_str)
        .ok()?
        .with_timezone(&Utc);

    let participants: String = row.get("participants");
    let topics: String = row.get("topics");
    let action_items: String = row.get("action_items");
    let overview: String = row.get("attachment_overview");
    let urgency: String = row.get("urgency");

    Some(Insight {
        thread_id: ThreadId(row.get("thread_id")),
        summary: row.get("summary"),
        participants: serde_json::from_str(&participants).unwrap_or_default(),
        topics: serde_json::from_str(&topics).unwrap_or_default(),
        action_items: serde_json::from_str(&action_items).unwrap_or_default(),
        urgency: Urgency::from_str_lossy(&urgency),
        requires_response: row.get::<bool, _>("requires_response"),
        attachment_overview: serde_json::from_str(&overview).unwrap_or_default(),
        generated_at,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Store;
    use crate::insight::{ActionItem, AttachmentOverview};
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

    fn sample_draft() -> InsightDraft {
        InsightDraft {
            summary: "Budget discussion; awaiting sign-off.".to_string(),
            participants: vec!["Alice".to_string(), "Bob".to_string()],
            topics: vec!["budget".to_string()],
            action_items: vec![ActionItem {
                task: "Approve Q3 numbers".to_string(),
                owner: "Alice".to_string(),
            }],
            urgency: Urgency::Medium,
            requires_response: true,
            attachment_overview: AttachmentOverview {
                count: 1,
                types: vec!["pdf".to_string()],
                mentions: vec!["budget sheet".to_string()],
            },
        }
    }

    #[tokio::test]
    async fn test_replace_and_get() {
        let store = Store::in_memory().await.unwrap();
        let thread_id = seed_thread(&store).await;
        let repo = store.insights();

        let as_of = Utc::now();
        repo.replace(thread_id, &sample_draft(), as_of).await.unwrap();

        let insight = repo.get(thread_id).await.unwrap().unwrap();
        assert_eq!(insight.summary, "Budget discussion; awaiting sign-off.");
        assert_eq!(insight.participants.len(), 2);
        assert_eq!(insight.urgency, Urgency::Medium);
        assert!(insight.requires_response);
        assert_eq!(insight.attachment_overview.count, 1);
        assert_eq!(insight.generated_at.timestamp(), as_of.timestamp());
    }

    #[tokio::test]
    async fn test_replace_overwrites_never_accumulates() {
        let store = Store::in_memory().await.unwrap();
        let thread_id = seed_thread(&store).await;
        let repo = store.insights();

        repo.replace(thread_id, &sample_draft(), Utc::now())
            .await
            .unwrap();

        let mut second = sample_draft();
        second.summary = "Signed off.".to_string();
        second.urgency = Urgency::Low;
        repo.replace(thread_id, &second, Utc::now()).await.unwrap();

        let insight = repo.get(thread_id).await.unwrap().unwrap();
        assert_eq!(insight.summary, "Signed off.");
        assert_eq!(insight.urgency, Urgency::Low);
    }

    #[tokio::test]
    async fn test_missing_insight_is_none() {
        let store = Store::in_memory().await.unwrap();
        let thread_id = seed_thread(&store).await;
        assert!(store.insights().get(thread_id).await.unwrap().is_none());
    }
}
