//! User storage repository.

use sqlx::Row;
use sqlx::sqlite::SqlitePool;
use tracing::warn;

use super::model::{User, UserProfile};
use crate::Result;

/// Repository for user storage and the sync cursor.
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a repository over the shared pool.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Upsert the user row from a verified identity profile.
    ///
    /// A stale row holding the same email under a different provider id
    /// (a re-created identity account) is evicted first; the email
    /// column is unique and the old row's threads are dead weight.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn upsert_profile(&self, profile: &UserProfile) -> Result<()> {
        let stale = sqlx::query("SELECT id FROM users WHERE email = ? AND id != ?")
            .bind(&profile.email)
            .bind(&profile.user_id)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = stale {
            let stale_id: String = row.get("id");
            warn!(email = %profile.email, %stale_id, "evicting stale user row for re-created identity");
            sqlx::query("DELETE FROM users WHERE id = ?")
                .bind(&stale_id)
                .execute(&self.pool)
                .await?;
        }

        sqlx::query(
            r"
            INSERT INTO users (id, email, name)
            VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                email = excluded.email,
                name = excluded.name,
                updated_at = CURRENT_TIMESTAMP
            ",
        )
        .bind(&profile.user_id)
        .bind(&profile.email)
        .bind(&profile.name)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a user by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, user_id: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, email, name, delta_link FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| User {
            id: row.get("id"),
            email: row.get("email"),
            name: row.get("name"),
            delta_link: row.get("delta_link"),
        }))
    }

    /// Get the stored sync cursor for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn delta_link(&self, user_id: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT delta_link FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.and_then(|row| row.get("delta_link")))
    }

    /// Persist the sync cursor.
    ///
    /// Called once per successful pass, after the batch's mutations are
    /// applied. Runs even when the batch was empty, because the remote
    /// feed still advances its position.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn set_delta_link(&self, user_id: &str, delta_link: &str) -> Result<()> {
        sqlx::query(
            "UPDATE users SET delta_link = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        )
        .bind(delta_link)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Store;

    #[tokio::test]
    async fn test_upsert_and_get() {
        let store = Store::in_memory().await.unwrap();
        let repo = store.users();

        let profile = UserProfile::new("user-1", "alice@example.com").with_name("Alice");
        repo.upsert_profile(&profile).await.unwrap();

        let user = repo.get("user-1").await.unwrap().unwrap();
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.name.as_deref(), Some("Alice"));
        assert!(user.delta_link.is_none());
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_and_updates_fields() {
        let store = Store::in_memory().await.unwrap();
        let repo = store.users();

        repo.upsert_profile(&UserProfile::new("user-1", "alice@example.com"))
            .await
            .unwrap();
        repo.upsert_profile(&UserProfile::new("user-1", "alice@new.example.com").with_name("A."))
            .await
            .unwrap();

        let user = repo.get("user-1").await.unwrap().unwrap();
        assert_eq!(user.email, "alice@new.example.com");
        assert_eq!(user.name.as_deref(), Some("A."));
    }

    #[tokio::test]
    async fn test_stale_identity_row_is_evicted() {
        let store = Store::in_memory().await.unwrap();
        let repo = store.users();

        repo.upsert_profile(&UserProfile::new("old-id", "alice@example.com"))
            .await
            .unwrap();
        repo.upsert_profile(&UserProfile::new("new-id", "alice@example.com"))
            .await
            .unwrap();

        assert!(repo.get("old-id").await.unwrap().is_none());
        assert!(repo.get("new-id").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_cursor_roundtrip() {
        let store = Store::in_memory().await.unwrap();
        let repo = store.users();

        repo.upsert_profile(&UserProfile::new("user-1", "alice@example.com"))
            .await
            .unwrap();
        assert!(repo.delta_link("user-1").await.unwrap().is_none());

        repo.set_delta_link("user-1", "https://feed/delta?token=t1")
            .await
            .unwrap();
        assert_eq!(
            repo.delta_link("user-1").await.unwrap().as_deref(),
            Some("https://feed/delta?token=t1")
        );
    }
}
