//! Shared `SQLite` store and schema.
//!
//! One pool is shared across every repository so foreign-key cascades
//! (user → thread → email → attachment, thread → insight) operate on a
//! single database.

use std::path::PathBuf;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::email::EmailRepository;
use crate::insight::InsightRepository;
use crate::thread::ThreadRepository;
use crate::user::UserRepository;
use crate::Result;

/// Shared store handle owning the connection pool.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (or create) the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema
    /// creation fails.
    pub async fn new(database_path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{database_path}"))?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    /// Create an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema
    /// creation fails.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    /// Default database location under the platform data directory.
    #[must_use]
    pub fn default_database_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("mailsense").join("mailsense.db"))
    }

    /// Initialize database schema.
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                name TEXT,
                delta_link TEXT,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS threads (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                conversation_id TEXT NOT NULL,
                subject TEXT NOT NULL DEFAULT '',
                last_message_at TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(user_id, conversation_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS emails (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                message_id TEXT NOT NULL UNIQUE,
                thread_id INTEGER NOT NULL REFERENCES threads(id) ON DELETE CASCADE,
                user_id TEXT NOT NULL,
                from_address TEXT NOT NULL DEFAULT '',
                from_name TEXT,
                to_recipients TEXT NOT NULL DEFAULT '[]',
                cc_recipients TEXT NOT NULL DEFAULT '[]',
                subject TEXT NOT NULL DEFAULT '',
                body TEXT NOT NULL DEFAULT '',
                received_at TEXT NOT NULL,
                attachment_count INTEGER NOT NULL DEFAULT 0
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS attachments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email_id INTEGER NOT NULL REFERENCES emails(id) ON DELETE CASCADE,
                filename TEXT NOT NULL DEFAULT '',
                mime_type TEXT NOT NULL DEFAULT '',
                size INTEGER
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS thread_insights (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                thread_id INTEGER NOT NULL UNIQUE REFERENCES threads(id) ON DELETE CASCADE,
                summary TEXT NOT NULL,
                participants TEXT NOT NULL DEFAULT '[]',
                topics TEXT NOT NULL DEFAULT '[]',
                action_items TEXT NOT NULL DEFAULT '[]',
                urgency TEXT NOT NULL DEFAULT 'low',
                requires_response INTEGER NOT NULL DEFAULT 0,
                attachment_overview TEXT NOT NULL DEFAULT '{}',
                generated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        // Indexes for the hot lookups
        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_threads_user_activity
            ON threads(user_id, last_message_at)
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_emails_thread
            ON emails(thread_id, received_at)
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Repository over the `users` table.
    #[must_use]
    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    /// Repository over the `threads` table.
    #[must_use]
    pub fn threads(&self) -> ThreadRepository {
        ThreadRepository::new(self.pool.clone())
    }

    /// Repository over the `emails` and `attachments` tables.
    #[must_use]
    pub fn emails(&self) -> EmailRepository {
        EmailRepository::new(self.pool.clone())
    }

    /// Repository over the `thread_insights` table.
    #[must_use]
    pub fn insights(&self) -> InsightRepository {
        InsightRepository::new(self.pool.clone())
    }
}
