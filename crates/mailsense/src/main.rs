//! `MailSense` - incremental mailbox sync with thread aggregation
//!
//! Runs one sync pass against the configured mailbox, then prints the
//! resulting thread list. Configuration comes from the environment:
//!
//! - `MAILSENSE_TOKEN`   bearer token for the mail provider (required)
//! - `MAILSENSE_USER_ID` provider account id (required)
//! - `MAILSENSE_EMAIL`   account email address (required)
//! - `MAILSENSE_NAME`    account display name (optional)
//! - `MAILSENSE_DB`      database path (defaults to the platform data dir)

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mailsense_core::{Store, SyncService, UserProfile};
use mailsense_graph::GraphClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailsense=info,mailsense_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let profile = profile_from_env()?;
    let token = std::env::var("MAILSENSE_TOKEN").ok();

    let db_path = database_path()?;
    if let Some(parent) = std::path::Path::new(&db_path).parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating data directory {}", parent.display()))?;
    }

    info!(%db_path, "opening store");
    let store = Store::new(&db_path).await?;

    let service = SyncService::new(&store, GraphClient::new());
    let report = service.sync_mailbox(&profile, token.as_deref()).await?;

    println!(
        "Synced {} emails ({} deleted, {} attachments) across {} new and {} updated threads ({} sync)",
        report.emails_synced,
        report.emails_deleted,
        report.attachments_synced,
        report.threads_created,
        report.threads_updated,
        if report.incremental { "incremental" } else { "full" },
    );

    let threads = store.threads().list(&profile.user_id).await?;
    println!("\n{} threads:", threads.len());
    for thread in threads {
        println!(
            "  [{}] {} ({} emails, {} attachments{})",
            thread.last_message_at.format("%Y-%m-%d %H:%M"),
            thread.subject,
            thread.email_count,
            thread.attachment_count,
            if thread.has_insight {
                ", insight cached"
            } else {
                ""
            },
        );
    }

    Ok(())
}

/// Build the user profile from required environment variables.
fn profile_from_env() -> anyhow::Result<UserProfile> {
    let user_id = std::env::var("MAILSENSE_USER_ID").context("MAILSENSE_USER_ID is not set")?;
    let email = std::env::var("MAILSENSE_EMAIL").context("MAILSENSE_EMAIL is not set")?;

    let profile = UserProfile::new(user_id, email);
    Ok(match std::env::var("MAILSENSE_NAME") {
        Ok(name) => profile.with_name(name),
        Err(_) => profile,
    })
}

/// Database path from the environment or the platform default.
fn database_path() -> anyhow::Result<String> {
    if let Ok(path) = std::env::var("MAILSENSE_DB") {
        return Ok(path);
    }
    let path = Store::default_database_path().context("no platform data directory available")?;
    Ok(path.display().to_string())
}
