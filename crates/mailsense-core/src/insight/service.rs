//! Insight resolution service: gate, regeneration, and persistence.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::gate::resolve_insight;
use super::model::{Insight, InsightDraft};
use super::repository::InsightRepository;
use crate::email::{EmailRepository, EmailWithAttachments};
use crate::store::Store;
use crate::thread::{ThreadId, ThreadRepository};
use crate::{Error, Result};

/// Longest body prefix handed to the summarizer, in characters.
const BODY_PREVIEW_LIMIT: usize = 2000;

/// External summarizer collaborator.
///
/// Receives the full ordered message set of a thread and produces a
/// draft insight, or `None` on failure or empty output. Either way the
/// caller degrades to "no insight available" rather than erroring.
pub trait Summarizer {
    /// Summarize one thread.
    fn summarize(
        &self,
        context: &ThreadContext,
    ) -> impl Future<Output = Option<InsightDraft>> + Send;
}

/// One email prepared for the summarizer.
#[derive(Debug, Clone)]
pub struct ContextEmail {
    /// Sender address.
    pub from_address: String,
    /// Sender display name.
    pub from_name: Option<String>,
    /// Subject line.
    pub subject: String,
    /// Body, truncated to a bounded prefix.
    pub body: String,
    /// Received timestamp.
    pub received_at: DateTime<Utc>,
    /// Attachment `(filename, mime_type)` pairs.
    pub attachments: Vec<(String, String)>,
}

/// The ordered message set handed to the summarizer, newest first.
#[derive(Debug, Clone)]
pub struct ThreadContext {
    /// Thread display subject.
    pub subject: String,
    /// Member emails, newest first.
    pub emails: Vec<ContextEmail>,
}

/// Resolves thread insights against the staleness gate.
pub struct InsightService<S> {
    threads: ThreadRepository,
    emails: EmailRepository,
    insights: InsightRepository,
    summarizer: S,
}

impl<S: Summarizer> InsightService<S> {
    /// Create a service over the store and an external summarizer.
    #[must_use]
    pub fn new(store: &Store, summarizer: S) -> Self {
        Self {
            threads: store.threads(),
            emails: store.emails(),
            insights: store.insights(),
            summarizer,
        }
    }

    /// Resolve the insight for a thread.
    ///
    /// Serves the cached insight untouched while it is fresh; otherwise
    /// runs the summarizer over the thread's ordered messages and
    /// replaces the single cached row. A thread with no messages, or a
    /// summarizer that yields nothing, resolves to `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ThreadNotFound`] when the thread does not exist
    /// for this user, or a database error.
    pub async fn resolve(&self, user_id: &str, thread_id: ThreadId) -> Result<Option<Insight>> {
        let thread = self
            .threads
            .get(user_id, thread_id)
            .await?
            .ok_or(Error::ThreadNotFound(thread_id.0))?;

        let emails = self.emails.list_for_thread(thread_id).await?;
        if emails.is_empty() {
            return Ok(None);
        }
        let newest = emails[0].email.received_at;

        let stored = self.insights.get(thread_id).await?;
        let status = resolve_insight(Some(newest), stored);

        if !status.must_regenerate {
            debug!(%thread_id, "serving cached insight");
            return Ok(status.cached);
        }

        let context = build_context(&thread.subject, &emails);
        match self.summarizer.summarize(&context).await {
            Some(draft) => {
                let insight = self.insights.replace(thread_id, &draft, newest).await?;
                debug!(%thread_id, "insight regenerated");
                Ok(Some(insight))
            }
            None => {
                warn!(%thread_id, "summarizer yielded no insight");
                Ok(None)
            }
        }
    }
}

/// Assemble the summarizer input from stored emails.
fn build_context(subject: &str, emails: &[EmailWithAttachments]) -> ThreadContext {
    let context_emails = emails
        .iter()
        .map(|entry| ContextEmail {
            from_address: entry.email.from_address.clone(),
            from_name: entry.email.from_name.clone(),
            subject: entry.email.subject.clone(),
            body: truncate_body(&entry.email.body),
            received_at: entry.email.received_at,
            attachments: entry
                .attachments
                .iter()
                .map(|a| (a.filename.clone(), a.mime_type.clone()))
                .collect(),
        })
        .collect();

    ThreadContext {
        subject: subject.to_string(),
        emails: context_emails,
    }
}

/// Truncate a body to the preview limit on a character boundary.
fn truncate_body(body: &str) -> String {
    if body.chars().count() <= BODY_PREVIEW_LIMIT {
        return body.to_string();
    }
    body.chars().take(BODY_PREVIEW_LIMIT).collect()
}
