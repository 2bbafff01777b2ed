//! Abstraction over the remote delta feed.
//!
//! The sync engine is generic over this trait so tests can drive it
//! with a scripted feed; production wires in
//! [`mailsense_graph::GraphClient`].

use mailsense_graph::{AttachmentMeta, DeltaBatch, GraphClient};

/// A paginated, token-based delta feed of mailbox changes.
pub trait MailFeed {
    /// Pull one flattened delta batch, resuming from `cursor` if given.
    fn fetch_delta(
        &self,
        access_token: &str,
        cursor: Option<&str>,
    ) -> impl Future<Output = mailsense_graph::Result<DeltaBatch>> + Send;

    /// Fetch attachment metadata for one message.
    ///
    /// Implementations degrade to an empty list on failure; a missing
    /// attachment list must never abort a sync pass.
    fn fetch_attachments(
        &self,
        access_token: &str,
        message_id: &str,
    ) -> impl Future<Output = Vec<AttachmentMeta>> + Send;
}

impl MailFeed for GraphClient {
    async fn fetch_delta(
        &self,
        access_token: &str,
        cursor: Option<&str>,
    ) -> mailsense_graph::Result<DeltaBatch> {
        Self::fetch_delta(self, access_token, cursor).await
    }

    async fn fetch_attachments(&self, access_token: &str, message_id: &str) -> Vec<AttachmentMeta> {
        Self::fetch_attachments(self, access_token, message_id).await
    }
}
