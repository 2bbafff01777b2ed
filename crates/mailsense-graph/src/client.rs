//! HTTP client for the Graph mail delta feed.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::types::{AttachmentMeta, DeltaBatch, DeltaPage, DeltaRecord};

/// Fields projected on the initial delta request.
const DELTA_SELECT: &str =
    "id,conversationId,subject,from,toRecipients,ccRecipients,body,receivedDateTime,hasAttachments";

/// Fields projected on attachment metadata requests.
const ATTACHMENT_SELECT: &str = "id,name,contentType,size";

/// Asks the provider for plain-text bodies instead of HTML.
const PREFER_TEXT_BODY: &str = "outlook.body-content-type=\"text\"";

/// Configuration for the delta-feed client.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// API base URL, without a trailing slash.
    pub base_url: String,
    /// Page size requested on the initial delta pull.
    pub page_size: u32,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: "https://graph.microsoft.com/v1.0".to_string(),
            page_size: 20,
        }
    }
}

/// Client for the provider's paginated delta protocol.
///
/// Holds no credentials; the caller passes a bearer token per call.
/// Transient failures are not retried here. The reconciler's dedup
/// makes redelivery of a failed batch safe, so retry policy stays with
/// the operator.
#[derive(Debug, Clone, Default)]
pub struct GraphClient {
    http: reqwest::Client,
    config: GraphConfig,
}

impl GraphClient {
    /// Create a client against the public Graph endpoint.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client with custom configuration.
    #[must_use]
    pub fn with_config(config: GraphConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Pull one delta batch.
    ///
    /// Without a cursor this starts a fresh sync from the inbox and
    /// returns the first page together with the cursor the provider
    /// issues for it. With a cursor it resumes from that token and
    /// follows next-page links internally until the provider hands out
    /// the final delta cursor, so the caller only ever sees a single
    /// flattened batch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccessDenied`] when the provider rejects the
    /// token, [`Error::Http`] for transport or server failures, and
    /// [`Error::MissingCursor`] when the response carries no
    /// continuation link.
    pub async fn fetch_delta(
        &self,
        access_token: &str,
        cursor: Option<&str>,
    ) -> Result<DeltaBatch> {
        let mut records: Vec<DeltaRecord> = Vec::new();

        let delta_link = if let Some(cursor) = cursor {
            let mut url = cursor.to_string();
            loop {
                let page: DeltaPage = self.get_json(access_token, &url).await?;
                records.extend(page.value.into_iter().map(DeltaRecord::from));

                if let Some(link) = page.delta_link {
                    break link;
                }
                url = page.next_link.ok_or(Error::MissingCursor)?;
            }
        } else {
            // Fresh sync: take the first page only. The provider's next
            // link doubles as the resume cursor, so the remaining pages
            // arrive on subsequent incremental passes.
            let url = format!(
                "{}/me/mailFolders/inbox/messages/delta?$select={}&$top={}",
                self.config.base_url, DELTA_SELECT, self.config.page_size
            );
            let page: DeltaPage = self.get_json(access_token, &url).await?;
            records.extend(page.value.into_iter().map(DeltaRecord::from));
            page.delta_link
                .or(page.next_link)
                .ok_or(Error::MissingCursor)?
        };

        debug!(
            records = records.len(),
            removed = records
                .iter()
                .filter(|r| matches!(r, DeltaRecord::Removed { .. }))
                .count(),
            "delta batch fetched"
        );

        Ok(DeltaBatch {
            records,
            delta_link,
        })
    }

    /// Fetch attachment metadata for one message.
    ///
    /// A remote failure here degrades to an empty list: a missing
    /// attachment list must not abort the surrounding sync pass.
    pub async fn fetch_attachments(
        &self,
        access_token: &str,
        message_id: &str,
    ) -> Vec<AttachmentMeta> {
        match self.try_fetch_attachments(access_token, message_id).await {
            Ok(attachments) => attachments,
            Err(error) => {
                warn!(message_id, %error, "attachment fetch failed, continuing without metadata");
                Vec::new()
            }
        }
    }

    async fn try_fetch_attachments(
        &self,
        access_token: &str,
        message_id: &str,
    ) -> Result<Vec<AttachmentMeta>> {
        let url = format!(
            "{}/me/messages/{}/attachments?$select={}",
            self.config.base_url, message_id, ATTACHMENT_SELECT
        );

        #[derive(serde::Deserialize)]
        struct AttachmentPage {
            #[serde(default)]
            value: Vec<AttachmentMeta>,
        }

        let page: AttachmentPage = self.get_json(access_token, &url).await?;
        Ok(page.value)
    }

    /// Issue an authenticated GET and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, access_token: &str, url: &str) -> Result<T> {
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .header("Prefer", PREFER_TEXT_BODY)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::AccessDenied {
                status: status.as_u16(),
            });
        }

        let response = response.error_for_status()?;
        Ok(response.json().await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_targets_public_endpoint() {
        let config = GraphConfig::default();
        assert_eq!(config.base_url, "https://graph.microsoft.com/v1.0");
        assert_eq!(config.page_size, 20);
    }

    #[test]
    fn test_initial_url_shape() {
        let config = GraphConfig::default();
        let url = format!(
            "{}/me/mailFolders/inbox/messages/delta?$select={}&$top={}",
            config.base_url, DELTA_SELECT, config.page_size
        );
        assert!(url.starts_with("https://graph.microsoft.com/v1.0/me/mailFolders/inbox"));
        assert!(url.contains("$select=id,conversationId"));
        assert!(url.ends_with("$top=20"));
    }
}
