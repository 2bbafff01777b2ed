//! Error types for the core library.

use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No credential token is available for the user.
    ///
    /// A caller precondition: surfaced before any remote call is made.
    #[error("Mail account not connected: no access token available")]
    NotConnected,

    /// The mail provider rejected the access token or scope.
    ///
    /// Needs user action (re-authentication) rather than a retry.
    #[error("Access denied by mail provider (HTTP {status})")]
    AccessDenied {
        /// HTTP status returned by the provider.
        status: u16,
    },

    /// Delta feed operation failed.
    #[error("Feed error: {0}")]
    Feed(mailsense_graph::Error),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Thread not found for the requesting user.
    #[error("Thread not found: {0}")]
    ThreadNotFound(i64),
}

impl From<mailsense_graph::Error> for Error {
    fn from(error: mailsense_graph::Error) -> Self {
        match error {
            mailsense_graph::Error::AccessDenied { status } => Self::AccessDenied { status },
            other => Self::Feed(other),
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
