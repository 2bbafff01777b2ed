//! Error types for delta-feed operations.

/// Result type alias for delta-feed operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Delta-feed error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The provider rejected the access token or its scope.
    ///
    /// Surfaced distinctly so callers can prompt for re-authentication
    /// instead of treating the failure as transient.
    #[error("Access denied by mail provider (HTTP {status})")]
    AccessDenied {
        /// HTTP status returned by the provider (401 or 403).
        status: u16,
    },

    /// HTTP transport or server-side failure.
    ///
    /// Not retried here; retry policy belongs to the caller.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The delta response carried neither a next-page nor a delta link.
    #[error("Delta response did not include a continuation cursor")]
    MissingCursor,
}
