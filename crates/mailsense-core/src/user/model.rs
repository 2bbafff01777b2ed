//! User model types.

/// Verified identity tuple supplied by the identity collaborator.
///
/// The core trusts this unconditionally; no session verification
/// happens here.
#[derive(Debug, Clone)]
pub struct UserProfile {
    /// Stable identity-provider user id.
    pub user_id: String,
    /// Email address.
    pub email: String,
    /// Display name.
    pub name: Option<String>,
}

impl UserProfile {
    /// Create a profile.
    #[must_use]
    pub fn new(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            name: None,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A stored user row.
#[derive(Debug, Clone)]
pub struct User {
    /// Identity-provider user id.
    pub id: String,
    /// Email address (unique).
    pub email: String,
    /// Display name.
    pub name: Option<String>,
    /// Opaque delta-feed resume cursor.
    ///
    /// `None` means no sync has ever completed for this user; present
    /// means subsequent syncs are incremental. Mutated only by a
    /// successful sync pass, after the batch's mutations are applied.
    pub delta_link: Option<String>,
}
