//! Insight model types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::thread::ThreadId;

/// Urgency classification assigned by the summarizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    /// No pressing action implied.
    #[default]
    Low,
    /// Worth attention soon.
    Medium,
    /// Time-sensitive.
    High,
}

impl Urgency {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Parse from storage; unknown values fall back to `Low`.
    #[must_use]
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "medium" => Self::Medium,
            "high" => Self::High,
            _ => Self::Low,
        }
    }
}

/// One action item extracted from the thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    /// Task description.
    pub task: String,
    /// Person responsible.
    pub owner: String,
}

/// Aggregate view of the thread's attachments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentOverview {
    /// Total number of attachments.
    pub count: u32,
    /// File types seen (extensions).
    pub types: Vec<String>,
    /// What the attachments appear to be about.
    pub mentions: Vec<String>,
}

/// Summarizer output before persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightDraft {
    /// Brief summary of the thread.
    pub summary: String,
    /// Participant names mentioned.
    pub participants: Vec<String>,
    /// Main topics discussed.
    pub topics: Vec<String>,
    /// Extracted action items.
    pub action_items: Vec<ActionItem>,
    /// Urgency classification.
    pub urgency: Urgency,
    /// Whether the thread still awaits a reply.
    pub requires_response: bool,
    /// Attachment overview.
    pub attachment_overview: AttachmentOverview,
}

/// A cached insight row. At most one exists per thread; regeneration
/// replaces it wholesale, never accumulating history.
#[derive(Debug, Clone)]
pub struct Insight {
    /// Owning thread.
    pub thread_id: ThreadId,
    /// Brief summary of the thread.
    pub summary: String,
    /// Participant names mentioned.
    pub participants: Vec<String>,
    /// Main topics discussed.
    pub topics: Vec<String>,
    /// Extracted action items.
    pub action_items: Vec<ActionItem>,
    /// Urgency classification.
    pub urgency: Urgency,
    /// Whether the thread still awaits a reply.
    pub requires_response: bool,
    /// Attachment overview.
    pub attachment_overview: AttachmentOverview,
    /// As-of marker: the received timestamp of the newest email this
    /// insight reflects. The insight is trustworthy only while no
    /// member email is newer than this.
    pub generated_at: DateTime<Utc>,
}
