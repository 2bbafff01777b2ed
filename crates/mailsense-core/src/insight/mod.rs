//! Derived thread insights: caching, staleness, and regeneration.

mod gate;
mod model;
mod repository;
mod service;

pub use gate::{InsightStatus, resolve_insight};
pub use model::{ActionItem, AttachmentOverview, Insight, InsightDraft, Urgency};
pub use repository::InsightRepository;
pub use service::{ContextEmail, InsightService, Summarizer, ThreadContext};
