//! Stored emails and their attachments.

mod model;
mod repository;

pub use model::{Attachment, Email, EmailId, EmailWithAttachments, NewEmail, Recipient};
pub use repository::EmailRepository;
