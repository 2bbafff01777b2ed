//! User accounts and the per-user sync cursor.

mod model;
mod repository;

pub use model::{User, UserProfile};
pub use repository::UserRepository;
