//! # mailsense-graph
//!
//! Typed client for the Microsoft Graph mail delta feed.
//!
//! This crate provides:
//! - Incremental delta sync against the inbox (`fetch_delta`), resuming
//!   from an opaque delta cursor and transparently following
//!   server-issued next-page links
//! - Per-message attachment metadata lookup that degrades gracefully
//! - A tagged record type distinguishing live messages from removals,
//!   converted once at the wire boundary

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod client;
mod error;
pub mod types;

pub use client::{GraphClient, GraphConfig};
pub use error::{Error, Result};
pub use types::{AttachmentMeta, DeltaBatch, DeltaRecord, MessageRecord};
