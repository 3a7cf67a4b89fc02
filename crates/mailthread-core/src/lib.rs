// Public fallible APIs in this crate share one concrete error contract (`MailIndexError`).
#![allow(
    clippy::missing_errors_doc,
    reason = "crate-wide fallible API uses one explicit error type; per-item boilerplate would duplicate contract"
)]

pub mod client;
pub mod config;
pub mod error;
pub mod message_file;
pub mod models;
pub mod references;
pub mod store;
pub(crate) mod terms;

pub use client::{INDEX_FILE_NAME, MailIndex, format_thread_id, parse_thread_id};
pub use config::IndexConfig;
pub use error::{MailIndexError, Result};
pub use models::{AddOutcome, AddStatus, IndexFeatures, IndexStatus, MessageKind, MessageSummary};
pub use store::{Document, OpenMode, SqliteIndexStore};
