use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, MailIndexError>;

#[derive(Debug, Error)]
pub enum MailIndexError {
    #[error("index is opened read-only")]
    ReadOnlyStore,

    #[error("cannot read message file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed message file: {0}")]
    Parse(String),

    #[error("not an email (no From, Subject or To header): {0}")]
    NotEmail(String),

    #[error("index store fault: {0}")]
    StoreFault(String),

    #[error("index invariant violated: {0}")]
    InvariantViolation(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    pub operation: String,
    pub trace_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl MailIndexError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ReadOnlyStore => "READ_ONLY_STORE",
            Self::File { .. } => "FILE_ERROR",
            Self::Parse(_) => "PARSE_ERROR",
            Self::NotEmail(_) => "NOT_EMAIL",
            Self::StoreFault(_) => "STORE_FAULT",
            Self::InvariantViolation(_) => "INVARIANT_VIOLATION",
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Sqlite(_) => "SQLITE_ERROR",
        }
    }

    /// Collapses engine-level failures into `StoreFault`; everything else keeps its kind.
    #[must_use]
    pub fn into_store_fault(self) -> Self {
        match self {
            Self::Sqlite(err) => Self::StoreFault(err.to_string()),
            Self::Io(err) => Self::StoreFault(err.to_string()),
            other => other,
        }
    }

    pub(crate) fn mutex_poisoned(name: &str) -> Self {
        Self::StoreFault(format!("{name} connection mutex poisoned"))
    }

    pub fn to_payload(&self, operation: impl Into<String>, path: Option<String>) -> ErrorPayload {
        ErrorPayload {
            code: self.code().to_string(),
            message: self.to_string(),
            operation: operation.into(),
            trace_id: Uuid::new_v4().to_string(),
            path,
        }
    }
}
