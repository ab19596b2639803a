//! Load-time failures.
//!
//! Only problems that make the whole export unusable surface here. Anomalies in
//! individual conversations or nodes are skipped by the parser instead.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported file format: {0}. Use .zip or .json")]
    UnsupportedFormat(String),

    #[error("No conversations.json found in the ZIP file")]
    MissingConversations,

    #[error("Invalid ZIP archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected export layout: {0}")]
    UnexpectedShape(String),
}
