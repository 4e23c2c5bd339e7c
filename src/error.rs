//! Error types shared by the persistence core and the generation pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Failure reading or writing one of the persisted JSON/CSV files.
///
/// There is no repair path: a malformed file is reported as-is and the
/// operator is expected to fix or remove it.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed table {path} at line {line}: {message}")]
    Table {
        path: PathBuf,
        line: usize,
        message: String,
    },
}

/// The LLM produced nothing usable for this attempt.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("LLM request failed: {0}")]
    Request(String),

    #[error("LLM request timed out after {0}s")]
    Timeout(u64),

    #[error("LLM API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("LLM response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("LLM response is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("LLM response has invalid field '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;
