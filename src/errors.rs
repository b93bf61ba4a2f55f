//! Storage error types
//!
//! Error codes:
//! - FEED_MISSING_KEY / FEED_EMPTY_VALUE (validation)
//! - FEED_INVALID_KEY / FEED_INVALID_JOURNAL_NAME / FEED_INVALID_RECORD
//!   (validation, persistent backends only)
//! - FEED_JOURNAL_EXISTS (conflict)
//! - FEED_IO_FAILED (I/O, persistent backends only)
//! - FEED_INVALID_JOURNAL_FILE_NAME (encoding)
//! - FEED_WORKER_SPAWN_FAILED / FEED_WORKER_UNAVAILABLE (executor)
//!
//! No storage error is fatal. Every error is resolved into a failed result
//! at the operation boundary.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::observability::Severity;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    // Validation errors
    #[error("Upsert is missing its key")]
    MissingKey,

    #[error("Upsert for key '{key}' has a zero-length value")]
    EmptyValue { key: String },

    #[error("Content key cannot be used as a file name: '{0}'")]
    InvalidKey(String),

    #[error("Journal name cannot be used as a file name: '{0}'")]
    InvalidJournalName(String),

    #[error("Record for journal '{journal}' cannot be stored: {reason}")]
    InvalidRecord { journal: String, reason: String },

    // Conflict errors
    #[error("Journal already exists: {0}")]
    JournalExists(String),

    // I/O errors
    #[error("I/O error during {operation} on {}: {source}", .path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("File name is not a sanitized journal name: {0}")]
    InvalidJournalFileName(String),

    // Executor
    #[error("Failed to start storage worker: {0}")]
    WorkerSpawn(#[source] io::Error),

    #[error("Storage worker is no longer running")]
    WorkerUnavailable,
}

impl StorageError {
    /// Wrap an I/O error with the operation and path it happened on
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        StorageError::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            StorageError::MissingKey => "FEED_MISSING_KEY",
            StorageError::EmptyValue { .. } => "FEED_EMPTY_VALUE",
            StorageError::InvalidKey(_) => "FEED_INVALID_KEY",
            StorageError::InvalidJournalName(_) => "FEED_INVALID_JOURNAL_NAME",
            StorageError::InvalidRecord { .. } => "FEED_INVALID_RECORD",
            StorageError::JournalExists(_) => "FEED_JOURNAL_EXISTS",
            StorageError::Io { .. } => "FEED_IO_FAILED",
            StorageError::InvalidJournalFileName(_) => "FEED_INVALID_JOURNAL_FILE_NAME",
            StorageError::WorkerSpawn(_) => "FEED_WORKER_SPAWN_FAILED",
            StorageError::WorkerUnavailable => "FEED_WORKER_UNAVAILABLE",
        }
    }

    /// WARN for rejected input, ERROR otherwise. Storage errors never
    /// terminate the process.
    pub fn severity(&self) -> Severity {
        if self.is_validation() {
            Severity::Warn
        } else {
            Severity::Error
        }
    }

    /// True for errors caused by the caller's input rather than the medium
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            StorageError::MissingKey
                | StorageError::EmptyValue { .. }
                | StorageError::InvalidKey(_)
                | StorageError::InvalidJournalName(_)
                | StorageError::InvalidRecord { .. }
        )
    }
}
