//! CLI-specific error types
//!
//! Every CLI error ends the command with a non-zero exit.

use std::fmt;
use std::io;

use crate::config::ConfigError;
use crate::errors::StorageError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdout, data directory)
    IoError,
    /// A storage read failed
    StorageError,
    /// A commit reported failure
    CommitFailed,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "FEED_CLI_CONFIG_ERROR",
            Self::IoError => "FEED_CLI_IO_ERROR",
            Self::StorageError => "FEED_CLI_STORAGE_ERROR",
            Self::CommitFailed => "FEED_CLI_COMMIT_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Commit failed
    pub fn commit_failed(target: &str) -> Self {
        Self::new(
            CliErrorCode::CommitFailed,
            format!("Commit on '{}' failed; earlier operations may have been applied", target),
        )
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<StorageError> for CliError {
    fn from(e: StorageError) -> Self {
        Self::new(CliErrorCode::StorageError, format!("{}: {}", e.code(), e))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_keeps_code() {
        let err: CliError = StorageError::JournalExists("j".into()).into();
        assert_eq!(err.code(), &CliErrorCode::StorageError);
        assert!(err.message().contains("FEED_JOURNAL_EXISTS"));
    }

    #[test]
    fn test_display() {
        let err = CliError::commit_failed("session");
        let display = err.to_string();
        assert!(display.starts_with("FEED_CLI_COMMIT_FAILED"));
        assert!(display.contains("session"));
    }
}
