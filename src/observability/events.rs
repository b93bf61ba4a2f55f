//! Observable storage events
//!
//! Events are explicit and typed.

use std::fmt;

/// Observable events in feedstore
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// A backend was constructed
    StorageOpen,
    /// A backing directory was created on first access
    DirectoryCreated,
    /// Configuration loaded
    ConfigLoaded,

    // Commits
    /// A mutation batch is about to be applied
    CommitBegin,
    /// Every operation of a batch applied
    CommitComplete,
    /// A batch stopped at a failing operation
    CommitFailed,

    // Journal operations
    /// Journal duplicated into a new journal
    JournalCopied,
    /// Journal removed
    JournalDeleted,
    /// A file in the journal directory was skipped while listing
    JournalFileSkipped,

    // Reads
    /// A read-style operation failed
    ReadFailed,

    // Worker
    /// Background worker thread started
    WorkerStarted,
    /// Background worker thread exited
    WorkerStopped,
    /// A job could not be queued because the worker is gone
    WorkerUnavailable,

    // Programming errors
    /// A call happened on the wrong thread (FATAL)
    ThreadViolation,
}

impl Event {
    /// Returns the event name as it appears in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::StorageOpen => "STORAGE_OPEN",
            Event::DirectoryCreated => "DIRECTORY_CREATED",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::CommitBegin => "COMMIT_BEGIN",
            Event::CommitComplete => "COMMIT_COMPLETE",
            Event::CommitFailed => "COMMIT_FAILED",
            Event::JournalCopied => "JOURNAL_COPIED",
            Event::JournalDeleted => "JOURNAL_DELETED",
            Event::JournalFileSkipped => "JOURNAL_FILE_SKIPPED",
            Event::ReadFailed => "READ_FAILED",
            Event::WorkerStarted => "WORKER_STARTED",
            Event::WorkerStopped => "WORKER_STOPPED",
            Event::WorkerUnavailable => "WORKER_UNAVAILABLE",
            Event::ThreadViolation => "THREAD_VIOLATION",
        }
    }

    /// Fatal events are followed by a panic
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::ThreadViolation)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_thread_violation_is_fatal() {
        assert!(Event::ThreadViolation.is_fatal());
        assert!(!Event::CommitFailed.is_fatal());
        assert!(!Event::WorkerUnavailable.is_fatal());
    }

    #[test]
    fn test_display_matches_as_str() {
        assert_eq!(Event::JournalCopied.to_string(), "JOURNAL_COPIED");
    }
}
