//! Operation counters for storage backends
//!
//! - Counters only
//! - Monotonic increase
//! - Reset only when the backend is constructed
//!
//! Counters feed diagnostic dumps. Nothing reads them to make decisions.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Per-backend operation counters
///
/// Uses Relaxed ordering; values are only ever read for dumps.
#[derive(Debug, Default)]
pub struct StorageMetrics {
    // Content store
    content_gets: AtomicU64,
    content_inserts: AtomicU64,
    content_updates: AtomicU64,
    content_deletes: AtomicU64,
    content_prefix_deletes: AtomicU64,

    // Journal store
    journal_reads: AtomicU64,
    journal_appends: AtomicU64,
    journal_copies: AtomicU64,
    journal_deletes: AtomicU64,

    // Commits
    commits: AtomicU64,
    commit_failures: AtomicU64,
}

impl StorageMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_content_gets(&self) {
        self.content_gets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_content_inserts(&self) {
        self.content_inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_content_updates(&self) {
        self.content_updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_content_deletes(&self) {
        self.content_deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_content_prefix_deletes(&self) {
        self.content_prefix_deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_journal_reads(&self) {
        self.journal_reads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_journal_appends(&self) {
        self.journal_appends.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_journal_copies(&self) {
        self.journal_copies.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_journal_deletes(&self) {
        self.journal_deletes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of one commit
    pub fn record_commit(&self, success: bool) {
        self.commits.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.commit_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get all counters as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            content_gets: self.content_gets.load(Ordering::Relaxed),
            content_inserts: self.content_inserts.load(Ordering::Relaxed),
            content_updates: self.content_updates.load(Ordering::Relaxed),
            content_deletes: self.content_deletes.load(Ordering::Relaxed),
            content_prefix_deletes: self.content_prefix_deletes.load(Ordering::Relaxed),
            journal_reads: self.journal_reads.load(Ordering::Relaxed),
            journal_appends: self.journal_appends.load(Ordering::Relaxed),
            journal_copies: self.journal_copies.load(Ordering::Relaxed),
            journal_deletes: self.journal_deletes.load(Ordering::Relaxed),
            commits: self.commits.load(Ordering::Relaxed),
            commit_failures: self.commit_failures.load(Ordering::Relaxed),
        }
    }

    /// Current counters as a JSON object
    pub fn to_json(&self) -> serde_json::Value {
        // Serializing a struct of integers cannot fail.
        serde_json::to_value(self.snapshot()).unwrap_or(serde_json::Value::Null)
    }
}

/// A point-in-time snapshot of all counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub content_gets: u64,
    pub content_inserts: u64,
    pub content_updates: u64,
    pub content_deletes: u64,
    pub content_prefix_deletes: u64,
    pub journal_reads: u64,
    pub journal_appends: u64,
    pub journal_copies: u64,
    pub journal_deletes: u64,
    pub commits: u64,
    pub commit_failures: u64,
}
