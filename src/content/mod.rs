//! Content storage: a flat key → bytes store
//!
//! - A key maps to at most one non-empty value
//! - Upserts replace the whole value
//! - Missing keys are omitted from reads, never an error
//! - Commits apply operations in order and stop at the first failure,
//!   without rolling back what was already applied

mod memory;
mod mutation;
mod persistent;

pub use memory::InMemoryContentStorage;
pub use mutation::{ContentMutation, ContentMutationBuilder, ContentOperation};
pub use persistent::PersistentContentStorage;

use std::collections::HashMap;

use crate::commit::CommitResult;
use crate::errors::StorageResult;
use crate::threading::{Completion, Consumer};

/// Values keyed by content key
pub type ContentMap = HashMap<String, Vec<u8>>;

/// Key-value content store
///
/// The `*_with` methods deliver their result to a consumer exactly once. The
/// provided methods without the suffix return a [`Completion`] instead.
pub trait ContentStorage: Send + Sync {
    /// Values for the requested keys that exist. Missing keys are omitted.
    fn get_with(&self, keys: &[String], consumer: Consumer<StorageResult<ContentMap>>);

    /// Every entry whose key starts with `prefix`.
    fn get_all_with(&self, prefix: &str, consumer: Consumer<StorageResult<ContentMap>>);

    /// Every stored key, sorted.
    fn get_all_keys_with(&self, consumer: Consumer<StorageResult<Vec<String>>>);

    /// Apply a mutation batch.
    fn commit_with(&self, mutation: ContentMutation, consumer: Consumer<CommitResult>);

    /// Diagnostic counters and backend details as JSON
    fn dump(&self) -> serde_json::Value;

    fn get(&self, keys: &[String]) -> Completion<StorageResult<ContentMap>> {
        let (consumer, completion) = Consumer::channel();
        self.get_with(keys, consumer);
        completion
    }

    fn get_all(&self, prefix: &str) -> Completion<StorageResult<ContentMap>> {
        let (consumer, completion) = Consumer::channel();
        self.get_all_with(prefix, consumer);
        completion
    }

    fn get_all_keys(&self) -> Completion<StorageResult<Vec<String>>> {
        let (consumer, completion) = Consumer::channel();
        self.get_all_keys_with(consumer);
        completion
    }

    fn commit(&self, mutation: ContentMutation) -> Completion<CommitResult> {
        let (consumer, completion) = Consumer::channel();
        self.commit_with(mutation, consumer);
        completion
    }
}
