//! Journal storage: named append-only logs of byte records
//!
//! Per journal: `ABSENT -> append -> PRESENT(n) -> append* -> delete -> ABSENT`.
//! A copy creates a second, independent journal holding the source's records
//! at copy time.
//!
//! - Records come back in append order
//! - Reading an absent journal yields an empty list
//! - Copy never overwrites an existing journal
//! - Deleting an absent journal succeeds
//! - Commits stop at the first failing operation and do not roll back

mod memory;
mod mutation;
mod persistent;
mod sanitize;

pub use memory::InMemoryJournalStorage;
pub use mutation::{JournalMutation, JournalMutationBuilder, JournalOperation};
pub use persistent::PersistentJournalStorage;
pub use sanitize::{desanitize, sanitize, ASTERISK_MARKER};

use crate::commit::CommitResult;
use crate::errors::StorageResult;
use crate::threading::{Completion, Consumer};

/// Append-only journal store
///
/// The `*_with` methods deliver their result to a consumer exactly once. The
/// provided methods without the suffix return a [`Completion`] instead.
pub trait JournalStorage: Send + Sync {
    /// Every record of the journal in append order.
    fn read_with(&self, journal_name: &str, consumer: Consumer<StorageResult<Vec<Vec<u8>>>>);

    fn exists_with(&self, journal_name: &str, consumer: Consumer<StorageResult<bool>>);

    /// Names of every present journal, sorted.
    fn get_all_journals_with(&self, consumer: Consumer<StorageResult<Vec<String>>>);

    /// Apply a mutation batch to the mutation's journal.
    fn commit_with(&self, mutation: JournalMutation, consumer: Consumer<CommitResult>);

    /// Remove every journal.
    fn delete_all_with(&self, consumer: Consumer<CommitResult>);

    /// Diagnostic counters and backend details as JSON
    fn dump(&self) -> serde_json::Value;

    fn read(&self, journal_name: &str) -> Completion<StorageResult<Vec<Vec<u8>>>> {
        let (consumer, completion) = Consumer::channel();
        self.read_with(journal_name, consumer);
        completion
    }

    fn exists(&self, journal_name: &str) -> Completion<StorageResult<bool>> {
        let (consumer, completion) = Consumer::channel();
        self.exists_with(journal_name, consumer);
        completion
    }

    fn get_all_journals(&self) -> Completion<StorageResult<Vec<String>>> {
        let (consumer, completion) = Consumer::channel();
        self.get_all_journals_with(consumer);
        completion
    }

    fn commit(&self, mutation: JournalMutation) -> Completion<CommitResult> {
        let (consumer, completion) = Consumer::channel();
        self.commit_with(mutation, consumer);
        completion
    }

    fn delete_all(&self) -> Completion<CommitResult> {
        let (consumer, completion) = Consumer::channel();
        self.delete_all_with(consumer);
        completion
    }
}
