//! feedstore - Embedded journal and content storage for feed sessions
//!
//! Two stores share one commit pattern:
//!
//! - [`journal`]: named append-only logs of byte records
//! - [`content`]: a flat key → bytes store
//!
//! Each has an in-memory backend and a file-backed backend. Commits apply
//! their operations in order and stop at the first failure without rolling
//! back. Every call delivers exactly one result, either to a callback
//! ([`threading::Consumer`]) or through a [`threading::Completion`].

pub mod cli;
pub mod commit;
pub mod config;
pub mod content;
pub mod directory;
pub mod errors;
pub mod journal;
pub mod observability;
pub mod threading;

pub use commit::CommitResult;
pub use config::{BackendKind, ConfigError, StoreConfig};
pub use content::{ContentMap, ContentMutation, ContentOperation, ContentStorage};
pub use errors::{StorageError, StorageResult};
pub use journal::{JournalMutation, JournalOperation, JournalStorage};
pub use threading::{Completion, Consumer, ThreadChecker};
