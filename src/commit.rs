//! Commit outcome shared by both stores
//!
//! A commit applies its operations in order and stops at the first failure.
//! Operations applied before the failure stay applied.

use serde::Serialize;

use crate::errors::StorageResult;
use crate::observability::{Event, Logger};

/// Aggregate outcome of one mutation batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommitResult {
    Success,
    Failure,
}

impl CommitResult {
    pub fn is_success(&self) -> bool {
        *self == CommitResult::Success
    }
}

/// Runs `apply` over every operation in order, stopping at the first error.
///
/// The stopping error is logged with the store and operation index (at WARN
/// for rejected input, ERROR otherwise), then folded into
/// `CommitResult::Failure`.
pub(crate) fn apply_in_order<O, F>(
    store: &str,
    target: &str,
    operations: &[O],
    mut apply: F,
) -> CommitResult
where
    F: FnMut(&O) -> StorageResult<()>,
{
    let count = operations.len().to_string();
    Logger::trace(
        Event::CommitBegin.as_str(),
        &[("store", store), ("target", target), ("operations", &count)],
    );

    for (index, operation) in operations.iter().enumerate() {
        if let Err(e) = apply(operation) {
            let index = index.to_string();
            Logger::log(
                e.severity(),
                Event::CommitFailed.as_str(),
                &[
                    ("store", store),
                    ("target", target),
                    ("failed_index", &index),
                    ("code", e.code()),
                    ("message", &e.to_string()),
                ],
            );
            return CommitResult::Failure;
        }
    }
    Logger::trace(
        Event::CommitComplete.as_str(),
        &[("store", store), ("target", target), ("operations", &count)],
    );
    CommitResult::Success
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StorageError;

    #[test]
    fn test_stops_at_first_failure() {
        let mut seen = Vec::new();
        let result = apply_in_order("test", "t", &[1, 2, 3, 4], |op| {
            seen.push(*op);
            if *op == 2 {
                Err(StorageError::MissingKey)
            } else {
                Ok(())
            }
        });
        assert_eq!(result, CommitResult::Failure);
        assert_eq!(seen, vec![1, 2]);
    }

    #[test]
    fn test_empty_batch_succeeds() {
        let ops: [u8; 0] = [];
        let result = apply_in_order("test", "t", &ops, |_| Err(StorageError::MissingKey));
        assert!(result.is_success());
    }
}
