//! Content mutation batches

use crate::errors::{StorageError, StorageResult};

/// One operation of a content commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentOperation {
    /// Insert or wholly replace the value for `key`
    Upsert { key: String, value: Vec<u8> },
    /// Remove `key` if present
    Delete { key: String },
    /// Remove every key starting with `prefix`
    DeleteByPrefix { prefix: String },
}

impl ContentOperation {
    /// Rejects upserts without a key or with an empty value.
    ///
    /// Deletes are always valid.
    pub fn validate(&self) -> StorageResult<()> {
        match self {
            ContentOperation::Upsert { key, value } => {
                if key.is_empty() {
                    return Err(StorageError::MissingKey);
                }
                if value.is_empty() {
                    return Err(StorageError::EmptyValue { key: key.clone() });
                }
                Ok(())
            }
            ContentOperation::Delete { .. } | ContentOperation::DeleteByPrefix { .. } => Ok(()),
        }
    }
}

/// Ordered list of content operations applied by one commit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentMutation {
    operations: Vec<ContentOperation>,
}

impl ContentMutation {
    pub fn builder() -> ContentMutationBuilder {
        ContentMutationBuilder::default()
    }

    pub fn operations(&self) -> &[ContentOperation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl From<Vec<ContentOperation>> for ContentMutation {
    fn from(operations: Vec<ContentOperation>) -> Self {
        Self { operations }
    }
}

#[derive(Debug, Default)]
pub struct ContentMutationBuilder {
    operations: Vec<ContentOperation>,
}

impl ContentMutationBuilder {
    pub fn upsert(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.operations.push(ContentOperation::Upsert {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn delete(mut self, key: impl Into<String>) -> Self {
        self.operations.push(ContentOperation::Delete { key: key.into() });
        self
    }

    pub fn delete_by_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.operations.push(ContentOperation::DeleteByPrefix {
            prefix: prefix.into(),
        });
        self
    }

    pub fn build(self) -> ContentMutation {
        ContentMutation {
            operations: self.operations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_keeps_order() {
        let mutation = ContentMutation::builder()
            .upsert("k1", "v1")
            .delete("k2")
            .delete_by_prefix("feature::")
            .build();

        assert_eq!(mutation.len(), 3);
        assert_eq!(
            mutation.operations()[0],
            ContentOperation::Upsert {
                key: "k1".into(),
                value: b"v1".to_vec()
            }
        );
        assert_eq!(
            mutation.operations()[2],
            ContentOperation::DeleteByPrefix {
                prefix: "feature::".into()
            }
        );
    }

    #[test]
    fn test_upsert_validation() {
        let missing_key = ContentOperation::Upsert {
            key: String::new(),
            value: b"v".to_vec(),
        };
        assert!(matches!(missing_key.validate(), Err(StorageError::MissingKey)));

        let empty_value = ContentOperation::Upsert {
            key: "k".into(),
            value: Vec::new(),
        };
        assert!(matches!(empty_value.validate(), Err(StorageError::EmptyValue { .. })));

        assert!(ContentOperation::Delete { key: String::new() }.validate().is_ok());
    }
}
