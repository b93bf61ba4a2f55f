//! Journal mutation batches

/// One operation applied to the mutation's journal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalOperation {
    /// Add a record at the end, creating the journal if absent
    Append(Vec<u8>),
    /// Duplicate the journal's current records into a new journal
    Copy { to_journal_name: String },
    /// Remove the journal
    Delete,
}

/// Ordered operations on a single journal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalMutation {
    journal_name: String,
    operations: Vec<JournalOperation>,
}

impl JournalMutation {
    pub fn builder(journal_name: impl Into<String>) -> JournalMutationBuilder {
        JournalMutationBuilder {
            journal_name: journal_name.into(),
            operations: Vec::new(),
        }
    }

    pub fn new(journal_name: impl Into<String>, operations: Vec<JournalOperation>) -> Self {
        Self {
            journal_name: journal_name.into(),
            operations,
        }
    }

    pub fn journal_name(&self) -> &str {
        &self.journal_name
    }

    pub fn operations(&self) -> &[JournalOperation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

#[derive(Debug)]
pub struct JournalMutationBuilder {
    journal_name: String,
    operations: Vec<JournalOperation>,
}

impl JournalMutationBuilder {
    pub fn append(mut self, record: impl Into<Vec<u8>>) -> Self {
        self.operations.push(JournalOperation::Append(record.into()));
        self
    }

    pub fn copy(mut self, to_journal_name: impl Into<String>) -> Self {
        self.operations.push(JournalOperation::Copy {
            to_journal_name: to_journal_name.into(),
        });
        self
    }

    pub fn delete(mut self) -> Self {
        self.operations.push(JournalOperation::Delete);
        self
    }

    pub fn build(self) -> JournalMutation {
        JournalMutation {
            journal_name: self.journal_name,
            operations: self.operations,
        }
    }
}
