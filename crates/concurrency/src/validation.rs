//! Transaction validation for OCC
//!
//! Key rules:
//! - First-committer-wins based on READ-SET, not write-set
//! - Blind writes (write without read) do NOT conflict
//! - Write skew is ALLOWED (do not try to prevent it)

use std::collections::HashMap;

use strata_storage::MemStore;

/// Types of conflicts that can occur during transaction validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictType {
    /// Read-write conflict: key was read at one revision but the current
    /// revision differs (including creation or deletion since the read)
    ReadWriteConflict {
        /// The key that has a conflict
        key: String,
        /// Revision recorded in the read set (0 = absent)
        read_revision: u64,
        /// Current revision in storage at validation time (0 = absent)
        current_revision: u64,
    },
}

/// Result of transaction validation
///
/// Accumulates all conflicts found during validation.
/// A transaction commits only if is_valid() returns true.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// All conflicts detected during validation
    pub conflicts: Vec<ConflictType>,
}

impl ValidationResult {
    /// Create a successful validation result (no conflicts)
    pub fn ok() -> Self {
        ValidationResult::default()
    }

    /// Check if validation passed (no conflicts)
    pub fn is_valid(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Get the number of conflicts
    pub fn conflict_count(&self) -> usize {
        self.conflicts.len()
    }
}

/// Validate the read-set against current storage state
///
/// For each key in the read set, check that the current mod revision equals
/// the one observed at read time; every mismatch is a `ReadWriteConflict`.
pub fn validate_read_set(read_set: &HashMap<String, u64>, store: &MemStore) -> ValidationResult {
    let mut result = ValidationResult::ok();

    for (key, read_revision) in read_set {
        let current_revision = store.mod_revision(key);
        if current_revision != *read_revision {
            result.conflicts.push(ConflictType::ReadWriteConflict {
                key: key.clone(),
                read_revision: *read_revision,
                current_revision,
            });
        }
    }

    result
}
