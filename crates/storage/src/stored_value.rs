//! Storage-layer value wrapper with revision metadata
//!
//! The contract type `KeyValue` carries the key alongside the value; inside
//! the ordered map the key is already known, so the store keeps only the
//! value and its revision bookkeeping here.

use strata_core::KeyValue;

/// A stored value with its revision metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredValue {
    value: String,
    create_revision: u64,
    mod_revision: u64,
    version: u64,
}

impl StoredValue {
    /// Create a freshly created entry at `revision`
    pub fn created(value: String, revision: u64) -> Self {
        StoredValue {
            value,
            create_revision: revision,
            mod_revision: revision,
            version: 1,
        }
    }

    /// Produce the successor of this entry after a write at `revision`
    pub fn updated(&self, value: String, revision: u64) -> Self {
        StoredValue {
            value,
            create_revision: self.create_revision,
            mod_revision: revision,
            version: self.version + 1,
        }
    }

    /// Get the value
    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Revision of the last modification
    #[inline]
    pub fn mod_revision(&self) -> u64 {
        self.mod_revision
    }

    /// Attach the key and return the contract type
    pub fn to_key_value(&self, key: &str) -> KeyValue {
        KeyValue {
            key: key.to_string(),
            value: self.value.clone(),
            create_revision: self.create_revision,
            mod_revision: self.mod_revision,
            version: self.version,
        }
    }
}
