//! Transaction context for OCC
//!
//! This module implements the transactional execution context that the
//! collection layer writes through. TransactionContext tracks every read
//! (with the revision it observed) and buffers every write, enabling
//! validation and atomic application at commit time.
//!
//! ## Read-Your-Writes
//!
//! Reads consult the transaction's own buffered writes first, including
//! range deletes, so operations issued later in a transaction observe the
//! effects of earlier ones. Only reads that reach the store join the read set.

use std::collections::{BTreeMap, HashMap};

use strata_core::{Error, Result, Stm};
use strata_storage::{MemStore, Op};

/// Status of a transaction in its lifecycle
///
/// State transitions:
/// - `Active` → `Committed` (validation passed, writes applied)
/// - `Active` → `Aborted` (conflict detected, closure error or user abort)
///
/// Terminal states (no transitions allowed):
/// - `Committed`
/// - `Aborted`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Transaction is executing, can read/write
    Active,
    /// Transaction committed successfully
    Committed,
    /// Transaction was aborted
    Aborted {
        /// Human-readable reason for abort
        reason: String,
    },
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Active => write!(f, "active"),
            TransactionStatus::Committed => write!(f, "committed"),
            TransactionStatus::Aborted { reason } => write!(f, "aborted ({})", reason),
        }
    }
}

/// Summary of pending operations that would be discarded on abort
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingOperations {
    /// Number of pending put operations
    pub puts: usize,
    /// Number of pending single-key deletes
    pub deletes: usize,
    /// Number of pending range deletes
    pub range_deletes: usize,
}

impl PendingOperations {
    /// Total number of pending operations
    pub fn total(&self) -> usize {
        self.puts + self.deletes + self.range_deletes
    }

    /// Check if there are no pending operations
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// An optimistic transaction against a `MemStore`
///
/// Obtain one from `TransactionManager::begin` (or through the closure API)
/// and hand it to a collection's read-write view as the `Stm`.
#[derive(Debug)]
pub struct TransactionContext {
    /// Unique transaction id
    pub txn_id: u64,
    /// Store revision when the transaction began
    pub start_revision: u64,
    store: MemStore,
    /// Key → mod revision observed at first read (0 = absent)
    read_set: HashMap<String, u64>,
    /// Buffered operations, in issue order
    ops: Vec<Op>,
    /// Latest buffered state per key (None = deleted)
    overlay: BTreeMap<String, Option<String>>,
    /// Prefixes removed by `del_all`
    deleted_prefixes: Vec<String>,
    status: TransactionStatus,
}

impl TransactionContext {
    /// Create a new active transaction
    pub fn new(txn_id: u64, store: MemStore) -> Self {
        let start_revision = store.current_revision();
        TransactionContext {
            txn_id,
            start_revision,
            store,
            read_set: HashMap::new(),
            ops: Vec::new(),
            overlay: BTreeMap::new(),
            deleted_prefixes: Vec::new(),
            status: TransactionStatus::Active,
        }
    }

    /// Current lifecycle status
    pub fn status(&self) -> &TransactionStatus {
        &self.status
    }

    /// True while operations may still be issued
    pub fn is_active(&self) -> bool {
        self.status == TransactionStatus::Active
    }

    /// Keys read from the store with the revision observed at first read
    pub fn read_set(&self) -> &HashMap<String, u64> {
        &self.read_set
    }

    /// Buffered operations, in issue order
    pub fn operations(&self) -> &[Op] {
        &self.ops
    }

    /// Count of buffered operations by kind
    pub fn pending_operations(&self) -> PendingOperations {
        let mut pending = PendingOperations {
            puts: 0,
            deletes: 0,
            range_deletes: 0,
        };
        for op in &self.ops {
            match op {
                Op::Put { .. } => pending.puts += 1,
                Op::Delete { .. } => pending.deletes += 1,
                Op::DeleteRange { .. } => pending.range_deletes += 1,
            }
        }
        pending
    }

    /// Abort the transaction, discarding buffered writes
    pub fn mark_aborted(&mut self, reason: impl Into<String>) {
        if self.is_active() {
            self.status = TransactionStatus::Aborted {
                reason: reason.into(),
            };
            self.ops.clear();
            self.overlay.clear();
            self.deleted_prefixes.clear();
        }
    }

    pub(crate) fn mark_committed(&mut self) {
        self.status = TransactionStatus::Committed;
    }

    pub(crate) fn store(&self) -> &MemStore {
        &self.store
    }

    fn ensure_active(&self) -> Result<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(Error::TransactionNotActive {
                state: self.status.to_string(),
            })
        }
    }

    fn buffered(&self, key: &str) -> Option<Option<String>> {
        if let Some(value) = self.overlay.get(key) {
            return Some(value.clone());
        }
        if self.deleted_prefixes.iter().any(|p| key.starts_with(p.as_str())) {
            return Some(None);
        }
        None
    }
}

impl Stm for TransactionContext {
    fn get(&mut self, key: &str) -> Result<Option<String>> {
        self.ensure_active()?;
        if let Some(value) = self.buffered(key) {
            return Ok(value);
        }

        let kv = self.store.read(key);
        let observed = kv.as_ref().map_or(0, |kv| kv.mod_revision);
        self.read_set.entry(key.to_string()).or_insert(observed);
        Ok(kv.map(|kv| kv.value))
    }

    fn put(&mut self, key: &str, value: String) -> Result<()> {
        self.ensure_active()?;
        self.overlay.insert(key.to_string(), Some(value.clone()));
        self.ops.push(Op::Put {
            key: key.to_string(),
            value,
        });
        Ok(())
    }

    fn del(&mut self, key: &str) -> Result<()> {
        self.ensure_active()?;
        self.overlay.insert(key.to_string(), None);
        self.ops.push(Op::Delete {
            key: key.to_string(),
        });
        Ok(())
    }

    fn del_all(&mut self, prefix: &str) -> Result<()> {
        self.ensure_active()?;
        for (_, value) in self
            .overlay
            .range_mut(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
        {
            *value = None;
        }
        self.deleted_prefixes.push(prefix.to_string());
        self.ops.push(Op::DeleteRange {
            prefix: prefix.to_string(),
        });
        Ok(())
    }
}
