//! Transaction manager for coordinating commit operations
//!
//! Provides atomic commit by orchestrating:
//! 1. Validation (first-committer-wins)
//! 2. Storage application (visibility, one revision per transaction)
//!
//! ## Commit Sequence
//!
//! ```text
//! 1. Acquire the commit lock
//! 2. validate_read_set() - Check for conflicts
//! 3. IF conflicts: abort and return TransactionAborted
//! 4. apply_batch() - Apply buffered ops under one revision
//! 5. mark_committed() and return the commit revision
//! ```
//!
//! Every transactional writer of a store must go through the same manager;
//! the commit lock is what makes validate-then-apply atomic.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::{debug, warn};

use strata_core::{Error, Result};
use strata_storage::MemStore;

use crate::config::{RetryConfig, StoreConfig};
use crate::transaction::TransactionContext;
use crate::validation::validate_read_set;

/// Manages transaction lifecycle and atomic commits
pub struct TransactionManager {
    store: MemStore,
    /// Serializes validation + application across transactions
    commit_lock: Mutex<()>,
    /// Next transaction ID
    next_txn_id: AtomicU64,
    retry: RetryConfig,
}

impl TransactionManager {
    /// Create a manager over `store` with the default retry policy
    pub fn new(store: MemStore) -> Self {
        Self::with_config(store, &StoreConfig::default())
    }

    /// Create a manager over `store` using a loaded configuration
    pub fn with_config(store: MemStore, config: &StoreConfig) -> Self {
        TransactionManager {
            store,
            commit_lock: Mutex::new(()),
            next_txn_id: AtomicU64::new(1),
            retry: config.retry.clone(),
        }
    }

    /// The store this manager commits to
    pub fn store(&self) -> &MemStore {
        &self.store
    }

    /// Retry policy used by `transaction_with_retry`
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Begin a new transaction (for manual control)
    ///
    /// Prefer the `transaction()` closure API for automatic handling.
    pub fn begin(&self) -> TransactionContext {
        let txn_id = self.next_txn_id.fetch_add(1, Ordering::SeqCst);
        let txn = TransactionContext::new(txn_id, self.store.clone());
        debug!(target: "strata::txn", txn_id, start_revision = txn.start_revision, "Transaction started");
        txn
    }

    /// Commit a transaction atomically
    ///
    /// # Returns
    /// - Ok(commit_revision) on success; a read-only transaction returns
    ///   the current revision without writing
    /// - Err(TransactionAborted) if validation fails
    /// - Err(TransactionNotActive) if the transaction already ended
    pub fn commit(&self, txn: &mut TransactionContext) -> Result<u64> {
        if !txn.is_active() {
            return Err(Error::TransactionNotActive {
                state: txn.status().to_string(),
            });
        }

        let _guard = self.commit_lock.lock();

        let validation = validate_read_set(txn.read_set(), txn.store());
        if !validation.is_valid() {
            let reason = format!(
                "Validation failed: {} conflict(s)",
                validation.conflict_count()
            );
            warn!(target: "strata::txn", txn_id = txn.txn_id, conflicts = validation.conflict_count(), "Transaction aborted");
            txn.mark_aborted(reason.clone());
            return Err(Error::TransactionAborted { reason });
        }

        let revision = txn.store().apply_batch(txn.operations())?;
        txn.mark_committed();
        debug!(target: "strata::txn", txn_id = txn.txn_id, revision, "Transaction committed");
        Ok(revision)
    }

    /// Execute a transaction closure once
    ///
    /// Commits when the closure returns `Ok`; aborts (discarding buffered
    /// writes) when it returns `Err` or validation fails.
    pub fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut TransactionContext) -> Result<T>,
    {
        self.transaction_with_revision(f).map(|(value, _)| value)
    }

    /// Execute a transaction closure once and return the commit revision too
    pub fn transaction_with_revision<F, T>(&self, f: F) -> Result<(T, u64)>
    where
        F: FnOnce(&mut TransactionContext) -> Result<T>,
    {
        let mut txn = self.begin();
        match f(&mut txn) {
            Ok(value) => {
                let revision = self.commit(&mut txn)?;
                Ok((value, revision))
            }
            Err(e) => {
                txn.mark_aborted(e.to_string());
                debug!(target: "strata::txn", txn_id = txn.txn_id, error = %e, "Transaction rolled back");
                Err(e)
            }
        }
    }

    /// Execute a transaction with automatic retry on conflict
    ///
    /// The closure is called repeatedly until either:
    /// - The transaction commits successfully
    /// - A non-conflict error occurs (not retried)
    /// - Maximum retries are exceeded
    ///
    /// The closure may run more than once, so it must not have side effects
    /// outside the transaction.
    pub fn transaction_with_retry<F, T>(&self, f: F) -> Result<T>
    where
        F: Fn(&mut TransactionContext) -> Result<T>,
    {
        let config = &self.retry;
        let mut attempt = 0;
        loop {
            match self.transaction(&f) {
                Err(e) if e.is_conflict() && attempt < config.max_retries => {
                    let delay = config.calculate_delay(attempt);
                    debug!(target: "strata::txn", attempt, delay_ms = delay.as_millis() as u64, "Retrying transaction after conflict");
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                outcome => return outcome,
            }
        }
    }
}
