//! MemStore: in-memory coordination store with revisions and watches
//!
//! This module implements the live store using:
//! - `BTreeMap<String, StoredValue>` for ordered key storage
//! - `parking_lot::RwLock` for thread-safe access
//! - `AtomicU64` for the monotonically increasing global revision
//! - A watch registry updated under the same write lock as the data
//!
//! # Design Notes
//!
//! - **One revision per batch**: every operation in an applied batch shares
//!   the batch's revision, so a committed transaction is one point in history.
//! - **No history**: each key stores only its latest value.
//! - **Gap-free watches**: a new subscription's snapshot and its registration
//!   happen under one write lock, so no commit can fall between them.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use strata_core::{Event, EventReceiver, KeyValue, KvClient, Result, Sort, WatchMode};

use crate::stored_value::StoredValue;
use crate::watcher::{WatcherId, WatcherRegistry};

/// A single operation in an atomic batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// Create or overwrite `key`
    Put {
        /// Full store key
        key: String,
        /// New value
        value: String,
    },
    /// Remove `key` if present
    Delete {
        /// Full store key
        key: String,
    },
    /// Remove every key starting with `prefix`
    DeleteRange {
        /// Key prefix
        prefix: String,
    },
}

#[derive(Debug, Default)]
struct State {
    data: BTreeMap<String, StoredValue>,
    watchers: WatcherRegistry,
}

#[derive(Debug, Default)]
struct Shared {
    state: RwLock<State>,
    revision: AtomicU64,
}

/// In-memory coordination store
///
/// Clone-friendly via `Arc`: clones share the same data, revision counter
/// and watchers.
///
/// # Example
///
/// ```ignore
/// let store = MemStore::new();
/// let rev = store.put("jobs/j1", "{}")?;
/// assert_eq!(store.read("jobs/j1").unwrap().mod_revision, rev);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemStore {
    shared: Arc<Shared>,
}

impl MemStore {
    /// Create a new empty store
    ///
    /// Initial revision is 0 (no writes have occurred).
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current global revision
    pub fn current_revision(&self) -> u64 {
        self.shared.revision.load(Ordering::SeqCst)
    }

    /// Read a single key
    pub fn read(&self, key: &str) -> Option<KeyValue> {
        let state = self.shared.state.read();
        state.data.get(key).map(|sv| sv.to_key_value(key))
    }

    /// Revision of the last modification of `key`, 0 when absent
    pub fn mod_revision(&self, key: &str) -> u64 {
        let state = self.shared.state.read();
        state.data.get(key).map_or(0, StoredValue::mod_revision)
    }

    /// Read every key starting with `prefix`
    pub fn scan_prefix(&self, prefix: &str, sort: Sort) -> Vec<KeyValue> {
        let state = self.shared.state.read();
        let mut results: Vec<KeyValue> = Self::range(&state.data, prefix)
            .map(|(key, sv)| sv.to_key_value(key))
            .collect();

        if sort == Sort::ModRevisionDescend {
            // Stable sort keeps key order among equal revisions
            results.sort_by(|a, b| b.mod_revision.cmp(&a.mod_revision));
        }
        results
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.shared.state.read().data.len()
    }

    /// True when the store holds no keys
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply a batch of operations atomically
    ///
    /// This method holds the write lock during ALL operations, ensuring that
    /// no reader or watcher can see a partial batch. Returns the revision
    /// assigned to the batch; an empty batch allocates no revision.
    pub fn apply_batch(&self, ops: &[Op]) -> Result<u64> {
        let mut state = self.shared.state.write();
        if ops.is_empty() {
            return Ok(self.current_revision());
        }

        let revision = self.shared.revision.fetch_add(1, Ordering::SeqCst) + 1;
        let mut events = Vec::with_capacity(ops.len());

        for op in ops {
            match op {
                Op::Put { key, value } => {
                    let next = match state.data.get(key) {
                        Some(existing) => existing.updated(value.clone(), revision),
                        None => StoredValue::created(value.clone(), revision),
                    };
                    state.data.insert(key.clone(), next);
                    events.push(Event::Put {
                        key: key.clone(),
                        value: value.clone(),
                        revision,
                    });
                }
                Op::Delete { key } => {
                    if state.data.remove(key).is_some() {
                        events.push(Event::Delete {
                            key: key.clone(),
                            revision,
                        });
                    }
                }
                Op::DeleteRange { prefix } => {
                    let doomed: Vec<String> = Self::range(&state.data, prefix)
                        .map(|(key, _)| key.clone())
                        .collect();
                    for key in doomed {
                        state.data.remove(&key);
                        events.push(Event::Delete { key, revision });
                    }
                }
            }
        }

        debug!(target: "strata::store", revision, ops = ops.len(), events = events.len(), "Batch applied");
        state.watchers.dispatch(&events);
        Ok(revision)
    }

    /// Write a single key outside any transaction
    pub fn put(&self, key: &str, value: impl Into<String>) -> Result<u64> {
        self.apply_batch(&[Op::Put {
            key: key.to_string(),
            value: value.into(),
        }])
    }

    /// Delete a single key outside any transaction
    pub fn delete(&self, key: &str) -> Result<u64> {
        self.apply_batch(&[Op::Delete {
            key: key.to_string(),
        }])
    }

    /// Register a watcher and deliver its initial snapshot
    ///
    /// The snapshot (current matching entries, in key order) is queued on the
    /// returned channel before the watcher becomes visible to commits.
    pub fn register_watch(&self, key: &str, mode: WatchMode) -> (WatcherId, EventReceiver) {
        let (id, rx, _released) = self.subscribe(key, mode);
        (id, rx)
    }

    fn subscribe(
        &self,
        key: &str,
        mode: WatchMode,
    ) -> (WatcherId, EventReceiver, CancellationToken) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.shared.state.write();

        let snapshot: Vec<Event> = match mode {
            WatchMode::Key => state
                .data
                .get(key)
                .map(|sv| Event::Put {
                    key: key.to_string(),
                    value: sv.value().to_string(),
                    revision: sv.mod_revision(),
                })
                .into_iter()
                .collect(),
            WatchMode::Prefix => Self::range(&state.data, key)
                .map(|(k, sv)| Event::Put {
                    key: k.clone(),
                    value: sv.value().to_string(),
                    revision: sv.mod_revision(),
                })
                .collect(),
        };
        for event in snapshot {
            // The receiver is still in hand, so this cannot fail
            let _ = tx.send(event);
        }

        let (id, released) = state.watchers.register_with_release(key, mode, tx);
        debug!(target: "strata::store", watcher = id, key, ?mode, "Watcher registered");
        (id, rx, released)
    }

    /// Remove a watcher, closing its channel
    pub fn unregister_watch(&self, id: WatcherId) -> bool {
        let removed = self.shared.state.write().watchers.remove(id);
        if removed {
            debug!(target: "strata::store", watcher = id, "Watcher removed");
        }
        removed
    }

    /// Close every open subscription, as a store shutting down would
    pub fn shutdown_watches(&self) -> usize {
        let count = self.shared.state.write().watchers.clear();
        debug!(target: "strata::store", count, "All watchers closed");
        count
    }

    /// Number of open subscriptions
    pub fn watcher_count(&self) -> usize {
        self.shared.state.read().watchers.len()
    }

    fn downgrade(&self) -> Weak<Shared> {
        Arc::downgrade(&self.shared)
    }

    fn range<'a>(
        data: &'a BTreeMap<String, StoredValue>,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a String, &'a StoredValue)> + 'a {
        data.range(prefix.to_string()..)
            .take_while(move |(key, _)| key.starts_with(prefix))
    }
}

impl KvClient for MemStore {
    async fn get(&self, key: &str) -> Result<Option<KeyValue>> {
        Ok(self.read(key))
    }

    async fn get_prefix(&self, prefix: &str, sort: Sort) -> Result<Vec<KeyValue>> {
        Ok(self.scan_prefix(prefix, sort))
    }

    async fn watch(
        &self,
        key: &str,
        mode: WatchMode,
        cancel: CancellationToken,
    ) -> Result<EventReceiver> {
        let (id, rx, released) = self.subscribe(key, mode);

        // Holds only a weak handle so an abandoned subscription does not keep
        // the store alive. Exits without unregistering once the watcher is
        // already gone (shutdown, pruned receiver).
        let shared = self.downgrade();
        tokio::spawn(async move {
            tokio::select! {
                _ = released.cancelled() => {}
                _ = cancel.cancelled() => {
                    if let Some(shared) = shared.upgrade() {
                        MemStore { shared }.unregister_watch(id);
                    }
                }
            }
        });

        Ok(rx)
    }
}
