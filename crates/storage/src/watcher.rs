//! Watch registry: fan-out of committed events to subscribers
//!
//! Every subscriber owns an unbounded sender. A subscriber whose receiver
//! has been dropped is pruned on the next dispatch that matches it.
//!
//! Each entry also carries a release token, cancelled when the entry leaves
//! the registry for any reason, so tasks tied to a subscription can exit.

use std::collections::BTreeMap;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use strata_core::{Event, WatchMode};

/// Identifier of a registered watcher
pub type WatcherId = u64;

#[derive(Debug)]
struct Watcher {
    key: String,
    mode: WatchMode,
    tx: mpsc::UnboundedSender<Event>,
    released: CancellationToken,
}

impl Drop for Watcher {
    fn drop(&mut self) {
        self.released.cancel();
    }
}

/// Registered watchers, ordered by registration
#[derive(Debug, Default)]
pub struct WatcherRegistry {
    next_id: WatcherId,
    watchers: BTreeMap<WatcherId, Watcher>,
}

impl WatcherRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a watcher and return its id
    pub fn register(
        &mut self,
        key: &str,
        mode: WatchMode,
        tx: mpsc::UnboundedSender<Event>,
    ) -> WatcherId {
        self.register_with_release(key, mode, tx).0
    }

    /// Register a watcher, also returning the token cancelled on its removal
    pub fn register_with_release(
        &mut self,
        key: &str,
        mode: WatchMode,
        tx: mpsc::UnboundedSender<Event>,
    ) -> (WatcherId, CancellationToken) {
        self.next_id += 1;
        let id = self.next_id;
        let released = CancellationToken::new();
        self.watchers.insert(
            id,
            Watcher {
                key: key.to_string(),
                mode,
                tx,
                released: released.clone(),
            },
        );
        (id, released)
    }

    /// Remove a watcher; dropping its sender closes the subscriber's channel
    pub fn remove(&mut self, id: WatcherId) -> bool {
        self.watchers.remove(&id).is_some()
    }

    /// Remove every watcher
    pub fn clear(&mut self) -> usize {
        let count = self.watchers.len();
        self.watchers.clear();
        count
    }

    /// Number of live watchers
    pub fn len(&self) -> usize {
        self.watchers.len()
    }

    /// True when no watcher is registered
    pub fn is_empty(&self) -> bool {
        self.watchers.is_empty()
    }

    /// Deliver events, in order, to every matching watcher
    pub fn dispatch(&mut self, events: &[Event]) {
        if events.is_empty() || self.watchers.is_empty() {
            return;
        }

        let mut dead = Vec::new();
        for (id, watcher) in &self.watchers {
            for event in events {
                let Some(key) = event.key() else { continue };
                if !watcher.mode.matches(&watcher.key, key) {
                    continue;
                }
                if watcher.tx.send(event.clone()).is_err() {
                    dead.push(*id);
                    break;
                }
            }
        }

        for id in dead {
            self.watchers.remove(&id);
            tracing::debug!(target: "strata::store", watcher = id, "Pruned watcher with dropped receiver");
        }
    }
}
