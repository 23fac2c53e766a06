//! Collaborator traits for the coordination store
//!
//! This module defines the two seams the collection layer is written against:
//! - `Stm`: a transactional execution context (buffered, atomic at commit)
//! - `KvClient`: non-transactional reads and watches against the live store
//!
//! Keeping these abstract lets the index-maintenance and watch-translation
//! code run unchanged over the in-memory store or a networked one.

use std::future::Future;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::types::{Event, KeyValue, Sort, WatchMode};

/// Receiving half of a raw watch subscription
pub type EventReceiver = mpsc::UnboundedReceiver<Event>;

/// Transactional execution context
///
/// All operations issued against one instance either take effect together
/// at commit or not at all. Reads observe this transaction's own earlier
/// writes. Conflict detection and retry belong to whoever drives the
/// transaction, never to the code issuing operations.
pub trait Stm {
    /// Read a key; `None` when absent
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store read fails.
    fn get(&mut self, key: &str) -> Result<Option<String>>;

    /// Buffer a write of `value` at `key`
    fn put(&mut self, key: &str, value: String) -> Result<()>;

    /// Buffer a delete of `key`
    fn del(&mut self, key: &str) -> Result<()>;

    /// Buffer a delete of every key starting with `prefix`
    fn del_all(&mut self, prefix: &str) -> Result<()>;
}

/// Live, non-transactional store client
///
/// Thread safety: a client is shared by any number of concurrent views and
/// watch forwarders, so implementations must be `Send + Sync`.
pub trait KvClient: Send + Sync + 'static {
    /// Point read of a single key
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<KeyValue>>> + Send;

    /// Range read of every key starting with `prefix`
    fn get_prefix(
        &self,
        prefix: &str,
        sort: Sort,
    ) -> impl Future<Output = Result<Vec<KeyValue>>> + Send;

    /// Subscribe to a key or key prefix
    ///
    /// The current matching entries are delivered first as synthetic `Put`
    /// events, followed by live events in commit order. The channel closes
    /// when `cancel` fires or the store shuts the subscription down.
    fn watch(
        &self,
        key: &str,
        mode: WatchMode,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<EventReceiver>> + Send;
}
