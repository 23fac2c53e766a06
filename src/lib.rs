//! Strata collections - typed, indexed, watchable records over a
//! transactional coordination store
//!
//! A collection maps a record type onto a key prefix, keeps secondary
//! indexes alongside the records and turns raw store events into typed
//! change notifications.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use strata_collections::{Collection, Index, MemStore, TransactionManager};
//!
//! let store = MemStore::new();
//! let manager = TransactionManager::new(store.clone());
//! let jobs = Collection::new(
//!     Arc::new(store),
//!     "jobs",
//!     vec![Index::new("State", |job: &Job| job.state.clone())],
//! );
//!
//! // Record and index entries commit together
//! manager.transaction(|txn| jobs.read_write(txn).put("j1", &job))?;
//!
//! // Live reads and watches
//! let view = jobs.read_only(CancellationToken::new());
//! let running = view.get_by_index("State", "running").await?.try_collect().await?;
//! let mut changes = view.watch_by_index("State", "running").await;
//! ```
//!
//! # Architecture
//!
//! - `strata-core`: errors, raw store types and the `Stm` / `KvClient` seams
//! - `strata-storage`: `MemStore`, the in-memory revisioned store
//! - `strata-concurrency`: optimistic transactions over `MemStore`
//! - `strata-primitives`: collections, indexes, iterators and watches
//!
//! The collection layer only depends on the two traits, so another store
//! can be plugged in by implementing `Stm` and `KvClient`.

pub use strata_concurrency::{
    RetryConfig, StoreConfig, TransactionContext, TransactionManager, TransactionStatus,
    CONFIG_FILE_NAME,
};
pub use strata_core::{
    Error, Event, EventReceiver, EventType, KeyValue, KvClient, Result, Sort, Stm, WatchMode,
    SEPARATOR,
};
pub use strata_primitives::{
    Collection, Index, IndirectIter, Iter, ReadOnlyCollection, ReadWriteCollection,
    ReadWriteIntCollection, Record, WatchEvent, WatchStream,
};
pub use strata_storage::{MemStore, Op};
