//! Storage layer for strata collections
//!
//! This crate implements the in-memory coordination store with:
//! - MemStore: BTreeMap-based storage with RwLock
//! - Revision management with AtomicU64 (one revision per applied batch)
//! - Atomic batches of put / delete / delete-range operations
//! - Prefix and single-key watches with a gap-free initial snapshot
//!
//! `MemStore` implements `strata_core::KvClient`, so every read-only view and
//! watch in the collection layer runs against it unchanged.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod mem_store;
pub mod stored_value;
pub mod watcher;

pub use mem_store::{MemStore, Op};
pub use stored_value::StoredValue;
pub use watcher::{WatcherId, WatcherRegistry};
