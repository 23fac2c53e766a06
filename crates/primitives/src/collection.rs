//! Typed collection over a prefix of the coordination store
//!
//! A `Collection` binds a key prefix, a record type and a list of secondary
//! indexes. It holds no data itself: every read and write goes through one
//! of the views it hands out.
//!
//! ## Views
//!
//! - `read_write(stm)`: transactional record operations with index upkeep
//! - `read_write_int(stm)`: transactional integer counters
//! - `read_only(cancel)`: live reads and watches against the client
//!
//! Views are short-lived and borrow the collection; the collection itself
//! is cheap to share behind an `Arc` across tasks.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use strata_core::{Error, KvClient, Result, Stm};

use crate::index::Index;
use crate::path;
use crate::read_only::ReadOnlyCollection;
use crate::read_write::ReadWriteCollection;
use crate::read_write_int::ReadWriteIntCollection;

/// Record types storable in a collection
///
/// Records are persisted as JSON text. Implemented for every type that
/// round-trips through serde and can cross task boundaries.
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> Record for T where T: Serialize + DeserializeOwned + Send + Sync + 'static {}

/// A typed, indexed collection of records under one key prefix
pub struct Collection<T, C> {
    client: Arc<C>,
    prefix: String,
    indexes: Vec<Index<T>>,
}

impl<T, C> Collection<T, C> {
    /// Create a collection rooted at `prefix`
    ///
    /// A separator is appended to a prefix that lacks one, so two
    /// collections whose prefixes share a textual prefix never see each
    /// other's keys. An empty prefix becomes `/`.
    pub fn new(client: Arc<C>, prefix: &str, indexes: Vec<Index<T>>) -> Self {
        Collection {
            client,
            prefix: path::normalize_prefix(prefix),
            indexes,
        }
    }

    /// Normalized, separator-terminated key prefix
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Declared secondary indexes
    pub fn indexes(&self) -> &[Index<T>] {
        &self.indexes
    }

    /// Look up a declared index by name
    pub fn index(&self, name: &str) -> Option<&Index<T>> {
        self.indexes.iter().find(|index| index.name() == name)
    }

    /// Store client used by read-only views
    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    /// Integer-counter view bound to a transaction
    ///
    /// Counters share the collection's prefix but ignore its record type
    /// and indexes.
    pub fn read_write_int<'a, S>(&'a self, stm: &'a mut S) -> ReadWriteIntCollection<'a, S>
    where
        S: Stm + ?Sized,
    {
        ReadWriteIntCollection::new(&self.prefix, stm)
    }

    pub(crate) fn path(&self, key: &str) -> String {
        path::primary_path(&self.prefix, key)
    }

    pub(crate) fn index_path(&self, index: &Index<T>, value: &str, key: &str) -> String {
        path::index_path(&self.prefix, index.name(), value, key)
    }

    /// Separator-terminated directory scanned for one index value
    pub(crate) fn index_scan_dir(&self, index: &Index<T>, value: &str) -> String {
        format!(
            "{}{}",
            path::index_dir(&self.prefix, index.name(), value),
            strata_core::SEPARATOR
        )
    }

    pub(crate) fn index_root(&self, index: &Index<T>) -> String {
        path::index_root(&self.prefix, index.name())
    }

    pub(crate) fn require_index(&self, name: &str) -> Result<&Index<T>> {
        self.index(name).ok_or_else(|| Error::UnknownIndex {
            collection: self.prefix.clone(),
            index: name.to_string(),
        })
    }

    pub(crate) fn not_found(&self, key: &str) -> Error {
        Error::NotFound {
            collection: self.prefix.clone(),
            key: key.to_string(),
        }
    }
}

impl<T: Record, C> Collection<T, C> {
    /// Transactional view bound to `stm`
    ///
    /// Every operation on the view is buffered in `stm` and takes effect
    /// when the caller commits it.
    pub fn read_write<'a, S>(&'a self, stm: &'a mut S) -> ReadWriteCollection<'a, T, C, S>
    where
        S: Stm + ?Sized,
    {
        ReadWriteCollection::new(self, stm)
    }
}

impl<T: Record, C: KvClient> Collection<T, C> {
    /// Live view bound to a cancellation token
    ///
    /// Reads issued through the view fail with `Error::Cancelled` once
    /// `cancel` fires, and watches opened from it close.
    pub fn read_only(&self, cancel: CancellationToken) -> ReadOnlyCollection<'_, T, C> {
        ReadOnlyCollection::new(self, cancel)
    }
}

impl<T, C> std::fmt::Debug for Collection<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("prefix", &self.prefix)
            .field("indexes", &self.indexes)
            .finish()
    }
}
