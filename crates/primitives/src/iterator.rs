//! Lazy record iterators over range-read results
//!
//! Both iterators hold the raw entries of a single range read and decode one
//! record per step. The first error ends iteration: every later step
//! reports exhaustion.

use std::marker::PhantomData;

use strata_core::{KeyValue, KvClient, Result};

use crate::collection::Record;
use crate::path;
use crate::read_only::ReadOnlyCollection;

/// Iterator over records returned by a prefix read
///
/// Yields `(key, record)` with `key` relative to the collection prefix.
pub struct Iter<T> {
    dir: String,
    entries: std::vec::IntoIter<KeyValue>,
    done: bool,
    _record: PhantomData<fn() -> T>,
}

impl<T> Iter<T> {
    pub(crate) fn new(dir: String, entries: Vec<KeyValue>) -> Self {
        Iter {
            dir,
            entries: entries.into_iter(),
            done: false,
            _record: PhantomData,
        }
    }

    /// Entries not yet visited
    pub fn remaining(&self) -> usize {
        if self.done {
            0
        } else {
            self.entries.len()
        }
    }
}

impl<T: Record> Iterator for Iter<T> {
    type Item = Result<(String, T)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let kv = self.entries.next()?;
        let key = path::relative_key(&kv.key, &self.dir).to_string();
        match serde_json::from_str(&kv.value) {
            Ok(record) => Some(Ok((key, record))),
            Err(e) => {
                self.done = true;
                Some(Err(e.into()))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining()))
    }
}

impl<T: Record> std::iter::FusedIterator for Iter<T> {}

/// Iterator that resolves index entries to the records they reference
///
/// Each step issues one point read of the primary record, so it is async.
/// Records deleted since the index read surface as `NotFound`.
pub struct IndirectIter<'a, T, C> {
    view: ReadOnlyCollection<'a, T, C>,
    entries: std::vec::IntoIter<KeyValue>,
    done: bool,
}

impl<'a, T: Record, C: KvClient> IndirectIter<'a, T, C> {
    pub(crate) fn new(view: ReadOnlyCollection<'a, T, C>, entries: Vec<KeyValue>) -> Self {
        IndirectIter {
            view,
            entries: entries.into_iter(),
            done: false,
        }
    }

    /// Resolve the next index entry
    ///
    /// Returns `None` once every entry has been visited or after an error.
    pub async fn next(&mut self) -> Option<Result<(String, T)>> {
        if self.done {
            return None;
        }
        // Index entries hold the primary key they point at
        let key = self.entries.next()?.value;
        match self.view.get(&key).await {
            Ok(record) => Some(Ok((key, record))),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }

    /// Drain the iterator, stopping at the first error
    pub async fn try_collect(mut self) -> Result<Vec<(String, T)>> {
        let mut records = Vec::with_capacity(self.entries.len());
        while let Some(item) = self.next().await {
            records.push(item?);
        }
        Ok(records)
    }

    /// Index entries not yet resolved
    pub fn remaining(&self) -> usize {
        if self.done {
            0
        } else {
            self.entries.len()
        }
    }
}
