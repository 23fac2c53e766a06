//! Transactional record view with secondary index upkeep
//!
//! ## Index maintenance
//!
//! For every declared index, a record at `key` whose index value is `v` has
//! exactly one back-reference at `<index dir>/v/key` holding `key`. `put`
//! moves the back-reference when the value changes; `delete` removes it.
//! All writes go through the caller's `Stm`, so the record and its index
//! entries become visible together or not at all.

use tracing::{debug, warn};

use strata_core::{Error, Result, Stm};

use crate::collection::{Collection, Record};

/// Read-write view of a collection bound to one transaction
pub struct ReadWriteCollection<'a, T, C, S: ?Sized> {
    collection: &'a Collection<T, C>,
    stm: &'a mut S,
}

impl<'a, T, C, S> ReadWriteCollection<'a, T, C, S>
where
    T: Record,
    S: Stm + ?Sized,
{
    pub(crate) fn new(collection: &'a Collection<T, C>, stm: &'a mut S) -> Self {
        ReadWriteCollection { collection, stm }
    }

    /// Read and decode the record at `key`
    ///
    /// # Errors
    ///
    /// `NotFound` when absent; `Serialization` when the stored text does not
    /// decode as `T`.
    pub fn get(&mut self, key: &str) -> Result<T> {
        let raw = self
            .stm
            .get(&self.collection.path(key))?
            .ok_or_else(|| self.collection.not_found(key))?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write `record` at `key`, creating or replacing it
    ///
    /// Index entries are reconciled against the record currently stored at
    /// `key` before the primary write is buffered.
    ///
    /// # Errors
    ///
    /// Any failure reading the prior record other than absence is returned
    /// and leaves the transaction to be discarded by the caller.
    pub fn put(&mut self, key: &str, record: &T) -> Result<()> {
        let collection = self.collection;
        let encoded = serde_json::to_string(record)?;

        for index in collection.indexes() {
            let entry = collection.index_path(index, &index.value_of(record), key);

            if let Some(prior) = self.prior(key)? {
                let stale = collection.index_path(index, &index.value_of(&prior), key);
                if stale != entry {
                    debug!(target: "strata::collection", index = index.name(), from = %stale, to = %entry, "Moving index entry");
                    self.stm.del(&stale)?;
                }
            }

            if self.stm.get(&entry)?.is_none() {
                self.stm.put(&entry, key.to_string())?;
            }
        }

        self.stm.put(&collection.path(key), encoded)
    }

    /// Write `record` at `key` only if nothing is stored there yet
    ///
    /// # Errors
    ///
    /// `AlreadyExists` when `key` holds a value; nothing is written.
    pub fn create(&mut self, key: &str, record: &T) -> Result<()> {
        if self.stm.get(&self.collection.path(key))?.is_some() {
            return Err(Error::AlreadyExists {
                collection: self.collection.prefix().to_string(),
                key: key.to_string(),
            });
        }
        self.put(key, record)
    }

    /// Remove the record at `key` and its index entries
    ///
    /// A stored record that no longer decodes still gets deleted; its index
    /// entries cannot be located and are left in place.
    ///
    /// # Errors
    ///
    /// `NotFound` when absent.
    pub fn delete(&mut self, key: &str) -> Result<()> {
        let collection = self.collection;
        let primary = collection.path(key);
        if self.stm.get(&primary)?.is_none() {
            return Err(collection.not_found(key));
        }

        for index in collection.indexes() {
            match self.get(key) {
                Ok(current) => {
                    let entry = collection.index_path(index, &index.value_of(&current), key);
                    self.stm.del(&entry)?;
                }
                Err(Error::Serialization(reason)) => {
                    warn!(target: "strata::collection", collection = collection.prefix(), key, index = index.name(), %reason, "Skipping index cleanup for undecodable record");
                }
                Err(e) => return Err(e),
            }
        }

        self.stm.del(&primary)
    }

    /// Remove every record in the collection and every index entry
    pub fn delete_all(&mut self) -> Result<()> {
        let collection = self.collection;
        self.stm.del_all(collection.prefix())?;
        for index in collection.indexes() {
            self.stm.del_all(&collection.index_root(index))?;
        }
        debug!(target: "strata::collection", collection = collection.prefix(), "Deleted all records");
        Ok(())
    }

    fn prior(&mut self, key: &str) -> Result<Option<T>> {
        match self.get(key) {
            Ok(record) => Ok(Some(record)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
