//! Transactional integer counters
//!
//! Values are stored as base-10 signed integer text. Increment and decrement
//! are read-modify-write inside the caller's transaction, so concurrent
//! updates to the same counter conflict at commit rather than lose writes.

use strata_core::{Error, Result, Stm};

use crate::path;

/// Counter view of a collection bound to one transaction
pub struct ReadWriteIntCollection<'a, S: ?Sized> {
    prefix: &'a str,
    stm: &'a mut S,
}

impl<'a, S: Stm + ?Sized> ReadWriteIntCollection<'a, S> {
    pub(crate) fn new(prefix: &'a str, stm: &'a mut S) -> Self {
        ReadWriteIntCollection { prefix, stm }
    }

    /// Create a counter at `key` with value `value`
    ///
    /// # Errors
    ///
    /// `AlreadyExists` when `key` holds a value.
    pub fn create(&mut self, key: &str, value: i64) -> Result<()> {
        let path = path::primary_path(self.prefix, key);
        if self.stm.get(&path)?.is_some() {
            return Err(Error::AlreadyExists {
                collection: self.prefix.to_string(),
                key: key.to_string(),
            });
        }
        self.stm.put(&path, value.to_string())
    }

    /// Read the counter at `key`
    ///
    /// # Errors
    ///
    /// `NotFound` when absent; `MalformedValue` when the stored text is not
    /// an integer.
    pub fn get(&mut self, key: &str) -> Result<i64> {
        let raw = self
            .stm
            .get(&path::primary_path(self.prefix, key))?
            .ok_or_else(|| Error::NotFound {
                collection: self.prefix.to_string(),
                key: key.to_string(),
            })?;
        raw.parse::<i64>().map_err(|_| Error::MalformedValue {
            collection: self.prefix.to_string(),
            key: key.to_string(),
            raw,
        })
    }

    /// Add one to the counter at `key`
    pub fn increment(&mut self, key: &str) -> Result<()> {
        self.add(key, 1)
    }

    /// Subtract one from the counter at `key`
    pub fn decrement(&mut self, key: &str) -> Result<()> {
        self.add(key, -1)
    }

    /// Remove the counter at `key`
    ///
    /// # Errors
    ///
    /// `NotFound` when absent.
    pub fn delete(&mut self, key: &str) -> Result<()> {
        let path = path::primary_path(self.prefix, key);
        if self.stm.get(&path)?.is_none() {
            return Err(Error::NotFound {
                collection: self.prefix.to_string(),
                key: key.to_string(),
            });
        }
        self.stm.del(&path)
    }

    fn add(&mut self, key: &str, delta: i64) -> Result<()> {
        let value = self.get(key)?.wrapping_add(delta);
        self.stm
            .put(&path::primary_path(self.prefix, key), value.to_string())
    }
}
