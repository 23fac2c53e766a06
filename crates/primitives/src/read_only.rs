//! Non-transactional view over the live store
//!
//! Reads go straight to the client and see the latest committed state.
//! Every call races the view's cancellation token and returns
//! `Error::Cancelled` if the token fires first.

use std::future::Future;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use strata_core::{Error, KvClient, Result, Sort, WatchMode};

use crate::collection::{Collection, Record};
use crate::iterator::{IndirectIter, Iter};
use crate::watch::{self, Resolve, WatchStream};

/// Read-only view of a collection bound to a cancellation token
pub struct ReadOnlyCollection<'a, T, C> {
    collection: &'a Collection<T, C>,
    cancel: CancellationToken,
}

impl<'a, T, C> Clone for ReadOnlyCollection<'a, T, C> {
    fn clone(&self) -> Self {
        ReadOnlyCollection {
            collection: self.collection,
            cancel: self.cancel.clone(),
        }
    }
}

impl<'a, T: Record, C: KvClient> ReadOnlyCollection<'a, T, C> {
    pub(crate) fn new(collection: &'a Collection<T, C>, cancel: CancellationToken) -> Self {
        ReadOnlyCollection { collection, cancel }
    }

    /// Token bounding this view's reads and watches
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Read and decode the record at `key`
    ///
    /// # Errors
    ///
    /// `NotFound` when absent, `Serialization` when undecodable, `Cancelled`
    /// when the view's token fires first.
    pub async fn get(&self, key: &str) -> Result<T> {
        let client = self.collection.client();
        let kv = self
            .cancellable(client.get(&self.collection.path(key)))
            .await?
            .ok_or_else(|| self.collection.not_found(key))?;
        Ok(serde_json::from_str(&kv.value)?)
    }

    /// Every record in the collection, most recently modified first
    ///
    /// Index entries are stored outside the collection prefix and never
    /// appear here.
    pub async fn list(&self) -> Result<Iter<T>> {
        let prefix = self.collection.prefix();
        let entries = self
            .cancellable(
                self.collection
                    .client()
                    .get_prefix(prefix, Sort::ModRevisionDescend),
            )
            .await?;
        Ok(Iter::new(prefix.to_string(), entries))
    }

    /// Records whose `index` value equals `value`, most recently indexed
    /// first
    ///
    /// # Errors
    ///
    /// `UnknownIndex` when `index` is not declared on the collection.
    pub async fn get_by_index(&self, index: &str, value: &str) -> Result<IndirectIter<'a, T, C>> {
        let index = self.collection.require_index(index)?;
        let dir = self.collection.index_scan_dir(index, value);
        let entries = self
            .cancellable(self.collection.client().get_prefix(&dir, Sort::ModRevisionDescend))
            .await?;
        Ok(IndirectIter::new(self.clone(), entries))
    }

    /// Watch every record in the collection
    ///
    /// Existing records arrive first as `Put` events, then live changes in
    /// commit order.
    pub async fn watch(&self) -> WatchStream<T> {
        let prefix = self.collection.prefix().to_string();
        self.subscribe(
            prefix.clone(),
            WatchMode::Prefix,
            Resolve::Direct { dir: prefix },
        )
        .await
    }

    /// Watch the single record at `key`
    pub async fn watch_one(&self, key: &str) -> WatchStream<T> {
        self.subscribe(
            self.collection.path(key),
            WatchMode::Key,
            Resolve::Direct {
                dir: self.collection.prefix().to_string(),
            },
        )
        .await
    }

    /// Watch the records whose `index` value equals `value`
    ///
    /// `Put` events carry the full record, read when the index entry changes.
    /// A record that moves out of `value` produces a `Delete` for its key.
    /// An undeclared index yields a stream holding one error event.
    pub async fn watch_by_index(&self, index: &str, value: &str) -> WatchStream<T> {
        let index = match self.collection.require_index(index) {
            Ok(index) => index,
            Err(e) => return WatchStream::failed(e),
        };
        let dir = self.collection.index_scan_dir(index, value);
        self.subscribe(
            dir.clone(),
            WatchMode::Prefix,
            Resolve::Indirect {
                dir,
                prefix: self.collection.prefix().to_string(),
            },
        )
        .await
    }

    async fn subscribe(&self, key: String, mode: WatchMode, resolve: Resolve) -> WatchStream<T> {
        let cancel = self.cancel.child_token();
        let client = self.collection.client();
        match self
            .cancellable(client.watch(&key, mode, cancel.clone()))
            .await
        {
            Ok(upstream) => {
                let (tx, rx) = mpsc::unbounded_channel();
                tokio::spawn(watch::forward(
                    client.clone(),
                    upstream,
                    resolve,
                    tx,
                    cancel.clone(),
                ));
                debug!(target: "strata::watch", key = %key, ?mode, "Watch opened");
                WatchStream::new(rx, cancel)
            }
            Err(Error::Cancelled) => WatchStream::closed(cancel),
            Err(e) => WatchStream::failed(e),
        }
    }

    async fn cancellable<F, R>(&self, op: F) -> Result<R>
    where
        F: Future<Output = Result<R>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            result = op => result,
        }
    }
}

impl<T, C> std::fmt::Debug for ReadOnlyCollection<'_, T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadOnlyCollection")
            .field("prefix", &self.collection.prefix())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}
