//! Typed watch streams
//!
//! A forwarding task reads raw store events, translates them into typed
//! `WatchEvent`s and pushes them to the subscriber:
//!
//! ```text
//! store watch ──Event──▶ forward() ──WatchEvent<T>──▶ WatchStream<T>
//!                          │
//!                          └─ Indirect: point read of the primary record
//! ```
//!
//! The output channel closes exactly once: on upstream close, on
//! cancellation, or right after a terminal `Error` event.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, warn};

use strata_core::{Error, Event, EventReceiver, EventType, KvClient};

use crate::collection::Record;
use crate::path;

/// Typed event delivered to a watcher
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent<T> {
    /// A record was created or modified
    Put {
        /// Collection-relative key
        key: String,
        /// Decoded record
        record: T,
        /// Modification revision of the record
        revision: u64,
    },
    /// A record was removed (or left the watched index value)
    Delete {
        /// Collection-relative key
        key: String,
        /// Revision of the removal
        revision: u64,
    },
    /// The watch failed; no further events follow
    Error(Error),
}

impl<T> WatchEvent<T> {
    /// The kind of this event
    pub fn event_type(&self) -> EventType {
        match self {
            WatchEvent::Put { .. } => EventType::Put,
            WatchEvent::Delete { .. } => EventType::Delete,
            WatchEvent::Error(_) => EventType::Error,
        }
    }

    /// Collection-relative key of a put or delete
    pub fn key(&self) -> Option<&str> {
        match self {
            WatchEvent::Put { key, .. } | WatchEvent::Delete { key, .. } => Some(key),
            WatchEvent::Error(_) => None,
        }
    }

    /// Revision of a put or delete
    pub fn revision(&self) -> Option<u64> {
        match self {
            WatchEvent::Put { revision, .. } | WatchEvent::Delete { revision, .. } => {
                Some(*revision)
            }
            WatchEvent::Error(_) => None,
        }
    }
}

/// Subscriber end of a typed watch
///
/// Dropping the stream cancels the subscription.
pub struct WatchStream<T> {
    rx: mpsc::UnboundedReceiver<WatchEvent<T>>,
    cancel: CancellationToken,
    _guard: DropGuard,
}

impl<T> WatchStream<T> {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<WatchEvent<T>>, cancel: CancellationToken) -> Self {
        WatchStream {
            rx,
            _guard: cancel.clone().drop_guard(),
            cancel,
        }
    }

    /// A stream that is already closed
    pub(crate) fn closed(cancel: CancellationToken) -> Self {
        let (_, rx) = mpsc::unbounded_channel();
        Self::new(rx, cancel)
    }

    /// A stream holding a single error event
    pub(crate) fn failed(error: Error) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        // Receiver is alive; the send cannot fail
        let _ = tx.send(WatchEvent::Error(error));
        Self::new(rx, CancellationToken::new())
    }

    /// Receive the next event; `None` once the watch has closed
    pub async fn recv(&mut self) -> Option<WatchEvent<T>> {
        self.rx.recv().await
    }

    /// Receive an event if one is already queued
    pub fn try_recv(&mut self) -> Option<WatchEvent<T>> {
        self.rx.try_recv().ok()
    }

    /// Stop the watch; queued events remain readable, then `recv` returns
    /// `None`
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// True once `cancel` was called or the parent view was cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// How raw events map to records
pub(crate) enum Resolve {
    /// Raw values are the records; keys are relative to `dir`
    Direct { dir: String },
    /// Raw keys are index entries under `dir` naming primary keys in the
    /// collection at `prefix`
    Indirect { dir: String, prefix: String },
}

enum Step<T> {
    Emit(WatchEvent<T>),
    Skip,
    Fail(Error),
    Stop,
}

/// Forward raw events to `tx` until upstream closes, `cancel` fires, the
/// subscriber goes away, or a terminal error is delivered
pub(crate) async fn forward<T, C>(
    client: Arc<C>,
    mut upstream: EventReceiver,
    resolve: Resolve,
    tx: mpsc::UnboundedSender<WatchEvent<T>>,
    cancel: CancellationToken,
) where
    T: Record,
    C: KvClient,
{
    loop {
        let event = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(target: "strata::watch", "Watch cancelled");
                return;
            }
            event = upstream.recv() => match event {
                Some(event) => event,
                None => {
                    debug!(target: "strata::watch", "Upstream watch closed");
                    return;
                }
            },
        };

        let out = match translate(client.as_ref(), &resolve, event, &cancel).await {
            Step::Emit(out) => out,
            Step::Skip => continue,
            Step::Stop => return,
            Step::Fail(e) => {
                warn!(target: "strata::watch", error = %e, "Watch failed");
                let _ = tx.send(WatchEvent::Error(e));
                return;
            }
        };

        if tx.send(out).is_err() {
            debug!(target: "strata::watch", "Watcher dropped");
            return;
        }
    }
}

async fn translate<T, C>(
    client: &C,
    resolve: &Resolve,
    event: Event,
    cancel: &CancellationToken,
) -> Step<T>
where
    T: Record,
    C: KvClient,
{
    match (event, resolve) {
        (Event::Error(e), _) => Step::Fail(e),

        (Event::Delete { key, revision }, Resolve::Direct { dir })
        | (Event::Delete { key, revision }, Resolve::Indirect { dir, .. }) => {
            Step::Emit(WatchEvent::Delete {
                key: path::relative_key(&key, dir).to_string(),
                revision,
            })
        }

        (Event::Put { key, value, revision }, Resolve::Direct { dir }) => {
            match serde_json::from_str(&value) {
                Ok(record) => Step::Emit(WatchEvent::Put {
                    key: path::relative_key(&key, dir).to_string(),
                    record,
                    revision,
                }),
                Err(e) => Step::Fail(e.into()),
            }
        }

        (Event::Put { key, .. }, Resolve::Indirect { dir, prefix }) => {
            let primary_key = path::relative_key(&key, dir).to_string();
            let primary = path::primary_path(prefix, &primary_key);
            let read = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Step::Stop,
                read = client.get(&primary) => read,
            };
            match read {
                Ok(Some(kv)) => match serde_json::from_str(&kv.value) {
                    Ok(record) => Step::Emit(WatchEvent::Put {
                        key: primary_key,
                        record,
                        revision: kv.mod_revision,
                    }),
                    Err(e) => Step::Fail(e.into()),
                },
                Ok(None) => {
                    debug!(target: "strata::watch", key = %primary_key, "Indexed record gone before it was read; skipping");
                    Step::Skip
                }
                Err(e) => Step::Fail(e),
            }
        }
    }
}
