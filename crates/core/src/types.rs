//! Raw store types shared by every layer
//!
//! This module defines the string-keyed view of the coordination store:
//! - KeyValue: a stored entry with its revision metadata
//! - Sort: ordering of prefix range reads
//! - WatchMode: single key vs. key-prefix subscriptions
//! - Event / EventType: raw watch stream events

use crate::error::Error;

/// Separator between path segments in store keys
pub const SEPARATOR: char = '/';

/// A stored entry as returned by point and range reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    /// Full store key
    pub key: String,
    /// Stored text
    pub value: String,
    /// Revision at which the key was (last) created
    pub create_revision: u64,
    /// Revision of the last modification
    pub mod_revision: u64,
    /// Number of modifications since creation (1 on create)
    pub version: u64,
}

/// Ordering of a prefix range read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sort {
    /// Lexicographic key order
    #[default]
    KeyAscend,
    /// Most recently modified first; ties broken by key order
    ModRevisionDescend,
}

/// Scope of a watch subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchMode {
    /// Exactly one key
    Key,
    /// Every key starting with the given prefix
    Prefix,
}

impl WatchMode {
    /// Check whether `candidate` falls inside a subscription on `key`
    pub fn matches(&self, key: &str, candidate: &str) -> bool {
        match self {
            WatchMode::Key => candidate == key,
            WatchMode::Prefix => candidate.starts_with(key),
        }
    }
}

/// Kind of a watch event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    /// Key was created or modified
    Put,
    /// Key was removed
    Delete,
    /// Subscription failed; no further events follow
    Error,
}

/// Raw event delivered by a store watch
///
/// The initial snapshot of a subscription is delivered as a run of synthetic
/// `Put` events before live events begin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Key was created or modified
    Put {
        /// Full store key
        key: String,
        /// New value
        value: String,
        /// Modification revision
        revision: u64,
    },
    /// Key was removed
    Delete {
        /// Full store key
        key: String,
        /// Revision of the delete
        revision: u64,
    },
    /// Terminal failure of the subscription
    Error(Error),
}

impl Event {
    /// The kind of this event
    pub fn event_type(&self) -> EventType {
        match self {
            Event::Put { .. } => EventType::Put,
            Event::Delete { .. } => EventType::Delete,
            Event::Error(_) => EventType::Error,
        }
    }

    /// Store key carried by a put or delete
    pub fn key(&self) -> Option<&str> {
        match self {
            Event::Put { key, .. } | Event::Delete { key, .. } => Some(key),
            Event::Error(_) => None,
        }
    }

    /// Revision of a put or delete
    pub fn revision(&self) -> Option<u64> {
        match self {
            Event::Put { revision, .. } | Event::Delete { revision, .. } => Some(*revision),
            Event::Error(_) => None,
        }
    }
}
