//! Error types for strata collections
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! `Error` is `Clone` so that a terminal failure can be carried inside a
//! watch event instead of being raised through a call-return path.

use thiserror::Error;

/// Result type alias for collection and store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for collections and the coordination store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Point operation target is absent
    #[error("{key} not found in {collection}")]
    NotFound {
        /// Collection prefix
        collection: String,
        /// Collection-relative key
        key: String,
    },

    /// Create target already holds a value
    #[error("{key} already exists in {collection}")]
    AlreadyExists {
        /// Collection prefix
        collection: String,
        /// Collection-relative key
        key: String,
    },

    /// Stored text does not parse as the expected scalar type
    #[error("malformed value at {key} in {collection}: {raw:?}")]
    MalformedValue {
        /// Collection prefix
        collection: String,
        /// Collection-relative key
        key: String,
        /// The stored text as found
        raw: String,
    },

    /// Index name not declared on the collection
    #[error("index {index:?} is not declared on {collection}")]
    UnknownIndex {
        /// Collection prefix
        collection: String,
        /// Requested index name
        index: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Storage layer error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Transaction aborted due to a read-set conflict
    #[error("Transaction aborted: {reason}")]
    TransactionAborted {
        /// Human-readable reason for abort
        reason: String,
    },

    /// Operation issued against a transaction that is no longer active
    #[error("Transaction not active: {state}")]
    TransactionNotActive {
        /// Current transaction state
        state: String,
    },

    /// The caller's execution context was cancelled
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// True for `NotFound`
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// True for `AlreadyExists`
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Error::AlreadyExists { .. })
    }

    /// True when the failure is an optimistic-concurrency conflict that the
    /// caller may resolve by re-running the transaction.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::TransactionAborted { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
