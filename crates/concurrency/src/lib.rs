//! Concurrency layer for strata collections
//!
//! This crate implements optimistic concurrency control (OCC) with:
//! - TransactionContext: the transactional execution context (`Stm`) with
//!   read-set tracking and buffered, read-your-writes mutations
//! - Conflict detection at commit time (first-committer-wins)
//! - TransactionManager: atomic commit plus a retrying closure API
//! - RetryConfig / StoreConfig: retry policy loaded from `strata.toml`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod manager;
pub mod transaction;
pub mod validation;

pub use config::{RetryConfig, StoreConfig, CONFIG_FILE_NAME};
pub use manager::TransactionManager;
pub use transaction::{PendingOperations, TransactionContext, TransactionStatus};
pub use validation::{validate_read_set, ConflictType, ValidationResult};
