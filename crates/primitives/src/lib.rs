//! Typed collections for strata
//!
//! Provides typed, indexed collections as stateless views over a
//! transactional key-value store:
//! - **Collection**: a record type bound to a key prefix and its indexes
//! - **ReadWriteCollection**: transactional put/get/create/delete with
//!   secondary index upkeep
//! - **ReadWriteIntCollection**: transactional integer counters
//! - **ReadOnlyCollection**: live reads, index lookups and watches
//!
//! ## Design Principle: Stateless Views
//!
//! A collection holds only its prefix, its index definitions and a shared
//! client handle. Views borrow it for the duration of one transaction or
//! one read scope, so any number of views may exist at once.
//!
//! ## Atomicity
//!
//! Read-write views never commit. Every write, including index entries, is
//! buffered in the caller's `Stm` and lands together when the caller
//! commits:
//!
//! ```rust,ignore
//! manager.transaction(|txn| {
//!     let mut jobs = jobs.read_write(txn);
//!     jobs.put("j1", &job)?;
//!     jobs.delete("j0")
//! })?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collection;
pub mod index;
pub mod iterator;
pub mod path;
pub mod read_only;
pub mod read_write;
pub mod read_write_int;
pub mod watch;

pub use collection::{Collection, Record};
pub use index::Index;
pub use iterator::{IndirectIter, Iter};
pub use read_only::ReadOnlyCollection;
pub use read_write::ReadWriteCollection;
pub use read_write_int::ReadWriteIntCollection;
pub use watch::{WatchEvent, WatchStream};
