//! Core types and traits for strata collections
//!
//! This crate defines the foundational types used throughout the system:
//! - Error: Error type hierarchy shared by every layer
//! - KeyValue, Sort, WatchMode: raw string-keyed store types
//! - Event, EventType: raw watch stream events
//! - Traits: collaborator seams (Stm, KvClient)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::{EventReceiver, KvClient, Stm};
pub use types::{Event, EventType, KeyValue, Sort, WatchMode, SEPARATOR};
