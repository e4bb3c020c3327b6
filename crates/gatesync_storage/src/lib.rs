//! # GateSync Storage
//!
//! Durable table backend trait and implementations for GateSync.
//!
//! This crate provides the lowest-level storage abstraction for GateSync.
//! Backends are **opaque keyed tables** - they do not interpret the records
//! they store.
//!
//! ## Design Principles
//!
//! - Backends expose simple keyed operations (put, get, delete, scan)
//! - No knowledge of snapshot or action record encodings
//! - Must be `Send + Sync` for shared access
//! - Every mutation is atomic with respect to concurrent readers
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral stores
//! - [`LogBackend`] - For persistent storage using an append-only record log
//!
//! ## Example
//!
//! ```rust
//! use gatesync_storage::{InMemoryBackend, Table, TableBackend};
//!
//! let backend = InMemoryBackend::new();
//! backend.put(Table::Snapshots, b"guests:list:7", b"[]").unwrap();
//! let value = backend.get(Table::Snapshots, b"guests:list:7").unwrap();
//! assert_eq!(value.as_deref(), Some(&b"[]"[..]));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod log;
mod memory;

pub use backend::{Table, TableBackend};
pub use error::{StorageError, StorageResult};
pub use log::LogBackend;
pub use memory::InMemoryBackend;
