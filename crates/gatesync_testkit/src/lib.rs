//! # GateSync Testkit
//!
//! Test utilities for GateSync.
//!
//! This crate provides:
//! - Test fixtures: temp-dir log backends and prepopulated queues
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use gatesync_testkit::TestStore;
//!
//! let store = TestStore::new();
//! let backend = store.open();
//! // ... exercise the backend, drop it, call store.open() again to
//! // simulate a restart
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

pub use fixtures::*;
pub use generators::*;
