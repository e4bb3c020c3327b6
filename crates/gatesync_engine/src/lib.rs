//! # GateSync Engine
//!
//! Cache gateway and queue drainer for GateSync.
//!
//! This crate provides:
//! - The [`CacheGateway`]: network-first reads with snapshot fallback
//! - The [`QueueDrainer`]: ordered replay of pending actions with
//!   stop-on-first-failure
//! - The injected boundary traits ([`Fetcher`], [`ActionExecutor`],
//!   [`HttpClient`]) plus ready-made HTTP adapters
//!
//! ## Architecture
//!
//! The engine sits between the host UI and the network:
//! 1. Reads go through the gateway; a live response refreshes the snapshot
//!    store, a failed one falls back to the last good snapshot.
//! 2. Mutations are queued durably by the host (via
//!    [`gatesync_core::ActionQueue`]) and replayed by the drainer when the
//!    host decides connectivity is back.
//! 3. Both sides publish [`gatesync_core::SyncEvent`]s so open UI surfaces
//!    can react.
//!
//! ## Key Invariants
//!
//! - A failed fetch never overwrites an existing snapshot
//! - Replay order is enqueue order; a drain halts at the first failure and
//!   leaves the failed action and everything after it queued
//! - At most one drain pass runs at a time; a concurrent trigger is
//!   deferred, never interleaved
//! - Delivery to the backend is at-least-once; the queue entry is removed
//!   only after the executor confirms success

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod drainer;
mod error;
mod executor;
mod fetch;
mod gateway;

pub use config::{CachedRoute, GatewayConfig};
pub use drainer::{DrainHalt, DrainOutcome, DrainState, DrainStats, QueueDrainer};
pub use error::{EngineError, EngineResult};
pub use executor::{ActionExecutor, HttpActionExecutor, HttpClient, HttpFetcher, MockExecutor};
pub use fetch::{FetchError, FetchRequest, FetchResponse, Fetcher, Method, MockFetcher};
pub use gateway::{CacheGateway, GatewayResponse, Origin};
