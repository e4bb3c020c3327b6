//! # GateSync Core
//!
//! Data model, snapshot store, and pending-action queue for GateSync.
//!
//! This crate provides:
//! - The [`SnapshotStore`]: keyed last-known-good cache of read results
//! - The [`ActionQueue`]: durable, strictly-ordered log of not-yet-confirmed
//!   mutations
//! - The [`EventBus`]: fan-out of typed [`SyncEvent`]s to UI consumers
//! - The record types shared by all of them
//!
//! ## Key Invariants
//!
//! - At most one snapshot per cache key; a newer write replaces the older
//!   value atomically
//! - Queue order is `(created_at, id)` ascending and is the only valid
//!   replay order
//! - A queued action is never mutated in place; it is deleted only after the
//!   backend confirms it
//! - The bus delivers to current subscribers only; missed events are not
//!   replayed

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod action;
mod bus;
mod error;
mod queue;
mod snapshot;
mod types;

pub use action::{decode_payload, encode_payload, ActionKind, AssetPayload, CheckInPayload, PendingAction};
pub use bus::{EventBus, SyncEvent};
pub use error::{CoreError, CoreResult};
pub use queue::ActionQueue;
pub use snapshot::{Snapshot, SnapshotStore};
pub use types::{ActionId, CacheKey};
