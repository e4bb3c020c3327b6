//! Error types for the engine.

use crate::fetch::FetchError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur in the cache gateway and queue drainer.
///
/// A cache miss after a network failure is deliberately *not* a distinct
/// variant: the gateway surfaces the original [`FetchError`] so the root
/// cause is never masked. An executor failure during a drain is likewise
/// not an `Err` - it is reported inside the drain outcome, because the pass
/// itself completed as designed.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A read failed to reach the backend and no snapshot could substitute.
    #[error("network unavailable: {0}")]
    Network(#[from] FetchError),

    /// The snapshot store or action queue failed.
    #[error("store error: {0}")]
    Store(#[from] gatesync_core::CoreError),

    /// A drain pass was cancelled before completing.
    ///
    /// Actions drained before the cancellation stay removed; everything
    /// else is still queued for a later pass.
    #[error("drain cancelled")]
    Cancelled,
}
