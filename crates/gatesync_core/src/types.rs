//! Identifier and key types shared across GateSync.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a queued action.
///
/// Assigned by the queue at insertion, monotonically increasing, and used
/// only for storage addressing. Replay order is decided by creation time,
/// not by this id (the id merely breaks ties between equal timestamps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActionId(u64);

impl ActionId {
    /// Creates an action id from its raw value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the big-endian storage key for this id.
    ///
    /// Big-endian keeps backend key order equal to numeric order.
    #[must_use]
    pub const fn storage_key(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key identifying one cached read result.
///
/// Derived from the resource and the caller's scope, e.g. the guest list
/// for user 7 is `guests:list:7`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    /// Creates the key for a scoped list resource.
    #[must_use]
    pub fn list(resource: &str, scope: &str) -> Self {
        Self(format!("{resource}:list:{scope}"))
    }

    /// Creates a key from an already-derived string.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
