//! Snapshot store: keyed cache of last-known-good read results.

use crate::error::{CoreError, CoreResult};
use crate::types::{now_millis, CacheKey};
use gatesync_storage::{Table, TableBackend};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A cached last-known-good response for one cache key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// The key this snapshot was stored under.
    pub key: CacheKey,
    /// The last successful response body, opaque to this crate.
    pub payload: Vec<u8>,
    /// Capture time in milliseconds since the Unix epoch.
    pub captured_at_ms: u64,
}

/// Keyed, versioned cache of last-known-good read results.
///
/// At most one snapshot exists per key; a newer `put` replaces the older
/// value atomically. Snapshots are never expired by this store - staleness
/// policy is a caller concern.
pub struct SnapshotStore {
    backend: Arc<dyn TableBackend>,
}

impl SnapshotStore {
    /// Creates a snapshot store over the given backend.
    #[must_use]
    pub fn new(backend: Arc<dyn TableBackend>) -> Self {
        Self { backend }
    }

    /// Stores `payload` as the current snapshot for `key`, capture time now.
    ///
    /// # Errors
    ///
    /// Returns an error if durable storage is unavailable. Callers on the
    /// cache-fill path may treat that as best-effort and ignore it.
    pub fn put(&self, key: &CacheKey, payload: &[u8]) -> CoreResult<()> {
        self.put_at(key, payload, now_millis())
    }

    /// Stores `payload` for `key` with an explicit capture time.
    ///
    /// # Errors
    ///
    /// Returns an error if durable storage is unavailable.
    pub fn put_at(&self, key: &CacheKey, payload: &[u8], captured_at_ms: u64) -> CoreResult<()> {
        let snapshot = Snapshot {
            key: key.clone(),
            payload: payload.to_vec(),
            captured_at_ms,
        };
        let mut buf = Vec::new();
        ciborium::into_writer(&snapshot, &mut buf).map_err(CoreError::codec)?;
        self.backend.put(Table::Snapshots, key.as_str().as_bytes(), &buf)?;
        Ok(())
    }

    /// Returns the stored snapshot for `key`, if any. Never touches the
    /// network.
    ///
    /// # Errors
    ///
    /// Returns an error if storage is unavailable or the record is corrupt.
    pub fn get(&self, key: &CacheKey) -> CoreResult<Option<Snapshot>> {
        match self.backend.get(Table::Snapshots, key.as_str().as_bytes())? {
            Some(bytes) => {
                let snapshot = ciborium::from_reader(&bytes[..]).map_err(CoreError::codec)?;
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }

    /// Returns the number of stored snapshots.
    ///
    /// # Errors
    ///
    /// Returns an error if storage is unavailable.
    pub fn len(&self) -> CoreResult<usize> {
        Ok(self.backend.scan(Table::Snapshots)?.len())
    }

    /// Returns true if no snapshots are stored.
    ///
    /// # Errors
    ///
    /// Returns an error if storage is unavailable.
    pub fn is_empty(&self) -> CoreResult<bool> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatesync_storage::InMemoryBackend;

    fn store() -> SnapshotStore {
        SnapshotStore::new(Arc::new(InMemoryBackend::new()))
    }

    #[test]
    fn get_missing_returns_none() {
        let store = store();
        let key = CacheKey::list("guests", "1");
        assert!(store.get(&key).unwrap().is_none());
    }

    #[test]
    fn put_then_get_returns_payload() {
        let store = store();
        let key = CacheKey::list("guests", "1");

        store.put(&key, br#"[{"id":5}]"#).unwrap();

        let snapshot = store.get(&key).unwrap().unwrap();
        assert_eq!(snapshot.key, key);
        assert_eq!(snapshot.payload, br#"[{"id":5}]"#.to_vec());
        assert!(snapshot.captured_at_ms > 0);
    }

    #[test]
    fn put_overwrites_previous_snapshot() {
        let store = store();
        let key = CacheKey::list("guests", "1");

        store.put_at(&key, b"old", 100).unwrap();
        store.put_at(&key, b"new", 200).unwrap();

        let snapshot = store.get(&key).unwrap().unwrap();
        assert_eq!(snapshot.payload, b"new".to_vec());
        assert_eq!(snapshot.captured_at_ms, 200);
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn keys_are_independent() {
        let store = store();
        let guests = CacheKey::list("guests", "1");
        let assets = CacheKey::list("assets", "1");

        store.put(&guests, b"guest data").unwrap();
        store.put(&assets, b"asset data").unwrap();

        assert_eq!(
            store.get(&guests).unwrap().unwrap().payload,
            b"guest data".to_vec()
        );
        assert_eq!(
            store.get(&assets).unwrap().unwrap().payload,
            b"asset data".to_vec()
        );
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn same_resource_different_scope_is_different_key() {
        let store = store();
        store.put(&CacheKey::list("guests", "1"), b"for user 1").unwrap();

        assert!(store.get(&CacheKey::list("guests", "2")).unwrap().is_none());
    }

    #[test]
    fn storage_failure_surfaces() {
        let backend = Arc::new(InMemoryBackend::new());
        let store = SnapshotStore::new(Arc::clone(&backend) as Arc<dyn TableBackend>);
        backend.close();

        let key = CacheKey::list("guests", "1");
        assert!(matches!(
            store.put(&key, b"data"),
            Err(CoreError::Storage(_))
        ));
        assert!(matches!(store.get(&key), Err(CoreError::Storage(_))));
    }
}
