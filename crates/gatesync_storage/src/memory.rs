//! In-memory table backend for testing.

use crate::backend::{Table, TableBackend};
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// An in-memory table backend.
///
/// This backend stores all data in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral stores that don't need persistence
///
/// # Thread Safety
///
/// This backend is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use gatesync_storage::{InMemoryBackend, Table, TableBackend};
///
/// let backend = InMemoryBackend::new();
/// backend.put(Table::Actions, b"1", b"payload").unwrap();
/// assert_eq!(backend.len(Table::Actions), 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    snapshots: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    actions: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    closed: AtomicBool,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the backend unavailable.
    ///
    /// Every subsequent operation fails with [`StorageError::Closed`].
    /// Useful for testing storage-failure handling.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Reopens a closed backend, keeping its data.
    pub fn reopen(&self) {
        self.closed.store(false, Ordering::SeqCst);
    }

    /// Returns the number of records in `table`.
    #[must_use]
    pub fn len(&self, table: Table) -> usize {
        self.map(table).read().len()
    }

    /// Returns true if `table` holds no records.
    #[must_use]
    pub fn is_empty(&self, table: Table) -> bool {
        self.len(table) == 0
    }

    fn map(&self, table: Table) -> &RwLock<BTreeMap<Vec<u8>, Vec<u8>>> {
        match table {
            Table::Snapshots => &self.snapshots,
            Table::Actions => &self.actions,
        }
    }

    fn check_open(&self) -> StorageResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            Err(StorageError::Closed)
        } else {
            Ok(())
        }
    }
}

impl TableBackend for InMemoryBackend {
    fn put(&self, table: Table, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.check_open()?;
        self.map(table).write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn get(&self, table: Table, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        self.check_open()?;
        Ok(self.map(table).read().get(key).cloned())
    }

    fn delete(&self, table: Table, key: &[u8]) -> StorageResult<()> {
        self.check_open()?;
        self.map(table).write().remove(key);
        Ok(())
    }

    fn scan(&self, table: Table) -> StorageResult<Vec<(Vec<u8>, Vec<u8>)>> {
        self.check_open()?;
        Ok(self
            .map(table)
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
