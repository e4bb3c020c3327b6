//! Test fixtures: backends and prepopulated stores with automatic cleanup.

use gatesync_core::{ActionKind, ActionQueue, PendingAction};
use gatesync_storage::{InMemoryBackend, LogBackend, TableBackend};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// A durable test store with automatic cleanup.
///
/// Owns a temporary directory holding one log file. Calling
/// [`TestStore::open`] again after dropping the previous backend simulates
/// an application restart over the same on-disk state.
pub struct TestStore {
    dir: TempDir,
}

impl TestStore {
    /// Creates a fresh store in a new temporary directory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp directory"),
        }
    }

    /// Returns the path of the log file.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.dir.path().join("gatesync.log")
    }

    /// Opens (or reopens) the backend over the store's log file.
    #[must_use]
    pub fn open(&self) -> Arc<LogBackend> {
        Arc::new(LogBackend::open(&self.path()).expect("failed to open log backend"))
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Creates an in-memory backend.
#[must_use]
pub fn memory_backend() -> Arc<InMemoryBackend> {
    Arc::new(InMemoryBackend::new())
}

/// Opens an action queue over a fresh in-memory backend.
#[must_use]
pub fn memory_queue() -> ActionQueue {
    ActionQueue::open(memory_backend()).expect("failed to open queue")
}

/// Opens a queue prepopulated with `count` actions at increasing timestamps.
///
/// Kinds rotate through the closed set so every kind appears.
#[must_use]
pub fn populated_queue(count: usize) -> (ActionQueue, Vec<PendingAction>) {
    let queue = memory_queue();
    let actions = populate(&queue, count);
    (queue, actions)
}

/// Enqueues `count` rotating-kind actions at increasing timestamps.
pub fn populate(queue: &ActionQueue, count: usize) -> Vec<PendingAction> {
    const KINDS: [ActionKind; 3] = [
        ActionKind::ConfirmCheckIn,
        ActionKind::AssetCheckout,
        ActionKind::AssetReturn,
    ];

    (0..count)
        .map(|i| {
            queue
                .enqueue_at(KINDS[i % KINDS.len()], Vec::new(), 1_000 + i as u64)
                .expect("failed to enqueue")
        })
        .collect()
}

/// Runs a test body against a queue over a durable backend, then reopens
/// the backend and runs a second body against the recovered queue.
pub fn with_restarted_queue<F, G>(before: F, after: G)
where
    F: FnOnce(&ActionQueue),
    G: FnOnce(&ActionQueue),
{
    let store = TestStore::new();
    {
        let queue = ActionQueue::open(store.open() as Arc<dyn TableBackend>)
            .expect("failed to open queue");
        before(&queue);
    }
    let queue =
        ActionQueue::open(store.open() as Arc<dyn TableBackend>).expect("failed to reopen queue");
    after(&queue);
}
