//! Pending action queue: durable, strictly-ordered log of offline mutations.

use crate::action::{encode_payload, ActionKind, AssetPayload, CheckInPayload, PendingAction};
use crate::error::CoreResult;
use crate::types::{now_millis, ActionId};
use gatesync_storage::{Table, TableBackend};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Durable, strictly-ordered queue of not-yet-confirmed mutations.
///
/// The queue read in `(created_at, id)` order is the exact sequence of user
/// intent and the only valid replay order. Actions are never reordered or
/// merged; duplicates are preserved as separate entries, and it is the
/// backend's responsibility to reject logically-invalid duplicates.
pub struct ActionQueue {
    backend: Arc<dyn TableBackend>,
    next_id: AtomicU64,
}

impl ActionQueue {
    /// Opens the queue over the given backend.
    ///
    /// Scans the action table to recover the id counter, so ids assigned
    /// after a restart never collide with surviving entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be scanned or a surviving
    /// record is corrupt.
    pub fn open(backend: Arc<dyn TableBackend>) -> CoreResult<Self> {
        let mut max_id = 0u64;
        for (_, value) in backend.scan(Table::Actions)? {
            let action = PendingAction::decode(&value)?;
            max_id = max_id.max(action.id.as_u64());
        }

        Ok(Self {
            backend,
            next_id: AtomicU64::new(max_id + 1),
        })
    }

    /// Appends a new pending action with creation time now.
    ///
    /// The action is durable before this returns. A storage failure here is
    /// a hard error: the caller must not report the user's action as
    /// accepted if it could not be queued.
    ///
    /// # Errors
    ///
    /// Returns an error if the action cannot be persisted.
    pub fn enqueue(&self, kind: ActionKind, payload: Vec<u8>) -> CoreResult<PendingAction> {
        self.enqueue_at(kind, payload, now_millis())
    }

    /// Appends a new pending action with an explicit creation time.
    ///
    /// # Errors
    ///
    /// Returns an error if the action cannot be persisted.
    pub fn enqueue_at(
        &self,
        kind: ActionKind,
        payload: Vec<u8>,
        created_at_ms: u64,
    ) -> CoreResult<PendingAction> {
        let action = PendingAction {
            id: ActionId::new(self.next_id.fetch_add(1, Ordering::SeqCst)),
            kind,
            payload,
            created_at_ms,
        };

        let bytes = action.encode()?;
        self.backend
            .put(Table::Actions, &action.id.storage_key(), &bytes)?;
        Ok(action)
    }

    /// Queues a check-in confirmation for `guest_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the action cannot be persisted.
    pub fn enqueue_confirm_check_in(&self, guest_id: u64) -> CoreResult<PendingAction> {
        let payload = encode_payload(&CheckInPayload { guest_id })?;
        self.enqueue(ActionKind::ConfirmCheckIn, payload)
    }

    /// Queues an asset checkout for `asset_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the action cannot be persisted.
    pub fn enqueue_asset_checkout(&self, asset_id: u64) -> CoreResult<PendingAction> {
        let payload = encode_payload(&AssetPayload { asset_id })?;
        self.enqueue(ActionKind::AssetCheckout, payload)
    }

    /// Queues an asset return for `asset_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the action cannot be persisted.
    pub fn enqueue_asset_return(&self, asset_id: u64) -> CoreResult<PendingAction> {
        let payload = encode_payload(&AssetPayload { asset_id })?;
        self.enqueue(ActionKind::AssetReturn, payload)
    }

    /// Returns all pending actions in replay order.
    ///
    /// Ordered by creation time ascending; equal timestamps fall back to id
    /// order, which equals enqueue order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be scanned or a record is
    /// corrupt.
    pub fn list_ordered(&self) -> CoreResult<Vec<PendingAction>> {
        let mut actions = Vec::new();
        for (_, value) in self.backend.scan(Table::Actions)? {
            actions.push(PendingAction::decode(&value)?);
        }
        actions.sort_by_key(|a| (a.created_at_ms, a.id));
        Ok(actions)
    }

    /// Removes one action by id.
    ///
    /// Idempotent: removing an absent id succeeds and affects nothing else.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete cannot be made durable.
    pub fn remove(&self, id: ActionId) -> CoreResult<()> {
        self.backend.delete(Table::Actions, &id.storage_key())?;
        Ok(())
    }

    /// Returns the number of pending actions.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be scanned.
    pub fn len(&self) -> CoreResult<usize> {
        Ok(self.backend.scan(Table::Actions)?.len())
    }

    /// Returns true if nothing is pending.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be scanned.
    pub fn is_empty(&self) -> CoreResult<bool> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use gatesync_storage::InMemoryBackend;

    fn queue() -> ActionQueue {
        ActionQueue::open(Arc::new(InMemoryBackend::new())).unwrap()
    }

    #[test]
    fn enqueue_assigns_increasing_ids() {
        let queue = queue();

        let a = queue.enqueue_confirm_check_in(1).unwrap();
        let b = queue.enqueue_asset_checkout(2).unwrap();

        assert!(b.id > a.id);
        assert_eq!(queue.len().unwrap(), 2);
    }

    #[test]
    fn list_ordered_by_creation_time() {
        let queue = queue();

        // Enqueue with out-of-order timestamps; replay order must follow the
        // timestamps, not id assignment order.
        queue
            .enqueue_at(ActionKind::AssetReturn, Vec::new(), 300)
            .unwrap();
        queue
            .enqueue_at(ActionKind::ConfirmCheckIn, Vec::new(), 100)
            .unwrap();
        queue
            .enqueue_at(ActionKind::AssetCheckout, Vec::new(), 200)
            .unwrap();

        let ordered = queue.list_ordered().unwrap();
        let times: Vec<_> = ordered.iter().map(|a| a.created_at_ms).collect();
        assert_eq!(times, vec![100, 200, 300]);
    }

    #[test]
    fn equal_timestamps_fall_back_to_enqueue_order() {
        let queue = queue();

        let first = queue
            .enqueue_at(ActionKind::AssetCheckout, Vec::new(), 500)
            .unwrap();
        let second = queue
            .enqueue_at(ActionKind::AssetReturn, Vec::new(), 500)
            .unwrap();

        let ordered = queue.list_ordered().unwrap();
        assert_eq!(ordered[0].id, first.id);
        assert_eq!(ordered[1].id, second.id);
    }

    #[test]
    fn duplicates_are_preserved() {
        let queue = queue();

        queue.enqueue_asset_checkout(42).unwrap();
        queue.enqueue_asset_checkout(42).unwrap();

        assert_eq!(queue.len().unwrap(), 2);
    }

    #[test]
    fn remove_is_idempotent() {
        let queue = queue();

        let kept = queue.enqueue_confirm_check_in(1).unwrap();
        let removed = queue.enqueue_confirm_check_in(2).unwrap();

        queue.remove(removed.id).unwrap();
        queue.remove(removed.id).unwrap();
        queue.remove(ActionId::new(9999)).unwrap();

        let remaining = queue.list_ordered().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, kept.id);
    }

    #[test]
    fn queue_survives_reopen() {
        let backend = Arc::new(InMemoryBackend::new());

        let ids: Vec<_> = {
            let queue = ActionQueue::open(Arc::clone(&backend) as Arc<dyn TableBackend>).unwrap();
            (0..3)
                .map(|i| queue.enqueue_confirm_check_in(i).unwrap().id)
                .collect()
        };

        let queue = ActionQueue::open(backend).unwrap();
        let actions = queue.list_ordered().unwrap();
        assert_eq!(actions.len(), 3);
        assert_eq!(actions.iter().map(|a| a.id).collect::<Vec<_>>(), ids);

        // The recovered counter continues past surviving entries.
        let next = queue.enqueue_confirm_check_in(99).unwrap();
        assert!(next.id > ids[2]);
    }

    #[test]
    fn enqueue_fails_hard_when_storage_is_down() {
        let backend = Arc::new(InMemoryBackend::new());
        let queue = ActionQueue::open(Arc::clone(&backend) as Arc<dyn TableBackend>).unwrap();
        backend.close();

        let result = queue.enqueue_confirm_check_in(7);
        assert!(matches!(result, Err(CoreError::Storage(_))));
    }

    #[test]
    fn typed_payloads_roundtrip_through_queue() {
        let queue = queue();

        queue.enqueue_confirm_check_in(11).unwrap();
        queue.enqueue_asset_checkout(22).unwrap();
        queue.enqueue_asset_return(33).unwrap();

        let actions = queue.list_ordered().unwrap();
        assert_eq!(
            actions[0].decode_payload::<CheckInPayload>().unwrap(),
            CheckInPayload { guest_id: 11 }
        );
        assert_eq!(
            actions[1].decode_payload::<AssetPayload>().unwrap(),
            AssetPayload { asset_id: 22 }
        );
        assert_eq!(actions[2].kind, ActionKind::AssetReturn);
    }
}
