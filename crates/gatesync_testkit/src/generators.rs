//! Property-based test generators using proptest.

use gatesync_core::ActionKind;
use proptest::prelude::*;

/// Strategy producing any action kind.
pub fn action_kind() -> impl Strategy<Value = ActionKind> {
    prop_oneof![
        Just(ActionKind::ConfirmCheckIn),
        Just(ActionKind::AssetCheckout),
        Just(ActionKind::AssetReturn),
    ]
}

/// Strategy producing opaque payload bytes (bounded, possibly empty).
pub fn payload_bytes() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>(), 0..64)
}

/// Strategy producing a creation timestamp in a realistic range.
pub fn created_at_ms() -> impl Strategy<Value = u64> {
    1_u64..2_000_000_000_000
}

/// Strategy producing a batch of enqueue arguments: kind, payload and
/// creation timestamp. Timestamps may repeat, which exercises the id
/// tie-break in replay ordering.
pub fn enqueue_batch(max_len: usize) -> impl Strategy<Value = Vec<(ActionKind, Vec<u8>, u64)>> {
    proptest::collection::vec((action_kind(), payload_bytes(), created_at_ms()), 0..max_len)
}
