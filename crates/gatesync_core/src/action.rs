//! Pending actions: the mutations queued for later replay.

use crate::error::{CoreError, CoreResult};
use crate::types::ActionId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of mutation queued for replay.
///
/// This set is closed: the executor dispatches on it exhaustively, so a new
/// kind cannot be added without also deciding how it replays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Confirm a guest's check-in at the gate.
    ConfirmCheckIn,
    /// Check an asset out through the gate.
    AssetCheckout,
    /// Return a previously checked-out asset.
    AssetReturn,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ConfirmCheckIn => "confirm_check_in",
            Self::AssetCheckout => "asset_checkout",
            Self::AssetReturn => "asset_return",
        };
        f.write_str(s)
    }
}

/// Payload for [`ActionKind::ConfirmCheckIn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInPayload {
    /// The guest being confirmed.
    pub guest_id: u64,
}

/// Payload for [`ActionKind::AssetCheckout`] and [`ActionKind::AssetReturn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPayload {
    /// The asset being moved through the gate.
    pub asset_id: u64,
}

/// One not-yet-acknowledged mutation.
///
/// Never mutated in place. The queue deletes it only after the backend
/// executor confirms success for this specific action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAction {
    /// Storage identifier, assigned by the queue at insertion.
    pub id: ActionId,
    /// What to replay.
    pub kind: ActionKind,
    /// CBOR bytes of the kind's typed payload.
    pub payload: Vec<u8>,
    /// Creation time in milliseconds since the Unix epoch. The ordering key.
    pub created_at_ms: u64,
}

impl PendingAction {
    /// Decodes the typed payload of this action.
    ///
    /// # Errors
    ///
    /// Returns a codec error if the stored bytes do not decode as `T`.
    pub fn decode_payload<T: DeserializeOwned>(&self) -> CoreResult<T> {
        decode_payload(&self.payload)
    }

    /// Encodes this action to the stored record bytes.
    pub(crate) fn encode(&self) -> CoreResult<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf).map_err(CoreError::codec)?;
        Ok(buf)
    }

    /// Decodes an action from stored record bytes.
    pub(crate) fn decode(bytes: &[u8]) -> CoreResult<Self> {
        ciborium::from_reader(bytes).map_err(CoreError::codec)
    }
}

/// Encodes a typed payload to the CBOR bytes stored in a [`PendingAction`].
///
/// # Errors
///
/// Returns a codec error if serialization fails.
pub fn encode_payload<T: Serialize>(payload: &T) -> CoreResult<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(payload, &mut buf).map_err(CoreError::codec)?;
    Ok(buf)
}

/// Decodes a typed payload from stored CBOR bytes.
///
/// # Errors
///
/// Returns a codec error if the bytes do not decode as `T`.
pub fn decode_payload<T: DeserializeOwned>(bytes: &[u8]) -> CoreResult<T> {
    ciborium::from_reader(bytes).map_err(CoreError::codec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_record_roundtrip() {
        let action = PendingAction {
            id: ActionId::new(3),
            kind: ActionKind::AssetCheckout,
            payload: encode_payload(&AssetPayload { asset_id: 42 }).unwrap(),
            created_at_ms: 1_700_000_000_000,
        };

        let bytes = action.encode().unwrap();
        let decoded = PendingAction::decode(&bytes).unwrap();
        assert_eq!(decoded, action);
        assert_eq!(
            decoded.decode_payload::<AssetPayload>().unwrap(),
            AssetPayload { asset_id: 42 }
        );
    }

    #[test]
    fn wrong_payload_type_is_codec_error() {
        let action = PendingAction {
            id: ActionId::new(1),
            kind: ActionKind::ConfirmCheckIn,
            payload: b"not cbor at all".to_vec(),
            created_at_ms: 1,
        };

        let result = action.decode_payload::<CheckInPayload>();
        assert!(matches!(result, Err(CoreError::Codec(_))));
    }

    #[test]
    fn kind_display() {
        assert_eq!(ActionKind::ConfirmCheckIn.to_string(), "confirm_check_in");
        assert_eq!(ActionKind::AssetCheckout.to_string(), "asset_checkout");
        assert_eq!(ActionKind::AssetReturn.to_string(), "asset_return");
    }

    #[test]
    fn corrupt_record_is_codec_error() {
        let result = PendingAction::decode(b"\xff\xff\xff");
        assert!(matches!(result, Err(CoreError::Codec(_))));
    }
}
