//! Codec trait and implementations for serializing/deserializing values.
//!
//! The core never owns a wire format, but its collaborators do: the action
//! source hands us gameplay events as bytes, and the presentation layer
//! wants snapshots back as bytes. The [`Codec`] trait keeps the choice of
//! format out of the core; [`JsonCodec`] is the one we ship.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` so a single codec can live inside the shared
/// service state and be used from any task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`.
///
/// ```rust
/// use gloomhold_protocol::{Codec, GameplayEvent, JsonCodec};
///
/// let codec = JsonCodec;
/// let event = GameplayEvent::AltarActivated { altar_id: "north".into() };
///
/// let bytes = codec.encode(&event).unwrap();
/// let decoded: GameplayEvent = codec.decode(&bytes).unwrap();
/// assert_eq!(event, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{BossRef, GameplayEvent, RoomId};

    #[test]
    fn test_decode_item_collected_from_action_source_json() {
        let raw = br#"{"kind":"ItemCollected","item_id":"ancient_shard","amount":3}"#;
        let event: GameplayEvent = JsonCodec.decode(raw).unwrap();
        assert_eq!(
            event,
            GameplayEvent::ItemCollected {
                item_id: "ancient_shard".into(),
                amount: 3,
            }
        );
    }

    #[test]
    fn test_decode_item_collected_defaults_amount_to_one() {
        let raw = br#"{"kind":"ItemCollected","item_id":"ancient_shard"}"#;
        let event: GameplayEvent = JsonCodec.decode(raw).unwrap();
        assert!(matches!(
            event,
            GameplayEvent::ItemCollected { amount: 1, .. }
        ));
    }

    #[test]
    fn test_decode_named_boss_kill() {
        let raw = br#"{"kind":"BossKilled","boss":{"named":"lich_king"}}"#;
        let event: GameplayEvent = JsonCodec.decode(raw).unwrap();
        assert_eq!(
            event,
            GameplayEvent::BossKilled {
                boss: BossRef::Named("lich_king".into()),
            }
        );
    }

    #[test]
    fn test_encode_room_cleared_uses_kind_tag() {
        let event = GameplayEvent::RoomCleared {
            room_id: RoomId::from("r1"),
        };
        let json: serde_json::Value =
            serde_json::from_slice(&JsonCodec.encode(&event).unwrap()).unwrap();
        assert_eq!(json["kind"], "RoomCleared");
        assert_eq!(json["room_id"], "r1");
    }

    #[test]
    fn test_decode_unknown_kind_is_an_error() {
        let raw = br#"{"kind":"Teleported","to":"nowhere"}"#;
        let result: Result<GameplayEvent, _> = JsonCodec.decode(raw);
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
