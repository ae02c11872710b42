//! Gameplay events: the facts participants produce during a run.
//!
//! Events are pushed into an instance as they happen and applied
//! immediately. Each objective looks at every event and ignores the kinds
//! it doesn't care about, so adding a kind here never breaks an objective.

use serde::{Deserialize, Serialize};

use crate::{EntityId, ParticipantId, RoomId};

/// How a boss-kill report names the boss.
///
/// The host may know the boss's entity UUID (it watched the entity die) or
/// only its configured id string (a scripted kill). Both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BossRef {
    /// The boss entity's UUID.
    Uuid(EntityId),
    /// The boss template id from configuration, e.g. `"lich_king"`.
    Named(String),
}

/// A single gameplay fact reported by the participant action source.
///
/// `#[serde(tag = "kind")]` gives the flat JSON shape the action source
/// emits: `{ "kind": "AltarActivated", "altar_id": "north" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum GameplayEvent {
    /// A participant activated an altar.
    AltarActivated { altar_id: String },

    /// A participant walked into a room. Informational; no objective
    /// tracks it.
    RoomEntered {
        participant: ParticipantId,
        room_id: RoomId,
    },

    /// A room was declared clear (all of its mobs are dead).
    RoomCleared { room_id: RoomId },

    /// A mob died. The instance removes it from its room and, if that
    /// was the room's last mob, follows up with [`Self::RoomCleared`].
    MobKilled { mob: EntityId },

    /// A participant picked up `amount` of an item.
    ItemCollected {
        item_id: String,
        #[serde(default = "default_amount")]
        amount: i64,
    },

    /// The boss took damage; `health` is its remaining fraction (0.0–1.0).
    BossDamaged { boss: EntityId, health: f64 },

    /// The boss died.
    BossKilled { boss: BossRef },

    /// A participant died inside the run.
    ParticipantDied { participant: ParticipantId },
}

fn default_amount() -> i64 {
    1
}

impl GameplayEvent {
    /// Short kind name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AltarActivated { .. } => "AltarActivated",
            Self::RoomEntered { .. } => "RoomEntered",
            Self::RoomCleared { .. } => "RoomCleared",
            Self::MobKilled { .. } => "MobKilled",
            Self::ItemCollected { .. } => "ItemCollected",
            Self::BossDamaged { .. } => "BossDamaged",
            Self::BossKilled { .. } => "BossKilled",
            Self::ParticipantDied { .. } => "ParticipantDied",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boss_ref_uuid_json_shape() {
        let id = EntityId::random();
        let json = serde_json::to_value(BossRef::Uuid(id)).unwrap();
        assert_eq!(json["uuid"], id.0.to_string());
    }

    #[test]
    fn test_kind_names_match_serde_tags() {
        let event = GameplayEvent::ParticipantDied {
            participant: ParticipantId(1),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], event.kind());
    }
}
