use gloomhold_protocol::RoomId;
use serde::{Deserialize, Serialize};

use crate::{Objective, ObjectiveError, ObjectiveKind};

/// An objective as written in dungeon configuration.
///
/// ```json
/// { "id": "shards", "type": "COLLECT_ITEMS", "item_id": "ancient_shard", "amount": 5 }
/// ```
///
/// Which of the optional fields matter depends on `type`:
///
/// | type              | fields             |
/// |-------------------|--------------------|
/// | `KILL_BOSS`       | `boss_id`          |
/// | `COLLECT_ITEMS`   | `item_id`, `amount` (default 1) |
/// | `ACTIVATE_ALTARS` | `amount` (default 1) |
/// | `CLEAR_ROOMS`     | `rooms`            |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectiveDefinition {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Defaults to the kind's display name.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub boss_id: Option<String>,
    #[serde(default)]
    pub item_id: Option<String>,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub rooms: Vec<RoomId>,
}

impl ObjectiveDefinition {
    /// Builds the objective this record describes.
    ///
    /// # Errors
    /// - [`ObjectiveError::UnknownKind`] for an unrecognized `type`.
    /// - [`ObjectiveError::MissingField`] when the kind's key field is absent.
    pub fn build(&self) -> Result<Objective, ObjectiveError> {
        let kind =
            ObjectiveKind::parse(&self.kind).ok_or_else(|| ObjectiveError::UnknownKind {
                id: self.id.clone(),
                kind: self.kind.clone(),
            })?;
        let description = self
            .description
            .clone()
            .unwrap_or_else(|| kind.display_name().to_string());
        let amount = self.amount.unwrap_or(1);

        let objective = match kind {
            ObjectiveKind::KillBoss => {
                let boss_id = self.require(self.boss_id.as_ref(), "boss_id")?;
                Objective::kill_boss(&self.id, description, boss_id)
            }
            ObjectiveKind::CollectItems => {
                let item_id = self.require(self.item_id.as_ref(), "item_id")?;
                Objective::collect_items(&self.id, description, item_id, amount)
            }
            ObjectiveKind::ActivateAltars => {
                Objective::activate_altars(&self.id, description, amount)
            }
            ObjectiveKind::ClearRooms => {
                Objective::clear_rooms(&self.id, description, self.rooms.iter().cloned())
            }
        };
        Ok(objective)
    }

    fn require<'a>(
        &self,
        value: Option<&'a String>,
        field: &'static str,
    ) -> Result<&'a str, ObjectiveError> {
        value
            .map(String::as_str)
            .ok_or_else(|| ObjectiveError::MissingField {
                id: self.id.clone(),
                field,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ObjectiveDefinition {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_build_collect_items_with_default_description() {
        let def = parse(r#"{"id":"s","type":"collect_items","item_id":"shard","amount":4}"#);
        let o = def.build().unwrap();
        assert_eq!(o.kind(), ObjectiveKind::CollectItems);
        assert_eq!(o.description(), "Collect Items (0/4)");
    }

    #[test]
    fn test_build_clear_rooms() {
        let def = parse(r#"{"id":"c","type":"CLEAR_ROOMS","description":"Purge","rooms":["r1","r2"]}"#);
        let o = def.build().unwrap();
        assert_eq!(o.counters(), Some((0, 2)));
        assert_eq!(o.base_description(), "Purge");
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let def = parse(r#"{"id":"x","type":"ESCORT_NPC"}"#);
        assert!(matches!(def.build(), Err(ObjectiveError::UnknownKind { .. })));
    }

    #[test]
    fn test_kill_boss_requires_boss_id() {
        let def = parse(r#"{"id":"k","type":"KILL_BOSS"}"#);
        assert!(matches!(
            def.build(),
            Err(ObjectiveError::MissingField { field: "boss_id", .. })
        ));
    }
}
