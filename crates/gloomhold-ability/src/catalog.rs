use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::{AbilityDefinition, AbilityError, BossAbility, builtin};

/// Registry of ability templates, built once at startup and shared
/// read-only by every run.
#[derive(Debug, Clone, Default)]
pub struct AbilityCatalog {
    abilities: BTreeMap<String, BossAbility>,
}

impl AbilityCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog holding the five stock abilities: `soul_bolt`,
    /// `ground_slam`, `summon_minions`, `blink` and `death_grip`.
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        for ability in builtin::all() {
            catalog.insert(ability);
        }
        catalog
    }

    /// Adds or replaces an ability; returns the one it replaced.
    pub fn insert(&mut self, ability: BossAbility) -> Option<BossAbility> {
        self.abilities.insert(ability.id().to_string(), ability)
    }

    /// Loads definitions into the catalog. A definition with an unknown
    /// type is logged and skipped; the errors for every skipped definition
    /// are returned. Later definitions override earlier ones (and
    /// built-ins) with the same id.
    pub fn load(&mut self, definitions: &[AbilityDefinition]) -> Vec<AbilityError> {
        let mut rejected = Vec::new();
        let mut loaded = 0usize;
        for def in definitions {
            match BossAbility::from_definition(def) {
                Ok(ability) => {
                    if self.insert(ability).is_some() {
                        info!(ability = %def.id, "ability definition overrides existing entry");
                    }
                    loaded += 1;
                }
                Err(error) => {
                    warn!(ability = %def.id, %error, "rejected ability definition");
                    rejected.push(error);
                }
            }
        }
        info!(loaded, rejected = rejected.len(), "ability definitions loaded");
        rejected
    }

    /// Parses a JSON array of definitions and loads them.
    ///
    /// # Errors
    /// [`AbilityError::Parse`] if the document is not a JSON array of
    /// definitions. Per-definition rejections are returned in the `Ok`
    /// value instead.
    pub fn load_json(&mut self, json: &str) -> Result<Vec<AbilityError>, AbilityError> {
        let definitions: Vec<AbilityDefinition> = serde_json::from_str(json)?;
        Ok(self.load(&definitions))
    }

    pub fn get(&self, id: &str) -> Option<&BossAbility> {
        self.abilities.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.abilities.contains_key(id)
    }

    /// Ability ids in sorted order.
    pub fn ids(&self) -> Vec<String> {
        self.abilities.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AbilityType;

    #[test]
    fn test_builtins_carry_stock_tuning() {
        let c = AbilityCatalog::with_builtins();
        assert_eq!(c.len(), 5);

        let bolt = c.get("soul_bolt").unwrap();
        assert_eq!(bolt.cooldown_ticks(), 60);
        assert_eq!(bolt.damage(), 15.0);
        assert_eq!(bolt.range(), 30.0);

        let grip = c.get("death_grip").unwrap();
        assert_eq!(grip.ability_type(), AbilityType::Grab);
        assert_eq!(grip.param_f64("pullStrength", 0.0), 2.5);

        let summon = c.get("summon_minions").unwrap();
        assert_eq!(summon.cooldown_ticks(), 200);
        assert_eq!(summon.param_u64("minionCount", 0), 3);
    }

    #[test]
    fn test_load_json_skips_unknown_types() {
        let mut c = AbilityCatalog::new();
        let rejected = c
            .load_json(
                r#"[
                    {"id":"frost_nova","type":"AOE","range":6},
                    {"id":"laser","type":"LASER"},
                    {"id":"hex","type":"debuff","params":{"effect":"WEAKNESS"}}
                ]"#,
            )
            .unwrap();
        assert_eq!(rejected.len(), 1);
        assert_eq!(c.ids(), vec!["frost_nova".to_string(), "hex".to_string()]);
    }

    #[test]
    fn test_load_json_rejects_malformed_document() {
        let mut c = AbilityCatalog::new();
        assert!(matches!(
            c.load_json(r#"{"id":"x"}"#),
            Err(AbilityError::Parse(_))
        ));
    }

    #[test]
    fn test_definitions_override_builtins() {
        let mut c = AbilityCatalog::with_builtins();
        let def: AbilityDefinition =
            serde_json::from_str(r#"{"id":"blink","type":"TELEPORT","cooldown":20}"#).unwrap();
        assert!(c.load(&[def]).is_empty());
        assert_eq!(c.get("blink").unwrap().cooldown_ticks(), 20);
        assert_eq!(c.len(), 5);
    }
}
