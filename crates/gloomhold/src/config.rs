//! Service configuration.

use gloomhold_ability::{AbilityCatalog, AbilityDefinition};
use gloomhold_instance::InstanceConfig;
use gloomhold_space::SpaceConfig;
use gloomhold_tick::{DEFAULT_TICK_RATE_HZ, TickConfig};
use serde::Deserialize;
use tracing::{info, warn};

use crate::GloomholdError;

/// Everything the service needs at startup, usually parsed from one JSON
/// document. Every field has a default, so `{}` is a valid config.
///
/// ```json
/// {
///   "tick_rate_hz": 20,
///   "space": { "area_name": "dungeon_world", "grid_width": 10 },
///   "instance": { "max_participants": 5, "difficulty": "HARD" },
///   "abilities": [
///     { "id": "frost_nova", "type": "AOE", "damage": 6.0, "range": 8.0 }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GloomholdConfig {
    /// Upkeep tick rate. 0 disables the upkeep loop.
    pub tick_rate_hz: u32,
    pub space: SpaceConfig,
    /// Defaults for runs created without an explicit config.
    pub instance: InstanceConfig,
    /// Load the stock boss abilities before `abilities`.
    pub builtin_abilities: bool,
    /// Extra abilities. Later ids replace earlier ones, builtins included.
    pub abilities: Vec<AbilityDefinition>,
}

impl Default for GloomholdConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: DEFAULT_TICK_RATE_HZ,
            space: SpaceConfig::default(),
            instance: InstanceConfig::default(),
            builtin_abilities: true,
            abilities: Vec::new(),
        }
    }
}

impl GloomholdConfig {
    pub fn from_json(json: &str) -> Result<Self, GloomholdError> {
        Ok(serde_json::from_str::<Self>(json)?.validated())
    }

    /// Clamps out-of-range values in every section.
    pub fn validated(mut self) -> Self {
        self.space = self.space.validated();
        self.instance = self.instance.validated();
        self
    }

    pub fn tick_config(&self) -> TickConfig {
        TickConfig::with_rate(self.tick_rate_hz).validated()
    }

    /// Builds the ability catalog. Rejected definitions are logged and
    /// skipped.
    pub fn ability_catalog(&self) -> AbilityCatalog {
        let mut catalog = if self.builtin_abilities {
            AbilityCatalog::with_builtins()
        } else {
            AbilityCatalog::new()
        };
        let rejected = catalog.load(&self.abilities);
        if !rejected.is_empty() {
            warn!(rejected = rejected.len(), "some abilities were rejected");
        }
        info!(abilities = catalog.len(), "ability catalog loaded");
        catalog
    }
}

#[cfg(test)]
mod tests {
    use gloomhold_instance::Difficulty;

    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = GloomholdConfig::from_json("{}").unwrap();
        assert_eq!(config.tick_rate_hz, 20);
        assert_eq!(config.space.grid_width, 10);
        assert_eq!(config.instance.max_participants, 5);
        assert!(config.builtin_abilities);
        assert!(config.abilities.is_empty());
    }

    #[test]
    fn test_sections_parse() {
        let config = GloomholdConfig::from_json(
            r#"{
                "tick_rate_hz": 10,
                "space": { "grid_width": 0 },
                "instance": { "difficulty": "NIGHTMARE" }
            }"#,
        )
        .unwrap();
        assert_eq!(config.tick_config().tick_rate_hz, 10);
        assert_eq!(config.space.grid_width, 1);
        assert_eq!(config.instance.difficulty, Difficulty::Nightmare);
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let err = GloomholdConfig::from_json(r#"{"tick_rate_hz": "fast"}"#).unwrap_err();
        assert!(matches!(err, GloomholdError::Config(_)));
    }

    #[test]
    fn test_catalog_skips_unknown_types() {
        let config = GloomholdConfig::from_json(
            r#"{
                "builtin_abilities": false,
                "abilities": [
                    { "id": "frost_nova", "type": "AOE", "range": 8.0 },
                    { "id": "moonbeam", "type": "LASER" }
                ]
            }"#,
        )
        .unwrap();
        let catalog = config.ability_catalog();
        assert!(catalog.contains("frost_nova"));
        assert!(!catalog.contains("moonbeam"));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_catalog_includes_builtins() {
        let catalog = GloomholdConfig::default().ability_catalog();
        assert!(catalog.contains("soul_bolt"));
        assert!(catalog.contains("death_grip"));
    }
}
