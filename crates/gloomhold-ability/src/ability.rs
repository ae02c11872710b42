use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::AbilityError;

// ---------------------------------------------------------------------------
// AbilityType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AbilityType {
    /// Launches a projectile at the target.
    Projectile,
    /// Knocks back and damages everyone around the boss.
    Aoe,
    /// Spawns minions around the boss.
    Summon,
    /// Applies a status effect to the boss.
    Buff,
    /// Applies a status effect to the target.
    Debuff,
    /// Moves the boss behind the target.
    Teleport,
    /// Pulls the target toward the boss.
    Grab,
}

impl AbilityType {
    pub const ALL: [AbilityType; 7] = [
        Self::Projectile,
        Self::Aoe,
        Self::Summon,
        Self::Buff,
        Self::Debuff,
        Self::Teleport,
        Self::Grab,
    ];

    pub fn config_name(self) -> &'static str {
        match self {
            Self::Projectile => "PROJECTILE",
            Self::Aoe => "AOE",
            Self::Summon => "SUMMON",
            Self::Buff => "BUFF",
            Self::Debuff => "DEBUFF",
            Self::Teleport => "TELEPORT",
            Self::Grab => "GRAB",
        }
    }

    /// Case-insensitive lookup. Unknown names are `None`, never a fallback.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.config_name().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for AbilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_name())
    }
}

// ---------------------------------------------------------------------------
// AbilityDefinition
// ---------------------------------------------------------------------------

fn default_cooldown() -> i64 {
    BossAbility::DEFAULT_COOLDOWN_TICKS as i64
}

fn default_range() -> f64 {
    BossAbility::DEFAULT_RANGE
}

fn default_type() -> String {
    AbilityType::Projectile.config_name().to_string()
}

/// A boss ability as written in configuration.
///
/// ```json
/// { "id": "frost_nova", "type": "AOE", "cooldown": 160, "damage": 12, "range": 6,
///   "params": { "knockbackStrength": 1.0 } }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbilityDefinition {
    pub id: String,
    #[serde(default, rename = "displayName", alias = "display_name")]
    pub display_name: Option<String>,
    /// Ticks between uses. Negative values clamp to 0.
    #[serde(default = "default_cooldown")]
    pub cooldown: i64,
    #[serde(default)]
    pub damage: f64,
    #[serde(default = "default_range")]
    pub range: f64,
    #[serde(rename = "type", default = "default_type")]
    pub ability_type: String,
    #[serde(default)]
    pub params: BTreeMap<String, Value>,
}

// ---------------------------------------------------------------------------
// BossAbility
// ---------------------------------------------------------------------------

/// A stateless, cooldown- and range-gated boss action template.
///
/// Per-type tuning lives in `params`, read with a default at execution
/// time (e.g. `projectileSpeed` for [`AbilityType::Projectile`]).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BossAbility {
    id: String,
    display_name: String,
    cooldown_ticks: u64,
    damage: f64,
    range: f64,
    ability_type: AbilityType,
    params: BTreeMap<String, Value>,
}

impl BossAbility {
    pub const DEFAULT_COOLDOWN_TICKS: u64 = 100;
    pub const DEFAULT_RANGE: f64 = 10.0;

    /// A new ability with the configuration defaults: 100-tick cooldown,
    /// no damage, range 10, display name equal to the id.
    pub fn new(id: impl Into<String>, ability_type: AbilityType) -> Self {
        let id = id.into();
        Self {
            display_name: id.clone(),
            id,
            cooldown_ticks: Self::DEFAULT_COOLDOWN_TICKS,
            damage: 0.0,
            range: Self::DEFAULT_RANGE,
            ability_type,
            params: BTreeMap::new(),
        }
    }

    /// Builds an ability from its configuration record.
    ///
    /// # Errors
    /// [`AbilityError::UnknownType`] if `type` is not a known ability type.
    pub fn from_definition(def: &AbilityDefinition) -> Result<Self, AbilityError> {
        let ability_type =
            AbilityType::parse(&def.ability_type).ok_or_else(|| AbilityError::UnknownType {
                id: def.id.clone(),
                kind: def.ability_type.clone(),
            })?;

        let mut ability = Self::new(&def.id, ability_type)
            .with_cooldown(def.cooldown)
            .with_damage(def.damage)
            .with_range(def.range);
        if let Some(name) = &def.display_name {
            ability.display_name = name.clone();
        }
        ability.params = def.params.clone();
        Ok(ability)
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// Negative cooldowns clamp to 0.
    pub fn with_cooldown(mut self, ticks: i64) -> Self {
        self.cooldown_ticks = ticks.max(0) as u64;
        self
    }

    pub fn with_damage(mut self, damage: f64) -> Self {
        self.damage = damage;
        self
    }

    pub fn with_range(mut self, range: f64) -> Self {
        self.range = range;
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn cooldown_ticks(&self) -> u64 {
        self.cooldown_ticks
    }

    pub fn damage(&self) -> f64 {
        self.damage
    }

    pub fn range(&self) -> f64 {
        self.range
    }

    pub fn ability_type(&self) -> AbilityType {
        self.ability_type
    }

    pub fn params(&self) -> &BTreeMap<String, Value> {
        &self.params
    }

    /// A numeric parameter, or `default` if absent or not a number.
    pub fn param_f64(&self, key: &str, default: f64) -> f64 {
        self.params
            .get(key)
            .and_then(Value::as_f64)
            .unwrap_or(default)
    }

    /// A non-negative integer parameter, or `default`.
    pub fn param_u64(&self, key: &str, default: u64) -> u64 {
        match self.params.get(key) {
            Some(v) => v
                .as_u64()
                .or_else(|| v.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
                .unwrap_or(default),
            None => default,
        }
    }

    /// A string parameter, or `default`.
    pub fn param_str<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.params
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_defaults() {
        let def: AbilityDefinition = serde_json::from_str(r#"{"id":"zap"}"#).unwrap();
        let a = BossAbility::from_definition(&def).unwrap();
        assert_eq!(a.ability_type(), AbilityType::Projectile);
        assert_eq!(a.cooldown_ticks(), 100);
        assert_eq!(a.damage(), 0.0);
        assert_eq!(a.range(), 10.0);
        assert_eq!(a.display_name(), "zap");
    }

    #[test]
    fn test_unknown_type_rejected() {
        let def: AbilityDefinition =
            serde_json::from_str(r#"{"id":"zap","type":"LASER"}"#).unwrap();
        let err = BossAbility::from_definition(&def).unwrap_err();
        assert!(matches!(err, AbilityError::UnknownType { kind, .. } if kind == "LASER"));
    }

    #[test]
    fn test_negative_cooldown_clamps_to_zero() {
        let def: AbilityDefinition =
            serde_json::from_str(r#"{"id":"zap","type":"aoe","cooldown":-40}"#).unwrap();
        let a = BossAbility::from_definition(&def).unwrap();
        assert_eq!(a.cooldown_ticks(), 0);
        assert_eq!(a.ability_type(), AbilityType::Aoe);
    }

    #[test]
    fn test_param_lookups_fall_back() {
        let a = BossAbility::new("s", AbilityType::Summon)
            .with_param("minionCount", 4)
            .with_param("spawnRadius", 2.5)
            .with_param("minionType", "SKELETON");
        assert_eq!(a.param_u64("minionCount", 3), 4);
        assert_eq!(a.param_f64("spawnRadius", 5.0), 2.5);
        assert_eq!(a.param_str("minionType", "ZOMBIE"), "SKELETON");
        assert_eq!(a.param_f64("missing", 1.5), 1.5);
        assert_eq!(a.param_u64("minionType", 3), 3);
    }
}
