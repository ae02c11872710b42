//! Run configuration and state machine.

use std::fmt;

use gloomhold_protocol::{BossRef, EntityId};
use gloomhold_tick::Tick;
use serde::{Deserialize, Serialize};
use tracing::warn;

// ---------------------------------------------------------------------------
// Difficulty
// ---------------------------------------------------------------------------

/// Difficulty a run is played at. Scales mob strength and loot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
    Nightmare,
}

impl Difficulty {
    pub const ALL: [Self; 4] = [Self::Easy, Self::Normal, Self::Hard, Self::Nightmare];

    pub fn mob_multiplier(self) -> f64 {
        match self {
            Self::Easy => 0.75,
            Self::Normal => 1.0,
            Self::Hard => 1.5,
            Self::Nightmare => 2.0,
        }
    }

    pub fn loot_multiplier(self) -> f64 {
        match self {
            Self::Easy => 0.5,
            Self::Normal => 1.0,
            Self::Hard => 1.5,
            Self::Nightmare => 2.0,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Normal => "Normal",
            Self::Hard => "Hard",
            Self::Nightmare => "Nightmare",
        }
    }

    /// Only nightmare runs drop unique loot.
    pub fn has_unique_drops(self) -> bool {
        self == Self::Nightmare
    }

    /// Parses `"HARD"`, `"hard"` or `"Hard"`.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|d| d.display_name().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ---------------------------------------------------------------------------
// InstanceConfig
// ---------------------------------------------------------------------------

/// Per-run settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceConfig {
    /// Maximum participants in the run.
    pub max_participants: usize,

    pub difficulty: Difficulty,

    /// Ticks from creation until the run expires. 0 means no limit.
    pub time_limit_ticks: Tick,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            max_participants: 5,
            difficulty: Difficulty::Normal,
            time_limit_ticks: 0,
        }
    }
}

impl InstanceConfig {
    pub fn with_max_participants(mut self, max: usize) -> Self {
        self.max_participants = max;
        self
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_time_limit(mut self, ticks: Tick) -> Self {
        self.time_limit_ticks = ticks;
        self
    }

    /// Clamps out-of-range values.
    pub fn validated(mut self) -> Self {
        if self.max_participants == 0 {
            warn!("max_participants must be at least 1, using 1");
            self.max_participants = 1;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// BossBinding
// ---------------------------------------------------------------------------

/// Which boss a run is fighting.
///
/// The configured id is known up front; the entity id only once the boss
/// has spawned. Either is enough to recognise a boss-kill report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossBinding {
    pub boss_id: Option<String>,
    pub entity: Option<EntityId>,
}

impl BossBinding {
    pub fn named(boss_id: impl Into<String>) -> Self {
        Self {
            boss_id: Some(boss_id.into()),
            entity: None,
        }
    }

    pub fn with_entity(mut self, entity: EntityId) -> Self {
        self.entity = Some(entity);
        self
    }

    pub fn is_bound(&self) -> bool {
        self.boss_id.is_some() || self.entity.is_some()
    }

    /// Whether a kill report names this boss.
    pub fn matches(&self, boss: &BossRef) -> bool {
        match boss {
            BossRef::Uuid(entity) => self.entity == Some(*entity),
            BossRef::Named(name) => self.boss_id.as_deref() == Some(name.as_str()),
        }
    }

    /// How this boss is named in a kill report: by entity if known.
    pub fn kill_ref(&self) -> Option<BossRef> {
        match (&self.entity, &self.boss_id) {
            (Some(entity), _) => Some(BossRef::Uuid(*entity)),
            (None, Some(name)) => Some(BossRef::Named(name.clone())),
            (None, None) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// InstanceState
// ---------------------------------------------------------------------------

/// The lifecycle state of a run.
///
/// Every run starts `Active`; the other states are terminal:
///
/// ```text
///          ┌──▶ Complete
///          ├──▶ Abandoned
/// Active ──┼──▶ Expired
///          └──▶ Destroyed
/// ```
///
/// - **Active**: participants present, objectives evolving.
/// - **Complete**: every objective satisfied.
/// - **Abandoned**: the last participant left before completion.
/// - **Expired**: the time limit ran out.
/// - **Destroyed**: torn down by an administrative action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceState {
    Active,
    Complete,
    Abandoned,
    Expired,
    Destroyed,
}

impl InstanceState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }

    /// Returns `true` if moving to `target` is allowed: only out of
    /// `Active`, only into a terminal state.
    pub fn can_transition_to(self, target: Self) -> bool {
        self == Self::Active && target.is_terminal()
    }
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Complete => write!(f, "COMPLETE"),
            Self::Abandoned => write!(f, "ABANDONED"),
            Self::Expired => write!(f, "EXPIRED"),
            Self::Destroyed => write!(f, "DESTROYED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_transitions_only_leave_active() {
        use InstanceState::*;
        for target in [Complete, Abandoned, Expired, Destroyed] {
            assert!(Active.can_transition_to(target));
            for from in [Complete, Abandoned, Expired, Destroyed] {
                assert!(!from.can_transition_to(target));
                assert!(!from.can_transition_to(Active));
            }
        }
        assert!(!Active.can_transition_to(Active));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(InstanceState::Active.to_string(), "ACTIVE");
        assert_eq!(InstanceState::Expired.to_string(), "EXPIRED");
    }

    #[test]
    fn test_difficulty_table() {
        assert_eq!(Difficulty::Easy.mob_multiplier(), 0.75);
        assert_eq!(Difficulty::Easy.loot_multiplier(), 0.5);
        assert_eq!(Difficulty::Normal.mob_multiplier(), 1.0);
        assert_eq!(Difficulty::Hard.loot_multiplier(), 1.5);
        assert_eq!(Difficulty::Nightmare.mob_multiplier(), 2.0);
        assert!(Difficulty::Nightmare.has_unique_drops());
        assert!(!Difficulty::Hard.has_unique_drops());
    }

    #[test]
    fn test_difficulty_parse() {
        assert_eq!(Difficulty::parse("HARD"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::parse("nightmare"), Some(Difficulty::Nightmare));
        assert_eq!(Difficulty::parse("legendary"), None);
    }

    #[test]
    fn test_config_default_and_validated() {
        let config = InstanceConfig::default();
        assert_eq!(config.max_participants, 5);
        assert_eq!(config.difficulty, Difficulty::Normal);
        assert_eq!(config.time_limit_ticks, 0);

        let config = InstanceConfig::default().with_max_participants(0).validated();
        assert_eq!(config.max_participants, 1);
    }

    #[test]
    fn test_config_from_json() {
        let config: InstanceConfig =
            serde_json::from_str(r#"{"difficulty": "HARD", "time_limit_ticks": 36000}"#).unwrap();
        assert_eq!(config.difficulty, Difficulty::Hard);
        assert_eq!(config.time_limit_ticks, 36_000);
        assert_eq!(config.max_participants, 5);
    }

    #[test]
    fn test_boss_binding_matches() {
        let entity = EntityId::random();
        let boss = BossBinding::named("lich_king").with_entity(entity);
        assert!(boss.matches(&BossRef::Uuid(entity)));
        assert!(boss.matches(&BossRef::Named("lich_king".into())));
        assert!(!boss.matches(&BossRef::Named("dragon".into())));
        assert!(!boss.matches(&BossRef::Uuid(EntityId::random())));
        assert_eq!(boss.kill_ref(), Some(BossRef::Uuid(entity)));

        assert!(!BossBinding::default().is_bound());
        assert_eq!(BossBinding::default().kill_ref(), None);
    }
}
