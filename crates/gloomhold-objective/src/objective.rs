use std::collections::BTreeSet;
use std::fmt;

use gloomhold_protocol::{BossRef, EntityId, GameplayEvent, RoomId};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ObjectiveKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectiveKind {
    KillBoss,
    CollectItems,
    ActivateAltars,
    ClearRooms,
}

impl ObjectiveKind {
    pub const ALL: [ObjectiveKind; 4] = [
        Self::KillBoss,
        Self::CollectItems,
        Self::ActivateAltars,
        Self::ClearRooms,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Self::KillBoss => "Kill Boss",
            Self::CollectItems => "Collect Items",
            Self::ActivateAltars => "Activate Altars",
            Self::ClearRooms => "Clear Rooms",
        }
    }

    /// Configuration name, e.g. `"KILL_BOSS"`.
    pub fn config_name(self) -> &'static str {
        match self {
            Self::KillBoss => "KILL_BOSS",
            Self::CollectItems => "COLLECT_ITEMS",
            Self::ActivateAltars => "ACTIVATE_ALTARS",
            Self::ClearRooms => "CLEAR_ROOMS",
        }
    }

    /// Case-insensitive lookup by configuration name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.config_name().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for ObjectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ---------------------------------------------------------------------------
// Update context and result
// ---------------------------------------------------------------------------

/// What the owning instance knows about its boss when an event is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BossContext {
    /// The boss entity bound to the run, once it has spawned.
    pub entity: Option<EntityId>,
    /// The run's boss-defeated flag.
    pub defeated: bool,
}

/// How an [`Objective::update`] call changed the objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveChange {
    Unchanged,
    Progressed,
    Completed,
}

// ---------------------------------------------------------------------------
// Objective
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Goal {
    KillBoss {
        boss_id: String,
    },
    CollectItems {
        item_id: String,
        required: i64,
        collected: i64,
    },
    ActivateAltars {
        required: i64,
        activated: BTreeSet<String>,
    },
    ClearRooms {
        required: Vec<RoomId>,
        cleared: BTreeSet<RoomId>,
    },
}

/// One goal of a run.
///
/// `complete` is write-once: no call ever sets it back to `false`.
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    id: String,
    description: String,
    complete: bool,
    goal: Goal,
}

impl Objective {
    /// Completes when the boss named `boss_id` (or the run's bound boss
    /// entity) is killed.
    pub fn kill_boss(
        id: impl Into<String>,
        description: impl Into<String>,
        boss_id: impl Into<String>,
    ) -> Self {
        Self::with_goal(
            id,
            description,
            Goal::KillBoss {
                boss_id: boss_id.into(),
            },
        )
    }

    /// Completes once `required` (at least 1) of `item_id` are collected.
    pub fn collect_items(
        id: impl Into<String>,
        description: impl Into<String>,
        item_id: impl Into<String>,
        required: i64,
    ) -> Self {
        Self::with_goal(
            id,
            description,
            Goal::CollectItems {
                item_id: item_id.into(),
                required: required.max(1),
                collected: 0,
            },
        )
    }

    /// Completes once `required` (at least 1) distinct altars are activated.
    pub fn activate_altars(
        id: impl Into<String>,
        description: impl Into<String>,
        required: i64,
    ) -> Self {
        Self::with_goal(
            id,
            description,
            Goal::ActivateAltars {
                required: required.max(1),
                activated: BTreeSet::new(),
            },
        )
    }

    /// Completes once every room in `rooms` is cleared. The list is fixed
    /// here; an empty list never completes.
    pub fn clear_rooms(
        id: impl Into<String>,
        description: impl Into<String>,
        rooms: impl IntoIterator<Item = RoomId>,
    ) -> Self {
        let mut required: Vec<RoomId> = Vec::new();
        for room in rooms {
            if !required.contains(&room) {
                required.push(room);
            }
        }
        Self::with_goal(
            id,
            description,
            Goal::ClearRooms {
                required,
                cleared: BTreeSet::new(),
            },
        )
    }

    fn with_goal(id: impl Into<String>, description: impl Into<String>, goal: Goal) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            complete: false,
            goal,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> ObjectiveKind {
        match self.goal {
            Goal::KillBoss { .. } => ObjectiveKind::KillBoss,
            Goal::CollectItems { .. } => ObjectiveKind::CollectItems,
            Goal::ActivateAltars { .. } => ObjectiveKind::ActivateAltars,
            Goal::ClearRooms { .. } => ObjectiveKind::ClearRooms,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Fraction done, in `[0.0, 1.0]`.
    pub fn progress(&self) -> f64 {
        match &self.goal {
            Goal::KillBoss { .. } => {
                if self.complete {
                    1.0
                } else {
                    0.0
                }
            }
            Goal::ClearRooms { required, .. } if required.is_empty() => 0.0,
            _ => match self.counters() {
                Some((current, required)) => (current as f64 / required as f64).min(1.0),
                None => 0.0,
            },
        }
    }

    /// `(current, required)` for counting objectives; `None` for a boss kill.
    pub fn counters(&self) -> Option<(u64, u64)> {
        match &self.goal {
            Goal::KillBoss { .. } => None,
            Goal::CollectItems {
                required,
                collected,
                ..
            } => Some((*collected as u64, *required as u64)),
            Goal::ActivateAltars {
                required,
                activated,
            } => Some((activated.len() as u64, *required as u64)),
            Goal::ClearRooms { required, cleared } => {
                Some((cleared.len() as u64, required.len() as u64))
            }
        }
    }

    /// The configured description, without counters.
    pub fn base_description(&self) -> &str {
        &self.description
    }

    /// The description with a `(current/required)` suffix for counting
    /// objectives.
    pub fn description(&self) -> String {
        match self.counters() {
            Some((current, required)) => {
                format!("{} ({current}/{required})", self.description)
            }
            None => self.description.clone(),
        }
    }

    /// Altars activated so far, sorted.
    pub fn activated_altars(&self) -> Vec<String> {
        match &self.goal {
            Goal::ActivateAltars { activated, .. } => activated.iter().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Required rooms cleared so far, sorted.
    pub fn cleared_rooms(&self) -> Vec<RoomId> {
        match &self.goal {
            Goal::ClearRooms { cleared, .. } => cleared.iter().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Applies one gameplay event.
    ///
    /// Events of a kind this objective does not track, facts it already
    /// recorded, and any event after completion are no-ops.
    pub fn update(&mut self, event: &GameplayEvent, boss: &BossContext) -> ObjectiveChange {
        if self.complete {
            return ObjectiveChange::Unchanged;
        }

        let progressed = match (&mut self.goal, event) {
            (Goal::KillBoss { boss_id }, event) => {
                let signalled = boss.defeated
                    || match event {
                        GameplayEvent::BossKilled {
                            boss: BossRef::Uuid(entity),
                        } => boss.entity == Some(*entity),
                        GameplayEvent::BossKilled {
                            boss: BossRef::Named(name),
                        } => *name == *boss_id,
                        _ => false,
                    };
                if signalled {
                    self.complete = true;
                }
                signalled
            }

            (
                Goal::CollectItems {
                    item_id,
                    required,
                    collected,
                },
                GameplayEvent::ItemCollected {
                    item_id: picked,
                    amount,
                },
            ) if *picked == *item_id && *amount > 0 => {
                let before = *collected;
                *collected = collected.saturating_add(*amount).clamp(0, *required);
                if *collected >= *required {
                    self.complete = true;
                }
                *collected != before
            }

            (
                Goal::ActivateAltars {
                    required,
                    activated,
                },
                GameplayEvent::AltarActivated { altar_id },
            ) => {
                let inserted = activated.insert(altar_id.clone());
                if activated.len() as i64 >= *required {
                    self.complete = true;
                }
                inserted
            }

            (Goal::ClearRooms { required, cleared }, GameplayEvent::RoomCleared { room_id })
                if required.contains(room_id) =>
            {
                let inserted = cleared.insert(room_id.clone());
                if cleared.len() >= required.len() {
                    self.complete = true;
                }
                inserted
            }

            _ => false,
        };

        if self.complete {
            ObjectiveChange::Completed
        } else if progressed {
            ObjectiveChange::Progressed
        } else {
            ObjectiveChange::Unchanged
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.complete { '✓' } else { '○' };
        write!(
            f,
            "{mark} {} [{:.0}%]",
            self.description(),
            self.progress() * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn altar(id: &str) -> GameplayEvent {
        GameplayEvent::AltarActivated {
            altar_id: id.into(),
        }
    }

    fn items(id: &str, amount: i64) -> GameplayEvent {
        GameplayEvent::ItemCollected {
            item_id: id.into(),
            amount,
        }
    }

    fn cleared(room: &str) -> GameplayEvent {
        GameplayEvent::RoomCleared {
            room_id: room.into(),
        }
    }

    const NO_BOSS: BossContext = BossContext {
        entity: None,
        defeated: false,
    };

    // =====================================================================
    // ActivateAltars
    // =====================================================================

    #[test]
    fn test_altars_progress_is_monotonic_and_deduplicated() {
        let mut o = Objective::activate_altars("alt", "Light the altars", 3);
        let mut last = o.progress();
        for id in ["n", "n", "e", "n", "s", "w"] {
            o.update(&altar(id), &NO_BOSS);
            assert!(o.progress() >= last);
            last = o.progress();
        }
        assert_eq!(o.counters(), Some((3, 3)));
        assert_eq!(o.progress(), 1.0);
        assert!(o.is_complete());
    }

    #[test]
    fn test_repeat_altar_is_unchanged() {
        let mut o = Objective::activate_altars("alt", "Light", 2);
        assert_eq!(o.update(&altar("n"), &NO_BOSS), ObjectiveChange::Progressed);
        assert_eq!(o.update(&altar("n"), &NO_BOSS), ObjectiveChange::Unchanged);
        assert_eq!(o.counters(), Some((1, 2)));
    }

    #[test]
    fn test_altar_requirement_clamped_to_one() {
        let mut o = Objective::activate_altars("alt", "Light", 0);
        assert_eq!(o.counters(), Some((0, 1)));
        assert_eq!(o.update(&altar("x"), &NO_BOSS), ObjectiveChange::Completed);
    }

    // =====================================================================
    // ClearRooms
    // =====================================================================

    #[test]
    fn test_rooms_outside_list_ignored() {
        let mut o = Objective::clear_rooms("rooms", "Purge", ["r1".into(), "r2".into()]);
        assert_eq!(o.update(&cleared("r9"), &NO_BOSS), ObjectiveChange::Unchanged);
        assert_eq!(o.counters(), Some((0, 2)));
    }

    #[test]
    fn test_empty_room_list_never_completes() {
        let mut o = Objective::clear_rooms("rooms", "Purge", Vec::<RoomId>::new());
        o.update(&cleared("r1"), &NO_BOSS);
        assert_eq!(o.progress(), 0.0);
        assert!(!o.is_complete());
    }

    #[test]
    fn test_duplicate_required_rooms_collapse() {
        let o = Objective::clear_rooms("rooms", "Purge", ["r1".into(), "r1".into()]);
        assert_eq!(o.counters(), Some((0, 1)));
    }

    // =====================================================================
    // CollectItems
    // =====================================================================

    #[test]
    fn test_collect_clamps_to_required() {
        let mut o = Objective::collect_items("shards", "Gather shards", "shard", 5);
        assert_eq!(o.update(&items("shard", 105), &NO_BOSS), ObjectiveChange::Completed);
        assert_eq!(o.counters(), Some((5, 5)));
    }

    #[test]
    fn test_collect_ignores_other_items_and_non_positive_amounts() {
        let mut o = Objective::collect_items("shards", "Gather shards", "shard", 5);
        o.update(&items("shard", 2), &NO_BOSS);
        assert_eq!(o.update(&items("bone", 4), &NO_BOSS), ObjectiveChange::Unchanged);
        assert_eq!(o.update(&items("shard", -3), &NO_BOSS), ObjectiveChange::Unchanged);
        assert_eq!(o.update(&items("shard", 0), &NO_BOSS), ObjectiveChange::Unchanged);
        assert_eq!(o.counters(), Some((2, 5)));
        assert_eq!(o.description(), "Gather shards (2/5)");
    }

    // =====================================================================
    // KillBoss
    // =====================================================================

    #[test]
    fn test_kill_boss_by_name() {
        let mut o = Objective::kill_boss("boss", "Slay the lich", "lich_king");
        let wrong = GameplayEvent::BossKilled {
            boss: BossRef::Named("goblin".into()),
        };
        assert_eq!(o.update(&wrong, &NO_BOSS), ObjectiveChange::Unchanged);
        let right = GameplayEvent::BossKilled {
            boss: BossRef::Named("lich_king".into()),
        };
        assert_eq!(o.update(&right, &NO_BOSS), ObjectiveChange::Completed);
        assert_eq!(o.progress(), 1.0);
    }

    #[test]
    fn test_kill_boss_by_bound_entity() {
        let boss = EntityId::random();
        let ctx = BossContext {
            entity: Some(boss),
            defeated: false,
        };
        let mut o = Objective::kill_boss("boss", "Slay", "lich_king");
        let other = GameplayEvent::BossKilled {
            boss: BossRef::Uuid(EntityId::random()),
        };
        assert_eq!(o.update(&other, &ctx), ObjectiveChange::Unchanged);
        let ours = GameplayEvent::BossKilled {
            boss: BossRef::Uuid(boss),
        };
        assert_eq!(o.update(&ours, &ctx), ObjectiveChange::Completed);
    }

    #[test]
    fn test_kill_boss_from_defeated_flag_on_any_event() {
        let ctx = BossContext {
            entity: None,
            defeated: true,
        };
        let mut o = Objective::kill_boss("boss", "Slay", "lich_king");
        assert_eq!(o.update(&altar("n"), &ctx), ObjectiveChange::Completed);
    }

    // =====================================================================
    // Completion is terminal
    // =====================================================================

    #[test]
    fn test_completed_objective_ignores_further_updates() {
        let mut o = Objective::collect_items("shards", "Gather", "shard", 1);
        o.update(&items("shard", 1), &NO_BOSS);
        let snapshot = o.clone();
        for event in [items("shard", 10), altar("x"), cleared("r1")] {
            assert_eq!(o.update(&event, &NO_BOSS), ObjectiveChange::Unchanged);
        }
        assert_eq!(o, snapshot);
        assert!(o.is_complete());
    }

    #[test]
    fn test_display_shows_mark_and_percent() {
        let mut o = Objective::activate_altars("alt", "Light", 2);
        o.update(&altar("a"), &NO_BOSS);
        assert_eq!(o.to_string(), "○ Light (1/2) [50%]");
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(ObjectiveKind::parse("kill_boss"), Some(ObjectiveKind::KillBoss));
        assert_eq!(ObjectiveKind::parse("escort"), None);
    }
}
