//! One dungeon run.

use std::collections::{BTreeSet, HashMap};

use gloomhold_ability::{BossEncounter, PhaseEntered};
use gloomhold_layout::{MobRemoval, RoomGraph};
use gloomhold_objective::{BossContext, ObjectiveEngine, ObjectiveSnapshot, ObjectiveUpdate};
use gloomhold_protocol::{BossRef, EntityId, GameplayEvent, InstanceId, ParticipantId, Vec3};
use gloomhold_space::Slot;
use gloomhold_tick::Tick;
use serde::Serialize;
use tracing::{debug, info, trace};

use crate::{BossBinding, Difficulty, InstanceConfig, InstanceState, LifecycleEvent};

/// A snapshot of a run for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceInfo {
    pub id: InstanceId,
    pub state: InstanceState,
    pub difficulty: Difficulty,
    pub participants: Vec<ParticipantId>,
    pub max_participants: usize,
    pub boss_defeated: bool,
    /// Mean progress over all objectives.
    pub progress: f64,
    pub objectives: Vec<ObjectiveSnapshot>,
    pub rooms_cleared: usize,
    pub room_count: usize,
    pub slot: usize,
    pub origin: Vec3,
    pub started_at: Tick,
    /// `None` when the run has no time limit.
    pub time_remaining: Option<Tick>,
    pub deaths: u32,
}

/// A single dungeon run: who is in it, its rooms, its objectives and its
/// boss.
///
/// Owned by the [`InstanceManager`](crate::InstanceManager). Gameplay
/// events are applied in arrival order through [`dispatch`](Self::dispatch);
/// once the run leaves `Active` it ignores them.
#[derive(Debug)]
pub struct DungeonInstance {
    id: InstanceId,
    state: InstanceState,
    config: InstanceConfig,
    roster: BTreeSet<ParticipantId>,
    deaths: HashMap<ParticipantId, u32>,
    graph: RoomGraph,
    objectives: ObjectiveEngine,
    boss: BossBinding,
    boss_defeated: bool,
    encounter: Option<BossEncounter>,
    slot: Slot,
    started_at: Tick,
    now: Tick,
    pending: Vec<LifecycleEvent>,
}

impl DungeonInstance {
    pub fn new(
        id: InstanceId,
        graph: RoomGraph,
        objectives: ObjectiveEngine,
        boss: BossBinding,
        config: InstanceConfig,
        slot: Slot,
        started_at: Tick,
    ) -> Self {
        Self {
            id,
            state: InstanceState::Active,
            config: config.validated(),
            roster: BTreeSet::new(),
            deaths: HashMap::new(),
            graph,
            objectives,
            boss,
            boss_defeated: false,
            encounter: None,
            slot,
            started_at,
            now: started_at,
            pending: Vec::new(),
        }
    }

    /// Attaches the boss encounter. The boss binding picks up the
    /// encounter's entity if it had none.
    pub fn with_encounter(mut self, encounter: BossEncounter) -> Self {
        self.attach_encounter(encounter);
        self
    }

    pub fn attach_encounter(&mut self, encounter: BossEncounter) {
        if self.boss.entity.is_none() {
            self.boss.entity = Some(encounter.entity());
        }
        self.encounter = Some(encounter);
    }

    /// Records the boss entity once it has spawned.
    pub fn bind_boss_entity(&mut self, entity: EntityId) {
        self.boss.entity = Some(entity);
    }

    // -- accessors ----------------------------------------------------------

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn state(&self) -> InstanceState {
        self.state
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn config(&self) -> &InstanceConfig {
        &self.config
    }

    pub fn difficulty(&self) -> Difficulty {
        self.config.difficulty
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    /// Origin of the run's grid cell.
    pub fn origin(&self) -> Vec3 {
        self.slot.origin
    }

    pub fn graph(&self) -> &RoomGraph {
        &self.graph
    }

    /// Mutable graph access for the host's mob spawner.
    pub fn graph_mut(&mut self) -> &mut RoomGraph {
        &mut self.graph
    }

    pub fn objectives(&self) -> &ObjectiveEngine {
        &self.objectives
    }

    pub fn boss(&self) -> &BossBinding {
        &self.boss
    }

    pub fn is_boss_defeated(&self) -> bool {
        self.boss_defeated
    }

    pub fn encounter(&self) -> Option<&BossEncounter> {
        self.encounter.as_ref()
    }

    pub fn encounter_mut(&mut self) -> Option<&mut BossEncounter> {
        self.encounter.as_mut()
    }

    /// The roster, in id order.
    pub fn participants(&self) -> Vec<ParticipantId> {
        self.roster.iter().copied().collect()
    }

    pub fn participant_count(&self) -> usize {
        self.roster.len()
    }

    pub fn is_participant(&self, participant: ParticipantId) -> bool {
        self.roster.contains(&participant)
    }

    pub fn is_empty(&self) -> bool {
        self.roster.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.roster.len() >= self.config.max_participants
    }

    /// Deaths of a participant in this run.
    pub fn deaths(&self, participant: ParticipantId) -> u32 {
        self.deaths.get(&participant).copied().unwrap_or(0)
    }

    pub fn total_deaths(&self) -> u32 {
        self.deaths.values().sum()
    }

    pub fn started_at(&self) -> Tick {
        self.started_at
    }

    pub fn now(&self) -> Tick {
        self.now
    }

    /// Ticks left before the run expires, or `None` without a time limit.
    pub fn time_remaining(&self) -> Option<Tick> {
        let limit = self.config.time_limit_ticks;
        if limit == 0 {
            return None;
        }
        let elapsed = self.now.saturating_sub(self.started_at);
        Some(limit.saturating_sub(elapsed))
    }

    /// What the objectives are told about the boss.
    pub fn boss_context(&self) -> BossContext {
        BossContext {
            entity: self.boss.entity,
            defeated: self.boss_defeated,
        }
    }

    pub fn info(&self) -> InstanceInfo {
        InstanceInfo {
            id: self.id,
            state: self.state,
            difficulty: self.config.difficulty,
            participants: self.participants(),
            max_participants: self.config.max_participants,
            boss_defeated: self.boss_defeated,
            progress: self.objectives.total_progress(),
            objectives: self.objectives.snapshots(),
            rooms_cleared: self.graph.cleared_rooms().len(),
            room_count: self.graph.len(),
            slot: self.slot.index,
            origin: self.slot.origin,
            started_at: self.started_at,
            time_remaining: self.time_remaining(),
            deaths: self.total_deaths(),
        }
    }

    // -- roster -------------------------------------------------------------

    /// Seats a participant. Returns `false` if the run has ended, is full,
    /// or already has them.
    ///
    /// Only the manager seats participants, so its participant index never
    /// disagrees with the roster.
    pub(crate) fn add_participant(&mut self, participant: ParticipantId) -> bool {
        if self.is_terminal() || self.is_full() {
            return false;
        }
        if !self.roster.insert(participant) {
            return false;
        }
        self.deaths.insert(participant, 0);
        debug!(instance = %self.id, %participant, "participant joined run");
        true
    }

    /// Removes a participant. Returns `false` if they were not in the run.
    ///
    /// When the last participant leaves an active run it is abandoned.
    pub(crate) fn remove_participant(&mut self, participant: ParticipantId) -> bool {
        if !self.roster.remove(&participant) {
            return false;
        }
        self.deaths.remove(&participant);
        debug!(instance = %self.id, %participant, "participant left run");
        if self.roster.is_empty() {
            self.transition(InstanceState::Abandoned);
        }
        true
    }

    // -- events -------------------------------------------------------------

    /// Sets the boss-defeated flag and re-evaluates the objectives.
    pub fn report_boss_defeated(&mut self) -> Vec<ObjectiveUpdate> {
        if self.is_terminal() || self.boss_defeated {
            return Vec::new();
        }
        self.set_boss_defeated();
        let boss = self
            .boss
            .kill_ref()
            .unwrap_or_else(|| BossRef::Named(String::new()));
        let updates = self
            .objectives
            .dispatch(&GameplayEvent::BossKilled { boss }, &self.boss_context());
        self.check_completion();
        updates
    }

    /// Applies one gameplay event to the run.
    ///
    /// Boss kills naming the bound boss set the defeated flag, boss damage
    /// updates the encounter, deaths are counted, and a mob kill that
    /// empties its room is followed by a `RoomCleared` for that room.
    /// Every event then goes to the objectives.
    pub fn dispatch(&mut self, event: &GameplayEvent) -> Vec<ObjectiveUpdate> {
        if self.is_terminal() {
            trace!(instance = %self.id, kind = event.kind(), state = %self.state, "event ignored");
            return Vec::new();
        }

        let mut follow_up = None;
        match event {
            GameplayEvent::BossKilled { boss } if self.boss.matches(boss) => {
                self.set_boss_defeated();
            }
            GameplayEvent::BossDamaged { boss, health } if self.boss.entity == Some(*boss) => {
                if let Some(encounter) = self.encounter.as_mut() {
                    encounter.set_health(*health);
                    if !encounter.is_alive() {
                        self.set_boss_defeated();
                    }
                }
            }
            GameplayEvent::ParticipantDied { participant } => {
                if let Some(count) = self.deaths.get_mut(participant) {
                    *count += 1;
                    debug!(instance = %self.id, %participant, deaths = *count, "participant died");
                }
            }
            GameplayEvent::MobKilled { mob } => {
                if let MobRemoval::RoomCleared { room } = self.graph.remove_mob(mob) {
                    follow_up = Some(GameplayEvent::RoomCleared { room_id: room });
                }
            }
            GameplayEvent::RoomCleared { room_id } => {
                self.graph.mark_cleared(room_id);
            }
            _ => {}
        }

        let boss = self.boss_context();
        let mut updates = self.objectives.dispatch(event, &boss);
        if let Some(cleared) = follow_up {
            updates.extend(self.objectives.dispatch(&cleared, &boss));
        }
        self.check_completion();
        updates
    }

    /// Advances the run to `now`: expires it once the time limit has
    /// passed, otherwise ticks the boss encounter.
    pub fn tick(&mut self, now: Tick) -> Option<PhaseEntered> {
        if self.is_terminal() {
            return None;
        }
        self.now = self.now.max(now);
        if self.time_remaining() == Some(0) {
            self.transition(InstanceState::Expired);
            return None;
        }
        self.encounter.as_mut()?.tick(self.now)
    }

    /// Ends the run administratively. Returns `false` if it had already
    /// ended.
    pub fn mark_destroyed(&mut self) -> bool {
        self.transition(InstanceState::Destroyed)
    }

    /// Lifecycle events raised since the last call.
    pub fn drain_events(&mut self) -> Vec<LifecycleEvent> {
        std::mem::take(&mut self.pending)
    }

    fn set_boss_defeated(&mut self) {
        if self.boss_defeated {
            return;
        }
        self.boss_defeated = true;
        if let Some(encounter) = self.encounter.as_mut() {
            encounter.mark_dead();
        }
        info!(instance = %self.id, boss = ?self.boss.boss_id, "boss defeated");
    }

    /// A run with objectives completes when all of them are; a run
    /// without any completes when its boss falls.
    fn check_completion(&mut self) {
        let done = if self.objectives.is_empty() {
            self.boss_defeated
        } else {
            self.objectives.is_complete()
        };
        if done {
            self.transition(InstanceState::Complete);
        }
    }

    fn transition(&mut self, target: InstanceState) -> bool {
        if !self.state.can_transition_to(target) {
            return false;
        }
        self.state = target;
        info!(instance = %self.id, state = %target, participants = self.roster.len(), "run state changed");

        let event = match target {
            InstanceState::Complete => Some(LifecycleEvent::Completed {
                instance: self.id,
                participants: self.participants(),
            }),
            InstanceState::Abandoned => Some(LifecycleEvent::Abandoned { instance: self.id }),
            InstanceState::Expired => Some(LifecycleEvent::Expired {
                instance: self.id,
                participants: self.participants(),
            }),
            InstanceState::Destroyed | InstanceState::Active => None,
        };
        self.pending.extend(event);
        true
    }
}
