//! Run manager: creates, tracks, and routes participants to runs.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use gloomhold_ability::PhaseEntered;
use gloomhold_layout::RoomGraph;
use gloomhold_objective::{ObjectiveEngine, ObjectiveUpdate};
use gloomhold_protocol::{GameplayEvent, InstanceId, ParticipantId};
use gloomhold_space::{AreaBackend, InstanceSpace};
use gloomhold_tick::Tick;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    BossBinding, DungeonInstance, InstanceConfig, InstanceError, LifecycleEvent, Relation,
    RelationProvider,
};

/// Counter for generating unique run IDs.
static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

// ---------------------------------------------------------------------------
// TeardownReport
// ---------------------------------------------------------------------------

/// A participant who could not be evacuated while a run was torn down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeardownFailure {
    pub instance: InstanceId,
    pub participant: ParticipantId,
    pub reason: String,
}

/// Outcome of tearing down one or more runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeardownReport {
    pub destroyed: Vec<InstanceId>,
    pub evacuated: usize,
    pub failures: Vec<TeardownFailure>,
}

impl TeardownReport {
    /// Returns `true` if every participant was evacuated.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn merge(&mut self, other: TeardownReport) {
        self.destroyed.extend(other.destroyed);
        self.evacuated += other.evacuated;
        self.failures.extend(other.failures);
    }
}

// ---------------------------------------------------------------------------
// InstanceManager
// ---------------------------------------------------------------------------

/// Manages all live runs and tracks which participant is in which run.
///
/// Owns the [`InstanceSpace`] the runs are placed in. Every registry
/// mutation goes through `&mut self`, so wrapping the manager in a single
/// lock makes create/destroy mutually exclusive.
pub struct InstanceManager<B> {
    space: InstanceSpace<B>,

    /// Live runs, keyed by run ID.
    instances: HashMap<InstanceId, DungeonInstance>,

    /// Maps each participant to the run they're in.
    /// A participant can be in at most ONE run at a time.
    participant_runs: HashMap<ParticipantId, InstanceId>,

    relations: Option<Box<dyn RelationProvider>>,
    events: Vec<LifecycleEvent>,
    now: Tick,
}

impl<B: AreaBackend> InstanceManager<B> {
    /// Creates an empty manager over `space`. The space is used as is;
    /// initialize it before creating runs.
    pub fn new(space: InstanceSpace<B>) -> Self {
        Self {
            space,
            instances: HashMap::new(),
            participant_runs: HashMap::new(),
            relations: None,
            events: Vec::new(),
            now: 0,
        }
    }

    /// Registers an ally/enemy lookup used by [`join`](Self::join).
    pub fn with_relations(mut self, provider: impl RelationProvider + 'static) -> Self {
        self.relations = Some(Box::new(provider));
        self
    }

    pub fn set_relations(&mut self, provider: Option<Box<dyn RelationProvider>>) {
        self.relations = provider;
    }

    pub fn space(&self) -> &InstanceSpace<B> {
        &self.space
    }

    pub fn space_mut(&mut self) -> &mut InstanceSpace<B> {
        &mut self.space
    }

    /// The last tick passed to [`tick`](Self::tick).
    pub fn now(&self) -> Tick {
        self.now
    }

    /// Creates a run in the next free cell of the space.
    ///
    /// Fails if the space is not ready or every cell is taken.
    pub fn create(
        &mut self,
        graph: RoomGraph,
        objectives: ObjectiveEngine,
        boss: BossBinding,
        config: InstanceConfig,
    ) -> Result<InstanceId, InstanceError> {
        let slot = self.space.claim_slot()?;
        let id = InstanceId(NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed));
        let instance = DungeonInstance::new(id, graph, objectives, boss, config, slot, self.now);
        info!(
            instance = %id,
            slot = slot.index,
            rooms = instance.graph().len(),
            objectives = instance.objectives().len(),
            difficulty = %instance.difficulty(),
            "run created"
        );
        self.instances.insert(id, instance);
        Ok(id)
    }

    pub fn get(&self, id: InstanceId) -> Option<&DungeonInstance> {
        self.instances.get(&id)
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut DungeonInstance> {
        self.instances.get_mut(&id)
    }

    /// IDs of every run in the registry, ascending.
    pub fn all_ids(&self) -> Vec<InstanceId> {
        let mut ids: Vec<InstanceId> = self.instances.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Number of runs in the registry, including ended runs not yet
    /// cleaned up.
    pub fn active_count(&self) -> usize {
        self.instances.len()
    }

    /// Seats a participant in a run.
    ///
    /// Enforces the "one run at a time" invariant and, when a relation
    /// provider is registered, refuses to seat enemies together.
    pub fn join(&mut self, participant: ParticipantId, id: InstanceId) -> Result<(), InstanceError> {
        if let Some(&current) = self.participant_runs.get(&participant) {
            return Err(InstanceError::AlreadyInRun {
                participant,
                instance: current,
            });
        }

        let instance = self.instances.get_mut(&id).ok_or(InstanceError::NotFound(id))?;
        if instance.is_terminal() {
            return Err(InstanceError::NotJoinable {
                instance: id,
                state: instance.state(),
            });
        }
        if instance.is_full() {
            return Err(InstanceError::RunFull(id));
        }
        if let Some(relations) = &self.relations {
            let enemy = instance
                .participants()
                .into_iter()
                .find(|&member| relations.relation(participant, member) == Relation::Enemy);
            if let Some(enemy) = enemy {
                return Err(InstanceError::HostileRoster {
                    participant,
                    enemy,
                    instance: id,
                });
            }
        }

        instance.add_participant(participant);
        self.participant_runs.insert(participant, id);
        Ok(())
    }

    /// The run a participant is in, if any.
    pub fn run_of(&self, participant: ParticipantId) -> Option<InstanceId> {
        self.participant_runs.get(&participant).copied()
    }

    pub fn is_participant_of_any(&self, participant: ParticipantId) -> bool {
        self.participant_runs.contains_key(&participant)
    }

    /// Removes a participant from whatever run they are in. Returns
    /// `false` if they were in none.
    pub fn remove_participant_from_wherever(&mut self, participant: ParticipantId) -> bool {
        let Some(id) = self.participant_runs.remove(&participant) else {
            return false;
        };
        let Some(instance) = self.instances.get_mut(&id) else {
            warn!(%participant, instance = %id, "participant indexed to a missing run");
            return false;
        };
        let removed = instance.remove_participant(participant);
        self.collect_events(id);
        removed
    }

    /// Applies an event to the run `participant` is in.
    pub fn route_event(
        &mut self,
        participant: ParticipantId,
        event: &GameplayEvent,
    ) -> Result<Vec<ObjectiveUpdate>, InstanceError> {
        let id = self
            .run_of(participant)
            .ok_or(InstanceError::NotInRun(participant))?;
        self.dispatch_to(id, event)
    }

    /// Applies an event to run `id`.
    pub fn dispatch_to(
        &mut self,
        id: InstanceId,
        event: &GameplayEvent,
    ) -> Result<Vec<ObjectiveUpdate>, InstanceError> {
        let instance = self.instances.get_mut(&id).ok_or(InstanceError::NotFound(id))?;
        let updates = instance.dispatch(event);
        self.collect_events(id);
        Ok(updates)
    }

    pub fn report_boss_defeated(&mut self, id: InstanceId) -> Result<Vec<ObjectiveUpdate>, InstanceError> {
        let instance = self.instances.get_mut(&id).ok_or(InstanceError::NotFound(id))?;
        let updates = instance.report_boss_defeated();
        self.collect_events(id);
        Ok(updates)
    }

    /// Advances every run to `now`. Returns the boss phase changes.
    pub fn tick(&mut self, now: Tick) -> Vec<(InstanceId, PhaseEntered)> {
        self.now = self.now.max(now);
        let mut phases = Vec::new();
        for (id, instance) in &mut self.instances {
            if let Some(phase) = instance.tick(self.now) {
                phases.push((*id, phase));
            }
            self.events.extend(instance.drain_events());
        }
        phases
    }

    /// Tears down one run.
    pub fn destroy(&mut self, id: InstanceId) -> Result<TeardownReport, InstanceError> {
        if !self.instances.contains_key(&id) {
            return Err(InstanceError::NotFound(id));
        }
        Ok(self.teardown(id))
    }

    /// Tears down every run. Safe with no runs; one run's evacuation
    /// failures never stop the others from being torn down.
    pub fn destroy_all(&mut self) -> TeardownReport {
        let mut report = TeardownReport::default();
        for id in self.all_ids() {
            report.merge(self.teardown(id));
        }
        if !report.destroyed.is_empty() {
            info!(
                runs = report.destroyed.len(),
                evacuated = report.evacuated,
                failures = report.failures.len(),
                "all runs destroyed"
            );
        }
        report
    }

    /// Tears down every run that has ended.
    pub fn cleanup_finished(&mut self) -> TeardownReport {
        let finished: Vec<InstanceId> = self
            .all_ids()
            .into_iter()
            .filter(|id| self.instances.get(id).is_some_and(|i| i.is_terminal()))
            .collect();
        let mut report = TeardownReport::default();
        for id in finished {
            report.merge(self.teardown(id));
        }
        report
    }

    /// Tears down every run, then destroys and recreates the space.
    pub fn reset_space(&mut self) -> Result<TeardownReport, InstanceError> {
        let report = self.destroy_all();
        self.space.reset()?;
        Ok(report)
    }

    /// Tears down every run and destroys the space for good.
    pub fn shutdown(&mut self) -> TeardownReport {
        let report = self.destroy_all();
        self.space.shutdown();
        report
    }

    /// Lifecycle events raised since the last call, in order.
    pub fn drain_events(&mut self) -> Vec<LifecycleEvent> {
        std::mem::take(&mut self.events)
    }

    fn collect_events(&mut self, id: InstanceId) {
        if let Some(instance) = self.instances.get_mut(&id) {
            self.events.extend(instance.drain_events());
        }
    }

    /// Membership is cleared first, then participants are evacuated and
    /// the slot released; the run leaves the registry last.
    fn teardown(&mut self, id: InstanceId) -> TeardownReport {
        let mut report = TeardownReport::default();
        let Some(instance) = self.instances.get_mut(&id) else {
            return report;
        };
        instance.mark_destroyed();
        let participants = instance.participants();
        let slot = instance.slot().index;
        self.events.extend(instance.drain_events());

        self.participant_runs.retain(|_, run| *run != id);

        for participant in participants {
            match self.space.evacuate(participant) {
                Ok(()) => report.evacuated += 1,
                Err(e) => {
                    warn!(instance = %id, %participant, error = %e, "evacuation failed during teardown");
                    report.failures.push(TeardownFailure {
                        instance: id,
                        participant,
                        reason: e.to_string(),
                    });
                }
            }
        }
        self.space.release_slot(slot);

        self.instances.remove(&id);
        self.events.push(LifecycleEvent::Destroyed { instance: id });
        report.destroyed.push(id);
        debug!(instance = %id, "run destroyed");
        report
    }
}

impl<B> fmt::Debug for InstanceManager<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceManager")
            .field("space", &self.space)
            .field("runs", &self.instances.len())
            .field("participants", &self.participant_runs.len())
            .field("relations", &self.relations.is_some())
            .field("now", &self.now)
            .finish()
    }
}
