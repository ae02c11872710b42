//! `DungeonService` builder and upkeep loop.
//!
//! This is the entry point for embedding Gloomhold in a game server. It
//! ties the layers together: config → ability catalog → instance space →
//! run manager, behind one lock.

use std::future::Future;
use std::sync::{Arc, PoisonError};

use gloomhold_ability::{AbilityCatalog, BossEncounter, PhaseEntered};
use gloomhold_instance::{
    BossBinding, InstanceConfig, InstanceError, InstanceInfo, InstanceManager, LifecycleEvent,
    RelationProvider, TeardownReport,
};
use gloomhold_layout::{LayoutRecord, RoomGraph};
use gloomhold_objective::{ObjectiveDefinition, ObjectiveEngine, ObjectiveUpdate};
use gloomhold_protocol::{Codec, EntityId, GameplayEvent, InstanceId, JsonCodec, ParticipantId, RoomId};
use gloomhold_space::{AreaBackend, InstanceSpace, SpaceState};
use gloomhold_tick::{Tick, TickConfig, TickScheduler};
use serde::Serialize;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error, info, warn};

use crate::{GloomholdConfig, GloomholdError};

/// Read-only service status for the admin surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceStatus {
    pub space: SpaceState,
    pub ready: bool,
    pub active_runs: usize,
    pub slots_in_use: usize,
    pub capacity: usize,
    pub now: Tick,
}

/// Shared service state.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. Every run
/// operation goes through the one `manager` lock. Lifecycle events are
/// sent while that lock is held, so subscribers see them in the order the
/// manager raised them.
pub(crate) struct ServiceState<B, C> {
    pub(crate) manager: Mutex<InstanceManager<B>>,
    pub(crate) catalog: AbilityCatalog,
    pub(crate) codec: C,
    pub(crate) defaults: InstanceConfig,
    subscribers: std::sync::Mutex<Vec<mpsc::UnboundedSender<LifecycleEvent>>>,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for configuring and starting a [`DungeonService`].
///
/// # Example
///
/// ```rust,ignore
/// use gloomhold::prelude::*;
///
/// let service = DungeonService::builder()
///     .config(GloomholdConfig::from_json(&raw)?)
///     .build(MyWorld::connect()?);
/// tokio::spawn({
///     let service = service.clone();
///     async move { service.run_upkeep(shutdown_signal()).await }
/// });
/// ```
pub struct DungeonServiceBuilder {
    config: GloomholdConfig,
    relations: Option<Box<dyn RelationProvider>>,
}

impl DungeonServiceBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: GloomholdConfig::default(),
            relations: None,
        }
    }

    pub fn config(mut self, config: GloomholdConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers an ally/enemy lookup used when seating participants.
    pub fn relations(mut self, provider: impl RelationProvider + 'static) -> Self {
        self.relations = Some(Box::new(provider));
        self
    }

    /// Builds the service over `backend` with [`JsonCodec`].
    pub fn build<B: AreaBackend>(self, backend: B) -> DungeonService<B, JsonCodec> {
        self.build_with_codec(backend, JsonCodec)
    }

    /// Builds the service and initializes the instance space.
    ///
    /// A space that fails to initialize is logged and left UNINITIALIZED:
    /// the service still starts, run creation fails with "not ready", and
    /// an admin reset retries the allocation.
    pub fn build_with_codec<B: AreaBackend, C: Codec>(
        self,
        backend: B,
        codec: C,
    ) -> DungeonService<B, C> {
        let config = self.config.validated();
        let catalog = config.ability_catalog();

        let mut space = InstanceSpace::new(backend, config.space.clone());
        if let Err(e) = space.initialize() {
            error!(error = %e, "instance space failed to initialize");
        }

        let mut manager = InstanceManager::new(space);
        manager.set_relations(self.relations);

        let state = Arc::new(ServiceState {
            manager: Mutex::new(manager),
            catalog,
            codec,
            defaults: config.instance.clone(),
            subscribers: std::sync::Mutex::new(Vec::new()),
        });

        DungeonService {
            state,
            tick: config.tick_config(),
        }
    }
}

impl Default for DungeonServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// DungeonService
// ---------------------------------------------------------------------------

/// A running Gloomhold service. Cheap to clone; clones share state.
pub struct DungeonService<B, C = JsonCodec> {
    pub(crate) state: Arc<ServiceState<B, C>>,
    tick: TickConfig,
}

impl<B, C> Clone for DungeonService<B, C> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            tick: self.tick.clone(),
        }
    }
}

impl DungeonService<(), JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> DungeonServiceBuilder {
        DungeonServiceBuilder::new()
    }
}

impl<B, C> DungeonService<B, C>
where
    B: AreaBackend + Send + 'static,
    C: Codec,
{
    pub fn catalog(&self) -> &AbilityCatalog {
        &self.state.catalog
    }

    /// Receives every lifecycle event from now on.
    pub async fn subscribe(&self) -> mpsc::UnboundedReceiver<LifecycleEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let _manager = self.state.manager.lock().await;
        self.subscribers().push(tx);
        rx
    }

    // -- runs ---------------------------------------------------------------

    /// Creates a run. `config` falls back to the service defaults.
    pub async fn create_run(
        &self,
        graph: RoomGraph,
        objectives: ObjectiveEngine,
        boss: BossBinding,
        config: Option<InstanceConfig>,
    ) -> Result<InstanceId, GloomholdError> {
        let config = config.unwrap_or_else(|| self.state.defaults.clone());
        let mut manager = self.state.manager.lock().await;
        Ok(manager.create(graph, objectives, boss, config)?)
    }

    /// Creates a run from configuration records.
    ///
    /// Malformed room, connection and objective records are logged and
    /// skipped; the run is built from whatever loaded.
    pub async fn create_run_from_records(
        &self,
        layout: LayoutRecord,
        objectives: &[ObjectiveDefinition],
        boss: BossBinding,
        config: Option<InstanceConfig>,
    ) -> Result<InstanceId, GloomholdError> {
        let (graph, report) = RoomGraph::from_records(layout);
        if !report.is_clean() {
            warn!(
                rejected = report.rejected.len(),
                duplicates = report.duplicate_connections,
                "layout loaded with rejected records"
            );
        }
        let (engine, rejected) = ObjectiveEngine::from_definitions(objectives);
        for e in &rejected {
            warn!(error = %e, "objective rejected");
        }
        self.create_run(graph, engine, boss, config).await
    }

    /// Seats a participant in a run.
    pub async fn join(&self, participant: ParticipantId, id: InstanceId) -> Result<(), GloomholdError> {
        let mut manager = self.state.manager.lock().await;
        manager.join(participant, id)?;
        Ok(())
    }

    /// Removes a participant from whatever run they are in.
    pub async fn leave(&self, participant: ParticipantId) -> bool {
        let mut manager = self.state.manager.lock().await;
        let removed = manager.remove_participant_from_wherever(participant);
        self.publish(&mut manager);
        removed
    }

    pub async fn is_participant_of_any(&self, participant: ParticipantId) -> bool {
        self.state.manager.lock().await.is_participant_of_any(participant)
    }

    /// Applies a participant's gameplay event to their run.
    ///
    /// Never fails: an event from someone outside any run is dropped.
    pub async fn dispatch(&self, participant: ParticipantId, event: GameplayEvent) -> Vec<ObjectiveUpdate> {
        let mut manager = self.state.manager.lock().await;
        let updates = match manager.route_event(participant, &event) {
            Ok(updates) => updates,
            Err(e) => {
                debug!(%participant, kind = event.kind(), error = %e, "event dropped");
                Vec::new()
            }
        };
        self.publish(&mut manager);
        updates
    }

    /// Decodes an event with the service codec and dispatches it.
    /// Undecodable payloads are dropped.
    pub async fn dispatch_encoded(&self, participant: ParticipantId, data: &[u8]) -> Vec<ObjectiveUpdate> {
        match self.state.codec.decode::<GameplayEvent>(data) {
            Ok(event) => self.dispatch(participant, event).await,
            Err(e) => {
                debug!(%participant, error = %e, "failed to decode gameplay event");
                Vec::new()
            }
        }
    }

    /// Applies an event to run `id` directly (host-side events such as
    /// mob deaths).
    pub async fn dispatch_to(
        &self,
        id: InstanceId,
        event: GameplayEvent,
    ) -> Result<Vec<ObjectiveUpdate>, GloomholdError> {
        let mut manager = self.state.manager.lock().await;
        let updates = manager.dispatch_to(id, &event)?;
        self.publish(&mut manager);
        Ok(updates)
    }

    pub async fn report_boss_defeated(&self, id: InstanceId) -> Result<Vec<ObjectiveUpdate>, GloomholdError> {
        let mut manager = self.state.manager.lock().await;
        let updates = manager.report_boss_defeated(id)?;
        self.publish(&mut manager);
        Ok(updates)
    }

    /// Records a spawned mob in one of a run's rooms, so its
    /// `MobKilled` can clear the room.
    pub async fn add_mob(&self, id: InstanceId, room: &RoomId, mob: EntityId) -> Result<(), GloomholdError> {
        let mut manager = self.state.manager.lock().await;
        let run = manager.get_mut(id).ok_or(InstanceError::NotFound(id))?;
        run.graph_mut().add_mob(room, mob)?;
        Ok(())
    }

    /// Attaches a boss encounter to a run.
    pub async fn attach_encounter(&self, id: InstanceId, encounter: BossEncounter) -> Result<(), GloomholdError> {
        let mut manager = self.state.manager.lock().await;
        let run = manager
            .get_mut(id)
            .ok_or(InstanceError::NotFound(id))?;
        run.attach_encounter(encounter);
        Ok(())
    }

    /// Runs `f` against a run's boss encounter and the ability catalog,
    /// under the service lock. `None` if the run or its encounter is
    /// missing.
    ///
    /// This is the boss AI driver's hook: pick from
    /// `usable_abilities(catalog)` and fire with `use_ability`.
    pub async fn with_encounter<R>(
        &self,
        id: InstanceId,
        f: impl FnOnce(&mut BossEncounter, &AbilityCatalog) -> R,
    ) -> Option<R> {
        let mut manager = self.state.manager.lock().await;
        let encounter = manager.get_mut(id)?.encounter_mut()?;
        Some(f(encounter, &self.state.catalog))
    }

    pub async fn info(&self, id: InstanceId) -> Option<InstanceInfo> {
        self.state.manager.lock().await.get(id).map(|run| run.info())
    }

    /// Snapshots of every run, by id.
    pub async fn list(&self) -> Vec<InstanceInfo> {
        let manager = self.state.manager.lock().await;
        manager
            .all_ids()
            .into_iter()
            .filter_map(|id| manager.get(id).map(|run| run.info()))
            .collect()
    }

    /// Serializes a run snapshot with the service codec.
    pub async fn encode_info(&self, id: InstanceId) -> Result<Option<Vec<u8>>, GloomholdError> {
        match self.info(id).await {
            Some(info) => Ok(Some(self.state.codec.encode(&info)?)),
            None => Ok(None),
        }
    }

    pub async fn status(&self) -> ServiceStatus {
        let manager = self.state.manager.lock().await;
        let space = manager.space();
        ServiceStatus {
            space: space.state(),
            ready: space.is_ready(),
            active_runs: manager.active_count(),
            slots_in_use: space.slots_in_use(),
            capacity: space.capacity(),
            now: manager.now(),
        }
    }

    // -- upkeep -------------------------------------------------------------

    /// One upkeep step: advances every run to `now`, then tears down runs
    /// that have ended. Returns the boss phase changes.
    pub async fn upkeep(&self, now: Tick) -> Vec<(InstanceId, PhaseEntered)> {
        let mut manager = self.state.manager.lock().await;
        let phases = manager.tick(now);
        let report = manager.cleanup_finished();
        if !report.destroyed.is_empty() {
            debug!(runs = report.destroyed.len(), "finished runs cleaned up");
        }
        self.publish(&mut manager);
        phases
    }

    /// Drives [`upkeep`](Self::upkeep) at the configured tick rate until
    /// `shutdown` resolves. Returns at once when the rate is 0.
    pub async fn run_upkeep(&self, shutdown: impl Future<Output = ()>) {
        let mut scheduler = TickScheduler::new(self.tick.clone());
        if scheduler.is_manual() {
            info!("upkeep loop disabled (tick rate 0)");
            return;
        }
        info!(rate_hz = scheduler.tick_rate_hz(), "upkeep loop running");
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                tick = scheduler.wait_for_tick() => {
                    for (id, phase) in self.upkeep(tick.tick).await {
                        debug!(instance = %id, phase = phase.number, "boss phase changed");
                    }
                    scheduler.record_tick_end();
                }
            }
        }
        info!(tick = scheduler.now(), "upkeep loop stopped");
    }

    // -- teardown -----------------------------------------------------------

    /// Tears down every run and destroys the instance space.
    pub async fn shutdown(&self) -> TeardownReport {
        let report = {
            let mut manager = self.state.manager.lock().await;
            let report = manager.shutdown();
            self.publish(&mut manager);
            report
        };
        info!(runs = report.destroyed.len(), "service shut down");
        report
    }

    /// Drains the manager's events and sends them to every live
    /// subscriber, dropping closed ones. Callers pass the guarded manager,
    /// so two operations never interleave their events.
    pub(crate) fn publish(&self, manager: &mut InstanceManager<B>) {
        let events = manager.drain_events();
        if events.is_empty() {
            return;
        }
        self.subscribers()
            .retain(|tx| events.iter().all(|e| tx.send(e.clone()).is_ok()));
    }

    fn subscribers(&self) -> std::sync::MutexGuard<'_, Vec<mpsc::UnboundedSender<LifecycleEvent>>> {
        self.state
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
