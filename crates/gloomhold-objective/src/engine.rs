use gloomhold_protocol::GameplayEvent;
use serde::Serialize;
use tracing::{debug, warn};

use crate::{BossContext, Objective, ObjectiveChange, ObjectiveDefinition, ObjectiveError, ObjectiveKind};

/// One objective that moved during [`ObjectiveEngine::dispatch`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectiveUpdate {
    pub id: String,
    pub change: ObjectiveChange,
    pub progress: f64,
}

/// Owned, serializable view of one objective for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectiveSnapshot {
    pub id: String,
    pub kind: ObjectiveKind,
    pub description: String,
    pub progress: f64,
    pub complete: bool,
}

impl From<&Objective> for ObjectiveSnapshot {
    fn from(o: &Objective) -> Self {
        Self {
            id: o.id().to_string(),
            kind: o.kind(),
            description: o.description(),
            progress: o.progress(),
            complete: o.is_complete(),
        }
    }
}

/// The objectives bound to one run.
///
/// Every event goes to every incomplete objective, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct ObjectiveEngine {
    objectives: Vec<Objective>,
}

impl ObjectiveEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an engine from configuration records.
    ///
    /// A bad record is logged and skipped; the rest still load. The
    /// returned errors describe every skipped record.
    pub fn from_definitions(
        definitions: &[ObjectiveDefinition],
    ) -> (ObjectiveEngine, Vec<ObjectiveError>) {
        let mut engine = ObjectiveEngine::new();
        let mut rejected = Vec::new();

        for def in definitions {
            let result = def.build().and_then(|o| engine.add(o));
            if let Err(error) = result {
                warn!(objective = %def.id, %error, "rejected objective definition");
                rejected.push(error);
            }
        }
        (engine, rejected)
    }

    /// Adds an objective.
    ///
    /// # Errors
    /// [`ObjectiveError::DuplicateId`] if another objective has the same id.
    pub fn add(&mut self, objective: Objective) -> Result<(), ObjectiveError> {
        if self.get(objective.id()).is_some() {
            return Err(ObjectiveError::DuplicateId(objective.id().to_string()));
        }
        self.objectives.push(objective);
        Ok(())
    }

    /// Feeds one event to every incomplete objective and returns the ones
    /// that moved.
    pub fn dispatch(&mut self, event: &GameplayEvent, boss: &BossContext) -> Vec<ObjectiveUpdate> {
        let mut updates = Vec::new();
        for objective in self.objectives.iter_mut().filter(|o| !o.is_complete()) {
            let change = objective.update(event, boss);
            if change != ObjectiveChange::Unchanged {
                debug!(
                    objective = objective.id(),
                    kind = event.kind(),
                    ?change,
                    progress = objective.progress(),
                    "objective updated"
                );
                updates.push(ObjectiveUpdate {
                    id: objective.id().to_string(),
                    change,
                    progress: objective.progress(),
                });
            }
        }
        updates
    }

    /// All objectives complete. An engine with no objectives is never
    /// complete.
    pub fn is_complete(&self) -> bool {
        !self.objectives.is_empty() && self.objectives.iter().all(Objective::is_complete)
    }

    /// Mean progress across objectives; 0.0 when empty.
    pub fn total_progress(&self) -> f64 {
        if self.objectives.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.objectives.iter().map(Objective::progress).sum();
        sum / self.objectives.len() as f64
    }

    pub fn completed_count(&self) -> usize {
        self.objectives.iter().filter(|o| o.is_complete()).count()
    }

    pub fn len(&self) -> usize {
        self.objectives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objectives.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Objective> {
        self.objectives.iter().find(|o| o.id() == id)
    }

    pub fn of_kind(&self, kind: ObjectiveKind) -> Vec<&Objective> {
        self.objectives.iter().filter(|o| o.kind() == kind).collect()
    }

    pub fn objectives(&self) -> &[Objective] {
        &self.objectives
    }

    pub fn snapshots(&self) -> Vec<ObjectiveSnapshot> {
        self.objectives.iter().map(ObjectiveSnapshot::from).collect()
    }
}
