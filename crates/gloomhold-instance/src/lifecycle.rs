use gloomhold_protocol::{InstanceId, ParticipantId};
use serde::Serialize;

/// A run reached the end of its life.
///
/// Emitted for reward and cleanup hooks outside the core; the manager
/// collects them and [`InstanceManager::drain_events`](crate::InstanceManager::drain_events)
/// hands them over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// Every objective is done. `participants` is the roster at that moment.
    Completed {
        instance: InstanceId,
        participants: Vec<ParticipantId>,
    },
    /// The last participant left before completion.
    Abandoned { instance: InstanceId },
    /// The time limit ran out.
    Expired {
        instance: InstanceId,
        participants: Vec<ParticipantId>,
    },
    /// The run was torn down and removed from the registry.
    Destroyed { instance: InstanceId },
}

impl LifecycleEvent {
    pub fn instance(&self) -> InstanceId {
        match self {
            Self::Completed { instance, .. }
            | Self::Abandoned { instance }
            | Self::Expired { instance, .. }
            | Self::Destroyed { instance } => *instance,
        }
    }
}
