use gloomhold_protocol::ParticipantId;

use crate::{BackendError, SpaceState};

/// Errors from the instance space.
#[derive(Debug, thiserror::Error)]
pub enum SpaceError {
    /// The backend could not create or configure the area.
    #[error("failed to allocate area {area}: {source}")]
    Allocation {
        area: String,
        #[source]
        source: BackendError,
    },

    /// The operation needs a READY space.
    #[error("instance space not ready (state: {0})")]
    NotReady(SpaceState),

    /// The space was shut down and cannot be used again.
    #[error("instance space destroyed")]
    Destroyed,

    /// Every grid cell is occupied.
    #[error("instance space full ({capacity} slots in use)")]
    Full { capacity: usize },

    /// A participant could not be moved out of the area.
    #[error("failed to evacuate {participant}: {source}")]
    Evacuation {
        participant: ParticipantId,
        #[source]
        source: BackendError,
    },
}
