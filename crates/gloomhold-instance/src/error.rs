//! Error types for the run layer.

use gloomhold_protocol::{InstanceId, ParticipantId};
use gloomhold_space::SpaceError;

use crate::InstanceState;

/// Errors from run management.
#[derive(Debug, thiserror::Error)]
pub enum InstanceError {
    /// The run does not exist.
    #[error("run {0} not found")]
    NotFound(InstanceId),

    /// The participant is already seated in a run.
    #[error("participant {participant} already in run {instance}")]
    AlreadyInRun {
        participant: ParticipantId,
        instance: InstanceId,
    },

    /// The participant is not in any run.
    #[error("participant {0} is not in any run")]
    NotInRun(ParticipantId),

    /// No free participant slots.
    #[error("run {0} is full")]
    RunFull(InstanceId),

    /// The run has ended and takes no new participants.
    #[error("run {instance} is not joinable ({state})")]
    NotJoinable {
        instance: InstanceId,
        state: InstanceState,
    },

    /// Someone already in the run is an enemy of the joining participant.
    #[error("participant {participant} is an enemy of {enemy} in run {instance}")]
    HostileRoster {
        participant: ParticipantId,
        enemy: ParticipantId,
        instance: InstanceId,
    },

    #[error(transparent)]
    Space(#[from] SpaceError),
}
