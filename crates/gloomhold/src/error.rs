//! Unified error type for Gloomhold.

use gloomhold_ability::AbilityError;
use gloomhold_instance::InstanceError;
use gloomhold_layout::LayoutError;
use gloomhold_objective::ObjectiveError;
use gloomhold_protocol::ProtocolError;
use gloomhold_space::SpaceError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum GloomholdError {
    /// Encoding or decoding failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room or connection record was rejected.
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// An objective definition was rejected.
    #[error(transparent)]
    Objective(#[from] ObjectiveError),

    /// An ability definition was rejected.
    #[error(transparent)]
    Ability(#[from] AbilityError),

    /// The instance space failed or is not ready.
    #[error(transparent)]
    Space(#[from] SpaceError),

    /// A run operation failed (not found, full, not joinable).
    #[error(transparent)]
    Instance(#[from] InstanceError),

    /// The service configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}
