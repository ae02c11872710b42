use gloomhold_protocol::ParticipantId;

use crate::AreaSettings;

/// Error type backends report failures with.
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

/// The game world that physically holds the instance area.
///
/// Calls are synchronous and may block on world I/O. Areas are created and
/// destroyed only on administrative paths (startup, reset, shutdown).
/// `evacuate` also runs whenever a run is torn down, including the upkeep
/// step that cleans up finished runs.
pub trait AreaBackend {
    fn area_exists(&self, name: &str) -> bool;

    /// Creates a fresh, empty area.
    fn create_area(&mut self, name: &str) -> Result<(), BackendError>;

    fn apply_settings(&mut self, name: &str, settings: &AreaSettings) -> Result<(), BackendError>;

    /// Participants currently inside the area.
    fn occupants(&self, name: &str) -> Vec<ParticipantId>;

    /// Moves a participant to their fallback location outside the area
    /// (respawn point, else the main spawn).
    fn evacuate(&mut self, participant: ParticipantId) -> Result<(), BackendError>;

    /// Unloads and deletes the area.
    fn destroy_area(&mut self, name: &str) -> Result<(), BackendError>;
}
