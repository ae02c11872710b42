use gloomhold_protocol::{EntityId, ParticipantId, Vec3};

use crate::TargetView;

/// Who a status effect lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectTarget {
    Boss,
    Participant(ParticipantId),
}

/// The game world as the ability engine sees it.
///
/// The engine decides *what* an ability does; the host carries it out
/// (spawns the projectile, moves players, deals damage). Implemented by
/// the embedding game server, and by recording fakes in tests.
pub trait EncounterHost {
    /// Fires a projectile from `origin` with the given velocity.
    fn launch_projectile(&mut self, origin: Vec3, velocity: Vec3);

    /// Live participants within `radius` of `center`.
    fn participants_within(&self, center: Vec3, radius: f64) -> Vec<TargetView>;

    /// Sets a participant's velocity.
    fn push(&mut self, participant: ParticipantId, velocity: Vec3);

    fn damage(&mut self, participant: ParticipantId, amount: f64);

    /// Hostile mobs currently alive within `radius` of `center`.
    fn hostile_mobs_near(&self, center: Vec3, radius: f64) -> usize;

    /// A standable spot at or just below `around`, if there is one.
    fn find_ground(&self, around: Vec3) -> Option<Vec3>;

    /// Spawns a mob of `kind` at `at`; `None` if the world refused.
    fn spawn_mob(&mut self, kind: &str, at: Vec3) -> Option<EntityId>;

    fn apply_effect(&mut self, target: EffectTarget, effect: &str, duration_ticks: u64, amplifier: u32);

    /// Moves the boss; `false` if the move was refused.
    fn teleport_boss(&mut self, to: Vec3) -> bool;
}
