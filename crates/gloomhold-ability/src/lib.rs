//! Boss abilities and the per-run encounter state that fires them.
//!
//! - [`BossAbility`] is a stateless template loaded once from
//!   configuration and kept in an [`AbilityCatalog`].
//! - [`can_use`] and [`execute`] are the ability engine: range/liveness
//!   gating and per-type effects, applied through an [`EncounterHost`].
//! - [`BossEncounter`] is the boss of one run: health, phase,
//!   invulnerability and per-ability cooldowns counted in ticks.
//!
//! Which ability to try next is the caller's decision (the boss AI
//! driver); [`BossEncounter::usable_abilities`] lists the candidates.

mod ability;
mod builtin;
mod catalog;
mod cooldown;
mod encounter;
mod engine;
mod error;
mod host;
mod phase;

pub use ability::{AbilityDefinition, AbilityType, BossAbility};
pub use catalog::AbilityCatalog;
pub use cooldown::CooldownTracker;
pub use encounter::{BossEncounter, PhaseEntered};
pub use engine::{CasterView, TargetView, can_use, execute};
pub use error::AbilityError;
pub use host::{EffectTarget, EncounterHost};
pub use phase::{BossPhase, phase_for_health};
