//! Progress tracking for the goals of a dungeon run.
//!
//! An [`Objective`] is one goal (kill the boss, collect items, activate
//! altars, clear rooms). An [`ObjectiveEngine`] holds every objective bound
//! to a run, feeds each gameplay event to all of them, and reports when the
//! run as a whole is complete.
//!
//! Objectives only ever move forward: recorded facts are never forgotten,
//! and a completed objective stays completed.

mod definition;
mod engine;
mod error;
mod objective;

pub use definition::ObjectiveDefinition;
pub use engine::{ObjectiveEngine, ObjectiveSnapshot, ObjectiveUpdate};
pub use error::ObjectiveError;
pub use objective::{BossContext, Objective, ObjectiveChange, ObjectiveKind};
