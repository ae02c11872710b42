//! Dungeon run orchestration for Gloomhold.
//!
//! Each run is a [`DungeonInstance`] that owns its room graph, its
//! objectives and its boss, and lives in one cell of the shared
//! [`InstanceSpace`](gloomhold_space::InstanceSpace). The
//! [`InstanceManager`] keeps every live run, knows which run each
//! participant is in, and tears runs down.
//!
//! # Key types
//!
//! - [`DungeonInstance`]: one run: roster, objectives, boss binding
//! - [`InstanceManager`]: creates/destroys runs, routes participants
//! - [`InstanceState`]: lifecycle state machine
//! - [`InstanceConfig`]: per-run settings (size, difficulty, time limit)
//! - [`RelationProvider`]: optional ally/enemy lookup for joins

mod config;
mod error;
mod instance;
mod lifecycle;
mod manager;
mod relation;

pub use config::{BossBinding, Difficulty, InstanceConfig, InstanceState};
pub use error::InstanceError;
pub use instance::{DungeonInstance, InstanceInfo};
pub use lifecycle::LifecycleEvent;
pub use manager::{InstanceManager, TeardownFailure, TeardownReport};
pub use relation::{Relation, RelationProvider};
