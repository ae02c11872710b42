//! # Gloomhold
//!
//! Core of a multiplayer dungeon run: the room graph, objectives tracked
//! against player actions, a boss fighting with cooldown-gated abilities,
//! and a shared instance space every run is placed in.
//!
//! The game server implements [`AreaBackend`](gloomhold_space::AreaBackend)
//! for its world (and [`EncounterHost`](gloomhold_ability::EncounterHost)
//! for the boss AI), builds a [`DungeonService`], and feeds it gameplay
//! events.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gloomhold::prelude::*;
//!
//! gloomhold::init_tracing();
//! let service = DungeonService::builder()
//!     .config(GloomholdConfig::from_json(&raw)?)
//!     .build(my_world);
//!
//! let run = service
//!     .create_run_from_records(layout, &objectives, BossBinding::named("lich_king"), None)
//!     .await?;
//! service.join(ParticipantId(1), run).await?;
//! service.dispatch(ParticipantId(1), GameplayEvent::RoomCleared { room_id: "r1".into() }).await;
//! ```

mod admin;
mod config;
mod error;
mod service;
mod telemetry;

pub use admin::{AdminCommand, AdminFailure, AdminOutcome};
pub use config::GloomholdConfig;
pub use error::GloomholdError;
pub use service::{DungeonService, DungeonServiceBuilder, ServiceStatus};
pub use telemetry::init_tracing;

pub use gloomhold_ability as ability;
pub use gloomhold_instance as instance;
pub use gloomhold_layout as layout;
pub use gloomhold_objective as objective;
pub use gloomhold_protocol as protocol;
pub use gloomhold_space as space;
pub use gloomhold_tick as tick;

pub mod prelude {
    pub use crate::{
        AdminCommand, AdminOutcome, DungeonService, GloomholdConfig, GloomholdError, ServiceStatus,
    };
    pub use gloomhold_ability::{AbilityCatalog, BossEncounter, BossPhase, EncounterHost, TargetView};
    pub use gloomhold_instance::{
        BossBinding, Difficulty, InstanceConfig, InstanceInfo, InstanceState, LifecycleEvent,
        RelationProvider,
    };
    pub use gloomhold_layout::{LayoutRecord, RoomGraph};
    pub use gloomhold_objective::{ObjectiveDefinition, ObjectiveEngine};
    pub use gloomhold_protocol::{
        BossRef, Codec, EntityId, GameplayEvent, InstanceId, JsonCodec, ParticipantId, RoomId, Vec3,
    };
    pub use gloomhold_space::{AreaBackend, AreaSettings, BackendError, SpaceConfig};
}
