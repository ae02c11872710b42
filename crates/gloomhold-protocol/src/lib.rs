//! Shared vocabulary for Gloomhold.
//!
//! Every other crate in the workspace speaks in the types defined here:
//!
//! - **Identity** ([`ParticipantId`], [`InstanceId`], [`RoomId`], [`EntityId`]):
//!   who and what a message is about.
//! - **Geometry** ([`Vec3`], [`Aabb`]): positions and room volumes.
//! - **Events** ([`GameplayEvent`], [`BossRef`]): the facts participants
//!   produce while playing a run.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how events and snapshots
//!   are turned into bytes for collaborators outside the core.
//!
//! ```text
//! Action source (bytes) → Protocol (GameplayEvent) → Instance (objectives)
//! ```

mod codec;
mod error;
mod event;
mod geometry;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use event::{BossRef, GameplayEvent};
pub use geometry::{Aabb, Vec3};
pub use types::{EntityId, InstanceId, ParticipantId, RoomId};
