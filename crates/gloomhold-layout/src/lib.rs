//! Room/connection topology of a dungeon layout.
//!
//! A layout arrives already generated: rooms with their volumes and points
//! of interest, plus the connections between them. [`RoomGraph`] owns the
//! rooms for the lifetime of a run and tracks which mobs are alive in each
//! one, so the instance can tell when a room has been cleared.
//!
//! ```rust
//! use gloomhold_layout::{Room, RoomGraph, RoomType};
//! use gloomhold_protocol::{Aabb, Vec3};
//!
//! let cell = |x: f64| Aabb::new(Vec3::new(x, 0.0, 0.0), Vec3::new(x + 10.0, 6.0, 10.0)).unwrap();
//!
//! let mut graph = RoomGraph::new();
//! graph.add_room(Room::new("entry", RoomType::Spawn, cell(0.0))).unwrap();
//! graph.add_room(Room::new("hall", RoomType::Combat, cell(10.0))).unwrap();
//!
//! let door = Vec3::new(10.0, 1.0, 5.0);
//! assert!(graph.connect(&"entry".into(), &"hall".into(), door, None).unwrap());
//! // The same pair in the other order is a no-op.
//! assert!(!graph.connect(&"hall".into(), &"entry".into(), door, None).unwrap());
//! ```

mod connection;
mod error;
mod graph;
mod record;
mod room;

pub use connection::RoomConnection;
pub use error::LayoutError;
pub use graph::{MobRemoval, RoomGraph};
pub use record::{ConnectionRecord, LayoutLoadReport, LayoutRecord, RejectedRecord, RoomRecord};
pub use room::{Room, RoomType};
