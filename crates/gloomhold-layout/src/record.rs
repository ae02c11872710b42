//! Layout records from the configuration loader.

use gloomhold_protocol::{Aabb, RoomId, Vec3};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{LayoutError, Room, RoomGraph, RoomType};

/// A whole layout as the configuration loader hands it over.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutRecord {
    pub rooms: Vec<RoomRecord>,
    #[serde(default)]
    pub connections: Vec<ConnectionRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomRecord {
    pub id: RoomId,
    /// Room type name. Missing or unknown names load as `COMBAT`.
    #[serde(rename = "type", default)]
    pub room_type: Option<String>,
    pub bounds: Aabb,
    /// Defaults to the middle of `bounds`.
    #[serde(default)]
    pub center: Option<Vec3>,
    #[serde(default)]
    pub spawn_points: Vec<Vec3>,
    #[serde(default)]
    pub chest_points: Vec<Vec3>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub from: RoomId,
    pub to: RoomId,
    pub point: Vec3,
    #[serde(default)]
    pub door: Option<Vec3>,
}

/// One record that failed to load.
#[derive(Debug)]
pub struct RejectedRecord {
    /// `"room r3"` or `"connection r1-r9"`.
    pub record: String,
    pub error: LayoutError,
}

/// Outcome of [`RoomGraph::from_records`].
#[derive(Debug, Default)]
pub struct LayoutLoadReport {
    pub rooms_loaded: usize,
    pub connections_loaded: usize,
    /// Connections naming a pair that was already connected.
    pub duplicate_connections: usize,
    pub rejected: Vec<RejectedRecord>,
}

impl LayoutLoadReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

impl RoomRecord {
    fn into_room(self) -> Room {
        let room_type = RoomType::parse_or_combat(self.room_type.as_deref());
        let mut room = Room::new(self.id, room_type, self.bounds);
        if let Some(center) = self.center {
            room = room.with_center(center);
        }
        for p in self.spawn_points {
            room = room.with_spawn_point(p);
        }
        for p in self.chest_points {
            room = room.with_chest_point(p);
        }
        room
    }
}

impl RoomGraph {
    /// Builds a graph from configuration records.
    ///
    /// A malformed room or connection is rejected on its own and logged;
    /// the rest of the layout still loads. Connections are applied after
    /// all rooms, so record order does not matter.
    pub fn from_records(record: LayoutRecord) -> (RoomGraph, LayoutLoadReport) {
        let mut graph = RoomGraph::new();
        let mut report = LayoutLoadReport::default();

        for room in record.rooms {
            let label = format!("room {}", room.id);
            match graph.add_room(room.into_room()) {
                Ok(()) => report.rooms_loaded += 1,
                Err(error) => {
                    warn!(record = %label, %error, "rejected layout record");
                    report.rejected.push(RejectedRecord {
                        record: label,
                        error,
                    });
                }
            }
        }

        for conn in record.connections {
            match graph.connect(&conn.from, &conn.to, conn.point, conn.door) {
                Ok(true) => report.connections_loaded += 1,
                Ok(false) => report.duplicate_connections += 1,
                Err(error) => {
                    let label = format!("connection {}-{}", conn.from, conn.to);
                    warn!(record = %label, %error, "rejected layout record");
                    report.rejected.push(RejectedRecord {
                        record: label,
                        error,
                    });
                }
            }
        }

        info!(
            rooms = report.rooms_loaded,
            connections = report.connections_loaded,
            rejected = report.rejected.len(),
            "layout loaded"
        );
        (graph, report)
    }
}
