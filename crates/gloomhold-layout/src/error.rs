use gloomhold_protocol::{ProtocolError, RoomId};

use crate::RoomType;

/// Errors that can occur while building a room graph.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    /// A room with this id is already in the graph.
    #[error("duplicate room {0}")]
    DuplicateRoom(RoomId),

    /// The referenced room does not exist in the graph.
    #[error("unknown room {0}")]
    UnknownRoom(RoomId),

    /// A connection from a room to itself.
    #[error("room {0} cannot connect to itself")]
    SelfLoop(RoomId),

    /// The room's volume is malformed.
    #[error("room {room} has invalid bounds: {source}")]
    InvalidBounds {
        room: RoomId,
        #[source]
        source: ProtocolError,
    },

    /// Mobs were assigned to a room type that never holds them.
    #[error("room {room} is a {room_type} and cannot hold mobs")]
    MobsNotAllowed { room: RoomId, room_type: RoomType },
}
