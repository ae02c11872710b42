use std::collections::HashSet;
use std::fmt;

use gloomhold_protocol::{Aabb, EntityId, RoomId, Vec3};
use serde::{Deserialize, Serialize};
use tracing::warn;

// ---------------------------------------------------------------------------
// RoomType
// ---------------------------------------------------------------------------

/// What a room is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomType {
    Spawn,
    Combat,
    Treasure,
    Puzzle,
    Boss,
    Corridor,
    Cave,
}

impl RoomType {
    pub const ALL: [RoomType; 7] = [
        Self::Spawn,
        Self::Combat,
        Self::Treasure,
        Self::Puzzle,
        Self::Boss,
        Self::Corridor,
        Self::Cave,
    ];

    /// Spawn rooms are safe; everything else may hold hostile mobs.
    pub fn can_have_mobs(self) -> bool {
        !matches!(self, Self::Spawn)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Spawn => "Spawn Room",
            Self::Combat => "Combat Room",
            Self::Treasure => "Treasure Room",
            Self::Puzzle => "Puzzle Room",
            Self::Boss => "Boss Room",
            Self::Corridor => "Corridor",
            Self::Cave => "Cave",
        }
    }

    /// Parses a configuration name case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.config_name().eq_ignore_ascii_case(name.trim()))
    }

    /// Parses a configuration name, falling back to [`RoomType::Combat`] for
    /// a missing or unrecognized name.
    pub fn parse_or_combat(name: Option<&str>) -> Self {
        match name {
            None => Self::Combat,
            Some(name) => Self::parse(name).unwrap_or_else(|| {
                warn!(name, "unknown room type, using COMBAT");
                Self::Combat
            }),
        }
    }

    fn config_name(self) -> &'static str {
        match self {
            Self::Spawn => "SPAWN",
            Self::Combat => "COMBAT",
            Self::Treasure => "TREASURE",
            Self::Puzzle => "PUZZLE",
            Self::Boss => "BOSS",
            Self::Corridor => "CORRIDOR",
            Self::Cave => "CAVE",
        }
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// One explorable area of a layout.
///
/// Rooms are owned by their [`RoomGraph`](crate::RoomGraph); the graph is
/// the only thing that mutates connections, mobs and the cleared flag.
#[derive(Debug, Clone)]
pub struct Room {
    id: RoomId,
    room_type: RoomType,
    bounds: Aabb,
    center: Vec3,
    pub(crate) connections: Vec<RoomId>,
    spawn_points: Vec<Vec3>,
    chest_points: Vec<Vec3>,
    pub(crate) cleared: bool,
    pub(crate) mobs: HashSet<EntityId>,
}

impl Room {
    /// Creates a room centred in its bounds.
    pub fn new(id: impl Into<RoomId>, room_type: RoomType, bounds: Aabb) -> Self {
        Self {
            id: id.into(),
            room_type,
            center: bounds.center(),
            bounds,
            connections: Vec::new(),
            spawn_points: Vec::new(),
            chest_points: Vec::new(),
            cleared: false,
            mobs: HashSet::new(),
        }
    }

    pub fn with_center(mut self, center: Vec3) -> Self {
        self.center = center;
        self
    }

    pub fn with_spawn_point(mut self, point: Vec3) -> Self {
        self.spawn_points.push(point);
        self
    }

    pub fn with_chest_point(mut self, point: Vec3) -> Self {
        self.chest_points.push(point);
        self
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn room_type(&self) -> RoomType {
        self.room_type
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Ids of the rooms this one connects to.
    pub fn connections(&self) -> &[RoomId] {
        &self.connections
    }

    pub fn spawn_points(&self) -> &[Vec3] {
        &self.spawn_points
    }

    pub fn chest_points(&self) -> &[Vec3] {
        &self.chest_points
    }

    pub fn is_cleared(&self) -> bool {
        self.cleared
    }

    /// Ids of the mobs currently alive in this room.
    pub fn mobs(&self) -> Vec<EntityId> {
        self.mobs.iter().copied().collect()
    }

    pub fn mob_count(&self) -> usize {
        self.mobs.len()
    }

    /// Bounding-volume membership.
    pub fn contains(&self, point: Vec3) -> bool {
        self.bounds.contains(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_spawn_rooms_are_mob_free() {
        for t in RoomType::ALL {
            assert_eq!(t.can_have_mobs(), t != RoomType::Spawn, "{t:?}");
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(RoomType::parse("boss"), Some(RoomType::Boss));
        assert_eq!(RoomType::parse(" Corridor "), Some(RoomType::Corridor));
        assert_eq!(RoomType::parse("vault"), None);
    }

    #[test]
    fn test_unknown_or_missing_type_falls_back_to_combat() {
        assert_eq!(RoomType::parse_or_combat(Some("vault")), RoomType::Combat);
        assert_eq!(RoomType::parse_or_combat(None), RoomType::Combat);
        assert_eq!(RoomType::parse_or_combat(Some("cave")), RoomType::Cave);
    }

    #[test]
    fn test_display_uses_display_name() {
        assert_eq!(RoomType::Treasure.to_string(), "Treasure Room");
        assert_eq!(RoomType::Cave.to_string(), "Cave");
    }

    #[test]
    fn test_room_defaults_center_to_bounds_center() {
        let bounds = Aabb::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(10.0, 4.0, 6.0)).unwrap();
        let room = Room::new("a", RoomType::Combat, bounds);
        assert_eq!(room.center(), Vec3::new(5.0, 2.0, 3.0));
        assert!(room.contains(Vec3::new(10.0, 4.0, 6.0)));
        assert!(!room.is_cleared());
        assert_eq!(room.mob_count(), 0);
    }
}
