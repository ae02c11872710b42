use std::collections::{HashMap, HashSet, VecDeque};

use gloomhold_protocol::{EntityId, RoomId, Vec3};
use tracing::{debug, trace};

use crate::connection::pair_key;
use crate::{LayoutError, Room, RoomConnection, RoomType};

/// What happened when a mob was removed from the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MobRemoval {
    /// The mob was not tracked in any room.
    NotTracked,
    /// The mob was removed; its room still has mobs left (or was
    /// already cleared).
    Removed { room: RoomId },
    /// The mob was the last one in its room, which is now cleared.
    RoomCleared { room: RoomId },
}

/// The rooms of one dungeon run and the connections between them.
///
/// An undirected graph; cycles are allowed. At most one connection exists
/// per unordered room pair.
#[derive(Debug, Default, Clone)]
pub struct RoomGraph {
    rooms: Vec<Room>,
    index: HashMap<RoomId, usize>,
    connections: Vec<RoomConnection>,
    /// Unordered room pair → index into `connections`.
    edges: HashMap<(RoomId, RoomId), usize>,
    /// Mob → the room it was spawned in.
    mob_rooms: HashMap<EntityId, RoomId>,
}

impl RoomGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// Adds a room.
    ///
    /// # Errors
    /// - [`LayoutError::DuplicateRoom`] if the id is already present.
    /// - [`LayoutError::InvalidBounds`] if the room's volume is inverted.
    pub fn add_room(&mut self, room: Room) -> Result<(), LayoutError> {
        if self.index.contains_key(room.id()) {
            return Err(LayoutError::DuplicateRoom(room.id().clone()));
        }
        room.bounds()
            .validate()
            .map_err(|source| LayoutError::InvalidBounds {
                room: room.id().clone(),
                source,
            })?;

        trace!(room_id = %room.id(), room_type = ?room.room_type(), "room added");
        self.index.insert(room.id().clone(), self.rooms.len());
        self.rooms.push(room);
        Ok(())
    }

    /// Connects two rooms.
    ///
    /// Returns `Ok(false)` without changing anything if the pair is already
    /// connected, in either order.
    ///
    /// # Errors
    /// - [`LayoutError::UnknownRoom`] if either room is missing.
    /// - [`LayoutError::SelfLoop`] if `a == b`.
    pub fn connect(
        &mut self,
        a: &RoomId,
        b: &RoomId,
        point: Vec3,
        door: Option<Vec3>,
    ) -> Result<bool, LayoutError> {
        let ia = self.position(a)?;
        let ib = self.position(b)?;
        if ia == ib {
            return Err(LayoutError::SelfLoop(a.clone()));
        }

        let key = pair_key(a, b);
        if self.edges.contains_key(&key) {
            trace!(from = %a, to = %b, "duplicate connection ignored");
            return Ok(false);
        }

        let connection = RoomConnection::new(a.clone(), b.clone(), point, door);
        self.edges.insert(key, self.connections.len());
        self.connections.push(connection);
        self.rooms[ia].connections.push(b.clone());
        self.rooms[ib].connections.push(a.clone());
        trace!(from = %a, to = %b, gated = door.is_some(), "rooms connected");
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn room(&self, id: &RoomId) -> Option<&Room> {
        self.index.get(id).map(|&i| &self.rooms[i])
    }

    /// Every room, in insertion order.
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Whether `point` lies inside `room`'s volume. False for an unknown room.
    pub fn contains(&self, room: &RoomId, point: Vec3) -> bool {
        self.room(room).is_some_and(|r| r.contains(point))
    }

    /// The first room (in insertion order) whose volume holds `point`.
    pub fn room_at(&self, point: Vec3) -> Option<&Room> {
        self.rooms.iter().find(|r| r.contains(point))
    }

    pub fn rooms_of_type(&self, room_type: RoomType) -> Vec<&Room> {
        self.rooms
            .iter()
            .filter(|r| r.room_type() == room_type)
            .collect()
    }

    /// Rooms directly connected to `room`. Empty for an unknown room.
    pub fn neighbors_of(&self, room: &RoomId) -> Vec<RoomId> {
        self.room(room)
            .map(|r| r.connections().to_vec())
            .unwrap_or_default()
    }

    pub fn connections(&self) -> &[RoomConnection] {
        &self.connections
    }

    pub fn connection_between(&self, a: &RoomId, b: &RoomId) -> Option<&RoomConnection> {
        self.edges
            .get(&pair_key(a, b))
            .map(|&i| &self.connections[i])
    }

    /// Every connection touching `room`.
    pub fn connections_of(&self, room: &RoomId) -> Vec<&RoomConnection> {
        self.connections.iter().filter(|c| c.touches(room)).collect()
    }

    pub fn cleared_rooms(&self) -> Vec<RoomId> {
        self.rooms
            .iter()
            .filter(|r| r.is_cleared())
            .map(|r| r.id().clone())
            .collect()
    }

    /// Fewest-hops route from `from` to `to`, both ends included.
    ///
    /// `None` if either room is unknown or `to` is unreachable.
    pub fn shortest_path(&self, from: &RoomId, to: &RoomId) -> Option<Vec<RoomId>> {
        let start = *self.index.get(from)?;
        let goal = *self.index.get(to)?;

        let mut came_from: Vec<Option<usize>> = vec![None; self.rooms.len()];
        let mut seen = vec![false; self.rooms.len()];
        let mut queue = VecDeque::from([start]);
        seen[start] = true;

        while let Some(current) = queue.pop_front() {
            if current == goal {
                let mut path = vec![self.rooms[current].id().clone()];
                let mut step = current;
                while let Some(prev) = came_from[step] {
                    path.push(self.rooms[prev].id().clone());
                    step = prev;
                }
                path.reverse();
                return Some(path);
            }
            for next in self.rooms[current].connections() {
                let Some(&ni) = self.index.get(next) else {
                    continue;
                };
                if !seen[ni] {
                    seen[ni] = true;
                    came_from[ni] = Some(current);
                    queue.push_back(ni);
                }
            }
        }
        None
    }

    /// Every room reachable from `room`, including itself, in
    /// breadth-first order. Empty for an unknown room.
    pub fn reachable_from(&self, room: &RoomId) -> Vec<RoomId> {
        let Some(start) = self.room(room) else {
            return Vec::new();
        };

        let mut seen: HashSet<&RoomId> = HashSet::from([start.id()]);
        let mut order = Vec::new();
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            order.push(current.id().clone());
            for next in current.connections() {
                if seen.insert(next) {
                    if let Some(r) = self.room(next) {
                        queue.push_back(r);
                    }
                }
            }
        }
        order
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Marks a room cleared. Returns `true` only if the flag changed.
    pub fn mark_cleared(&mut self, room: &RoomId) -> bool {
        match self.index.get(room) {
            Some(&i) if !self.rooms[i].cleared => {
                self.rooms[i].cleared = true;
                debug!(room_id = %room, "room cleared");
                true
            }
            _ => false,
        }
    }

    /// Records a spawned mob in `room`. A mob already tracked elsewhere
    /// moves to `room`; the room it left is not cleared by the move.
    ///
    /// # Errors
    /// - [`LayoutError::UnknownRoom`] if the room is missing.
    /// - [`LayoutError::MobsNotAllowed`] for a room type that never holds mobs.
    pub fn add_mob(&mut self, room: &RoomId, mob: EntityId) -> Result<(), LayoutError> {
        let i = self.position(room)?;
        let room_type = self.rooms[i].room_type();
        if !room_type.can_have_mobs() {
            return Err(LayoutError::MobsNotAllowed {
                room: room.clone(),
                room_type,
            });
        }
        if let Some(previous) = self.mob_rooms.insert(mob, room.clone()) {
            if previous != *room {
                if let Some(&j) = self.index.get(&previous) {
                    self.rooms[j].mobs.remove(&mob);
                }
                debug!(%mob, from = %previous, to = %room, "mob changed rooms");
            }
        }
        self.rooms[i].mobs.insert(mob);
        trace!(room_id = %room, %mob, "mob tracked");
        Ok(())
    }

    /// Removes a dead mob from whichever room holds it, clearing the room
    /// if it was the last one.
    pub fn remove_mob(&mut self, mob: &EntityId) -> MobRemoval {
        let Some(room_id) = self.mob_rooms.remove(mob) else {
            return MobRemoval::NotTracked;
        };
        let Some(&i) = self.index.get(&room_id) else {
            return MobRemoval::NotTracked;
        };

        let room = &mut self.rooms[i];
        room.mobs.remove(mob);
        if room.mobs.is_empty() && !room.cleared {
            room.cleared = true;
            debug!(room_id = %room_id, "last mob died, room cleared");
            MobRemoval::RoomCleared { room: room_id }
        } else {
            MobRemoval::Removed { room: room_id }
        }
    }

    /// The room a tracked mob lives in.
    pub fn room_of_mob(&self, mob: &EntityId) -> Option<&RoomId> {
        self.mob_rooms.get(mob)
    }

    fn position(&self, id: &RoomId) -> Result<usize, LayoutError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| LayoutError::UnknownRoom(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use gloomhold_protocol::Aabb;

    use super::*;

    fn cell(i: f64) -> Aabb {
        Aabb::new(Vec3::new(i * 10.0, 0.0, 0.0), Vec3::new(i * 10.0 + 9.0, 5.0, 9.0)).unwrap()
    }

    fn graph_of(ids: &[&str]) -> RoomGraph {
        let mut g = RoomGraph::new();
        for (i, id) in ids.iter().enumerate() {
            g.add_room(Room::new(*id, RoomType::Combat, cell(i as f64))).unwrap();
        }
        g
    }

    #[test]
    fn test_duplicate_room_rejected() {
        let mut g = graph_of(&["a"]);
        let err = g.add_room(Room::new("a", RoomType::Cave, cell(3.0))).unwrap_err();
        assert!(matches!(err, LayoutError::DuplicateRoom(id) if id.as_str() == "a"));
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let mut g = RoomGraph::new();
        let bad = Aabb {
            min: Vec3::new(5.0, 0.0, 0.0),
            max: Vec3::new(0.0, 5.0, 5.0),
        };
        let err = g.add_room(Room::new("x", RoomType::Combat, bad)).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidBounds { .. }));
    }

    #[test]
    fn test_connect_rejects_unknown_and_self() {
        let mut g = graph_of(&["a"]);
        assert!(matches!(
            g.connect(&"a".into(), &"nope".into(), Vec3::ZERO, None),
            Err(LayoutError::UnknownRoom(_))
        ));
        assert!(matches!(
            g.connect(&"a".into(), &"a".into(), Vec3::ZERO, None),
            Err(LayoutError::SelfLoop(_))
        ));
    }

    #[test]
    fn test_mark_cleared_reports_change_once() {
        let mut g = graph_of(&["a"]);
        assert!(g.mark_cleared(&"a".into()));
        assert!(!g.mark_cleared(&"a".into()));
        assert!(!g.mark_cleared(&"ghost".into()));
    }

    #[test]
    fn test_spawn_room_refuses_mobs() {
        let mut g = RoomGraph::new();
        g.add_room(Room::new("start", RoomType::Spawn, cell(0.0))).unwrap();
        let err = g.add_mob(&"start".into(), EntityId::random()).unwrap_err();
        assert!(matches!(err, LayoutError::MobsNotAllowed { room_type: RoomType::Spawn, .. }));
    }
}
