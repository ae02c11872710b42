use std::hash::{Hash, Hasher};

use gloomhold_protocol::{RoomId, Vec3};

/// An undirected edge between two rooms, optionally gated by a door.
///
/// Equality and hashing ignore direction and points: `a↔b` equals `b↔a`,
/// so a set of connections holds at most one edge per room pair.
#[derive(Debug, Clone)]
pub struct RoomConnection {
    from: RoomId,
    to: RoomId,
    point: Vec3,
    door: Option<Vec3>,
}

impl RoomConnection {
    pub fn new(from: RoomId, to: RoomId, point: Vec3, door: Option<Vec3>) -> Self {
        Self {
            from,
            to,
            point,
            door,
        }
    }

    pub fn from_room(&self) -> &RoomId {
        &self.from
    }

    pub fn to_room(&self) -> &RoomId {
        &self.to
    }

    /// Where the two rooms meet.
    pub fn point(&self) -> Vec3 {
        self.point
    }

    pub fn door(&self) -> Option<Vec3> {
        self.door
    }

    /// A doorless connection is always traversable.
    pub fn has_door(&self) -> bool {
        self.door.is_some()
    }

    /// The opposite end from `room`, or `None` if `room` is not an end.
    pub fn other_room(&self, room: &RoomId) -> Option<&RoomId> {
        if *room == self.from {
            Some(&self.to)
        } else if *room == self.to {
            Some(&self.from)
        } else {
            None
        }
    }

    pub fn touches(&self, room: &RoomId) -> bool {
        *room == self.from || *room == self.to
    }

    /// True if this edge joins `a` and `b`, in either order.
    pub fn connects(&self, a: &RoomId, b: &RoomId) -> bool {
        (self.from == *a && self.to == *b) || (self.from == *b && self.to == *a)
    }
}

/// The room pair in a fixed order, used as a lookup key.
pub(crate) fn pair_key(a: &RoomId, b: &RoomId) -> (RoomId, RoomId) {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

impl PartialEq for RoomConnection {
    fn eq(&self, other: &Self) -> bool {
        self.connects(&other.from, &other.to)
    }
}

impl Eq for RoomConnection {}

impl Hash for RoomConnection {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let (lo, hi) = if self.from <= self.to {
            (&self.from, &self.to)
        } else {
            (&self.to, &self.from)
        };
        lo.hash(state);
        hi.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn edge(a: &str, b: &str) -> RoomConnection {
        RoomConnection::new(a.into(), b.into(), Vec3::ZERO, None)
    }

    #[test]
    fn test_equality_is_symmetric() {
        assert_eq!(edge("a", "b"), edge("b", "a"));
        assert_ne!(edge("a", "b"), edge("a", "c"));
    }

    #[test]
    fn test_hash_is_symmetric() {
        let mut set = HashSet::new();
        set.insert(edge("a", "b"));
        assert!(!set.insert(edge("b", "a")));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_other_room() {
        let e = edge("a", "b");
        assert_eq!(e.other_room(&"a".into()), Some(&RoomId::from("b")));
        assert_eq!(e.other_room(&"b".into()), Some(&RoomId::from("a")));
        assert_eq!(e.other_room(&"z".into()), None);
    }

    #[test]
    fn test_door_presence() {
        assert!(!edge("a", "b").has_door());
        let gated = RoomConnection::new("a".into(), "b".into(), Vec3::ZERO, Some(Vec3::new(1.0, 0.0, 0.0)));
        assert!(gated.has_door());
    }
}
