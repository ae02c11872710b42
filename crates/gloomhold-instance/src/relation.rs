use gloomhold_protocol::ParticipantId;

/// How two participants stand towards each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Relation {
    Ally,
    #[default]
    Neutral,
    Enemy,
}

/// Ally/enemy lookup supplied by a faction system.
///
/// Optional: a manager without one seats anybody.
pub trait RelationProvider: Send + Sync {
    fn relation(&self, a: ParticipantId, b: ParticipantId) -> Relation;
}
