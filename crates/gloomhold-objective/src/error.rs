/// Errors raised while building objectives from configuration.
#[derive(Debug, thiserror::Error)]
pub enum ObjectiveError {
    /// The `type` field names no known objective kind.
    #[error("objective {id}: unknown type {kind:?}")]
    UnknownKind { id: String, kind: String },

    /// A field the objective kind needs is absent.
    #[error("objective {id}: missing field `{field}`")]
    MissingField { id: String, field: &'static str },

    /// Two objectives in one engine share an id.
    #[error("duplicate objective id {0}")]
    DuplicateId(String),
}
