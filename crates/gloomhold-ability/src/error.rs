/// Errors raised while loading ability configuration.
#[derive(Debug, thiserror::Error)]
pub enum AbilityError {
    /// The definition's `type` names no known ability type.
    #[error("ability {id}: unknown type {kind:?}")]
    UnknownType { id: String, kind: String },

    /// The ability document is not valid JSON for the expected shape.
    #[error("malformed ability configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
