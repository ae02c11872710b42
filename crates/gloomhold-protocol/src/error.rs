//! Error types for the protocol layer.
//!
//! Each crate in Gloomhold defines its own error enum. A `ProtocolError`
//! always means bytes could not be turned into a value (or back), never
//! that a run or room is in the wrong state.

/// Errors that can occur while encoding or decoding protocol values.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, a missing field, or an
    /// event `kind` this build does not know.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A value decoded fine but violates a geometric or identity rule,
    /// e.g. a bounding box whose minimum exceeds its maximum.
    #[error("invalid value: {0}")]
    InvalidValue(String),
}
