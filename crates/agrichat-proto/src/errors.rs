//! Errors for frame encoding and decoding.
//!
//! Decoding is the only fallible direction in practice: frames arrive from the
//! network and may be truncated, carry an event name this build does not know,
//! or hold a payload of the wrong shape. Callers log and drop such frames.

use thiserror::Error;

/// Errors produced by the wire codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame text is not valid JSON or not a JSON array.
    #[error("malformed frame: {0}")]
    Malformed(String),

    /// Frame array does not hold exactly `[event, payload]`.
    #[error("frame must hold [event, payload], got {0} elements")]
    Arity(usize),

    /// Event name is not part of the protocol.
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    /// Event is valid but travels in the other direction.
    #[error("event {0} is not valid in this direction")]
    WrongDirection(&'static str),

    /// Payload does not match the shape required by the event.
    #[error("invalid payload for {event}: {reason}")]
    InvalidPayload {
        /// Wire name of the event
        event: &'static str,
        /// Deserializer error text
        reason: String,
    },

    /// Payload could not be serialized.
    #[error("encode failed: {0}")]
    Encode(String),

    /// Role string is neither `customer` nor `farmer`.
    #[error("unknown role: {0} (expected customer or farmer)")]
    UnknownRole(String),
}

/// Result alias for codec operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}
