//! Error types for the transport core.
//!
//! The chat layer never surfaces these to callers: a failed connect simply
//! schedules a reconnect. They exist so drivers and tests can tell an illegal
//! transition from a broken socket.

use std::io;

use thiserror::Error;

use crate::connection::ConnectionState;

/// Errors from the connection state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Invalid state transition attempted
    #[error("invalid state transition: cannot {operation} from {state:?}")]
    InvalidState {
        /// Current state when error occurred
        state: ConnectionState,
        /// Operation that was attempted
        operation: &'static str,
    },

    /// Frame could not be encoded or decoded
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Underlying socket error
    #[error("transport error: {0}")]
    Transport(String),
}

impl ConnectionError {
    /// Returns true if retrying the connection may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<agrichat_proto::ProtocolError> for ConnectionError {
    fn from(err: agrichat_proto::ProtocolError) -> Self {
        Self::Protocol(err.to_string())
    }
}

impl From<io::Error> for ConnectionError {
    fn from(err: io::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_errors_are_transient() {
        let err: ConnectionError = io::Error::new(io::ErrorKind::ConnectionReset, "reset").into();
        assert!(err.is_transient());
    }

    #[test]
    fn state_violations_are_not_transient() {
        let err = ConnectionError::InvalidState {
            state: ConnectionState::Disconnected,
            operation: "on_open",
        };
        assert!(!err.is_transient());
        assert_eq!(err.to_string(), "invalid state transition: cannot on_open from Disconnected");
    }
}
