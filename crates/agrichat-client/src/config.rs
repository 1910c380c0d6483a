//! Client configuration.

use std::time::Duration;

use agrichat_core::ConnectionConfig;
use agrichat_proto::{Role, UserId};

/// Quiet period after the last keystroke before `stop_typing` is emitted.
pub const DEFAULT_TYPING_TIMEOUT: Duration = Duration::from_millis(2000);

/// Per-conversation settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Typing debounce
    pub typing_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { typing_timeout: DEFAULT_TYPING_TIMEOUT }
    }
}

/// Everything the client needs to start.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Messaging server URL
    pub endpoint: String,
    /// Local actor
    pub user_id: UserId,
    /// Side of the order the local actor is on
    pub role: Role,
    /// Reconnect policy
    pub connection: ConnectionConfig,
    /// Conversation settings
    pub session: SessionConfig,
}

impl ClientConfig {
    /// Config with default timing.
    pub fn new(endpoint: impl Into<String>, user_id: UserId, role: Role) -> Self {
        Self {
            endpoint: endpoint.into(),
            user_id,
            role,
            connection: ConnectionConfig::default(),
            session: SessionConfig::default(),
        }
    }
}
