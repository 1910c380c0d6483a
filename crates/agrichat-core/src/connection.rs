//! Transport connection state machine.
//!
//! Tracks whether the shared socket is up and when to retry it. Uses the action
//! pattern: methods take time as input and return actions for the driver to
//! execute, so reconnect timing is testable on a virtual clock.
//!
//! # State Machine
//!
//! ```text
//! ┌──────────────┐ connect ┌────────────┐  on_open  ┌───────────┐
//! │ Disconnected │────────>│ Connecting │──────────>│ Connected │
//! └──────────────┘         └────────────┘           └───────────┘
//!                             ↑      │ timeout/closed     │ on_closed
//!                     backoff │      ↓                    ↓
//!                          ┌──────────────┐<──────────────┘
//!                          │ Reconnecting │
//!                          └──────────────┘
//! ```
//!
//! `disconnect` returns to `Disconnected` from any state and stops retries.

use std::time::Duration;

use crate::{env::Timestamp, error::ConnectionError};

/// Delay before the first reconnect attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Upper bound on the reconnect delay.
pub const DEFAULT_RECONNECT_DELAY_MAX: Duration = Duration::from_secs(5);

/// Time allowed for a single connect attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

/// Actions returned by the connection state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionAction {
    /// Open a socket to this endpoint
    Open {
        /// Server URL
        endpoint: String,
    },

    /// Drop the current socket or abandon the pending attempt
    Close {
        /// Reason for closing
        reason: String,
    },
}

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Never connected, or closed on request
    Disconnected,
    /// Attempt in flight
    Connecting,
    /// Socket open; emits are delivered
    Connected,
    /// Lost the socket; waiting out the backoff delay
    Reconnecting,
}

/// Connection configuration
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Delay before the first retry
    pub reconnect_delay: Duration,
    /// Cap on the retry delay
    pub reconnect_delay_max: Duration,
    /// Growth factor applied per consecutive failure
    pub backoff_multiplier: u32,
    /// Attempt timeout
    pub connect_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            reconnect_delay_max: DEFAULT_RECONNECT_DELAY_MAX,
            backoff_multiplier: 2,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// Connection state machine.
///
/// Pure: no I/O and no clock. Generic over the instant type so simulation can
/// drive it with virtual time.
#[derive(Debug, Clone)]
pub struct Connection<I: Timestamp> {
    state: ConnectionState,
    config: ConnectionConfig,
    endpoint: String,
    /// When the current state was entered
    since: I,
    /// Consecutive failed or dropped connections
    failures: u32,
}

impl<I: Timestamp> Connection<I> {
    /// Create a connection in [`ConnectionState::Disconnected`].
    pub fn new(endpoint: impl Into<String>, config: ConnectionConfig, now: I) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            config,
            endpoint: endpoint.into(),
            since: now,
            failures: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether emits are currently delivered.
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Server URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Consecutive failures since the last successful open.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Start connecting. Idempotent: a no-op unless disconnected.
    pub fn connect(&mut self, now: I) -> Vec<ConnectionAction> {
        if self.state != ConnectionState::Disconnected {
            return Vec::new();
        }

        tracing::debug!(endpoint = %self.endpoint, "connecting");
        self.enter(ConnectionState::Connecting, now);
        vec![self.open_action()]
    }

    /// The driver reports the socket is open.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::InvalidState` if no attempt is in flight
    pub fn on_open(&mut self, now: I) -> Result<(), ConnectionError> {
        if self.state != ConnectionState::Connecting {
            return Err(ConnectionError::InvalidState { state: self.state, operation: "on_open" });
        }

        tracing::info!(endpoint = %self.endpoint, attempts = self.failures, "connected");
        self.failures = 0;
        self.enter(ConnectionState::Connected, now);
        Ok(())
    }

    /// The driver reports the socket closed or the attempt failed.
    ///
    /// Schedules a reconnect. Ignored when already disconnected or waiting.
    pub fn on_closed(&mut self, now: I) {
        if !matches!(self.state, ConnectionState::Connecting | ConnectionState::Connected) {
            return;
        }

        self.failures = self.failures.saturating_add(1);
        self.enter(ConnectionState::Reconnecting, now);
        tracing::info!(
            endpoint = %self.endpoint,
            failures = self.failures,
            retry_in = ?self.backoff(),
            "connection lost"
        );
    }

    /// Close on request and stop reconnecting.
    pub fn disconnect(&mut self, now: I) -> Vec<ConnectionAction> {
        let was_live = matches!(self.state, ConnectionState::Connecting | ConnectionState::Connected);
        self.failures = 0;
        self.enter(ConnectionState::Disconnected, now);

        if was_live {
            vec![ConnectionAction::Close { reason: "client disconnect".to_string() }]
        } else {
            Vec::new()
        }
    }

    /// Delay before the next retry given the current failure count.
    ///
    /// `reconnect_delay * multiplier^(failures - 1)`, capped at
    /// `reconnect_delay_max`.
    pub fn backoff(&self) -> Duration {
        let exponent = self.failures.saturating_sub(1);
        let factor = self.config.backoff_multiplier.max(1).saturating_pow(exponent);
        self.config.reconnect_delay.saturating_mul(factor).min(self.config.reconnect_delay_max)
    }

    /// Process periodic maintenance (attempt timeout and retry scheduling).
    pub fn tick(&mut self, now: I) -> Vec<ConnectionAction> {
        let elapsed = now - self.since;

        match self.state {
            ConnectionState::Reconnecting if elapsed >= self.backoff() => {
                tracing::debug!(endpoint = %self.endpoint, failures = self.failures, "retrying");
                self.enter(ConnectionState::Connecting, now);
                vec![self.open_action()]
            },
            ConnectionState::Connecting if elapsed > self.config.connect_timeout => {
                self.on_closed(now);
                vec![ConnectionAction::Close { reason: format!("connect timeout after {elapsed:?}") }]
            },
            _ => Vec::new(),
        }
    }

    fn enter(&mut self, state: ConnectionState, now: I) {
        self.state = state;
        self.since = now;
    }

    fn open_action(&self) -> ConnectionAction {
        ConnectionAction::Open { endpoint: self.endpoint.clone() }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    fn conn(t0: Instant) -> Connection<Instant> {
        Connection::new("ws://localhost:5000", ConnectionConfig::default(), t0)
    }

    #[test]
    #[allow(clippy::disallowed_methods)]
    fn connect_is_idempotent() {
        let t0 = Instant::now();
        let mut c = conn(t0);

        assert_eq!(c.connect(t0), vec![ConnectionAction::Open {
            endpoint: "ws://localhost:5000".into()
        }]);
        assert!(c.connect(t0).is_empty());

        c.on_open(t0).unwrap();
        assert!(c.connect(t0).is_empty());
        assert!(c.is_connected());
    }

    #[test]
    #[allow(clippy::disallowed_methods)]
    fn open_without_attempt_is_rejected() {
        let t0 = Instant::now();
        let mut c = conn(t0);

        assert_eq!(
            c.on_open(t0),
            Err(ConnectionError::InvalidState {
                state: ConnectionState::Disconnected,
                operation: "on_open"
            })
        );
    }

    #[test]
    #[allow(clippy::disallowed_methods)]
    fn drop_schedules_retry_after_backoff() {
        let t0 = Instant::now();
        let mut c = conn(t0);
        c.connect(t0);
        c.on_open(t0).unwrap();

        c.on_closed(t0);
        assert_eq!(c.state(), ConnectionState::Reconnecting);
        assert_eq!(c.backoff(), Duration::from_secs(1));

        assert!(c.tick(t0 + Duration::from_millis(999)).is_empty());
        let actions = c.tick(t0 + Duration::from_secs(1));
        assert!(matches!(actions.as_slice(), [ConnectionAction::Open { .. }]));
        assert_eq!(c.state(), ConnectionState::Connecting);
    }

    #[test]
    #[allow(clippy::disallowed_methods)]
    fn backoff_doubles_and_caps() {
        let t0 = Instant::now();
        let mut c = conn(t0);
        c.connect(t0);

        let mut delays = Vec::new();
        for _ in 0..5 {
            c.on_closed(t0);
            delays.push(c.backoff());
            c.state = ConnectionState::Connecting;
        }

        assert_eq!(delays, [1, 2, 4, 5, 5].map(Duration::from_secs));
    }

    #[test]
    #[allow(clippy::disallowed_methods)]
    fn successful_open_resets_backoff() {
        let t0 = Instant::now();
        let mut c = conn(t0);
        c.connect(t0);
        c.on_closed(t0);
        c.on_closed(t0);
        c.tick(t0 + Duration::from_secs(10));
        c.on_open(t0 + Duration::from_secs(10)).unwrap();

        assert_eq!(c.failures(), 0);
    }

    #[test]
    #[allow(clippy::disallowed_methods)]
    fn stuck_attempt_times_out() {
        let t0 = Instant::now();
        let mut c = conn(t0);
        c.connect(t0);

        let actions = c.tick(t0 + DEFAULT_CONNECT_TIMEOUT + Duration::from_millis(1));
        assert!(matches!(actions.as_slice(), [ConnectionAction::Close { .. }]));
        assert_eq!(c.state(), ConnectionState::Reconnecting);
        assert_eq!(c.failures(), 1);
    }

    #[test]
    #[allow(clippy::disallowed_methods)]
    fn disconnect_stops_retries() {
        let t0 = Instant::now();
        let mut c = conn(t0);
        c.connect(t0);
        c.on_open(t0).unwrap();

        assert!(matches!(c.disconnect(t0).as_slice(), [ConnectionAction::Close { .. }]));
        assert!(c.tick(t0 + Duration::from_secs(60)).is_empty());
        assert_eq!(c.state(), ConnectionState::Disconnected);
    }
}
