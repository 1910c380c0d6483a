//! The shared transport connection.
//!
//! One [`Transport`] exists per process. Chat components borrow it mutably to
//! emit events and to subscribe; the top-level client owns it and the driver
//! moves its queued frames onto the socket.
//!
//! Emits are fire-and-forget. While the connection is down they are dropped,
//! not queued: nothing a chat panel sends is worth replaying after a
//! reconnect except the user registration, which is re-sent automatically.

use agrichat_proto::{EventName, Inbound, Outbound};

use crate::{
    connection::{Connection, ConnectionAction, ConnectionConfig, ConnectionState},
    env::Timestamp,
    error::ConnectionError,
    subscriptions::{SubscriptionId, Subscriptions},
};

/// A decoded inbound event and the subscriptions it is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Decoded event
    pub event: Inbound,
    /// Subscriptions listening to this event name at dispatch time
    pub listeners: Vec<SubscriptionId>,
}

impl Delivery {
    /// Whether `id` should see this event.
    pub fn is_for(&self, id: SubscriptionId) -> bool {
        self.listeners.contains(&id)
    }

    /// Whether any of `ids` should see this event.
    pub fn is_for_any(&self, ids: &[SubscriptionId]) -> bool {
        ids.iter().any(|id| self.is_for(*id))
    }
}

/// Connection handle shared by every chat component.
#[derive(Debug, Clone)]
pub struct Transport<I: Timestamp> {
    connection: Connection<I>,
    subscriptions: Subscriptions,
    /// Encoded frames awaiting the driver
    outbox: Vec<String>,
    /// Re-emitted on every successful open
    announce: Option<Outbound>,
}

impl<I: Timestamp> Transport<I> {
    /// Create a disconnected transport.
    pub fn new(endpoint: impl Into<String>, config: ConnectionConfig, now: I) -> Self {
        Self {
            connection: Connection::new(endpoint, config, now),
            subscriptions: Subscriptions::new(),
            outbox: Vec::new(),
            announce: None,
        }
    }

    /// Start connecting. Idempotent.
    pub fn connect(&mut self, now: I) -> Vec<ConnectionAction> {
        self.connection.connect(now)
    }

    /// The driver opened the socket.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::InvalidState` if no attempt was in flight
    pub fn on_open(&mut self, now: I) -> Result<(), ConnectionError> {
        self.connection.on_open(now)?;

        if let Some(announce) = self.announce.clone() {
            self.emit(announce);
        }
        Ok(())
    }

    /// The driver lost the socket. Unsent frames are discarded.
    pub fn on_closed(&mut self, now: I) {
        if !self.outbox.is_empty() {
            tracing::debug!(dropped = self.outbox.len(), "discarding unsent frames");
            self.outbox.clear();
        }
        self.connection.on_closed(now);
    }

    /// Close on request and stop reconnecting.
    pub fn disconnect(&mut self, now: I) -> Vec<ConnectionAction> {
        self.outbox.clear();
        self.connection.disconnect(now)
    }

    /// Drive reconnect timing.
    pub fn tick(&mut self, now: I) -> Vec<ConnectionAction> {
        self.connection.tick(now)
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Whether emits are currently delivered.
    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Underlying connection state machine.
    pub fn connection(&self) -> &Connection<I> {
        &self.connection
    }

    /// Emit `event` now and again after every reconnect.
    pub fn announce(&mut self, event: Outbound) {
        self.announce = Some(event.clone());
        self.emit(event);
    }

    /// Queue `event` for the driver. Returns `false` if it was dropped.
    pub fn emit(&mut self, event: Outbound) -> bool {
        let name = event.name();
        if !self.connection.is_connected() {
            tracing::debug!(event = %name, state = ?self.connection.state(), "dropping emit while offline");
            return false;
        }

        match event.encode() {
            Ok(frame) => {
                self.outbox.push(frame);
                true
            },
            Err(err) => {
                tracing::warn!(event = %name, error = %err, "failed to encode frame");
                false
            },
        }
    }

    /// Drain frames queued since the last call.
    pub fn take_outgoing(&mut self) -> Vec<String> {
        std::mem::take(&mut self.outbox)
    }

    /// Subscribe to an inbound event.
    pub fn on(&mut self, event: EventName) -> SubscriptionId {
        self.subscriptions.on(event)
    }

    /// Remove a subscription. Returns `false` if it was not live.
    pub fn off(&mut self, id: SubscriptionId) -> bool {
        self.subscriptions.off(id)
    }

    /// Live subscriptions.
    pub fn subscriptions(&self) -> &Subscriptions {
        &self.subscriptions
    }

    /// Decode a received frame and address it to current listeners.
    ///
    /// Malformed frames are logged and dropped.
    pub fn dispatch(&self, frame: &str) -> Option<Delivery> {
        let event = match Inbound::decode(frame) {
            Ok(event) => event,
            Err(err) => {
                tracing::debug!(error = %err, "dropping undecodable frame");
                return None;
            },
        };

        let listeners = self.subscriptions.listeners(event.name()).to_vec();
        if listeners.is_empty() {
            tracing::trace!(event = %event.name(), "no listeners");
        }

        Some(Delivery { event, listeners })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use agrichat_proto::{OrderId, UserId};

    use super::*;

    #[allow(clippy::disallowed_methods)]
    fn connected() -> (Transport<Instant>, Instant) {
        let now = Instant::now();
        let mut t = Transport::new("ws://chat", ConnectionConfig::default(), now);
        t.connect(now);
        t.on_open(now).unwrap();
        (t, now)
    }

    #[test]
    #[allow(clippy::disallowed_methods)]
    fn emit_dropped_while_disconnected() {
        let now = Instant::now();
        let mut t = Transport::new("ws://chat", ConnectionConfig::default(), now);

        assert!(!t.emit(Outbound::JoinRoom(OrderId::from("order-1"))));
        assert!(t.take_outgoing().is_empty());
    }

    #[test]
    fn emit_queues_encoded_frames() {
        let (mut t, _) = connected();

        assert!(t.emit(Outbound::Typing(OrderId::from("order-1"))));
        assert_eq!(t.take_outgoing(), vec![r#"["typing","order-1"]"#.to_string()]);
        assert!(t.take_outgoing().is_empty());
    }

    #[test]
    fn announce_repeats_after_reconnect() {
        let (mut t, now) = connected();
        t.announce(Outbound::RegisterUser(UserId::from("farmer-1")));
        assert_eq!(t.take_outgoing().len(), 1);

        t.on_closed(now);
        let later = now + t.connection().backoff();
        assert!(!t.tick(later).is_empty());
        t.on_open(later).unwrap();

        assert_eq!(t.take_outgoing(), vec![r#"["register_user","farmer-1"]"#.to_string()]);
    }

    #[test]
    fn closing_discards_unsent_frames() {
        let (mut t, now) = connected();
        t.emit(Outbound::CheckOnline(UserId::from("asha")));

        t.on_closed(now);
        assert!(t.take_outgoing().is_empty());
    }

    #[test]
    fn dispatch_addresses_current_listeners() {
        let (mut t, _) = connected();
        let a = t.on(EventName::UserOnline);
        let b = t.on(EventName::UserOnline);
        let other = t.on(EventName::Typing);

        let delivery = t.dispatch(r#"["user_online","asha"]"#).unwrap();
        assert_eq!(delivery.event, Inbound::UserOnline(UserId::from("asha")));
        assert!(delivery.is_for(a) && delivery.is_for(b));
        assert!(!delivery.is_for(other));

        t.off(a);
        let delivery = t.dispatch(r#"["user_online","asha"]"#).unwrap();
        assert!(!delivery.is_for(a));
    }

    #[test]
    fn dispatch_drops_garbage() {
        let (t, _) = connected();
        assert_eq!(t.dispatch("[1,2,3]"), None);
        assert_eq!(t.dispatch(r#"["join_room","order-1"]"#), None);
    }
}
