//! Observable state snapshots for invariant checking.
//!
//! Invariants operate on snapshots rather than live clients so every check
//! sees one consistent moment.

use std::time::Duration;

use agrichat_client::{ChatClient, Environment, SessionPhase};
use agrichat_proto::{OrderId, UserId};

/// Snapshot of every simulated client.
#[derive(Debug, Clone, Default)]
pub struct SystemSnapshot {
    /// Per-client state snapshots.
    pub clients: Vec<ClientSnapshot>,
}

impl SystemSnapshot {
    /// Create an empty snapshot (no clients).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a snapshot with a single client.
    pub fn single(client: ClientSnapshot) -> Self {
        Self { clients: vec![client] }
    }

    /// Create a snapshot from multiple clients.
    pub fn from_clients(clients: Vec<ClientSnapshot>) -> Self {
        Self { clients }
    }
}

/// Observable state of one client.
#[derive(Debug, Clone)]
pub struct ClientSnapshot {
    /// Local user.
    pub user: UserId,
    /// Listeners registered on the transport.
    pub live_subscriptions: usize,
    /// Listener handles held by the directory and the session.
    pub held_subscriptions: usize,
    /// Listed orders.
    pub candidates: Vec<OrderId>,
    /// Selected order.
    pub selected: Option<OrderId>,
    /// Open conversation.
    pub session: Option<SessionSnapshot>,
}

/// Observable state of one conversation.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Room key.
    pub room: OrderId,
    /// Lifecycle phase.
    pub phase: SessionPhase,
    /// Time since the last keystroke while a typing indicator is out.
    pub typing_elapsed: Option<Duration>,
    /// Configured debounce.
    pub typing_timeout: Duration,
    /// `room` of each held message, in order.
    pub message_rooms: Vec<Option<OrderId>>,
}

impl ClientSnapshot {
    /// Capture a client's observable state.
    pub fn capture<E: Environment>(client: &ChatClient<E>) -> Self {
        let directory = client.directory();
        let now = client.env().now();

        let session = directory.session().map(|session| SessionSnapshot {
            room: session.room().clone(),
            phase: session.phase(),
            typing_elapsed: session.typing_since().map(|since| now - since),
            typing_timeout: client.config().session.typing_timeout,
            message_rooms: session.messages().iter().map(|m| m.room.clone()).collect(),
        });

        Self {
            user: client.config().user_id.clone(),
            live_subscriptions: client.transport().subscriptions().len(),
            held_subscriptions: directory.presence_subscriptions().len()
                + directory.session().map_or(0, |s| s.subscriptions().len()),
            candidates: directory.candidates().iter().map(|o| o.id.clone()).collect(),
            selected: directory.selected().cloned(),
            session,
        }
    }
}
