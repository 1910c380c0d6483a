//! Conversation session: one active chat bound to one order.
//!
//! # Lifecycle
//!
//! ```text
//! enter ──> Joining ──history_loaded──> Active ──exit──> Closed
//! ```
//!
//! `enter` subscribes, joins the room and asks whether the counterpart is
//! online; the caller fetches history. Until history arrives the session is
//! `Joining`: live messages and optimistic sends are shown immediately and
//! survive the history replace (unless history already contains them). Once
//! `Active`, a history load replaces the list wholesale.
//!
//! # Typing
//!
//! The first keystroke after idle emits `typing`. Every keystroke re-arms one
//! debounce; when it expires `tick` emits `stop_typing` exactly once. Sending
//! or exiting cancels the debounce and emits `stop_typing` immediately.

use agrichat_core::{Delivery, SubscriptionId, Timestamp, Transport};
use agrichat_proto::{Counterpart, EventName, Inbound, Message, OrderId, Outbound, UserId};
use chrono::{DateTime, FixedOffset};

use crate::{SessionConfig, error::FetchError};

/// Events a session listens to for its whole lifetime.
const SESSION_EVENTS: [EventName; 4] = [
    EventName::ReceiveMessage,
    EventName::Typing,
    EventName::StopTyping,
    EventName::IsOnlineResponse,
];

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Room joined, history outstanding
    Joining,
    /// History applied
    Active,
    /// Torn down; inert
    Closed,
}

/// Observable effect of an inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionChange {
    /// A message was appended
    Message {
        /// Written by someone other than the local actor
        incoming: bool,
    },
    /// Counterpart typing indicator changed
    Typing,
    /// Counterpart presence changed
    Presence,
}

/// One conversation.
#[derive(Debug, Clone)]
pub struct Session<I: Timestamp> {
    room: OrderId,
    self_id: UserId,
    counterpart: Counterpart,
    counterpart_online: bool,
    phase: SessionPhase,
    /// Arrival order; never sorted
    messages: Vec<Message>,
    draft: String,
    /// Last keystroke while the debounce is armed
    typing_since: Option<I>,
    counterpart_typing: bool,
    subscriptions: Vec<SubscriptionId>,
    config: SessionConfig,
}

impl<I: Timestamp> Session<I> {
    /// Join the room for `room` and start listening.
    pub fn enter(
        room: OrderId,
        self_id: UserId,
        counterpart: Counterpart,
        config: SessionConfig,
        transport: &mut Transport<I>,
    ) -> Self {
        let subscriptions = SESSION_EVENTS.iter().map(|event| transport.on(*event)).collect();

        transport.emit(Outbound::JoinRoom(room.clone()));
        transport.emit(Outbound::CheckOnline(counterpart.id.clone()));

        tracing::debug!(%room, counterpart = %counterpart.id, "joined conversation");

        Self {
            room,
            self_id,
            counterpart,
            counterpart_online: false,
            phase: SessionPhase::Joining,
            messages: Vec::new(),
            draft: String::new(),
            typing_since: None,
            counterpart_typing: false,
            subscriptions,
            config,
        }
    }

    /// Order this conversation belongs to.
    pub fn room(&self) -> &OrderId {
        &self.room
    }

    /// The other party.
    pub fn counterpart(&self) -> &Counterpart {
        &self.counterpart
    }

    /// `false` until a presence answer or event says otherwise.
    pub fn is_counterpart_online(&self) -> bool {
        self.counterpart_online
    }

    /// Whether the counterpart is currently typing.
    pub fn is_counterpart_typing(&self) -> bool {
        self.counterpart_typing
    }

    /// Whether we have announced `typing` and not yet `stop_typing`.
    pub fn is_typing(&self) -> bool {
        self.typing_since.is_some()
    }

    /// When the typing debounce was last re-armed.
    pub fn typing_since(&self) -> Option<I> {
        self.typing_since
    }

    /// Lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Messages in arrival order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Unsent input text.
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Local actor.
    pub fn self_id(&self) -> &UserId {
        &self.self_id
    }

    /// Live subscription handles. Empty once closed.
    pub fn subscriptions(&self) -> &[SubscriptionId] {
        &self.subscriptions
    }

    /// Whether `message` was written by the local actor.
    pub fn is_mine(&self, message: &Message) -> bool {
        message.is_from(&self.self_id)
    }

    /// Apply a history fetch result. A failure counts as empty history.
    pub fn history_loaded(&mut self, result: Result<Vec<Message>, FetchError>) {
        let history = match result {
            Ok(history) => history,
            Err(err) => {
                tracing::warn!(room = %self.room, error = %err, "history fetch failed");
                Vec::new()
            },
        };

        match self.phase {
            SessionPhase::Closed => {},
            SessionPhase::Active => self.messages = history,
            SessionPhase::Joining => {
                let live = std::mem::replace(&mut self.messages, history);
                for message in live {
                    self.push_unique(message);
                }
                self.phase = SessionPhase::Active;
                tracing::debug!(room = %self.room, count = self.messages.len(), "history applied");
            },
        }
    }

    /// React to an inbound event if one of our subscriptions is addressed.
    pub fn deliver(&mut self, delivery: &Delivery) -> Option<SessionChange> {
        if self.phase == SessionPhase::Closed || !delivery.is_for_any(&self.subscriptions) {
            return None;
        }

        match &delivery.event {
            Inbound::ReceiveMessage(message) => self.receive(message.clone()),
            Inbound::Typing(room) if *room == self.room => {
                self.counterpart_typing = true;
                Some(SessionChange::Typing)
            },
            Inbound::StopTyping(room) if *room == self.room => {
                self.counterpart_typing = false;
                Some(SessionChange::Typing)
            },
            Inbound::IsOnlineResponse(reply) => self
                .set_presence(&reply.user_id, reply.is_online)
                .then_some(SessionChange::Presence),
            _ => None,
        }
    }

    /// Record presence for `user`. Ignored unless `user` is the counterpart.
    pub fn set_presence(&mut self, user: &UserId, online: bool) -> bool {
        if *user != self.counterpart.id || self.phase == SessionPhase::Closed {
            return false;
        }
        self.counterpart_online = online;
        true
    }

    /// The input box changed.
    pub fn input_changed(&mut self, text: impl Into<String>, now: I, transport: &mut Transport<I>) {
        if self.phase == SessionPhase::Closed {
            return;
        }

        self.draft = text.into();
        if self.typing_since.is_none() {
            transport.emit(Outbound::Typing(self.room.clone()));
        }
        self.typing_since = Some(now);
    }

    /// Send the draft. No-op on an empty or whitespace-only draft.
    ///
    /// The message is appended locally before it is emitted. Returns `false`
    /// when nothing was sent.
    pub fn send(
        &mut self,
        sent_at: DateTime<FixedOffset>,
        client_id: String,
        transport: &mut Transport<I>,
    ) -> bool {
        if self.phase == SessionPhase::Closed || self.draft.trim().is_empty() {
            return false;
        }

        let body = std::mem::take(&mut self.draft);
        let message = Message::outgoing(
            self.room.clone(),
            self.self_id.clone(),
            self.counterpart.id.clone(),
            body,
            sent_at,
            client_id,
        );

        self.messages.push(message.clone());
        transport.emit(Outbound::SendMessage(message));
        self.stop_typing(transport);
        true
    }

    /// Expire the typing debounce. Returns `true` if `stop_typing` was emitted.
    pub fn tick(&mut self, now: I, transport: &mut Transport<I>) -> bool {
        match self.typing_since {
            Some(since) if now - since >= self.config.typing_timeout => {
                self.stop_typing(transport);
                true
            },
            _ => false,
        }
    }

    /// Tear down: unsubscribe everything, cancel typing, discard messages.
    /// Idempotent.
    pub fn exit(&mut self, transport: &mut Transport<I>) {
        if self.phase == SessionPhase::Closed {
            return;
        }

        for id in self.subscriptions.drain(..) {
            transport.off(id);
        }
        self.stop_typing(transport);
        self.messages.clear();
        self.draft.clear();
        self.counterpart_typing = false;
        self.phase = SessionPhase::Closed;

        tracing::debug!(room = %self.room, "left conversation");
    }

    fn receive(&mut self, message: Message) -> Option<SessionChange> {
        if let Some(room) = &message.room
            && *room != self.room
        {
            tracing::debug!(room = %self.room, other = %room, "ignoring message for another room");
            return None;
        }

        let incoming = !self.is_mine(&message);
        self.push_unique(message).then_some(SessionChange::Message { incoming })
    }

    fn push_unique(&mut self, message: Message) -> bool {
        if self.messages.iter().any(|known| known.is_duplicate_of(&message)) {
            return false;
        }
        self.messages.push(message);
        true
    }

    fn stop_typing(&mut self, transport: &mut Transport<I>) {
        if self.typing_since.take().is_some() {
            transport.emit(Outbound::StopTyping(self.room.clone()));
        }
    }
}
