//! Conversation directory: which orders the actor can chat on, and which one
//! is open.
//!
//! The directory lives as long as the chat panel. It fetches candidates on
//! every open, owns at most one [`Session`], and holds the `user_online` /
//! `user_offline` subscriptions for the whole panel lifetime, forwarding them
//! to the session only when they concern the selected counterpart.
//!
//! Selection is by order id; the directory never hands out ownership of order
//! data. Selecting a new order tears the old session down before the new one
//! subscribes.

use agrichat_core::{Delivery, SubscriptionId, Timestamp, Transport};
use agrichat_proto::{EventName, Inbound, Message, OrderId, OrderSummary, Role, UserId};

use crate::{
    SessionConfig,
    error::FetchError,
    session::{Session, SessionChange},
};

const PRESENCE_EVENTS: [EventName; 2] = [EventName::UserOnline, EventName::UserOffline];

/// Panel navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Greeting and candidate count
    Home,
    /// Candidate orders
    List,
    /// Open conversation
    Chat,
}

/// Candidate orders and the selected conversation.
#[derive(Debug, Clone)]
pub struct Directory<I: Timestamp> {
    role: Role,
    self_id: UserId,
    config: SessionConfig,
    open: bool,
    loading: bool,
    screen: Screen,
    candidates: Vec<OrderSummary>,
    selected: Option<OrderId>,
    session: Option<Session<I>>,
    presence: Vec<SubscriptionId>,
}

impl<I: Timestamp> Directory<I> {
    /// Closed directory for the given actor.
    pub fn new(role: Role, self_id: UserId, config: SessionConfig) -> Self {
        Self {
            role,
            self_id,
            config,
            open: false,
            loading: false,
            screen: Screen::Home,
            candidates: Vec::new(),
            selected: None,
            session: None,
            presence: Vec::new(),
        }
    }

    /// Open the panel. Returns `true` if candidates must be fetched.
    pub fn open(&mut self, transport: &mut Transport<I>) -> bool {
        if self.open {
            return false;
        }

        self.open = true;
        self.loading = true;
        self.screen = Screen::Home;
        self.candidates.clear();
        self.presence = PRESENCE_EVENTS.iter().map(|event| transport.on(*event)).collect();

        tracing::debug!(role = %self.role, "panel opened");
        true
    }

    /// Apply a candidate fetch. A failure yields an empty list.
    pub fn orders_loaded(&mut self, result: Result<Vec<OrderSummary>, FetchError>) {
        if !self.open {
            tracing::debug!("ignoring orders for a closed panel");
            return;
        }

        self.candidates = match result {
            Ok(orders) => orders,
            Err(err) => {
                tracing::warn!(role = %self.role, error = %err, "order listing failed");
                Vec::new()
            },
        };
        self.loading = false;
    }

    /// Move from the greeting to the candidate list.
    pub fn show_list(&mut self) {
        if self.open && self.screen == Screen::Home {
            self.screen = Screen::List;
        }
    }

    /// Open the conversation for `order_id`.
    ///
    /// Returns the order whose history must be fetched, or `None` when the
    /// order is unknown or has no usable counterpart.
    pub fn select(&mut self, order_id: &OrderId, transport: &mut Transport<I>) -> Option<OrderId> {
        if !self.open {
            return None;
        }

        let Some(order) = self.candidates.iter().find(|order| order.id == *order_id) else {
            tracing::debug!(order = %order_id, "select of unknown order");
            return None;
        };
        let Some(counterpart) = order.counterpart(self.role) else {
            tracing::warn!(order = %order_id, role = %self.role, "order has no counterpart");
            return None;
        };

        self.teardown(transport);

        self.session = Some(Session::enter(
            order_id.clone(),
            self.self_id.clone(),
            counterpart,
            self.config.clone(),
            transport,
        ));
        self.selected = Some(order_id.clone());
        self.screen = Screen::Chat;

        Some(order_id.clone())
    }

    /// Navigate back: Chat to List (tearing the session down), List to Home.
    pub fn back(&mut self, transport: &mut Transport<I>) {
        match self.screen {
            Screen::Chat => {
                self.teardown(transport);
                self.screen = Screen::List;
            },
            Screen::List => self.screen = Screen::Home,
            Screen::Home => {},
        }
    }

    /// Close the panel, releasing every subscription.
    pub fn close(&mut self, transport: &mut Transport<I>) {
        if !self.open {
            return;
        }

        self.teardown(transport);
        for id in self.presence.drain(..) {
            transport.off(id);
        }
        self.candidates.clear();
        self.open = false;
        self.loading = false;
        self.screen = Screen::Home;

        tracing::debug!(role = %self.role, "panel closed");
    }

    /// Apply a history fetch. Stale results for another order are ignored.
    pub fn history_loaded(&mut self, order_id: &OrderId, result: Result<Vec<Message>, FetchError>) {
        match self.session.as_mut() {
            Some(session) if session.room() == order_id => session.history_loaded(result),
            _ => tracing::debug!(order = %order_id, "ignoring stale history"),
        }
    }

    /// Route an inbound event to the presence handlers and the session.
    pub fn deliver(&mut self, delivery: &Delivery) -> Option<SessionChange> {
        if delivery.is_for_any(&self.presence) {
            let (user, online) = match &delivery.event {
                Inbound::UserOnline(user) => (user, true),
                Inbound::UserOffline(user) => (user, false),
                _ => return None,
            };
            return self
                .session
                .as_mut()
                .filter(|session| session.counterpart().id == *user)
                .and_then(|session| session.set_presence(user, online).then_some(SessionChange::Presence));
        }

        self.session.as_mut().and_then(|session| session.deliver(delivery))
    }

    /// Whether the panel is open.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Whether a candidate fetch is outstanding.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Open panel, fetch done, nothing to show.
    pub fn is_empty(&self) -> bool {
        self.open && !self.loading && self.candidates.is_empty()
    }

    /// Current view.
    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Local actor's role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Candidate orders, as fetched.
    pub fn candidates(&self) -> &[OrderSummary] {
        &self.candidates
    }

    /// Selected order id.
    pub fn selected(&self) -> Option<&OrderId> {
        self.selected.as_ref()
    }

    /// Selected order, looked up in the candidates.
    pub fn selected_order(&self) -> Option<&OrderSummary> {
        let id = self.selected.as_ref()?;
        self.candidates.iter().find(|order| order.id == *id)
    }

    /// Active conversation.
    pub fn session(&self) -> Option<&Session<I>> {
        self.session.as_ref()
    }

    /// Active conversation, mutably.
    pub fn session_mut(&mut self) -> Option<&mut Session<I>> {
        self.session.as_mut()
    }

    /// Presence subscription handles. Empty while closed.
    pub fn presence_subscriptions(&self) -> &[SubscriptionId] {
        &self.presence
    }

    fn teardown(&mut self, transport: &mut Transport<I>) {
        if let Some(mut session) = self.session.take() {
            session.exit(transport);
        }
        self.selected = None;
    }
}
