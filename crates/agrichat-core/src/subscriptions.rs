//! Subscriber registry for inbound events.
//!
//! Components register interest in an event name with [`Subscriptions::on`]
//! and receive a [`SubscriptionId`]. Dispatch reports which ids are listening;
//! the owner of an id is the only component that reacts. Removing an id with
//! [`Subscriptions::off`] guarantees the owner is never addressed again.
//!
//! Several independent subscribers may listen to the same event; each gets its
//! own id and its own `off`.

use std::collections::BTreeMap;

use agrichat_proto::EventName;

/// Handle returned by [`Subscriptions::on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Raw value, for logging.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Registry of live subscriptions keyed by event name.
#[derive(Debug, Clone, Default)]
pub struct Subscriptions {
    next_id: u64,
    /// Listening ids per event, in registration order
    by_event: BTreeMap<EventName, Vec<SubscriptionId>>,
    /// Reverse index for `off`
    events: BTreeMap<SubscriptionId, EventName>,
}

impl Subscriptions {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to `event`.
    pub fn on(&mut self, event: EventName) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);

        self.by_event.entry(event).or_default().push(id);
        self.events.insert(id, event);

        tracing::trace!(subscription = id.0, %event, "subscribed");
        id
    }

    /// Remove a subscription. Returns `false` if it was not live.
    pub fn off(&mut self, id: SubscriptionId) -> bool {
        let Some(event) = self.events.remove(&id) else {
            return false;
        };

        if let Some(ids) = self.by_event.get_mut(&event) {
            ids.retain(|live| *live != id);
            if ids.is_empty() {
                self.by_event.remove(&event);
            }
        }

        tracing::trace!(subscription = id.0, %event, "unsubscribed");
        true
    }

    /// Ids listening to `event`, in registration order.
    pub fn listeners(&self, event: EventName) -> &[SubscriptionId] {
        self.by_event.get(&event).map_or(&[], Vec::as_slice)
    }

    /// Whether `id` is live.
    pub fn is_live(&self, id: SubscriptionId) -> bool {
        self.events.contains_key(&id)
    }

    /// Total live subscriptions across all events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no subscription is live.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Live subscriptions for one event.
    pub fn count(&self, event: EventName) -> usize {
        self.listeners(event).len()
    }
}
