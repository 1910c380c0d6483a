//! Standard invariant checks.

use agrichat_client::SessionPhase;

use super::{Invariant, InvariantResult, SystemSnapshot};

/// Every listener on the transport is held by the directory or the session.
///
/// More live than held means a teardown leaked a listener; the next session
/// would see every event twice.
pub struct SubscriptionBalance;

impl Invariant for SubscriptionBalance {
    fn name(&self) -> &'static str {
        "subscription_balance"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            if client.live_subscriptions != client.held_subscriptions {
                return Err(self.violation(format!(
                    "{} live, {} held",
                    client.live_subscriptions, client.held_subscriptions
                )));
            }
        }
        Ok(())
    }
}

/// The selected order is listed, and the open session is for it.
pub struct SelectedOrderPresent;

impl Invariant for SelectedOrderPresent {
    fn name(&self) -> &'static str {
        "selected_order_present"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            let session_room = client.session.as_ref().map(|s| &s.room);

            if let Some(selected) = &client.selected
                && !client.candidates.contains(selected)
            {
                return Err(self.violation(format!(
                    "client {}: selected {selected} not among {:?}",
                    client.user, client.candidates
                )));
            }
            if client.selected.as_ref() != session_room {
                return Err(self.violation(format!(
                    "client {}: selected {:?} but session for {:?}",
                    client.user, client.selected, session_room
                )));
            }
        }
        Ok(())
    }
}

/// A typing indicator is only out for a live session and never past its
/// debounce. Holds after every tick.
pub struct TypingTimerConsistency;

impl Invariant for TypingTimerConsistency {
    fn name(&self) -> &'static str {
        "typing_timer_consistency"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            let Some(session) = &client.session else { continue };
            let Some(elapsed) = session.typing_elapsed else { continue };

            if session.phase == SessionPhase::Closed {
                return Err(self.violation(format!(
                    "client {}: typing timer on closed session {}",
                    client.user, session.room
                )));
            }
            if elapsed >= session.typing_timeout {
                return Err(self.violation(format!(
                    "client {}: typing for {elapsed:?} in {} (timeout {:?})",
                    client.user, session.room, session.typing_timeout
                )));
            }
        }
        Ok(())
    }
}

/// A session never holds a message addressed to another room.
pub struct MessagesScopedToRoom;

impl Invariant for MessagesScopedToRoom {
    fn name(&self) -> &'static str {
        "messages_scoped_to_room"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            let Some(session) = &client.session else { continue };

            if let Some(stray) =
                session.message_rooms.iter().flatten().find(|room| **room != session.room)
            {
                return Err(self.violation(format!(
                    "client {}: message for {stray} in session {}",
                    client.user, session.room
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use agrichat_proto::{OrderId, UserId};

    use super::*;
    use crate::invariants::{ClientSnapshot, SessionSnapshot};

    fn client() -> ClientSnapshot {
        ClientSnapshot {
            user: UserId::from("u1"),
            live_subscriptions: 6,
            held_subscriptions: 6,
            candidates: vec![OrderId::from("o1"), OrderId::from("o2")],
            selected: Some(OrderId::from("o1")),
            session: Some(SessionSnapshot {
                room: OrderId::from("o1"),
                phase: SessionPhase::Active,
                typing_elapsed: None,
                typing_timeout: Duration::from_millis(2000),
                message_rooms: vec![None, Some(OrderId::from("o1"))],
            }),
        }
    }

    #[test]
    fn healthy_client_passes() {
        let snapshot = SystemSnapshot::single(client());
        assert!(SubscriptionBalance.check(&snapshot).is_ok());
        assert!(SelectedOrderPresent.check(&snapshot).is_ok());
        assert!(TypingTimerConsistency.check(&snapshot).is_ok());
        assert!(MessagesScopedToRoom.check(&snapshot).is_ok());
    }

    #[test]
    fn leaked_listener_detected() {
        let mut c = client();
        c.live_subscriptions = 7;
        assert!(SubscriptionBalance.check(&SystemSnapshot::single(c)).is_err());
    }

    #[test]
    fn unlisted_selection_detected() {
        let mut c = client();
        c.candidates = vec![OrderId::from("o2")];
        assert!(SelectedOrderPresent.check(&SystemSnapshot::single(c)).is_err());
    }

    #[test]
    fn session_without_selection_detected() {
        let mut c = client();
        c.selected = None;
        assert!(SelectedOrderPresent.check(&SystemSnapshot::single(c)).is_err());
    }

    #[test]
    fn stale_typing_timer_detected() {
        let mut c = client();
        if let Some(session) = c.session.as_mut() {
            session.typing_elapsed = Some(Duration::from_millis(2000));
        }
        assert!(TypingTimerConsistency.check(&SystemSnapshot::single(c)).is_err());
    }

    #[test]
    fn foreign_message_detected() {
        let mut c = client();
        if let Some(session) = c.session.as_mut() {
            session.message_rooms.push(Some(OrderId::from("o2")));
        }
        let violation = MessagesScopedToRoom.check(&SystemSnapshot::single(c)).unwrap_err();
        assert_eq!(violation.message, "client u1: message for o2 in session o1");
    }
}
