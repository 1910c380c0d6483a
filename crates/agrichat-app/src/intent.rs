//! User intents produced by front-ends.

use agrichat_client::ClientEvent;
use agrichat_proto::OrderId;

/// What the user asked for, independent of how they asked.
///
/// Front-ends translate key presses, clicks or scripted steps into intents.
/// Everything except [`Intent::Quit`] maps onto a [`ClientEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Open the chat panel
    OpenPanel,
    /// Close the chat panel
    ClosePanel,
    /// Go from the greeting to the conversation list
    ShowList,
    /// Open the conversation for an order
    Select(OrderId),
    /// Navigate back
    Back,
    /// Input box now holds this text
    Input(String),
    /// Send the draft
    Send,
    /// Leave the application
    Quit,
}

impl Intent {
    /// Client event for this intent, or `None` for [`Intent::Quit`].
    pub fn into_event(self) -> Option<ClientEvent> {
        let event = match self {
            Self::OpenPanel => ClientEvent::OpenPanel,
            Self::ClosePanel => ClientEvent::ClosePanel,
            Self::ShowList => ClientEvent::ShowList,
            Self::Select(order_id) => ClientEvent::SelectOrder(order_id),
            Self::Back => ClientEvent::Back,
            Self::Input(text) => ClientEvent::InputChanged(text),
            Self::Send => ClientEvent::Send,
            Self::Quit => return None,
        };
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quit_has_no_client_event() {
        assert_eq!(Intent::Quit.into_event(), None);
    }

    #[test]
    fn select_carries_order() {
        let event = Intent::Select(OrderId::from("order-1")).into_event();
        assert_eq!(event, Some(ClientEvent::SelectOrder(OrderId::from("order-1"))));
    }
}
