//! Client events and actions.

use agrichat_proto::{Message, OrderId, OrderSummary, Role};

use crate::error::FetchError;

/// Events the caller feeds into the client.
///
/// The caller is responsible for:
/// - reporting socket open/close and received frames
/// - driving time forward via ticks
/// - completing the fetches the client asks for
/// - forwarding user intents from the chat panel
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// Socket opened.
    Connected,

    /// Socket closed, or the connect attempt failed.
    Disconnected,

    /// Text frame received from the server.
    FrameReceived(String),

    /// Time tick for typing debounce and reconnect timing.
    Tick,

    /// User opened the chat panel.
    OpenPanel,

    /// User closed the chat panel.
    ClosePanel,

    /// User moved from the greeting to the conversation list.
    ShowList,

    /// Candidate listing completed.
    OrdersLoaded(Result<Vec<OrderSummary>, FetchError>),

    /// User picked an order.
    SelectOrder(OrderId),

    /// History fetch completed.
    HistoryLoaded {
        /// Order the history was requested for
        order_id: OrderId,
        /// Messages, oldest first
        result: Result<Vec<Message>, FetchError>,
    },

    /// User navigated back.
    Back,

    /// Input box text changed.
    InputChanged(String),

    /// User pressed send.
    Send,
}

/// Actions the caller executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientAction {
    /// Open a socket to the messaging server.
    Connect {
        /// Server URL
        endpoint: String,
    },

    /// Drop the socket or abandon the pending attempt.
    Close {
        /// Reason for closing
        reason: String,
    },

    /// Write a text frame to the socket.
    SendFrame(String),

    /// List orders eligible for chat and answer with
    /// [`ClientEvent::OrdersLoaded`].
    FetchOrders {
        /// Selects the farmer or customer listing
        role: Role,
    },

    /// Fetch persisted history and answer with [`ClientEvent::HistoryLoaded`].
    FetchHistory {
        /// Room to fetch
        order_id: OrderId,
    },

    /// A message from the counterpart arrived.
    Notify {
        /// Conversation it arrived in
        order_id: OrderId,
        /// Message body
        preview: String,
    },

    /// Panel state changed; redraw.
    Render,
}
