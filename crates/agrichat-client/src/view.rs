//! Read-only snapshot of the chat panel for front-ends.
//!
//! Front-ends render a [`PanelView`] and never touch client internals. All
//! display decisions that belong to the chat domain (counterpart naming, short
//! order labels, time fallback, empty-state text) are made here so every
//! front-end shows the same thing.

use agrichat_core::{ConnectionState, Timestamp};
use agrichat_proto::{Message, OrderId, OrderItem, OrderSummary, Role};

use crate::{
    directory::{Directory, Screen},
    session::Session,
};

/// Shown when the candidate list is empty.
pub const EMPTY_LIST_NOTICE: &str = "No order history found.";

/// Shown in a conversation with no messages.
pub const EMPTY_CHAT_NOTICE: &str = "Start the conversation!";

/// Everything a front-end needs to draw the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelView {
    /// Transport status
    pub connection: ConnectionState,
    /// Whether the panel is open at all
    pub open: bool,
    /// Current view
    pub screen: Screen,
    /// Header title
    pub title: String,
    /// Greeting on the home view
    pub greeting: String,
    /// Home view entry label
    pub entry_label: String,
    /// Candidate fetch outstanding
    pub loading: bool,
    /// Candidate orders
    pub orders: Vec<OrderLine>,
    /// Open conversation, on the chat view
    pub chat: Option<ChatView>,
    /// Empty-state text, if any
    pub notice: Option<String>,
}

/// One candidate order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    /// Order id
    pub order_id: OrderId,
    /// `Order #XXXXXX`
    pub label: String,
    /// Counterpart display name
    pub counterpart: String,
    /// Workflow status, if reported
    pub status: Option<String>,
    /// Whether this is the open conversation
    pub selected: bool,
}

/// The open conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatView {
    /// Order id
    pub order_id: OrderId,
    /// `Order #XXXXXX`
    pub label: String,
    /// Counterpart display name
    pub counterpart: String,
    /// Counterpart secondary line
    pub details: Option<String>,
    /// Order workflow status
    pub status: Option<String>,
    /// One `{quantity} {unit} x {name}` line per item
    pub items: Vec<String>,
    /// Formatted order total, e.g. `₹12.50`
    pub total: Option<String>,
    /// Counterpart presence
    pub online: bool,
    /// `"<name> is typing..."` while the counterpart types
    pub typing: Option<String>,
    /// Messages in arrival order
    pub lines: Vec<ChatLine>,
    /// Unsent input
    pub draft: String,
}

/// One rendered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    /// Written by the local actor
    pub mine: bool,
    /// Body text
    pub text: String,
    /// `HH:MM`, or empty when the message carries no time
    pub time: String,
}

impl PanelView {
    /// Snapshot `directory` under the given connection state.
    pub fn capture<I: Timestamp>(directory: &Directory<I>, connection: ConnectionState) -> Self {
        let role = directory.role();
        let screen = directory.screen();
        let orders = order_lines(directory);
        let chat = match screen {
            Screen::Chat => directory.session().map(|session| chat_view(directory, session)),
            Screen::Home | Screen::List => None,
        };

        let title = match (&screen, &chat) {
            (Screen::Chat, Some(chat)) => chat.counterpart.clone(),
            (Screen::List, _) => "My Conversations".to_string(),
            _ => "AgriChat".to_string(),
        };

        let notice = match screen {
            Screen::List if directory.is_empty() => Some(EMPTY_LIST_NOTICE.to_string()),
            Screen::Chat if chat.as_ref().is_some_and(|c| c.lines.is_empty()) => {
                Some(EMPTY_CHAT_NOTICE.to_string())
            },
            _ => None,
        };

        Self {
            connection,
            open: directory.is_open(),
            screen,
            title,
            greeting: greeting(role),
            entry_label: entry_label(role, orders.len()),
            loading: directory.is_loading(),
            orders,
            chat,
            notice,
        }
    }
}

fn greeting(role: Role) -> String {
    match role {
        Role::Customer => "Welcome, Shopper! Connect with your Farmers directly to discuss orders.",
        Role::Farmer => "Welcome, Farmer! Connect with your Customers directly to discuss orders.",
    }
    .to_string()
}

fn entry_label(role: Role, count: usize) -> String {
    let entry = match role {
        Role::Customer => "My Orders",
        Role::Farmer => "Customer Enquiries",
    };
    format!("{entry} ({count} active chats)")
}

fn order_lines<I: Timestamp>(directory: &Directory<I>) -> Vec<OrderLine> {
    let role = directory.role();
    directory
        .candidates()
        .iter()
        .map(|order| OrderLine {
            order_id: order.id.clone(),
            label: order.short_label(),
            counterpart: order
                .counterpart(role)
                .map_or_else(|| default_name(role).to_string(), |c| c.name),
            status: order.status.clone(),
            selected: directory.selected() == Some(&order.id),
        })
        .collect()
}

fn chat_view<I: Timestamp>(directory: &Directory<I>, session: &Session<I>) -> ChatView {
    let counterpart = session.counterpart();
    let order = directory.selected_order();
    let label =
        order.map_or_else(|| format!("Order #{}", session.room()), OrderSummary::short_label);

    ChatView {
        order_id: session.room().clone(),
        label,
        counterpart: counterpart.name.clone(),
        details: counterpart.details.clone(),
        status: order.and_then(|o| o.status.clone()),
        items: order
            .map_or_else(Vec::new, |o| o.items.iter().map(OrderItem::summary_line).collect()),
        total: order.and_then(|o| o.total).map(|total| format!("₹{total:.2}")),
        online: session.is_counterpart_online(),
        typing: session
            .is_counterpart_typing()
            .then(|| format!("{} is typing...", counterpart.name)),
        lines: session.messages().iter().map(|m| chat_line(session, m)).collect(),
        draft: session.draft().to_string(),
    }
}

fn chat_line<I: Timestamp>(session: &Session<I>, message: &Message) -> ChatLine {
    ChatLine {
        mine: session.is_mine(message),
        text: message.message.clone(),
        time: message.display_time(),
    }
}

fn default_name(role: Role) -> &'static str {
    match role.counterpart() {
        Role::Farmer => "Farmer",
        Role::Customer => "Customer",
    }
}
