//! UI rendering
//!
//! Rendering functions that convert a [`PanelView`] into terminal output
//! using ratatui widgets. All functions are pure (no I/O), taking state and
//! returning widget trees.

mod chat;
mod home;
mod orders;
mod status;

use agrichat_client::{PanelView, Screen};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
};

use crate::InputState;

/// Render the entire UI.
///
/// `status` is a transient line (e.g. a new-message notice) shown in place of
/// the key hints.
pub fn render(frame: &mut Frame, view: &PanelView, input: &InputState, status: Option<&str>) {
    const MAIN_AREA_MIN_HEIGHT: u16 = 3;
    const INPUT_HEIGHT: u16 = 3;
    const STATUS_HEIGHT: u16 = 1;

    let in_chat = view.open && view.screen == Screen::Chat;
    let input_height = if in_chat { INPUT_HEIGHT } else { 0 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(MAIN_AREA_MIN_HEIGHT),
            Constraint::Length(input_height),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(frame.area());

    let [main_area, input_area, status_area] = chunks.as_ref() else {
        return;
    };

    match (view.open, view.screen) {
        (false, _) => home::render_closed(frame, *main_area),
        (true, Screen::Home) => home::render(frame, view, *main_area),
        (true, Screen::List) => orders::render(frame, view, input.list_cursor(), *main_area),
        (true, Screen::Chat) => {
            chat::render(frame, view, input, *main_area, *input_area);
        },
    }
    status::render(frame, view, status, *status_area);
}

#[cfg(test)]
mod tests {
    use agrichat_client::{ChatLine, ChatView, ConnectionState, OrderLine};
    use agrichat_proto::OrderId;
    use ratatui::{Terminal, backend::TestBackend};

    use super::*;

    fn panel(screen: Screen) -> PanelView {
        PanelView {
            connection: ConnectionState::Connected,
            open: true,
            screen,
            title: "AgriChat".into(),
            greeting: "Welcome, Shopper! Connect with your Farmers directly to discuss orders."
                .into(),
            entry_label: "My Orders (2 active chats)".into(),
            loading: false,
            orders: vec![
                OrderLine {
                    order_id: OrderId::from("order-7a1b2c"),
                    label: "Order #7A1B2C".into(),
                    counterpart: "Green Acres".into(),
                    status: Some("Pending".into()),
                    selected: false,
                },
                OrderLine {
                    order_id: OrderId::from("order-4d5e6f"),
                    label: "Order #4D5E6F".into(),
                    counterpart: "Hill Farm".into(),
                    status: None,
                    selected: false,
                },
            ],
            chat: None,
            notice: None,
        }
    }

    fn draw(height: u16, view: &PanelView, input: &InputState, status: Option<&str>) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(40, height)).unwrap();
        terminal.draw(|frame| render(frame, view, input, status)).unwrap();

        let buffer = terminal.backend().buffer();
        (0..buffer.area.height)
            .map(|y| {
                let row: String = (0..buffer.area.width).map(|x| buffer[(x, y)].symbol()).collect();
                row.trim_end().to_string()
            })
            .collect()
    }

    #[test]
    fn order_list() {
        let rows = draw(8, &panel(Screen::List), &InputState::new(), None);

        insta::assert_snapshot!(rows.join("\n"), @r"
        ┌ My Conversations ────────────────────┐
        │> Order #7A1B2C  Green Acres [Pending]│
        │  Order #4D5E6F  Hill Farm            │
        │                                      │
        │                                      │
        │                                      │
        └──────────────────────────────────────┘
         Online | Enter: open  Esc: back
        ");
    }

    #[test]
    fn empty_list_shows_notice() {
        let mut view = panel(Screen::List);
        view.orders.clear();
        view.notice = Some("No order history found.".into());

        let rows = draw(8, &view, &InputState::new(), None);

        assert!(rows[1].contains("No order history found."));
    }

    #[test]
    fn closed_panel_shows_launcher() {
        let mut view = panel(Screen::Home);
        view.open = false;
        view.connection = ConnectionState::Reconnecting;

        let rows = draw(8, &view, &InputState::new(), None);

        assert!(rows.iter().any(|r| r.contains("Tab: open chat")));
        assert!(rows[7].contains("Reconnecting..."));
    }

    #[test]
    fn home_shows_entry_count() {
        let rows = draw(8, &panel(Screen::Home), &InputState::new(), None);

        assert!(rows.iter().any(|r| r.contains("My Orders (2 active chats)")));
    }

    #[test]
    fn chat_shows_messages_typing_and_draft() {
        let mut view = panel(Screen::Chat);
        view.title = "Green Acres".into();
        view.chat = Some(ChatView {
            order_id: OrderId::from("order-7a1b2c"),
            label: "Order #7A1B2C".into(),
            counterpart: "Green Acres".into(),
            details: Some("Ravi".into()),
            status: None,
            items: Vec::new(),
            total: None,
            online: true,
            typing: Some("Green Acres is typing...".into()),
            lines: vec![ChatLine { mine: true, text: "Fresh?".into(), time: "09:00".into() }],
            draft: "Ye".into(),
        });
        let mut input = InputState::new();
        for c in "Ye".chars() {
            input.handle_key(crate::KeyInput::Char(c), &view);
        }

        let rows = draw(12, &view, &input, Some("New message on Order #7A1B2C: hi"));

        assert!(rows[0].contains("Green Acres (online)"));
        assert!(rows.iter().any(|r| r.contains("[09:00] You: Fresh?")));
        assert!(rows.iter().any(|r| r.contains("Green Acres is typing...")));
        assert!(rows.iter().any(|r| r.contains("> Ye")));
        assert!(rows.iter().any(|r| r.contains(" To Green Acres ")));
        assert!(rows[11].contains("New message on Order #7A1B2C"));
    }
}
