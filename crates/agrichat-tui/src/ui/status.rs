//! Status bar
//!
//! Displays connection status, then either a transient notice or the key
//! hints for the current screen.

use agrichat_client::{ConnectionState, PanelView, Screen};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

/// Render the status bar.
pub fn render(frame: &mut Frame, view: &PanelView, notice: Option<&str>, area: Rect) {
    let connection_status = match view.connection {
        ConnectionState::Disconnected => Span::styled("Offline", Style::default().fg(Color::Red)),
        ConnectionState::Connecting => {
            Span::styled("Connecting...", Style::default().fg(Color::Yellow))
        },
        ConnectionState::Reconnecting => {
            Span::styled("Reconnecting...", Style::default().fg(Color::Yellow))
        },
        ConnectionState::Connected => Span::styled(
            "Online",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
    };

    let detail = match notice {
        Some(notice) => Span::styled(format!(" | {notice}"), Style::default().fg(Color::Cyan)),
        None => Span::raw(format!(" | {}", hints(view))),
    };

    let status_line = Line::from(vec![Span::raw(" "), connection_status, detail]);
    let paragraph =
        Paragraph::new(status_line).style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(paragraph, area);
}

fn hints(view: &PanelView) -> &'static str {
    if !view.open {
        return "Tab: open chat  q: quit";
    }
    match view.screen {
        Screen::Home => "Enter: conversations  Esc: close",
        Screen::List => "Enter: open  Esc: back",
        Screen::Chat => "Enter: send  Esc: back",
    }
}
