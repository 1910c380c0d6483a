//! Home view
//!
//! The launcher shown while the panel is closed, and the greeting with the
//! conversation entry once it is open.

use agrichat_client::PanelView;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

/// Render the launcher for a closed panel.
pub fn render_closed(frame: &mut Frame, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" AgriChat ");
    let text = Line::from(Span::styled(
        "Chat with the other side of your orders.",
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: true }).block(block), area);
}

/// Render the greeting and the entry into the conversation list.
pub fn render(frame: &mut Frame, view: &PanelView, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(format!(" {} ", view.title));

    let lines = vec![
        Line::from(view.greeting.as_str()),
        Line::default(),
        Line::from(vec![
            Span::raw("> "),
            Span::styled(
                view.entry_label.as_str(),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }).block(block), area);
}
