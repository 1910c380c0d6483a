//! Conversation list
//!
//! One row per candidate order. The row under the list cursor is marked with
//! `>`, the open conversation with `*`.

use agrichat_client::PanelView;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};

const CURSOR_PREFIX: &str = "> ";
const PLAIN_PREFIX: &str = "  ";
const OPEN_MARKER: &str = " *";

/// Render the conversation list.
pub fn render(frame: &mut Frame, view: &PanelView, cursor: usize, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(format!(" {} ", view.title));

    let items: Vec<ListItem> = if view.loading && view.orders.is_empty() {
        vec![dim("Loading conversations...")]
    } else if let Some(notice) = &view.notice {
        vec![dim(notice)]
    } else {
        view.orders
            .iter()
            .enumerate()
            .map(|(row, order)| {
                let (prefix, label_style) = if row == cursor {
                    (CURSOR_PREFIX, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
                } else {
                    (PLAIN_PREFIX, Style::default())
                };

                let mut spans = vec![
                    Span::raw(prefix),
                    Span::styled(order.label.as_str(), label_style),
                    Span::raw("  "),
                    Span::raw(order.counterpart.as_str()),
                ];
                if let Some(status) = &order.status {
                    spans.push(Span::styled(
                        format!(" [{status}]"),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
                if order.selected {
                    spans.push(Span::styled(OPEN_MARKER, Style::default().fg(Color::Cyan)));
                }
                ListItem::new(Line::from(spans))
            })
            .collect()
    };

    frame.render_widget(List::new(items).block(block), area);
}

fn dim(text: &str) -> ListItem<'_> {
    ListItem::new(Line::from(Span::styled(text, Style::default().fg(Color::DarkGray))))
}
