//! Chat area
//!
//! Displays the open conversation: counterpart details, the order summary,
//! messages in arrival order and the typing indicator, with the compose line
//! underneath. Older lines scroll off the top.

use agrichat_client::{ChatLine, ChatView, PanelView};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

use crate::InputState;

const BORDER_SIZE: u16 = 2;
const PROMPT: &str = "> ";
const PLACEHOLDER: &str = "Type a message...";

/// Render the conversation into `area` and the compose line into `compose`.
pub fn render(frame: &mut Frame, view: &PanelView, input: &InputState, area: Rect, compose: Rect) {
    let Some(chat) = &view.chat else {
        let block = Block::default().borders(Borders::ALL).title(format!(" {} ", view.title));
        frame.render_widget(List::new(vec![muted("Loading conversation...")]).block(block), area);
        return;
    };

    let presence = if chat.online { "online" } else { "offline" };
    let title = format!(" {} ({presence}) - {} ", chat.counterpart, chat.label);
    let block = Block::default().borders(Borders::ALL).title(title);

    let mut items = Vec::with_capacity(chat.lines.len() + chat.items.len() + 4);
    if let Some(details) = &chat.details {
        items.push(muted(details));
    }
    items.extend(summary(chat));
    if let Some(notice) = &view.notice {
        items.push(muted(notice));
    }
    items.extend(chat.lines.iter().map(|line| message(line, &chat.counterpart)));
    if let Some(typing) = &chat.typing {
        items.push(ListItem::new(Line::from(Span::styled(
            typing.as_str(),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))));
    }

    let visible_height = area.height.saturating_sub(BORDER_SIZE) as usize;
    let skip = items.len().saturating_sub(visible_height);
    let visible_items: Vec<_> = items.into_iter().skip(skip).collect();

    frame.render_widget(List::new(visible_items).block(block), area);
    render_compose(frame, chat, input, compose);
}

/// Status and total on one line, then one line per item.
fn summary(chat: &ChatView) -> Vec<ListItem<'_>> {
    let headline = match (&chat.status, &chat.total) {
        (Some(status), Some(total)) => Some(format!("Status: {status}  Total: {total}")),
        (Some(status), None) => Some(format!("Status: {status}")),
        (None, Some(total)) => Some(format!("Total: {total}")),
        (None, None) => None,
    };

    headline
        .into_iter()
        .chain(chat.items.iter().map(|item| format!("  {item}")))
        .map(|text| Span::styled(text, Style::default().fg(Color::Yellow)))
        .map(|span| ListItem::new(Line::from(span)))
        .collect()
}

/// Compose line. Long drafts scroll horizontally so the cursor stays visible.
fn render_compose(frame: &mut Frame, chat: &ChatView, input: &InputState, area: Rect) {
    if area.height == 0 {
        return;
    }
    let block = Block::default().borders(Borders::ALL).title(format!(" To {} ", chat.counterpart));
    let prompt_width = PROMPT.chars().count();
    let text_width =
        (area.width.saturating_sub(BORDER_SIZE) as usize).saturating_sub(prompt_width + 1);
    let scroll = input.cursor().saturating_sub(text_width);

    let line = if input.buffer().is_empty() {
        Line::from(vec![
            Span::raw(PROMPT),
            Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray)),
        ])
    } else {
        let visible: String = input.buffer().chars().skip(scroll).take(text_width + 1).collect();
        Line::from(vec![
            Span::raw(PROMPT),
            Span::styled(visible, Style::default().fg(Color::White)),
        ])
    };
    frame.render_widget(Paragraph::new(line).block(block), area);

    let cursor_x = area.x as usize + 1 + prompt_width + (input.cursor() - scroll);
    frame.set_cursor_position((cursor_x as u16, area.y.saturating_add(1)));
}

fn message<'a>(line: &'a ChatLine, counterpart: &'a str) -> ListItem<'a> {
    let (author, color) = if line.mine { ("You", Color::Green) } else { (counterpart, Color::Cyan) };

    let mut spans = Vec::with_capacity(4);
    if !line.time.is_empty() {
        spans.push(Span::styled(format!("[{}] ", line.time), Style::default().fg(Color::DarkGray)));
    }
    spans.push(Span::styled(author, Style::default().fg(color).add_modifier(Modifier::BOLD)));
    spans.push(Span::raw(": "));
    spans.push(Span::raw(line.text.as_str()));
    ListItem::new(Line::from(spans))
}

fn muted(text: &str) -> ListItem<'_> {
    ListItem::new(Line::from(Span::styled(text, Style::default().fg(Color::DarkGray))))
}
