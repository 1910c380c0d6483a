//! Input state and key handling for the TUI.
//!
//! This module owns the text input state (buffer, cursor) and the list
//! cursor, and turns key events into [`Intent`]s based on the screen the
//! panel currently shows.
//!
//! | Screen        | Keys                                                    |
//! |---------------|---------------------------------------------------------|
//! | panel closed  | `Tab`/`Enter` open, `q`/`Esc` quit                      |
//! | home          | `Enter` lists conversations, `Tab`/`Esc` close, `q` quit |
//! | list          | `Up`/`Down` move, `Enter` opens, `Esc` back, `q` quit    |
//! | chat          | text edits the draft, `Enter` sends, `Esc` back          |
//!
//! `Ctrl-C` quits from anywhere.

use agrichat_app::Intent;
use agrichat_client::{PanelView, Screen};

/// Key input events from the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// Character input.
    Char(char),
    /// Enter/Return key.
    Enter,
    /// Backspace key.
    Backspace,
    /// Delete key.
    Delete,
    /// Tab key.
    Tab,
    /// Escape key.
    Esc,
    /// Left arrow.
    Left,
    /// Right arrow.
    Right,
    /// Up arrow.
    Up,
    /// Down arrow.
    Down,
    /// Home key.
    Home,
    /// End key.
    End,
    /// Ctrl-C.
    Interrupt,
}

/// Input state for the TUI.
///
/// The cursor counts characters, not bytes.
#[derive(Debug, Default)]
pub struct InputState {
    buffer: String,
    cursor: usize,
    list_cursor: usize,
}

impl InputState {
    /// Create a new empty input state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current text in the input buffer.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Current cursor position, in characters.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Highlighted row of the conversation list.
    pub fn list_cursor(&self) -> usize {
        self.list_cursor
    }

    /// Drop the draft.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
    }

    /// Keep the list cursor inside a list of `len` rows.
    pub fn clamp_list(&mut self, len: usize) {
        self.list_cursor = self.list_cursor.min(len.saturating_sub(1));
    }

    /// Handle a key input event against the panel as last rendered.
    ///
    /// Returns the intents to feed the runtime; editing keys that do not
    /// change the draft return none.
    pub fn handle_key(&mut self, key: KeyInput, view: &PanelView) -> Vec<Intent> {
        if key == KeyInput::Interrupt {
            return vec![Intent::Quit];
        }
        if !view.open {
            return match key {
                KeyInput::Tab | KeyInput::Enter => vec![Intent::OpenPanel],
                KeyInput::Esc | KeyInput::Char('q') => vec![Intent::Quit],
                _ => vec![],
            };
        }

        match view.screen {
            Screen::Home => match key {
                KeyInput::Enter => {
                    self.list_cursor = 0;
                    vec![Intent::ShowList]
                },
                KeyInput::Tab | KeyInput::Esc => vec![Intent::ClosePanel],
                KeyInput::Char('q') => vec![Intent::Quit],
                _ => vec![],
            },
            Screen::List => self.handle_list(key, view),
            Screen::Chat => self.handle_chat(key),
        }
    }

    fn handle_list(&mut self, key: KeyInput, view: &PanelView) -> Vec<Intent> {
        self.clamp_list(view.orders.len());
        match key {
            KeyInput::Up => {
                self.list_cursor = self.list_cursor.saturating_sub(1);
                vec![]
            },
            KeyInput::Down => {
                self.list_cursor = self.list_cursor.saturating_add(1);
                self.clamp_list(view.orders.len());
                vec![]
            },
            KeyInput::Enter => view
                .orders
                .get(self.list_cursor)
                .map(|order| Intent::Select(order.order_id.clone()))
                .into_iter()
                .collect(),
            KeyInput::Esc => vec![Intent::Back],
            KeyInput::Tab => vec![Intent::ClosePanel],
            KeyInput::Char('q') => vec![Intent::Quit],
            _ => vec![],
        }
    }

    fn handle_chat(&mut self, key: KeyInput) -> Vec<Intent> {
        match key {
            KeyInput::Char(c) => {
                let at = self.byte_offset(self.cursor);
                self.buffer.insert(at, c);
                self.cursor = self.cursor.saturating_add(1);
                self.draft()
            },
            KeyInput::Backspace => {
                if self.cursor == 0 {
                    return vec![];
                }
                self.cursor = self.cursor.saturating_sub(1);
                let at = self.byte_offset(self.cursor);
                self.buffer.remove(at);
                self.draft()
            },
            KeyInput::Delete => {
                if self.cursor >= self.char_len() {
                    return vec![];
                }
                let at = self.byte_offset(self.cursor);
                self.buffer.remove(at);
                self.draft()
            },
            KeyInput::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                vec![]
            },
            KeyInput::Right => {
                self.cursor = self.cursor.saturating_add(1).min(self.char_len());
                vec![]
            },
            KeyInput::Home => {
                self.cursor = 0;
                vec![]
            },
            KeyInput::End => {
                self.cursor = self.char_len();
                vec![]
            },
            KeyInput::Enter => {
                // Whitespace-only drafts are never sent.
                if self.buffer.trim().is_empty() {
                    return vec![];
                }
                self.clear();
                vec![Intent::Send]
            },
            KeyInput::Esc => {
                self.clear();
                vec![Intent::Back]
            },
            KeyInput::Tab => {
                self.clear();
                vec![Intent::ClosePanel]
            },
            KeyInput::Up | KeyInput::Down | KeyInput::Interrupt => vec![],
        }
    }

    fn draft(&self) -> Vec<Intent> {
        vec![Intent::Input(self.buffer.clone())]
    }

    fn char_len(&self) -> usize {
        self.buffer.chars().count()
    }

    fn byte_offset(&self, chars: usize) -> usize {
        self.buffer.char_indices().nth(chars).map_or(self.buffer.len(), |(at, _)| at)
    }
}
