//! Terminal driver for the TUI.
//!
//! Implements the [`Driver`] trait for terminal I/O using crossterm for
//! keyboard events and ratatui for rendering. The messaging server is reached
//! over the WebSocket transport of [`agrichat_client::transport`].

use std::{
    collections::VecDeque,
    io::{self, Stdout, stdout},
    time::Duration,
};

use agrichat_app::{Driver, Intent};
use agrichat_client::{
    PanelView, Screen,
    transport::{self, ConnectedSocket, TransportError},
};
use agrichat_proto::{OrderId, OrderSummary};
use crossterm::{
    ExecutableCommand,
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    style::Print,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use thiserror::Error;
use tokio::sync::mpsc::error::TryRecvError;

use crate::{InputState, KeyInput, ui};

/// Upper bound on a WebSocket handshake.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Handshake did not finish in time.
    #[error("connection timed out")]
    Timeout,

    /// No socket is open.
    #[error("not connected")]
    NotConnected,

    /// Channel send error.
    #[error("channel send error")]
    ChannelSend,
}

/// Terminal driver implementing the [`Driver`] trait.
///
/// Handles terminal I/O (crossterm), rendering (ratatui) and the socket.
/// Owns the input state, so editing and list movement redraw immediately
/// without a round trip through the client.
pub struct TerminalDriver {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_stream: EventStream,
    socket: Option<ConnectedSocket>,
    input: InputState,
    pending: VecDeque<Intent>,
    view: Option<PanelView>,
    status: Option<String>,
}

impl TerminalDriver {
    /// Switch the terminal to raw mode on the alternate screen.
    pub fn new() -> Result<Self, TerminalError> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;
        let event_stream = EventStream::new();

        Ok(Self {
            terminal,
            event_stream,
            socket: None,
            input: InputState::new(),
            pending: VecDeque::new(),
            view: None,
            status: None,
        })
    }

    /// Convert a crossterm key event to `KeyInput`.
    fn convert_key(event: KeyEvent) -> Option<KeyInput> {
        if event.modifiers.contains(KeyModifiers::CONTROL) && event.code == KeyCode::Char('c') {
            return Some(KeyInput::Interrupt);
        }
        match event.code {
            KeyCode::Char(c) => Some(KeyInput::Char(c)),
            KeyCode::Enter => Some(KeyInput::Enter),
            KeyCode::Backspace => Some(KeyInput::Backspace),
            KeyCode::Delete => Some(KeyInput::Delete),
            KeyCode::Tab => Some(KeyInput::Tab),
            KeyCode::Esc => Some(KeyInput::Esc),
            KeyCode::Left => Some(KeyInput::Left),
            KeyCode::Right => Some(KeyInput::Right),
            KeyCode::Up => Some(KeyInput::Up),
            KeyCode::Down => Some(KeyInput::Down),
            KeyCode::Home => Some(KeyInput::Home),
            KeyCode::End => Some(KeyInput::End),
            _ => None,
        }
    }

    fn handle_key(&mut self, event: KeyEvent) -> Result<(), TerminalError> {
        let (Some(key), Some(view)) = (Self::convert_key(event), &self.view) else {
            return Ok(());
        };
        self.status = None;
        let intents = self.input.handle_key(key, view);
        self.pending.extend(intents);
        self.redraw()
    }

    fn redraw(&mut self) -> Result<(), TerminalError> {
        let Some(view) = &self.view else {
            return Ok(());
        };
        let input = &self.input;
        let status = self.status.as_deref();
        self.terminal.draw(|frame| ui::render(frame, view, input, status))?;
        Ok(())
    }
}

impl Driver for TerminalDriver {
    type Error = TerminalError;

    async fn poll_intent(&mut self, timeout: Duration) -> Result<Option<Intent>, Self::Error> {
        if let Some(intent) = self.pending.pop_front() {
            return Ok(Some(intent));
        }

        tokio::select! {
            biased;

            // Terminal events
            maybe_event = self.event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        self.handle_key(key)?;
                    },
                    Some(Ok(Event::Resize(..))) => self.redraw()?,
                    Some(Err(e)) => return Err(TerminalError::Io(e)),
                    _ => {},
                }
                Ok(self.pending.pop_front())
            }

            // Tick timeout
            () = tokio::time::sleep(timeout) => Ok(None),
        }
    }

    async fn connect(&mut self, endpoint: &str) -> Result<(), Self::Error> {
        self.close();
        let socket = tokio::time::timeout(CONNECT_TIMEOUT, transport::connect(endpoint))
            .await
            .map_err(|_| TerminalError::Timeout)??;
        self.socket = Some(socket);
        Ok(())
    }

    async fn send_frame(&mut self, frame: String) -> Result<(), Self::Error> {
        let to_server =
            self.socket.as_ref().map(|s| s.to_server.clone()).ok_or(TerminalError::NotConnected)?;
        to_server.send(frame).await.map_err(|_| TerminalError::ChannelSend)
    }

    async fn recv_frame(&mut self) -> Option<String> {
        let socket = self.socket.as_mut()?;
        match socket.from_server.try_recv() {
            Ok(frame) => Some(frame),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                tracing::info!("socket closed by server");
                self.socket = None;
                None
            },
        }
    }

    fn is_connected(&self) -> bool {
        self.socket.as_ref().is_some_and(|s| !s.to_server.is_closed())
    }

    fn close(&mut self) {
        if let Some(socket) = self.socket.take() {
            socket.stop();
        }
    }

    fn notify(&mut self, order_id: &OrderId, preview: &str) {
        let label = OrderSummary::new(order_id.clone()).short_label();
        self.status = Some(format!("New message on {label}: {preview}"));
        if let Err(e) = stdout().execute(Print('\u{7}')) {
            tracing::debug!(error = %e, "bell failed");
        }
    }

    fn render(&mut self, view: &PanelView) -> Result<(), Self::Error> {
        if view.screen != Screen::Chat {
            self.input.clear();
        }
        self.input.clamp_list(view.orders.len());
        self.view = Some(view.clone());
        self.redraw()
    }

    fn stop(&mut self) {
        self.close();
    }
}

impl Drop for TerminalDriver {
    fn drop(&mut self) {
        self.stop();
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}
