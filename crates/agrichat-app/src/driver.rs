//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the chat runtime from specific I/O
//! implementations. Each front-end implements the trait to provide
//! platform-specific I/O, while the generic [`crate::Runtime`] handles all
//! orchestration.

use std::{future::Future, time::Duration};

use agrichat_client::PanelView;
use agrichat_proto::OrderId;

use crate::Intent;

/// Abstracts I/O operations for the chat runtime.
///
/// Implementations provide platform-specific I/O while the generic
/// [`Runtime`](crate::Runtime) handles orchestration logic. The same
/// orchestration code runs in the terminal front-end and in simulation.
///
/// # Implementations
///
/// - **TUI**: crossterm for key events, a WebSocket for the server
/// - **Simulation**: scripted intents and an in-memory server
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Wait up to `timeout` for the next user intent.
    ///
    /// Returns `None` when the timeout elapses without input; the runtime
    /// then ticks the client.
    fn poll_intent(
        &mut self,
        timeout: Duration,
    ) -> impl Future<Output = Result<Option<Intent>, Self::Error>> + Send;

    /// Open a socket to the messaging server.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established. The runtime
    /// reports it to the client as a disconnect and keeps running.
    fn connect(&mut self, endpoint: &str) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Write a text frame to the socket.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket is closed or the send fails.
    fn send_frame(&mut self, frame: String) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Next buffered frame from the server, without waiting.
    ///
    /// Returns `None` when nothing is buffered or the socket is gone.
    fn recv_frame(&mut self) -> impl Future<Output = Option<String>> + Send;

    /// Whether the socket is still open.
    fn is_connected(&self) -> bool;

    /// Drop the socket, if any.
    fn close(&mut self);

    /// Tell the user that the counterpart wrote something.
    fn notify(&mut self, order_id: &OrderId, preview: &str);

    /// Draw the panel.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, view: &PanelView) -> Result<(), Self::Error>;

    /// Stop the connection and clean up resources.
    fn stop(&mut self);
}
