//! WebSocket transport for the client.
//!
//! Provides [`ConnectedSocket`], a pair of channels backed by a tokio task that
//! moves text frames between the channels and the socket. Protocol logic stays
//! in the sans-IO [`ChatClient`](crate::ChatClient).
//!
//! When the socket closes the task ends and drops its end of `from_server`, so
//! the receiver reports disconnection.

use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::{net::TcpStream, sync::mpsc};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite::Message};

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Socket closed while sending.
    #[error("socket closed")]
    Closed,
}

/// Handle to an open socket.
pub struct ConnectedSocket {
    /// Text frames to the server.
    pub to_server: mpsc::Sender<String>,
    /// Text frames from the server.
    pub from_server: mpsc::Receiver<String>,
    abort_handle: tokio::task::AbortHandle,
}

impl ConnectedSocket {
    /// Stop the socket task.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }
}

impl Drop for ConnectedSocket {
    fn drop(&mut self) {
        self.abort_handle.abort();
    }
}

/// Open a WebSocket to `endpoint` (`ws://` or `wss://`).
pub async fn connect(endpoint: &str) -> Result<ConnectedSocket, TransportError> {
    let (socket, _response) = tokio_tungstenite::connect_async(endpoint)
        .await
        .map_err(|e| TransportError::Connection(e.to_string()))?;

    let (to_server_tx, to_server_rx) = mpsc::channel::<String>(64);
    let (from_server_tx, from_server_rx) = mpsc::channel::<String>(64);

    let handle = tokio::spawn(run_socket(socket, to_server_rx, from_server_tx));
    tracing::info!(%endpoint, "socket open");

    Ok(ConnectedSocket {
        to_server: to_server_tx,
        from_server: from_server_rx,
        abort_handle: handle.abort_handle(),
    })
}

async fn run_socket(
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
    mut to_server: mpsc::Receiver<String>,
    from_server: mpsc::Sender<String>,
) {
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            outgoing = to_server.recv() => {
                let Some(frame) = outgoing else { break };
                if let Err(e) = sink.send(Message::Text(frame.into())).await {
                    tracing::debug!(error = %e, "socket send failed");
                    break;
                }
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if from_server.send(text.to_string()).await.is_err() {
                            break;
                        }
                    },
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {},
                    Some(Err(e)) => {
                        tracing::debug!(error = %e, "socket read failed");
                        break;
                    },
                }
            }
        }
    }

    tracing::info!("socket closed");
}
