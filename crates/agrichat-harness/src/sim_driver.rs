//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as the terminal driver but for
//! deterministic testing. It implements [`Driver`] so the same
//! [`agrichat_app::Runtime`] orchestration code runs in both production and
//! simulation.
//!
//! Input is scripted with [`SimDriver::push_intent`]; polling never waits and
//! never moves the clock. The socket is a connection on a shared
//! [`SimServer`](crate::SimServer).

use std::{collections::VecDeque, sync::PoisonError, time::Duration};

use agrichat_app::{Driver, Intent};
use agrichat_client::PanelView;
use agrichat_proto::OrderId;

use crate::{ConnId, SharedSimServer, SimServer};

/// Error type for simulation driver.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimDriverError {
    /// Connect refused by the test.
    #[error("connection refused")]
    Refused,
    /// Write on a closed socket.
    #[error("not connected")]
    NotConnected,
}

/// Simulation driver for deterministic testing.
pub struct SimDriver {
    server: SharedSimServer,
    conn: Option<ConnId>,
    intents: VecDeque<Intent>,
    refuse_connect: bool,
    last_view: Option<PanelView>,
    renders: usize,
    notifications: Vec<(OrderId, String)>,
}

impl SimDriver {
    /// Driver whose socket connects to `server`.
    pub fn new(server: SharedSimServer) -> Self {
        Self {
            server,
            conn: None,
            intents: VecDeque::new(),
            refuse_connect: false,
            last_view: None,
            renders: 0,
            notifications: Vec::new(),
        }
    }

    /// Queue a user intent.
    pub fn push_intent(&mut self, intent: Intent) {
        self.intents.push_back(intent);
    }

    /// Whether scripted input is still queued.
    pub fn has_pending(&self) -> bool {
        !self.intents.is_empty()
    }

    /// Whether the server holds frames not yet received.
    pub fn has_inbound(&self) -> bool {
        self.conn.is_some_and(|conn| self.with_server(|server| server.has_frames(conn)))
    }

    /// Refuse (or accept again) future connects.
    pub fn refuse_connects(&mut self, refuse: bool) {
        self.refuse_connect = refuse;
    }

    /// Drop the socket from the server side, as a server restart would.
    pub fn sever(&mut self) {
        if let Some(conn) = self.conn {
            self.with_server(|server| server.disconnect(conn));
        }
    }

    /// Server connection, while one is open.
    pub fn conn(&self) -> Option<ConnId> {
        self.conn
    }

    /// Most recent render.
    pub fn last_view(&self) -> Option<&PanelView> {
        self.last_view.as_ref()
    }

    /// Number of renders so far.
    pub fn renders(&self) -> usize {
        self.renders
    }

    /// Notifications raised so far, oldest first.
    pub fn notifications(&self) -> &[(OrderId, String)] {
        &self.notifications
    }

    fn with_server<T>(&self, f: impl FnOnce(&mut SimServer) -> T) -> T {
        let mut server = self.server.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut server)
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;

    async fn poll_intent(&mut self, _timeout: Duration) -> Result<Option<Intent>, Self::Error> {
        Ok(self.intents.pop_front())
    }

    async fn connect(&mut self, _endpoint: &str) -> Result<(), Self::Error> {
        if self.refuse_connect {
            return Err(SimDriverError::Refused);
        }
        self.close();
        self.conn = Some(self.with_server(SimServer::connect));
        Ok(())
    }

    async fn send_frame(&mut self, frame: String) -> Result<(), Self::Error> {
        let conn = self.conn.ok_or(SimDriverError::NotConnected)?;
        if let Err(err) = self.with_server(|server| server.receive(conn, &frame)) {
            tracing::warn!(error = %err, "server rejected frame");
        }
        Ok(())
    }

    async fn recv_frame(&mut self) -> Option<String> {
        let conn = self.conn?;
        self.with_server(|server| server.next_frame(conn))
    }

    fn is_connected(&self) -> bool {
        self.conn.is_some_and(|conn| self.with_server(|server| server.is_open(conn)))
    }

    fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.with_server(|server| server.disconnect(conn));
        }
    }

    fn notify(&mut self, order_id: &OrderId, preview: &str) {
        self.notifications.push((order_id.clone(), preview.to_string()));
    }

    fn render(&mut self, view: &PanelView) -> Result<(), Self::Error> {
        self.renders += 1;
        self.last_view = Some(view.clone());
        Ok(())
    }

    fn stop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_shared_server;

    #[tokio::test]
    async fn frames_reach_the_server() {
        let server = create_shared_server();
        let mut driver = SimDriver::new(server.clone());

        driver.connect("sim://").await.unwrap();
        driver.send_frame(r#"["register_user","alice"]"#.into()).await.unwrap();

        assert!(server.lock().unwrap().is_online(&"alice".into()));
    }

    #[tokio::test]
    async fn severed_socket_reports_disconnected() {
        let mut driver = SimDriver::new(create_shared_server());
        driver.connect("sim://").await.unwrap();
        assert!(driver.is_connected());

        driver.sever();

        assert!(!driver.is_connected());
        assert_eq!(driver.recv_frame().await, None);
    }

    #[tokio::test]
    async fn send_without_socket_fails() {
        let mut driver = SimDriver::new(create_shared_server());
        let result = driver.send_frame("[]".into()).await;
        assert_eq!(result, Err(SimDriverError::NotConnected));
    }

    #[tokio::test]
    async fn refused_connect_leaves_no_socket() {
        let mut driver = SimDriver::new(create_shared_server());
        driver.refuse_connects(true);

        assert_eq!(driver.connect("sim://").await, Err(SimDriverError::Refused));
        assert!(!driver.is_connected());
    }
}
