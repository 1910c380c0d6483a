//! Top-level chat client.
//!
//! [`ChatClient`] owns the shared [`Transport`] and the [`Directory`] (which in
//! turn owns the active session). It consumes [`ClientEvent`]s and returns
//! [`ClientAction`]s; outgoing frames queued on the transport during an event
//! are returned first, in emit order.

use agrichat_core::{ConnectionAction, ConnectionState, Environment, Transport};
use agrichat_proto::Outbound;

use crate::{
    ClientConfig,
    directory::Directory,
    event::{ClientAction, ClientEvent},
    session::SessionChange,
    view::PanelView,
};

/// Chat client state machine.
///
/// Pure: no I/O. Time, wall-clock stamps and client message ids come from the
/// environment, so a simulated environment makes every run reproducible.
#[derive(Debug)]
pub struct ChatClient<E: Environment> {
    env: E,
    config: ClientConfig,
    transport: Transport<E::Instant>,
    directory: Directory<E::Instant>,
}

impl<E: Environment> ChatClient<E> {
    /// Create a client. Call [`ChatClient::start`] to connect.
    pub fn new(env: E, config: ClientConfig) -> Self {
        let now = env.now();
        let transport = Transport::new(config.endpoint.clone(), config.connection.clone(), now);
        let directory = Directory::new(config.role, config.user_id.clone(), config.session.clone());

        Self { env, config, transport, directory }
    }

    /// Register the local user for presence and start connecting.
    pub fn start(&mut self) -> Vec<ClientAction> {
        self.transport.announce(Outbound::RegisterUser(self.config.user_id.clone()));
        let now = self.env.now();
        let actions = self.transport.connect(now).into_iter().map(connection_action).collect();
        self.finish(actions)
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: ClientEvent) -> Vec<ClientAction> {
        let now = self.env.now();

        let actions = match event {
            ClientEvent::Connected => {
                if let Err(err) = self.transport.on_open(now) {
                    tracing::warn!(error = %err, "unexpected open");
                    return Vec::new();
                }
                self.rejoin();
                vec![ClientAction::Render]
            },
            ClientEvent::Disconnected => {
                self.transport.on_closed(now);
                vec![ClientAction::Render]
            },
            ClientEvent::FrameReceived(frame) => self.handle_frame(&frame),
            ClientEvent::Tick => self.handle_tick(),
            ClientEvent::OpenPanel => {
                let mut actions = Vec::new();
                if self.directory.open(&mut self.transport) {
                    actions.push(ClientAction::FetchOrders { role: self.config.role });
                }
                actions.push(ClientAction::Render);
                actions
            },
            ClientEvent::ClosePanel => {
                self.directory.close(&mut self.transport);
                vec![ClientAction::Render]
            },
            ClientEvent::ShowList => {
                self.directory.show_list();
                vec![ClientAction::Render]
            },
            ClientEvent::OrdersLoaded(result) => {
                self.directory.orders_loaded(result);
                vec![ClientAction::Render]
            },
            ClientEvent::SelectOrder(order_id) => {
                let mut actions = Vec::new();
                if let Some(order_id) = self.directory.select(&order_id, &mut self.transport) {
                    actions.push(ClientAction::FetchHistory { order_id });
                }
                actions.push(ClientAction::Render);
                actions
            },
            ClientEvent::HistoryLoaded { order_id, result } => {
                self.directory.history_loaded(&order_id, result);
                vec![ClientAction::Render]
            },
            ClientEvent::Back => {
                self.directory.back(&mut self.transport);
                vec![ClientAction::Render]
            },
            ClientEvent::InputChanged(text) => {
                if let Some(session) = self.directory.session_mut() {
                    session.input_changed(text, now, &mut self.transport);
                }
                vec![ClientAction::Render]
            },
            ClientEvent::Send => {
                let sent_at = self.env.wall_clock();
                let client_id = self.env.random_id();
                let sent = self
                    .directory
                    .session_mut()
                    .is_some_and(|session| session.send(sent_at, client_id, &mut self.transport));
                if sent { vec![ClientAction::Render] } else { Vec::new() }
            },
        };

        self.finish(actions)
    }

    /// Close the panel and the socket for good.
    ///
    /// Leaves the open conversation (a pending typing indicator is stopped),
    /// releases every subscription, then disconnects without scheduling a
    /// reconnect. Frames emitted during teardown come first.
    pub fn shutdown(&mut self) -> Vec<ClientAction> {
        self.directory.close(&mut self.transport);

        let mut actions: Vec<ClientAction> =
            self.transport.take_outgoing().into_iter().map(ClientAction::SendFrame).collect();
        let now = self.env.now();
        actions.extend(self.transport.disconnect(now).into_iter().map(connection_action));

        tracing::debug!("client shut down");
        actions
    }

    /// Snapshot for rendering.
    pub fn view(&self) -> PanelView {
        PanelView::capture(&self.directory, self.transport.state())
    }

    /// Conversation directory.
    pub fn directory(&self) -> &Directory<E::Instant> {
        &self.directory
    }

    /// Shared transport.
    pub fn transport(&self) -> &Transport<E::Instant> {
        &self.transport
    }

    /// Connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.transport.state()
    }

    /// Configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Environment.
    pub fn env(&self) -> &E {
        &self.env
    }

    fn handle_frame(&mut self, frame: &str) -> Vec<ClientAction> {
        let Some(delivery) = self.transport.dispatch(frame) else {
            return Vec::new();
        };

        match self.directory.deliver(&delivery) {
            None => Vec::new(),
            Some(SessionChange::Message { incoming }) => {
                let mut actions = Vec::new();
                if incoming
                    && let Some(session) = self.directory.session()
                    && let Some(last) = session.messages().last()
                {
                    actions.push(ClientAction::Notify {
                        order_id: session.room().clone(),
                        preview: last.message.clone(),
                    });
                }
                actions.push(ClientAction::Render);
                actions
            },
            Some(SessionChange::Typing | SessionChange::Presence) => vec![ClientAction::Render],
        }
    }

    fn handle_tick(&mut self) -> Vec<ClientAction> {
        let now = self.env.now();
        let before = self.transport.state();

        let mut actions: Vec<ClientAction> =
            self.transport.tick(now).into_iter().map(connection_action).collect();

        if let Some(session) = self.directory.session_mut() {
            session.tick(now, &mut self.transport);
        }

        if self.transport.state() != before {
            actions.push(ClientAction::Render);
        }
        actions
    }

    /// Rooms are per socket on the server; re-enter the open one after a
    /// reconnect.
    fn rejoin(&mut self) {
        let Some(session) = self.directory.session() else {
            return;
        };
        let room = session.room().clone();
        let counterpart = session.counterpart().id.clone();

        tracing::debug!(%room, "rejoining after reconnect");
        self.transport.emit(Outbound::JoinRoom(room));
        self.transport.emit(Outbound::CheckOnline(counterpart));
    }

    fn finish(&mut self, actions: Vec<ClientAction>) -> Vec<ClientAction> {
        let mut out: Vec<ClientAction> =
            self.transport.take_outgoing().into_iter().map(ClientAction::SendFrame).collect();
        out.extend(actions);
        out
    }
}

fn connection_action(action: ConnectionAction) -> ClientAction {
    match action {
        ConnectionAction::Open { endpoint } => ClientAction::Connect { endpoint },
        ConnectionAction::Close { reason } => ClientAction::Close { reason },
    }
}
