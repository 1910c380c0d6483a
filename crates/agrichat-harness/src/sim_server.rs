//! In-memory messaging server.
//!
//! Reproduces the relay semantics the chat client depends on:
//!
//! - rooms are per connection and joined explicitly
//! - `send_message` is persisted, then relayed to the other connections in
//!   the room; the sender never receives its own message
//! - `typing`/`stop_typing` are relayed the same way
//! - `register_user` records presence and tells every other connection
//! - `check_online` is answered to the asker only
//! - a dropped connection takes its presence with it
//!
//! Tests drive the server directly; there is no socket underneath.

#![allow(clippy::disallowed_types, reason = "Synchronous locking operations only")]

use std::{
    collections::{BTreeMap, BTreeSet, VecDeque},
    sync::{Arc, Mutex},
};

use agrichat_proto::{
    Inbound, Message, OrderId, Outbound, PresenceReply, ProtocolError, UserId, UserRef,
};

/// Identifies one simulated socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnId(u64);

#[derive(Debug, Default)]
struct SimConnection {
    user: Option<UserId>,
    rooms: BTreeSet<OrderId>,
    outbox: VecDeque<String>,
}

/// Simulation server shared between drivers and backends.
pub type SharedSimServer = Arc<Mutex<SimServer>>;

/// Create a server wrapped for sharing.
pub fn create_shared_server() -> SharedSimServer {
    Arc::new(Mutex::new(SimServer::new()))
}

/// In-memory messaging server.
#[derive(Debug, Default)]
pub struct SimServer {
    connections: BTreeMap<ConnId, SimConnection>,
    online: BTreeMap<UserId, ConnId>,
    history: BTreeMap<OrderId, Vec<Message>>,
    next_conn: u64,
    next_message: u64,
}

impl SimServer {
    /// Empty server.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a connection.
    pub fn connect(&mut self) -> ConnId {
        self.next_conn += 1;
        let conn = ConnId(self.next_conn);
        self.connections.insert(conn, SimConnection::default());
        tracing::debug!(?conn, "sim connection accepted");
        conn
    }

    /// Drop a connection, from either side. Unknown ids are ignored.
    pub fn disconnect(&mut self, conn: ConnId) {
        let Some(connection) = self.connections.remove(&conn) else {
            return;
        };

        if let Some(user) = connection.user
            && self.online.get(&user) == Some(&conn)
        {
            self.online.remove(&user);
            self.broadcast(None, &Inbound::UserOffline(user));
        }
        tracing::debug!(?conn, "sim connection dropped");
    }

    /// Whether `conn` is still open.
    pub fn is_open(&self, conn: ConnId) -> bool {
        self.connections.contains_key(&conn)
    }

    /// Process one frame a client wrote.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolError`] for frames the server cannot decode. The
    /// connection stays open.
    pub fn receive(&mut self, conn: ConnId, frame: &str) -> Result<(), ProtocolError> {
        if !self.is_open(conn) {
            return Ok(());
        }

        match Outbound::decode(frame)? {
            Outbound::JoinRoom(room) => {
                if let Some(connection) = self.connections.get_mut(&conn) {
                    connection.rooms.insert(room);
                }
            },
            Outbound::SendMessage(message) => {
                let Some(room) = message.room.clone() else {
                    tracing::debug!(?conn, "message without room dropped");
                    return Ok(());
                };
                self.persist(&room, &message);
                self.broadcast_room(conn, &room, &Inbound::ReceiveMessage(message));
            },
            Outbound::Typing(room) => {
                let event = Inbound::Typing(room.clone());
                self.broadcast_room(conn, &room, &event);
            },
            Outbound::StopTyping(room) => {
                let event = Inbound::StopTyping(room.clone());
                self.broadcast_room(conn, &room, &event);
            },
            Outbound::RegisterUser(user) => {
                if let Some(connection) = self.connections.get_mut(&conn) {
                    connection.user = Some(user.clone());
                }
                self.online.insert(user.clone(), conn);
                self.broadcast(Some(conn), &Inbound::UserOnline(user));
            },
            Outbound::CheckOnline(user) => {
                let is_online = self.online.contains_key(&user);
                let reply = PresenceReply { user_id: user, is_online };
                self.send(conn, &Inbound::IsOnlineResponse(reply));
            },
        }
        Ok(())
    }

    /// Pop the next frame queued for `conn`.
    pub fn next_frame(&mut self, conn: ConnId) -> Option<String> {
        self.connections.get_mut(&conn)?.outbox.pop_front()
    }

    /// Whether frames are queued for `conn`.
    pub fn has_frames(&self, conn: ConnId) -> bool {
        self.connections.get(&conn).is_some_and(|c| !c.outbox.is_empty())
    }

    /// Persisted history for `room`, oldest first.
    pub fn history(&self, room: &OrderId) -> Vec<Message> {
        self.history.get(room).cloned().unwrap_or_default()
    }

    /// Seed persisted history, as if written in an earlier visit.
    pub fn seed_history(&mut self, room: &OrderId, messages: impl IntoIterator<Item = Message>) {
        for message in messages {
            self.persist(room, &message);
        }
    }

    /// Whether `user` has a registered, open connection.
    pub fn is_online(&self, user: &UserId) -> bool {
        self.online.contains_key(user)
    }

    /// Rooms `conn` has joined.
    pub fn rooms_of(&self, conn: ConnId) -> Vec<OrderId> {
        self.connections.get(&conn).map(|c| c.rooms.iter().cloned().collect()).unwrap_or_default()
    }

    /// Store with a server id and a normalized sender, the way history is
    /// returned later.
    fn persist(&mut self, room: &OrderId, message: &Message) {
        self.next_message += 1;
        let mut stored = message.clone();
        if stored.id.is_none() {
            stored.id = Some(format!("msg-{}", self.next_message));
        }
        if stored.sender_id.is_none() {
            stored.sender_id = stored.author_id.clone().map(UserRef::Id);
        }
        stored.room = Some(room.clone());
        self.history.entry(room.clone()).or_default().push(stored);
    }

    fn broadcast_room(&mut self, from: ConnId, room: &OrderId, event: &Inbound) {
        let Some(frame) = encode(event) else { return };
        for (conn, connection) in &mut self.connections {
            if *conn != from && connection.rooms.contains(room) {
                connection.outbox.push_back(frame.clone());
            }
        }
    }

    fn broadcast(&mut self, except: Option<ConnId>, event: &Inbound) {
        let Some(frame) = encode(event) else { return };
        for (conn, connection) in &mut self.connections {
            if Some(*conn) != except {
                connection.outbox.push_back(frame.clone());
            }
        }
    }

    fn send(&mut self, conn: ConnId, event: &Inbound) {
        let Some(frame) = encode(event) else { return };
        if let Some(connection) = self.connections.get_mut(&conn) {
            connection.outbox.push_back(frame);
        }
    }
}

fn encode(event: &Inbound) -> Option<String> {
    event
        .encode()
        .inspect_err(|err| tracing::error!(event = %event.name(), error = %err, "encode failed"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(server: &mut SimServer, conn: ConnId) -> Vec<String> {
        std::iter::from_fn(|| server.next_frame(conn)).collect()
    }

    #[test]
    fn message_relayed_to_room_except_sender() {
        let mut server = SimServer::new();
        let a = server.connect();
        let b = server.connect();
        let outsider = server.connect();
        server.receive(a, r#"["join_room","o1"]"#).unwrap();
        server.receive(b, r#"["join_room","o1"]"#).unwrap();

        server
            .receive(a, r#"["send_message",{"room":"o1","authorId":"alice","message":"hi"}]"#)
            .unwrap();

        assert!(drain(&mut server, a).is_empty());
        assert!(drain(&mut server, outsider).is_empty());
        assert_eq!(drain(&mut server, b), [
            r#"["receive_message",{"room":"o1","authorId":"alice","message":"hi"}]"#
        ]);
    }

    #[test]
    fn history_normalizes_sender() {
        let mut server = SimServer::new();
        let a = server.connect();
        server
            .receive(a, r#"["send_message",{"room":"o1","authorId":"alice","message":"hi"}]"#)
            .unwrap();

        let history = server.history(&OrderId::from("o1"));
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id.as_deref(), Some("msg-1"));
        assert_eq!(history[0].sender(), Some(&UserId::from("alice")));
    }

    #[test]
    fn presence_follows_connections() {
        let mut server = SimServer::new();
        let a = server.connect();
        let b = server.connect();

        server.receive(a, r#"["register_user","alice"]"#).unwrap();
        assert_eq!(drain(&mut server, b), [r#"["user_online","alice"]"#]);
        assert!(drain(&mut server, a).is_empty());

        server.receive(b, r#"["check_online","alice"]"#).unwrap();
        assert_eq!(drain(&mut server, b), [
            r#"["is_online_response",{"userId":"alice","isOnline":true}]"#
        ]);

        server.disconnect(a);
        assert!(!server.is_online(&UserId::from("alice")));
        assert_eq!(drain(&mut server, b), [r#"["user_offline","alice"]"#]);
    }

    #[test]
    fn server_only_frames_are_rejected() {
        let mut server = SimServer::new();
        let a = server.connect();

        let result = server.receive(a, r#"["user_online","alice"]"#);
        assert!(matches!(result, Err(ProtocolError::WrongDirection("user_online"))));
        assert!(server.is_open(a));
    }
}
