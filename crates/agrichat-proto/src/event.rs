//! Transport events and the text-frame codec.
//!
//! A frame is the JSON array `[event, payload]`. [`Outbound`] covers what a
//! client emits, [`Inbound`] what the server delivers. `typing` and
//! `stop_typing` exist in both directions with the same payload.

use std::fmt;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    Message, OrderId, UserId,
    errors::{ProtocolError, Result},
};

/// Every event name the protocol knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventName {
    /// Enter the room keyed by an order id
    JoinRoom,
    /// Client to server chat message
    SendMessage,
    /// Server to client chat message
    ReceiveMessage,
    /// Counterpart started typing
    Typing,
    /// Counterpart stopped typing
    StopTyping,
    /// Bind this connection to a user id for presence
    RegisterUser,
    /// Ask whether a user is online
    CheckOnline,
    /// A user came online
    UserOnline,
    /// A user went offline
    UserOffline,
    /// Answer to [`EventName::CheckOnline`]
    IsOnlineResponse,
}

impl EventName {
    /// All names, in declaration order.
    pub const ALL: [EventName; 10] = [
        Self::JoinRoom,
        Self::SendMessage,
        Self::ReceiveMessage,
        Self::Typing,
        Self::StopTyping,
        Self::RegisterUser,
        Self::CheckOnline,
        Self::UserOnline,
        Self::UserOffline,
        Self::IsOnlineResponse,
    ];

    /// Wire spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::JoinRoom => "join_room",
            Self::SendMessage => "send_message",
            Self::ReceiveMessage => "receive_message",
            Self::Typing => "typing",
            Self::StopTyping => "stop_typing",
            Self::RegisterUser => "register_user",
            Self::CheckOnline => "check_online",
            Self::UserOnline => "user_online",
            Self::UserOffline => "user_offline",
            Self::IsOnlineResponse => "is_online_response",
        }
    }

    /// Parse a wire name.
    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|event| event.as_str() == name)
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of `is_online_response`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceReply {
    /// User the answer is about
    pub user_id: UserId,
    /// Whether that user has a live connection
    pub is_online: bool,
}

/// Events a client emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// `join_room(orderId)`
    JoinRoom(OrderId),
    /// `send_message(Message)`
    SendMessage(Message),
    /// `typing(orderId)`
    Typing(OrderId),
    /// `stop_typing(orderId)`
    StopTyping(OrderId),
    /// `register_user(userId)`
    RegisterUser(UserId),
    /// `check_online(userId)`
    CheckOnline(UserId),
}

impl Outbound {
    /// Event name of this variant.
    pub fn name(&self) -> EventName {
        match self {
            Self::JoinRoom(_) => EventName::JoinRoom,
            Self::SendMessage(_) => EventName::SendMessage,
            Self::Typing(_) => EventName::Typing,
            Self::StopTyping(_) => EventName::StopTyping,
            Self::RegisterUser(_) => EventName::RegisterUser,
            Self::CheckOnline(_) => EventName::CheckOnline,
        }
    }

    /// Encode to a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Encode`] if the payload cannot be serialized.
    pub fn encode(&self) -> Result<String> {
        let name = self.name();
        match self {
            Self::JoinRoom(room) | Self::Typing(room) | Self::StopTyping(room) => {
                encode_frame(name, room)
            },
            Self::RegisterUser(user) | Self::CheckOnline(user) => encode_frame(name, user),
            Self::SendMessage(message) => encode_frame(name, message),
        }
    }

    /// Decode a frame a client sent. Used by the simulation server.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolError`] for malformed frames, unknown or
    /// server-only events, and payloads of the wrong shape.
    pub fn decode(text: &str) -> Result<Self> {
        let (name, payload) = split_frame(text)?;
        Ok(match name {
            EventName::JoinRoom => Self::JoinRoom(payload_as(name, payload)?),
            EventName::SendMessage => Self::SendMessage(payload_as(name, payload)?),
            EventName::Typing => Self::Typing(payload_as(name, payload)?),
            EventName::StopTyping => Self::StopTyping(payload_as(name, payload)?),
            EventName::RegisterUser => Self::RegisterUser(payload_as(name, payload)?),
            EventName::CheckOnline => Self::CheckOnline(payload_as(name, payload)?),
            other => return Err(ProtocolError::WrongDirection(other.as_str())),
        })
    }
}

/// Events the server delivers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// `receive_message(Message)`
    ReceiveMessage(Message),
    /// `typing(orderId)`
    Typing(OrderId),
    /// `stop_typing(orderId)`
    StopTyping(OrderId),
    /// `user_online(userId)`
    UserOnline(UserId),
    /// `user_offline(userId)`
    UserOffline(UserId),
    /// `is_online_response {userId, isOnline}`
    IsOnlineResponse(PresenceReply),
}

impl Inbound {
    /// Event name of this variant.
    pub fn name(&self) -> EventName {
        match self {
            Self::ReceiveMessage(_) => EventName::ReceiveMessage,
            Self::Typing(_) => EventName::Typing,
            Self::StopTyping(_) => EventName::StopTyping,
            Self::UserOnline(_) => EventName::UserOnline,
            Self::UserOffline(_) => EventName::UserOffline,
            Self::IsOnlineResponse(_) => EventName::IsOnlineResponse,
        }
    }

    /// Encode to a text frame. Used by the simulation server.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Encode`] if the payload cannot be serialized.
    pub fn encode(&self) -> Result<String> {
        let name = self.name();
        match self {
            Self::ReceiveMessage(message) => encode_frame(name, message),
            Self::Typing(room) | Self::StopTyping(room) => encode_frame(name, room),
            Self::UserOnline(user) | Self::UserOffline(user) => encode_frame(name, user),
            Self::IsOnlineResponse(reply) => encode_frame(name, reply),
        }
    }

    /// Decode a frame the server sent.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolError`] for malformed frames, unknown or
    /// client-only events, and payloads of the wrong shape.
    pub fn decode(text: &str) -> Result<Self> {
        let (name, payload) = split_frame(text)?;
        Ok(match name {
            EventName::ReceiveMessage => Self::ReceiveMessage(payload_as(name, payload)?),
            EventName::Typing => Self::Typing(payload_as(name, payload)?),
            EventName::StopTyping => Self::StopTyping(payload_as(name, payload)?),
            EventName::UserOnline => Self::UserOnline(payload_as(name, payload)?),
            EventName::UserOffline => Self::UserOffline(payload_as(name, payload)?),
            EventName::IsOnlineResponse => Self::IsOnlineResponse(payload_as(name, payload)?),
            other => return Err(ProtocolError::WrongDirection(other.as_str())),
        })
    }
}

fn encode_frame<T: Serialize>(name: EventName, payload: &T) -> Result<String> {
    serde_json::to_string(&(name.as_str(), payload))
        .map_err(|err| ProtocolError::Encode(err.to_string()))
}

fn split_frame(text: &str) -> Result<(EventName, Value)> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Array(mut parts) = value else {
        return Err(ProtocolError::Malformed("frame is not an array".into()));
    };
    if parts.len() != 2 {
        return Err(ProtocolError::Arity(parts.len()));
    }

    let payload = parts.pop().unwrap_or(Value::Null);
    let name = match parts.pop() {
        Some(Value::String(name)) => name,
        _ => return Err(ProtocolError::Malformed("event name is not a string".into())),
    };
    let event = EventName::from_wire(&name).ok_or(ProtocolError::UnknownEvent(name))?;

    Ok((event, payload))
}

fn payload_as<T: DeserializeOwned>(name: EventName, payload: Value) -> Result<T> {
    serde_json::from_value(payload).map_err(|err| ProtocolError::InvalidPayload {
        event: name.as_str(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_wire_spelling() {
        for name in EventName::ALL {
            assert_eq!(EventName::from_wire(name.as_str()), Some(name));
        }
        assert_eq!(EventName::from_wire("connect"), None);
    }

    #[test]
    fn join_room_frame() {
        let frame = Outbound::JoinRoom(OrderId::from("order-123")).encode().unwrap();
        insta::assert_snapshot!(frame, @r#"["join_room","order-123"]"#);
    }

    #[test]
    fn presence_reply_frame() {
        let reply = Inbound::IsOnlineResponse(PresenceReply {
            user_id: UserId::from("asha"),
            is_online: true,
        });
        insta::assert_snapshot!(reply.encode().unwrap(), @r#"["is_online_response",{"userId":"asha","isOnline":true}]"#);
    }

    #[test]
    fn typing_decodes_in_both_directions() {
        let frame = r#"["typing","order-123"]"#;
        assert_eq!(Inbound::decode(frame).unwrap(), Inbound::Typing(OrderId::from("order-123")));
        assert_eq!(Outbound::decode(frame).unwrap(), Outbound::Typing(OrderId::from("order-123")));
    }

    #[test]
    fn receive_message_decodes_history_shape() {
        let frame = r#"["receive_message",{"room":"order-123","senderId":{"_id":"asha"},"message":"Is it fresh?","time":"10:00"}]"#;
        let Inbound::ReceiveMessage(msg) = Inbound::decode(frame).unwrap() else {
            panic!("expected receive_message");
        };
        assert!(msg.is_from(&UserId::from("asha")));
        assert_eq!(msg.room, Some(OrderId::from("order-123")));
    }

    #[test]
    fn decode_errors_are_typed() {
        assert!(matches!(Inbound::decode("not json"), Err(ProtocolError::Malformed(_))));
        assert!(matches!(Inbound::decode(r#"{"a":1}"#), Err(ProtocolError::Malformed(_))));
        assert_eq!(Inbound::decode(r#"["typing"]"#), Err(ProtocolError::Arity(1)));
        assert!(matches!(Inbound::decode(r#"[1,"x"]"#), Err(ProtocolError::Malformed(_))));
        assert_eq!(
            Inbound::decode(r#"["disconnect","x"]"#),
            Err(ProtocolError::UnknownEvent("disconnect".into()))
        );
        assert_eq!(
            Inbound::decode(r#"["join_room","order-1"]"#),
            Err(ProtocolError::WrongDirection("join_room"))
        );
        assert!(matches!(
            Inbound::decode(r#"["user_online",42]"#),
            Err(ProtocolError::InvalidPayload { event: "user_online", .. })
        ));
    }

    #[test]
    fn server_only_events_rejected_from_clients() {
        assert_eq!(
            Outbound::decode(r#"["user_offline","raj"]"#),
            Err(ProtocolError::WrongDirection("user_offline"))
        );
    }
}
