//! Chat message model.
//!
//! A [`Message`] arrives through two paths with different shapes: live
//! `receive_message` events carry the `authorId` stamped by the sending client,
//! while persisted history carries a `senderId` that the backend may or may not
//! have expanded into an embedded user object. Both shapes deserialize into the
//! same struct; [`UserRef::id`] normalizes the sender reference once so
//! ownership checks never inspect the shape again.

use chrono::{DateTime, FixedOffset, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{OrderId, UserId};

/// Reference to a user that is either a bare id or an embedded user object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserRef {
    /// Bare identifier.
    Id(UserId),
    /// Embedded user document. Only the identifier is retained.
    Embedded {
        /// Database object id (`_id`).
        #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
        object_id: Option<UserId>,
        /// Virtual `id` field some serializers add.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<UserId>,
    },
}

impl UserRef {
    /// Canonical identifier regardless of shape. `None` for an embedded object
    /// that carries neither `_id` nor `id`.
    pub fn id(&self) -> Option<&UserId> {
        match self {
            Self::Id(id) => Some(id),
            Self::Embedded { object_id, id } => object_id.as_ref().or(id.as_ref()),
        }
    }
}

impl From<UserId> for UserRef {
    fn from(id: UserId) -> Self {
        Self::Id(id)
    }
}

/// One chat line.
///
/// At least one of `time` and `timestamp` is present on well-formed messages;
/// `time` wins for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Server-assigned id. Present on persisted history.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Client-generated id, used to recognise our own messages echoed back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Order the message belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<OrderId>,

    /// Sender id stamped by the sending client (live path).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<UserId>,

    /// Sender reference as returned by history (persisted path).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<UserRef>,

    /// Intended recipient, used by the server for routing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_id: Option<UserRef>,

    /// Body text.
    #[serde(default)]
    pub message: String,

    /// Short local time, e.g. `10:05`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,

    /// ISO-8601 instant, e.g. `2024-01-01T10:05:00.000Z`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Message {
    /// Build an outgoing message stamped with both display time and ISO
    /// timestamp.
    pub fn outgoing(
        room: OrderId,
        author: UserId,
        receiver: UserId,
        body: impl Into<String>,
        sent_at: DateTime<FixedOffset>,
        client_id: String,
    ) -> Self {
        Self {
            id: None,
            client_id: Some(client_id),
            room: Some(room),
            author_id: Some(author),
            sender_id: None,
            receiver_id: Some(UserRef::Id(receiver)),
            message: body.into(),
            time: Some(sent_at.format("%H:%M").to_string()),
            timestamp: Some(sent_at.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }

    /// Normalized sender id from the persisted `senderId` field.
    pub fn sender(&self) -> Option<&UserId> {
        self.sender_id.as_ref().and_then(UserRef::id)
    }

    /// Whether `user` wrote this message.
    ///
    /// Checks both `authorId` and the normalized `senderId`, because live
    /// events and fetched history populate different fields.
    pub fn is_from(&self, user: &UserId) -> bool {
        self.author_id.as_ref() == Some(user) || self.sender() == Some(user)
    }

    /// Whether the message carries any time information.
    pub fn has_time(&self) -> bool {
        self.time.is_some() || self.timestamp.is_some()
    }

    /// Whether `other` is the same logical message (matching client id or
    /// server id).
    pub fn is_duplicate_of(&self, other: &Message) -> bool {
        let same_client =
            matches!((&self.client_id, &other.client_id), (Some(a), Some(b)) if a == b);
        let same_server = matches!((&self.id, &other.id), (Some(a), Some(b)) if a == b);
        same_client || same_server
    }

    /// Display time in the local time zone.
    pub fn display_time(&self) -> String {
        self.display_time_in(&chrono::Local)
    }

    /// Display time: `time` if set, else `timestamp` rendered as `HH:MM` in
    /// `tz`, else empty.
    pub fn display_time_in<Tz: TimeZone>(&self, tz: &Tz) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        if let Some(time) = self.time.as_deref().filter(|t| !t.is_empty()) {
            return time.to_owned();
        }

        self.timestamp
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|at| at.with_timezone(tz).format("%H:%M").to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn me() -> UserId {
        UserId::from("farmer-1")
    }

    #[test]
    fn live_message_owned_by_author_id() {
        let json = r#"{"room":"order-123","authorId":"farmer-1","message":"hi","time":"10:00"}"#;
        let msg: Message = serde_json::from_str(json).unwrap();

        assert!(msg.is_from(&me()));
        assert!(!msg.is_from(&UserId::from("asha")));
    }

    #[test]
    fn history_message_with_flat_sender_id() {
        let json = r#"{"_id":"m1","senderId":"farmer-1","message":"hi","timestamp":"2024-01-01T10:00:00Z"}"#;
        let msg: Message = serde_json::from_str(json).unwrap();

        assert_eq!(msg.sender(), Some(&me()));
        assert!(msg.is_from(&me()));
    }

    #[test]
    fn history_message_with_embedded_sender() {
        let json = r#"{"senderId":{"_id":"farmer-1","name":"Green Acres"},"message":"hi"}"#;
        let msg: Message = serde_json::from_str(json).unwrap();

        assert_eq!(msg.sender(), Some(&me()));
        assert!(msg.is_from(&me()));
    }

    #[test]
    fn embedded_sender_falls_back_to_virtual_id() {
        let json = r#"{"senderId":{"id":"farmer-1"},"message":"hi"}"#;
        let msg: Message = serde_json::from_str(json).unwrap();

        assert!(msg.is_from(&me()));
    }

    #[test]
    fn embedded_sender_without_id_is_nobody() {
        let json = r#"{"senderId":{"name":"ghost"},"message":"hi"}"#;
        let msg: Message = serde_json::from_str(json).unwrap();

        assert_eq!(msg.sender(), None);
        assert!(!msg.is_from(&me()));
    }

    #[test]
    fn display_time_prefers_short_time() {
        let msg = Message {
            time: Some("09:15".into()),
            timestamp: Some("2024-01-01T10:00:00Z".into()),
            ..Message::default()
        };
        assert_eq!(msg.display_time_in(&Utc), "09:15");
    }

    #[test]
    fn display_time_falls_back_to_timestamp() {
        let msg = Message { timestamp: Some("2024-01-01T10:05:00Z".into()), ..Message::default() };
        assert_eq!(msg.display_time_in(&Utc), "10:05");

        let bare = Message::default();
        assert_eq!(bare.display_time_in(&Utc), "");
    }

    #[test]
    fn outgoing_message_stamps_both_times() {
        let sent_at = DateTime::parse_from_rfc3339("2024-01-01T12:30:00+02:00").unwrap();
        let msg = Message::outgoing(
            OrderId::from("order-123"),
            me(),
            UserId::from("asha"),
            "Thanks",
            sent_at,
            "c-1".into(),
        );

        assert_eq!(msg.time.as_deref(), Some("12:30"));
        assert_eq!(msg.timestamp.as_deref(), Some("2024-01-01T10:30:00.000Z"));
        assert_eq!(msg.receiver_id.as_ref().and_then(UserRef::id), Some(&UserId::from("asha")));
        assert!(msg.is_from(&me()));
    }

    #[test]
    fn duplicates_match_on_client_or_server_id() {
        let a = Message { client_id: Some("c-1".into()), ..Message::default() };
        let b = Message { client_id: Some("c-1".into()), id: Some("m-9".into()), ..Message::default() };
        let c = Message { id: Some("m-9".into()), ..Message::default() };
        let d = Message::default();

        assert!(a.is_duplicate_of(&b));
        assert!(b.is_duplicate_of(&c));
        assert!(!a.is_duplicate_of(&c));
        assert!(!d.is_duplicate_of(&d.clone()));
    }
}
