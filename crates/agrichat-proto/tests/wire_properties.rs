//! Property-based tests for the frame codec and message ownership
//!
//! Frames come off the network, so the decoder must reject garbage with a typed
//! error instead of panicking. Ownership must be the same answer whichever
//! shape the sender reference arrived in.

use agrichat_proto::{Inbound, Message, Outbound, ProtocolError, UserId};
use proptest::prelude::*;

fn arbitrary_user() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,24}"
}

/// Sender reference in each shape the backend produces, all naming `user`.
fn sender_shapes(user: &str) -> Vec<serde_json::Value> {
    vec![
        serde_json::json!({ "authorId": user, "message": "x" }),
        serde_json::json!({ "senderId": user, "message": "x" }),
        serde_json::json!({ "senderId": { "_id": user }, "message": "x" }),
        serde_json::json!({ "senderId": { "id": user, "name": "n" }, "message": "x" }),
    ]
}

#[test]
fn prop_decoder_never_panics_on_arbitrary_text() {
    proptest!(|(text in ".{0,256}")| {
        let _ = Inbound::decode(&text);
        let _ = Outbound::decode(&text);
    });
}

#[test]
fn prop_unknown_event_names_rejected() {
    proptest!(|(name in "[a-z_]{1,20}", payload in "[a-z0-9]{0,10}")| {
        prop_assume!(agrichat_proto::EventName::from_wire(&name).is_none());

        let frame = serde_json::json!([name, payload]).to_string();
        prop_assert_eq!(Inbound::decode(&frame), Err(ProtocolError::UnknownEvent(name)));
    });
}

#[test]
fn prop_wrong_arity_rejected() {
    proptest!(|(extra in prop::collection::vec("[a-z]{0,5}", 0..6))| {
        prop_assume!(extra.len() != 2);

        let frame = serde_json::to_string(&extra).unwrap();
        prop_assert_eq!(Inbound::decode(&frame), Err(ProtocolError::Arity(extra.len())));
    });
}

#[test]
fn prop_ownership_independent_of_sender_shape() {
    proptest!(|(me in arbitrary_user(), other in arbitrary_user())| {
        prop_assume!(me != other);
        let me = UserId::new(me);
        let other = UserId::new(other);

        for shape in sender_shapes(me.as_str()) {
            let msg: Message = serde_json::from_value(shape).unwrap();
            prop_assert!(msg.is_from(&me));
            prop_assert!(!msg.is_from(&other));
        }
    });
}

#[test]
fn prop_live_message_survives_the_wire() {
    proptest!(|(room in "[a-z0-9-]{1,16}", author in arbitrary_user(), body in ".{0,64}")| {
        let msg = Message {
            room: Some(room.as_str().into()),
            author_id: Some(UserId::new(author.clone())),
            message: body,
            time: Some("10:00".into()),
            ..Message::default()
        };

        let frame = Outbound::SendMessage(msg.clone()).encode().unwrap();
        let relayed = frame.replacen("send_message", "receive_message", 1);

        prop_assert_eq!(Inbound::decode(&relayed).unwrap(), Inbound::ReceiveMessage(msg));
    });
}
