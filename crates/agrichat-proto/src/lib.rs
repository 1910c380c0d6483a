//! Wire protocol for AgriChat
//!
//! Event names, payload types and the text-frame codec shared by the chat
//! client, the simulation server and the terminal front-end.
//!
//! # Frames
//!
//! Every frame is a JSON array `[event, payload]`. The event name selects the
//! payload type, so payloads carry no variant tag of their own. See
//! [`Outbound`] for events a client emits and [`Inbound`] for events the
//! server delivers.
//!
//! # Data model
//!
//! - [`Message`]: one chat line, in either its live or its persisted shape
//! - [`OrderSummary`]: an order eligible for chat, with its counterpart
//! - [`OrderListing`]: a listing that skips malformed orders
//! - [`OrderId`] / [`UserId`]: opaque backend identifiers

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod errors;
pub mod event;
pub mod ids;
pub mod message;
pub mod order;

pub use errors::{ProtocolError, Result};
pub use event::{EventName, Inbound, Outbound, PresenceReply};
pub use ids::{OrderId, UserId};
pub use message::{Message, UserRef};
pub use order::{
    Counterpart, FarmDetails, OrderItem, OrderListing, OrderSummary, PartyProfile, PartyRef,
    ProductDetails, ProductRef, Role,
};
