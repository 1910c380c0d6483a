//! Client
//!
//! Action-based chat client for order-scoped conversations between a farmer
//! and a customer.
//!
//! # Architecture
//!
//! The client follows the sans-IO pattern of [`agrichat_core`]. It receives
//! events ([`ClientEvent`]), processes them through pure state machine logic,
//! and returns actions ([`ClientAction`]) for the caller to execute.
//!
//! # Components
//!
//! - [`ChatClient`]: top-level state machine owning the transport
//! - [`Directory`]: candidate orders, navigation and the selected conversation
//! - [`Session`]: one conversation (history, live messages, typing, presence)
//! - [`PanelView`]: render snapshot for front-ends
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides
//! [`transport::connect`], a WebSocket connection exposed as a pair of
//! channels.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod client;
mod config;
pub mod directory;
mod error;
mod event;
pub mod session;
pub mod view;

#[cfg(feature = "transport")]
pub mod transport;

pub use agrichat_core::{ConnectionState, Environment};
pub use client::ChatClient;
pub use config::{ClientConfig, DEFAULT_TYPING_TIMEOUT, SessionConfig};
pub use directory::{Directory, Screen};
pub use error::FetchError;
pub use event::{ClientAction, ClientEvent};
pub use session::{Session, SessionChange, SessionPhase};
pub use view::{ChatLine, ChatView, OrderLine, PanelView};
