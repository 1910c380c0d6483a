//! Core of the AgriChat client
//!
//! Sans-IO building blocks shared by the chat client and the simulation
//! harness. Nothing in this crate performs I/O: methods take the current time
//! as input and return actions (or queue frames) for a driver to execute.
//!
//! # Components
//!
//! - [`env::Environment`]: time and randomness, real or simulated
//! - [`connection::Connection`]: connect/reconnect state machine with backoff
//! - [`subscriptions::Subscriptions`]: per-event subscriber registry
//! - [`transport::Transport`]: the shared connection handle components emit
//!   through and subscribe on

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod connection;
pub mod env;
pub mod error;
pub mod subscriptions;
pub mod transport;

pub use connection::{Connection, ConnectionAction, ConnectionConfig, ConnectionState};
pub use env::{Environment, Timestamp};
pub use error::ConnectionError;
pub use subscriptions::{SubscriptionId, Subscriptions};
pub use transport::{Delivery, Transport};
