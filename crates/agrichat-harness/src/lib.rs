//! Deterministic simulation harness for AgriChat.
//!
//! In-memory implementations of the environment, the messaging server, the
//! storefront backend and the I/O driver, so the production
//! [`agrichat_app::Runtime`] can be exercised end to end with a virtual clock
//! and a seeded RNG.
//!
//! # Invariant Testing
//!
//! The `invariants` module checks behavioral properties of every client after
//! each simulation step. Use [`InvariantRegistry::standard()`] for the chat
//! invariants.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod invariants;
pub mod scenario;
pub mod sim_backend;
pub mod sim_driver;
pub mod sim_env;
pub mod sim_server;

pub use invariants::{
    ClientSnapshot, Invariant, InvariantRegistry, InvariantResult, MessagesScopedToRoom,
    SelectedOrderPresent, SessionSnapshot, SubscriptionBalance, SystemSnapshot,
    TypingTimerConsistency, Violation,
};
pub use scenario::{Participant, SimRuntime, SimWorld};
pub use sim_backend::SimBackend;
pub use sim_driver::{SimDriver, SimDriverError};
pub use sim_env::SimEnv;
pub use sim_server::{ConnId, SharedSimServer, SimServer, create_shared_server};
