//! Application layer for AgriChat
//!
//! Generic runtime that executes the chat client's actions against real or
//! simulated I/O, so the orchestration tested in simulation is the one that
//! runs in production.
//!
//! # Components
//!
//! - [`Driver`]: trait for platform-specific I/O (socket, input, rendering)
//! - [`Backend`]: trait for the storefront fetches (orders, history)
//! - [`Runtime`]: orchestration loop over a driver, a backend and a
//!   [`agrichat_client::ChatClient`]
//! - [`SystemEnv`]: production environment (system clock, OS RNG)
//! - `HttpBackend`: REST backend, behind the `http` feature

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod backend;
mod driver;
mod intent;
mod runtime;
mod system_env;

#[cfg(feature = "http")]
pub mod http;

pub use backend::Backend;
pub use driver::Driver;
pub use intent::Intent;
pub use runtime::{Runtime, RuntimeConfig};
pub use system_env::SystemEnv;
