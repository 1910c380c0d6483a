//! Terminal UI for AgriChat
//!
//! A thin shell over [`agrichat_app::Driver`] that provides terminal-specific
//! I/O. All orchestration logic lives in the generic [`agrichat_app::Runtime`].
//!
//! This crate only handles key input and terminal rendering.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod input;
pub mod terminal;
pub mod ui;

pub use agrichat_app::{Driver, Intent, Runtime};
pub use input::{InputState, KeyInput};
pub use terminal::{TerminalDriver, TerminalError};
