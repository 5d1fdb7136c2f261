//! An out-of-the-box music producer assistant: built-in project tools, a
//! reference in-memory host, and a headless model of the chat panel.
//!
//! The crate includes a CLI tool for using in the terminal. And you can
//! also use it as a library to bring the assistant into your own host.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod host;
mod session;
pub mod tools;
pub mod ui;

pub use session::{SYSTEM_PROMPT, Session, SessionBuilder};

/// Re-exports of [`producer_core`] crate.
pub mod core {
    pub use producer_core::*;
}
