//! Protocol-neutral types shared by the conversation manager and the
//! model providers.
//!
//! The conversation manager only ever talks to a model through these
//! types, so a provider speaking a different wire protocol (or a scripted
//! fake one in tests) can be plugged in without touching the core.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
