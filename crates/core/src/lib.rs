//! Core logic of the producer assistant: the conversation loop, tools and
//! the host interface they act on, settings and events.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

pub mod event;
pub mod host;
mod manager;
mod model_client;
pub mod settings;
pub mod tool;
pub mod transcript;

pub use event::AgentEvent;
pub use manager::{
    BUSY, CANCELLED_TOOL_CALL, ConversationManager,
    ConversationManagerBuilder, NOT_CONFIGURED,
};
