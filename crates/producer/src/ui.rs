//! A toolkit-independent model of the chat panel.
//!
//! [`ChatView`] turns manager events into a list of artifacts and tells the
//! renderer what changed; [`ScrollTracker`] decides whether the view keeps
//! following new content.

mod chat_view;
mod scroll;

pub use chat_view::{Artifact, ChatView, THINKING_BUDGET, ViewChange};
pub use scroll::{BOTTOM_THRESHOLD, PROGRAMMATIC_LATCH, ScrollTracker};
