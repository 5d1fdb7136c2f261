use std::error::Error;
use std::fmt;

/// The actor has terminated, either because it was killed or because its
/// last handle was dropped. Messages sent to it are lost.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ActorDeadError;

impl fmt::Debug for ActorDeadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ActorDeadError")
    }
}

impl fmt::Display for ActorDeadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("the actor is no longer running")
    }
}

impl Error for ActorDeadError {}
