use std::fmt::{self, Debug};
use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::Instrument;

use crate::mailbox::{Mailbox, MailboxParts, Query};
use crate::scheduler::run_actor;
use crate::{ActorDeadError, Message};

/// Handle to an actor.
///
/// Handles are cheap to clone. The actor keeps running as long as at
/// least one handle is alive, or until it is killed.
pub struct Actor<S> {
    mailbox: Arc<Mailbox<S>>,
}

impl<S: Send + 'static> Actor<S> {
    /// Spawns a new actor with the specified state and an optional label.
    ///
    /// Must be called within a Tokio runtime. Prefer the spawn method
    /// generated by [`crate::define_actor`].
    pub fn spawn(state: S, label: Option<&str>) -> Self {
        let MailboxParts {
            mailbox,
            msg_rx,
            kill_rx,
        } = Mailbox::new();
        let mailbox = Arc::new(mailbox);
        tokio::spawn(
            run_actor(Arc::downgrade(&mailbox), state, msg_rx, kill_rx)
                .instrument(trace_span!("actor", label = label)),
        );
        Self { mailbox }
    }

    #[inline]
    pub(crate) fn from_mailbox(mailbox: Arc<Mailbox<S>>) -> Self {
        Self { mailbox }
    }

    /// Sends a message to the actor.
    #[inline]
    pub fn send<M: Message<S> + 'static>(
        &self,
        msg: M,
    ) -> Result<(), ActorDeadError> {
        self.mailbox.send(Box::new(msg))
    }

    /// Runs `f` on the actor's state, after every message sent before it,
    /// and resolves to its result.
    pub fn ask<R, F>(
        &self,
        f: F,
    ) -> impl Future<Output = Result<R, ActorDeadError>> + Send + 'static
    where
        R: Send + 'static,
        F: FnOnce(&mut S) -> R + Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        let sent = self.mailbox.send(Box::new(Query {
            f: Box::new(f),
            reply,
        }));
        async move {
            sent?;
            rx.await.map_err(|_| ActorDeadError)
        }
    }

    /// Returns whether the actor has stopped handling messages.
    #[inline]
    pub fn is_dead(&self) -> bool {
        self.mailbox.is_closed()
    }

    /// Attempts to kill the actor.
    ///
    /// The actor is not guaranteed to be killed immediately, but it
    /// will stop handling further messages and quit soon.
    #[inline]
    pub fn try_kill(&self) {
        self.mailbox.try_kill();
    }
}

impl<S> Clone for Actor<S> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            mailbox: Arc::clone(&self.mailbox),
        }
    }
}

impl<S> Debug for Actor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actor").finish_non_exhaustive()
    }
}
