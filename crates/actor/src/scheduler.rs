use std::sync::Weak;

use tokio::select;
use tokio::sync::{mpsc, watch};

use crate::mailbox::Mailbox;
use crate::{Actor, Message};

pub async fn run_actor<S: Send + 'static>(
    mailbox: Weak<Mailbox<S>>,
    mut state: S,
    mut msg_rx: mpsc::UnboundedReceiver<Box<dyn Message<S>>>,
    mut kill_rx: watch::Receiver<bool>,
) {
    debug!("started");
    loop {
        let msg = select! {
            biased;

            _ = kill_rx.changed() => {
                debug!("killed");
                break;
            }
            msg = msg_rx.recv() => {
                let Some(msg) = msg else {
                    break;
                };
                msg
            }
        };
        trace!("received message: {msg:?}");

        let Some(mailbox) = mailbox.upgrade() else {
            debug!("all handles dropped, discarding the message");
            break;
        };
        trace_span!("proc msg").in_scope(|| {
            msg.handle(&mut state, &Actor::from_mailbox(mailbox));
        });
    }
    // Pending senders learn the actor is gone.
    msg_rx.close();
    debug!("terminated");
}
