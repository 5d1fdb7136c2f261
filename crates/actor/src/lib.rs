//! A lightweight actor runtime.
//!
//! An actor owns its state on a Tokio task and handles messages one at a
//! time. Everything that touches the state goes through the mailbox, so
//! no locking is needed, and work done on other tasks reports back with
//! messages.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod error;
mod handle;
mod macros;
mod mailbox;
mod scheduler;

pub use error::ActorDeadError;
pub use handle::Actor;
pub use mailbox::Message;

#[cfg(test)]
mod tests {
    use super::*;

    define_actor! {
        /// This is a test actor.
        #[wrapper_type(TestActor)]
        #[derive(Default)]
        struct TestActorState {
            value: u32,
            log: Vec<&'static str>,
        }
    }

    #[derive(Debug)]
    struct AddMessage(u32);

    impl Message<TestActorState> for AddMessage {
        fn handle(
            self,
            state: &mut TestActorState,
            _handle: &Actor<TestActorState>,
        ) {
            state.value += self.0;
        }
    }

    #[derive(Debug)]
    struct Ping(u32);

    impl Message<TestActorState> for Ping {
        fn handle(
            self,
            state: &mut TestActorState,
            handle: &Actor<TestActorState>,
        ) {
            state.log.push("ping");
            if self.0 > 0 {
                // Re-entry goes to the back of the mailbox.
                handle.send(Ping(self.0 - 1)).unwrap();
            }
        }
    }

    #[tokio::test]
    async fn test_send_message() {
        let actor = TestActor::spawn(TestActorState::default(), None);
        actor.handle().send(AddMessage(42)).unwrap();

        let value = actor.handle().ask(|state| state.value).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_messages_sent_from_handlers() {
        let actor = TestActor::spawn(TestActorState::default(), None);
        actor.handle().send(Ping(2)).unwrap();
        actor.handle().send(AddMessage(1)).unwrap();

        // The query lands between the first ping and its follow-ups.
        let log = actor.handle().ask(|state| state.log.clone()).await;
        assert_eq!(log.unwrap(), ["ping"]);

        tokio::task::yield_now().await;
        let log = actor.handle().ask(|state| state.log.len()).await;
        assert_eq!(log.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_kill() {
        let actor = TestActor::spawn(TestActorState::default(), Some("t"));
        actor.handle().try_kill();

        let result = actor.handle().ask(|state| state.value).await;
        assert_eq!(result, Err(ActorDeadError));
        assert!(actor.handle().is_dead());
    }
}
