//! A local scripted model for testing purpose.

mod preset;

use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use producer_model::{
    ErrorKind, ModelFinishReason, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, ModelResponseEvent,
};
use tokio::time::{Sleep, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub struct TestModelResponse {
    events: Vec<PresetEvent>,
    delay: Duration,
    event_idx: usize,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl TestModelResponse {
    fn finish_reason(&self) -> ModelFinishReason {
        let has_tool_call = self
            .events
            .iter()
            .any(|event| matches!(event, PresetEvent::ToolCall(_)));
        if has_tool_call {
            ModelFinishReason::ToolCalls
        } else {
            ModelFinishReason::Stop
        }
    }
}

impl ModelResponse for TestModelResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        // SAFETY: This type does not require to be pinned.
        let this = unsafe { self.get_unchecked_mut() };

        if let Some(sleep) = &mut this.sleep {
            ready!(sleep.as_mut().poll(cx));
            this.sleep = None;

            if this.event_idx < this.events.len() {
                let event = match &this.events[this.event_idx] {
                    PresetEvent::MessageDelta(msg) => {
                        ModelResponseEvent::MessageDelta(msg.clone())
                    }
                    PresetEvent::ThinkingDelta(msg) => {
                        ModelResponseEvent::ThinkingDelta(msg.clone())
                    }
                    PresetEvent::ToolCall(req) => {
                        ModelResponseEvent::ToolCall(req.clone())
                    }
                    PresetEvent::ServerError(msg) => {
                        ModelResponseEvent::ServerError(msg.clone())
                    }
                    PresetEvent::StreamError(msg) => {
                        this.event_idx = usize::MAX;
                        return Poll::Ready(Err(Error {
                            message: msg.clone(),
                            kind: ErrorKind::Network,
                        }));
                    }
                    PresetEvent::Hang => return Poll::Pending,
                };
                this.event_idx += 1;
                return Poll::Ready(Ok(Some(event)));
            } else if this.event_idx == this.events.len() {
                this.event_idx += 1;
                return Poll::Ready(Ok(Some(ModelResponseEvent::Completed(
                    this.finish_reason(),
                ))));
            } else {
                // In case this method is called after completion.
                return Poll::Ready(Ok(None));
            }
        }
        this.sleep = Some(Box::pin(sleep(this.delay)));
        Pin::new(this).poll_next_event(cx)
    }
}

#[derive(Default)]
struct Script {
    steps: Vec<PresetResponse>,
    served: usize,
    requests: Vec<ModelRequest>,
}

/// A local scripted model for testing purpose.
///
/// Responses are served in the order they were added, one per request,
/// no matter what the request contains. Clones share the same script, so
/// a test can keep a handle to inspect the requests the code under test
/// has sent. Once the script is exhausted, requests fail.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    script: Arc<Mutex<Script>>,
    delay: Option<Duration>,
}

impl TestModelProvider {
    #[inline]
    pub fn add_response(&self, preset: PresetResponse) {
        self.script.lock().unwrap().steps.push(preset);
    }

    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns the requests received so far.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.script.lock().unwrap().requests.clone()
    }
}

impl Debug for TestModelProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestModelProvider")
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;
    type Response = TestModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let mut script = self.script.lock().unwrap();
        script.requests.push(req.clone());
        let step = script.steps.get(script.served).cloned();
        script.served += 1;

        let result = match step {
            None => Err(Error {
                message: "no more scripted responses".to_owned(),
                kind: ErrorKind::Other,
            }),
            Some(PresetResponse {
                failure: Some(message),
                ..
            }) => Err(Error {
                message,
                kind: ErrorKind::Network,
            }),
            Some(PresetResponse { events, .. }) => Ok(TestModelResponse {
                events,
                delay: self.delay.unwrap_or(Duration::from_millis(1)),
                event_idx: 0,
                sleep: None,
            }),
        };
        ready(result)
    }
}
