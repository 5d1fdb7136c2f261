use std::pin::Pin;
use std::task::{self, Poll};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::provider::ModelProviderError;

/// A streaming response from the model provider.
pub trait ModelResponse: Sized + Send + 'static {
    /// The error type that may be returned by the provider.
    type Error: ModelProviderError;

    /// Attempts to pull out the next event from the response.
    ///
    /// # Return value
    ///
    /// There are several possible return values, each indicating a
    /// distinct response state:
    ///
    /// - `Poll::Pending` means that this response is still waiting for
    ///   the next event. Implementations will ensure that the current
    ///   task will be notified when the next event may be ready.
    /// - `Poll::Ready(Ok(Some(event)))` means the response has an event
    ///   to deliver, and may produce further events on subsequent
    ///   `poll_next_event` calls.
    /// - `Poll::Ready(Ok(None))` means the response has completed.
    /// - `Poll::Ready(Err(error))` means the transport failed. No more
    ///   events will be produced.
    ///
    /// Tool calls are only delivered once the stream has ended, because
    /// their arguments arrive as fragments of JSON text. Calling this
    /// method after completion should always return `None`.
    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>>;
}

/// The reason why a model response has finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelFinishReason {
    /// The model needs to call a tool.
    ToolCalls,
    /// The model has finished generating text.
    Stop,
}

/// Describes a tool call request from the model.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// The unique identifier for the tool call request, assigned by the
    /// server.
    pub id: String,
    /// The name of the tool to call.
    pub name: String,
    /// The raw argument text, exactly as the model streamed it.
    pub arguments: String,
}

impl ToolCallRequest {
    /// Parses the raw argument text into a JSON object.
    ///
    /// Empty, malformed or non-object arguments yield an empty object, so
    /// that the tool can report the missing parameters itself.
    pub fn parse_arguments(&self) -> Value {
        match serde_json::from_str::<Value>(&self.arguments) {
            Ok(Value::Object(map)) => Value::Object(map),
            _ => Value::Object(Map::new()),
        }
    }
}

/// The event from a model response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelResponseEvent {
    /// The response has been completed.
    Completed(ModelFinishReason),
    /// Received a content delta.
    MessageDelta(String),
    /// Received a reasoning ("thinking") delta.
    ThinkingDelta(String),
    /// A fully reassembled tool call request.
    ToolCall(ToolCallRequest),
    /// The server reported an error inside the stream. The stream itself
    /// stays open.
    ServerError(String),
}
