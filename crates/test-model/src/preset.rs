use producer_model::ToolCallRequest;
use serde::{Deserialize, Serialize};

/// The events in a preset response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetEvent {
    #[serde(rename = "message_delta")]
    MessageDelta(String),
    #[serde(rename = "thinking_delta")]
    ThinkingDelta(String),
    #[serde(rename = "tool_call")]
    ToolCall(ToolCallRequest),
    /// An error record inside the stream; the stream continues.
    #[serde(rename = "server_error")]
    ServerError(String),
    /// The transport breaks; no more events follow.
    #[serde(rename = "stream_error")]
    StreamError(String),
    /// The stream stalls forever.
    #[serde(rename = "hang")]
    Hang,
}

/// The preset response for an assistant step.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Events in this response.
    pub events: Vec<PresetEvent>,
    /// If set, the request itself fails with this message, as if the
    /// server could not be reached.
    pub failure: Option<String>,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified events.
    #[inline]
    pub fn with_events(events: impl Into<Vec<PresetEvent>>) -> Self {
        Self {
            events: events.into(),
            failure: None,
        }
    }

    /// Creates a response whose request fails before streaming starts.
    #[inline]
    pub fn with_failure(message: impl Into<String>) -> Self {
        Self {
            events: vec![],
            failure: Some(message.into()),
        }
    }

    /// Creates a text-only response streamed as the given deltas.
    pub fn text<I, S>(deltas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_events(
            deltas
                .into_iter()
                .map(|delta| PresetEvent::MessageDelta(delta.into()))
                .collect::<Vec<_>>(),
        )
    }
}

/// Shorthand for a [`PresetEvent::ToolCall`].
pub fn tool_call(id: &str, name: &str, arguments: &str) -> PresetEvent {
    PresetEvent::ToolCall(ToolCallRequest {
        id: id.to_owned(),
        name: name.to_owned(),
        arguments: arguments.to_owned(),
    })
}
