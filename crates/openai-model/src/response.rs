use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use pin_project_lite::pin_project;
use producer_model::{
    ErrorKind, ModelFinishReason, ModelResponse, ModelResponseEvent,
    ToolCallRequest,
};
use serde_json::Value;

use crate::Error;
use crate::io::Sse;
use crate::proto::{ChatCompletionChunk, ToolCallDelta};

/// A tool call being reassembled from its streamed fragments.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct ToolCallSlot {
    id: String,
    name: String,
    arguments: String,
}

struct PartialState {
    sse: Sse,
    // Indexed by the server-assigned tool call index.
    tool_calls: Vec<ToolCallSlot>,
    pending_events: VecDeque<ModelResponseEvent>,
    finished: bool,
}

impl PartialState {
    fn apply_record(&mut self, record: &str) {
        let value = match serde_json::from_str::<Value>(record) {
            Ok(value @ Value::Object(_)) => value,
            Ok(_) => {
                warn!("skipping non-object record: {record}");
                return;
            }
            Err(err) => {
                warn!("skipping malformed record: {err}");
                return;
            }
        };

        if let Some(error) = value.get("error").filter(|e| !e.is_null()) {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .map(ToOwned::to_owned)
                .unwrap_or_else(|| error.to_string());
            self.pending_events
                .push_back(ModelResponseEvent::ServerError(message));
            return;
        }

        let chunk = match serde_json::from_value::<ChatCompletionChunk>(value) {
            Ok(chunk) => chunk,
            Err(err) => {
                warn!("skipping unrecognized record: {err}");
                return;
            }
        };
        let Some(choice) = chunk.choices.into_iter().next() else {
            return;
        };
        let delta = choice.delta;

        if let Some(content) = delta.content.filter(|s| !s.is_empty()) {
            self.pending_events
                .push_back(ModelResponseEvent::MessageDelta(content));
        }
        let thinking = delta
            .reasoning
            .filter(|s| !s.is_empty())
            .or(delta.thinking.filter(|s| !s.is_empty()));
        if let Some(thinking) = thinking {
            self.pending_events
                .push_back(ModelResponseEvent::ThinkingDelta(thinking));
        }
        for fragment in delta.tool_calls.into_iter().flatten() {
            self.patch_tool_call(fragment);
        }
    }

    fn patch_tool_call(&mut self, fragment: ToolCallDelta) {
        if self.tool_calls.len() <= fragment.index {
            self.tool_calls
                .resize_with(fragment.index + 1, Default::default);
        }
        let slot = &mut self.tool_calls[fragment.index];
        if let Some(id) = fragment.id.filter(|s| !s.is_empty()) {
            slot.id = id;
        }
        if let Some(function) = fragment.function {
            if let Some(name) = function.name.filter(|s| !s.is_empty()) {
                slot.name = name;
            }
            if let Some(arguments) = function.arguments {
                slot.arguments.push_str(&arguments);
            }
        }
    }

    /// Flushes the reassembled tool calls and the completion event.
    fn finish(&mut self) {
        self.finished = true;
        let reason = if self.tool_calls.is_empty() {
            ModelFinishReason::Stop
        } else {
            ModelFinishReason::ToolCalls
        };
        for slot in self.tool_calls.drain(..) {
            self.pending_events.push_back(ModelResponseEvent::ToolCall(
                ToolCallRequest {
                    id: slot.id,
                    name: slot.name,
                    arguments: slot.arguments,
                },
            ));
        }
        self.pending_events
            .push_back(ModelResponseEvent::Completed(reason));
    }
}

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextEvent = Result<(Option<ModelResponseEvent>, PartialState), Error>;

pin_project! {
    /// A streaming chat completion.
    pub struct OpenAIResponse {
        next_event_fut: Option<PinnedFuture<NextEvent>>,
    }
}

impl OpenAIResponse {
    #[inline]
    pub fn from_sse(sse: Sse) -> Self {
        let partial_state = PartialState {
            sse,
            tool_calls: Default::default(),
            pending_events: Default::default(),
            finished: false,
        };
        let next_event_fut = async move { next_event(partial_state).await };
        Self {
            next_event_fut: Some(Box::pin(next_event_fut)),
        }
    }
}

impl ModelResponse for OpenAIResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.project();
        let Some(next_event_fut) = this.next_event_fut else {
            return Poll::Ready(Ok(None));
        };
        let (event, partial_state) =
            match ready!(next_event_fut.as_mut().poll(cx)) {
                Ok((Some(event), partial_state)) => (event, partial_state),
                Ok((None, _)) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Ok(None));
                }
                Err(err) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Err(err));
                }
            };

        let next_event_fut = async move { next_event(partial_state).await };
        *this.next_event_fut = Some(Box::pin(next_event_fut));

        Poll::Ready(Ok(Some(event)))
    }
}

async fn next_event(mut partial_state: PartialState) -> NextEvent {
    loop {
        if let Some(event) = partial_state.pending_events.pop_front() {
            return Ok((Some(event), partial_state));
        }
        if partial_state.finished {
            return Ok((None, partial_state));
        }

        let record = match partial_state.sse.next_event().await {
            Ok(Some(record)) => record,
            Ok(None) => {
                partial_state.finish();
                continue;
            }
            Err(err) => {
                error!("stream broken: {err}");
                return Err(Error::new(err.to_string(), ErrorKind::Network));
            }
        };
        trace!("got sse record: {record}");
        if record == "[DONE]" {
            partial_state.finish();
            continue;
        }
        partial_state.apply_record(&record);
    }
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use bytes::Bytes;
    use producer_model::ModelProviderError;

    use super::*;
    use crate::io::{Chunks, ChunksError};

    async fn collect(
        chunks: Chunks,
    ) -> (Vec<ModelResponseEvent>, Option<Error>) {
        let mut resp = pin!(OpenAIResponse::from_sse(Sse::new(chunks)));
        let mut events = vec![];
        loop {
            match poll_fn(|cx| resp.as_mut().poll_next_event(cx)).await {
                Ok(Some(event)) => events.push(event),
                Ok(None) => return (events, None),
                Err(err) => return (events, Some(err)),
            }
        }
    }

    fn chunks_of(parts: &[&'static str]) -> Chunks {
        Chunks::from_vec_deque(
            parts
                .iter()
                .map(|s| Bytes::from_static(s.as_bytes()))
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_fixture_stream() {
        let chunks = Chunks::from_vec_deque(
            vec![Bytes::from_static(include_bytes!(
                "../fixtures/test_response.txt"
            ))]
            .into(),
        );
        let (events, err) = collect(chunks).await;
        assert!(err.is_none());

        let content: String = events
            .iter()
            .filter_map(|e| match e {
                ModelResponseEvent::MessageDelta(s) => Some(s.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(content, "Let me check the project first.");

        let tool_calls: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                ModelResponseEvent::ToolCall(req) => Some(req.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(tool_calls.len(), 2);
        assert_eq!(tool_calls[0].name, "get_tempo");
        assert_eq!(tool_calls[0].id, "call_a");
        assert_eq!(tool_calls[1].name, "list_tracks");
        assert_eq!(tool_calls[1].arguments, "{}");
        assert_eq!(
            events.last(),
            Some(&ModelResponseEvent::Completed(ModelFinishReason::ToolCalls))
        );
    }

    #[tokio::test]
    async fn test_fragmented_arguments() {
        let chunks = chunks_of(&[
            "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\
             \"id\":\"call_1\",\"function\":{\"name\":\"set_tempo\",\
             \"arguments\":\"{\\\"bp\"}}]}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\
             \"function\":{\"arguments\":\"m\\\":12\"}}]}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\
             \"id\":\"\",\"function\":{\"name\":\"\",\"arguments\":\"8}\"}}]}}]}\n\n",
            "data: [DONE]\n\n",
        ]);
        let (events, err) = collect(chunks).await;
        assert!(err.is_none());
        assert_eq!(
            events,
            vec![
                ModelResponseEvent::ToolCall(ToolCallRequest {
                    id: "call_1".to_owned(),
                    name: "set_tempo".to_owned(),
                    arguments: r#"{"bpm":128}"#.to_owned(),
                }),
                ModelResponseEvent::Completed(ModelFinishReason::ToolCalls),
            ]
        );
    }

    #[tokio::test]
    async fn test_reasoning_and_content() {
        let chunks = chunks_of(&[
            "data: {\"choices\":[{\"delta\":{\"reasoning\":\"Hmm\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"thinking\":\", ok\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\",\
             \"reasoning\":\"\"}}]}\n\n",
            "data: {\"choices\":[]}\n\n",
        ]);
        let (events, err) = collect(chunks).await;
        assert!(err.is_none());
        assert_eq!(
            events,
            vec![
                ModelResponseEvent::ThinkingDelta("Hmm".to_owned()),
                ModelResponseEvent::ThinkingDelta(", ok".to_owned()),
                ModelResponseEvent::MessageDelta("Hi".to_owned()),
                ModelResponseEvent::Completed(ModelFinishReason::Stop),
            ]
        );
    }

    #[tokio::test]
    async fn test_bad_records_are_skipped() {
        let chunks = chunks_of(&[
            "data: {not json\n\n",
            "data: 42\n\n",
            "data: {\"choices\":\"nope\"}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\n",
            "data: [DONE]\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"late\"}}]}\n\n",
        ]);
        let (events, err) = collect(chunks).await;
        assert!(err.is_none());
        assert_eq!(
            events,
            vec![
                ModelResponseEvent::MessageDelta("ok".to_owned()),
                ModelResponseEvent::Completed(ModelFinishReason::Stop),
            ]
        );
    }

    #[tokio::test]
    async fn test_server_error_record() {
        let chunks = chunks_of(&[
            "data: {\"error\":{\"message\":\"Rate limit exceeded\"}}\n\n",
            "data: {\"error\":\"overloaded\"}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"still here\"}}]}\n\n",
        ]);
        let (events, err) = collect(chunks).await;
        assert!(err.is_none());
        assert_eq!(
            events,
            vec![
                ModelResponseEvent::ServerError(
                    "Rate limit exceeded".to_owned()
                ),
                ModelResponseEvent::ServerError("\"overloaded\"".to_owned()),
                ModelResponseEvent::MessageDelta("still here".to_owned()),
                ModelResponseEvent::Completed(ModelFinishReason::Stop),
            ]
        );
    }

    #[tokio::test]
    async fn test_transport_error() {
        let chunks = Chunks::from_results(
            vec![
                Ok(Bytes::from_static(
                    b"data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n\n",
                )),
                Err(ChunksError("connection reset".to_owned())),
            ]
            .into(),
        );
        let (events, err) = collect(chunks).await;
        assert_eq!(
            events,
            vec![ModelResponseEvent::MessageDelta("a".to_owned())]
        );
        let err = err.unwrap();
        assert_eq!(err.kind(), ErrorKind::Network);
        assert_eq!(err.message(), "connection reset");
    }
}
