use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::task::{self, Poll, ready};
use std::time::Duration;

use producer_model::{
    ErrorKind, ModelFinishReason, ModelMessage, ModelProvider,
    ModelProviderError, ModelRequest, ModelResponse, ModelResponseEvent,
    ToolCallRequest,
};
use tokio::time::{Sleep, sleep};

#[derive(Debug)]
struct EchoProviderError(ErrorKind);

impl Display for EchoProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Error for EchoProviderError {}

impl ModelProviderError for EchoProviderError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

/// Echoes the last user message word by word, and asks for the tempo
/// tool whenever the user mentions it.
#[derive(Debug)]
struct EchoResponse {
    events: VecDeque<ModelResponseEvent>,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl EchoResponse {
    fn new(input: &str) -> Self {
        let mut events: VecDeque<_> =
            [ModelResponseEvent::ThinkingDelta("Echoing".to_owned())].into();
        let words: Vec<_> = format!("You said {input}")
            .split(' ')
            .map(ToString::to_string)
            .collect();
        let last = words.len() - 1;
        for (idx, mut word) in words.into_iter().enumerate() {
            if idx != last {
                word.push(' ');
            }
            events.push_back(ModelResponseEvent::MessageDelta(word));
        }
        let reason = if input.contains("tempo") {
            events.push_back(ModelResponseEvent::ToolCall(ToolCallRequest {
                id: "call_0".to_owned(),
                name: "get_tempo".to_owned(),
                arguments: "{}".to_owned(),
            }));
            ModelFinishReason::ToolCalls
        } else {
            ModelFinishReason::Stop
        };
        events.push_back(ModelResponseEvent::Completed(reason));
        Self {
            events,
            sleep: None,
        }
    }
}

impl ModelResponse for EchoResponse {
    type Error = EchoProviderError;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        // SAFETY: This type does not require to be pinned.
        let this = unsafe { self.get_unchecked_mut() };
        if let Some(sleep) = &mut this.sleep {
            ready!(sleep.as_mut().poll(cx));
            this.sleep = None;
            return Poll::Ready(Ok(this.events.pop_front()));
        }
        this.sleep = Some(Box::pin(sleep(Duration::from_millis(1))));
        Pin::new(this).poll_next_event(cx)
    }
}

struct EchoProvider;

impl ModelProvider for EchoProvider {
    type Error = EchoProviderError;
    type Response = EchoResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let input = req.messages.iter().rev().find_map(|msg| match msg {
            ModelMessage::User(text) => Some(text.clone()),
            _ => None,
        });
        let result = match input {
            Some(input) => Ok(EchoResponse::new(&input)),
            None => Err(EchoProviderError(ErrorKind::Other)),
        };
        ready(result)
    }
}

mod tests {
    use std::future::poll_fn;

    use super::*;

    async fn drain(
        mut resp: EchoResponse,
    ) -> (String, String, Vec<ToolCallRequest>, ModelFinishReason) {
        let mut content = String::new();
        let mut thinking = String::new();
        let mut tool_calls = vec![];
        let mut finish_reason = None;
        loop {
            let event =
                poll_fn(|cx| Pin::new(&mut resp).poll_next_event(cx)).await;
            match event {
                Ok(Some(ModelResponseEvent::MessageDelta(delta))) => {
                    content.push_str(&delta);
                }
                Ok(Some(ModelResponseEvent::ThinkingDelta(delta))) => {
                    thinking.push_str(&delta);
                }
                Ok(Some(ModelResponseEvent::ToolCall(req))) => {
                    tool_calls.push(req);
                }
                Ok(Some(ModelResponseEvent::Completed(reason))) => {
                    finish_reason = Some(reason);
                }
                Ok(Some(event)) => unreachable!("unexpected event: {event:?}"),
                Ok(None) => break,
                Err(err) => unreachable!("unexpected error: {err:?}"),
            }
        }
        (content, thinking, tool_calls, finish_reason.unwrap())
    }

    #[tokio::test]
    async fn test_completion() {
        let req = ModelRequest {
            messages: vec![
                ModelMessage::System("Be brief.".to_owned()),
                ModelMessage::User("Good morning".to_owned()),
            ],
            tools: vec![],
        };
        let resp = EchoProvider.send_request(&req).await.unwrap();
        let (content, thinking, tool_calls, reason) = drain(resp).await;

        assert_eq!(content, "You said Good morning");
        assert_eq!(thinking, "Echoing");
        assert!(tool_calls.is_empty());
        assert_eq!(reason, ModelFinishReason::Stop);
    }

    #[tokio::test]
    async fn test_tool_calls_arrive_after_content() {
        let req = ModelRequest {
            messages: vec![ModelMessage::User("what tempo?".to_owned())],
            tools: vec![],
        };
        let resp = EchoProvider.send_request(&req).await.unwrap();
        let (content, _, tool_calls, reason) = drain(resp).await;

        assert_eq!(content, "You said what tempo?");
        assert_eq!(tool_calls.len(), 1);
        assert_eq!(tool_calls[0].name, "get_tempo");
        assert_eq!(reason, ModelFinishReason::ToolCalls);
    }

    #[tokio::test]
    async fn test_error() {
        let req = ModelRequest {
            messages: vec![],
            tools: vec![],
        };
        let result = EchoProvider.send_request(&req).await;
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
    }
}
