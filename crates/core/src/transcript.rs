//! The ordered record of a conversation.

use producer_model::{AssistantMessage, ModelMessage, ToolCallResult};

/// Append-only list of the user, assistant and tool messages of a
/// conversation. The system prompt is not part of it; it is prepended
/// when a request is built.
///
/// Tool messages always directly follow the assistant message that
/// issued the calls, in the same order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<ModelMessage>,
}

impl Transcript {
    /// Creates an empty transcript.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message.
    #[inline]
    pub fn append(&mut self, message: ModelMessage) {
        self.messages.push(message);
    }

    /// Appends a user message.
    #[inline]
    pub fn append_user<S: Into<String>>(&mut self, text: S) {
        self.append(ModelMessage::User(text.into()));
    }

    /// Appends an assistant message.
    #[inline]
    pub fn append_assistant(&mut self, message: AssistantMessage) {
        self.append(ModelMessage::Assistant(message));
    }

    /// Appends the result of a tool call.
    #[inline]
    pub fn append_tool_result(&mut self, result: ToolCallResult) {
        self.append(ModelMessage::Tool(result));
    }

    /// Removes every message.
    #[inline]
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Returns the messages, oldest first.
    #[inline]
    pub fn snapshot(&self) -> &[ModelMessage] {
        &self.messages
    }

    /// Returns the number of messages.
    #[inline]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns whether the transcript is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Builds the message list of a request: the system prompt, if any,
    /// followed by the whole transcript.
    pub fn to_request_messages(&self, system_prompt: &str) -> Vec<ModelMessage> {
        let mut messages = Vec::with_capacity(self.messages.len() + 1);
        if !system_prompt.is_empty() {
            messages.push(ModelMessage::System(system_prompt.to_owned()));
        }
        messages.extend(self.messages.iter().cloned());
        messages
    }

    /// Checks that every assistant message carrying tool calls is followed
    /// by exactly one tool message per call, in order and with matching
    /// ids. A trailing round still being executed is accepted as long as
    /// what is there matches.
    pub fn tool_results_are_paired(&self) -> bool {
        let mut iter = self.messages.iter().peekable();
        while let Some(message) = iter.next() {
            let ModelMessage::Assistant(assistant) = message else {
                if matches!(message, ModelMessage::Tool(_)) {
                    // A tool message without a preceding assistant call.
                    return false;
                }
                continue;
            };
            for call in &assistant.tool_calls {
                match iter.peek() {
                    Some(ModelMessage::Tool(result)) if result.id == call.id => {
                        iter.next();
                    }
                    None => return true,
                    Some(_) => return false,
                }
            }
        }
        true
    }
}

impl From<Vec<ModelMessage>> for Transcript {
    #[inline]
    fn from(messages: Vec<ModelMessage>) -> Self {
        Self { messages }
    }
}

#[cfg(test)]
mod tests {
    use producer_model::ToolCallRequest;

    use super::*;

    fn call(id: &str) -> ToolCallRequest {
        ToolCallRequest {
            id: id.to_owned(),
            name: "get_tempo".to_owned(),
            arguments: "{}".to_owned(),
        }
    }

    fn result(id: &str) -> ToolCallResult {
        ToolCallResult {
            id: id.to_owned(),
            name: "get_tempo".to_owned(),
            content: r#"{"bpm":140}"#.to_owned(),
        }
    }

    #[test]
    fn test_request_messages() {
        let mut transcript = Transcript::new();
        transcript.append_user("hello");
        transcript.append(ModelMessage::assistant("Hi there!"));

        let messages = transcript.to_request_messages("Be helpful.");
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0], ModelMessage::System("Be helpful.".to_owned()));
        assert_eq!(messages[2].content(), "Hi there!");

        transcript.clear();
        assert!(transcript.is_empty());
        assert!(transcript.to_request_messages("").is_empty());
    }

    #[test]
    fn test_tool_results_are_paired() {
        let mut transcript = Transcript::new();
        transcript.append_user("tempo?");
        transcript.append_assistant(AssistantMessage {
            content: String::new(),
            tool_calls: vec![call("a"), call("b")],
        });
        transcript.append_tool_result(result("a"));
        assert!(transcript.tool_results_are_paired());

        transcript.append_tool_result(result("b"));
        transcript.append(ModelMessage::assistant("140 BPM."));
        assert!(transcript.tool_results_are_paired());

        let mut broken = transcript.clone();
        broken.append_tool_result(result("c"));
        assert!(!broken.tool_results_are_paired());

        let swapped = Transcript::from(vec![
            ModelMessage::Assistant(AssistantMessage {
                content: String::new(),
                tool_calls: vec![call("a"), call("b")],
            }),
            ModelMessage::Tool(result("b")),
            ModelMessage::Tool(result("a")),
        ]);
        assert!(!swapped.tool_results_are_paired());
    }
}
