use serde_json::Value;

use crate::ToolCallRequest;

/// A request to be sent to the model provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModelRequest {
    /// The input messages, system prompt first.
    pub messages: Vec<ModelMessage>,
    /// Tools that are available to the model.
    pub tools: Vec<ModelTool>,
}

/// A complete message.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ModelMessage {
    /// The system instructions.
    System(String),
    /// A user input text.
    User(String),
    /// An assistant turn, optionally carrying the tool calls it issued.
    Assistant(AssistantMessage),
    /// A tool call result.
    Tool(ToolCallResult),
}

impl ModelMessage {
    /// Creates a text-only assistant message.
    #[inline]
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        ModelMessage::Assistant(AssistantMessage {
            content: content.into(),
            tool_calls: vec![],
        })
    }

    /// Returns the protocol role of this message.
    pub fn role(&self) -> &'static str {
        match self {
            ModelMessage::System(_) => "system",
            ModelMessage::User(_) => "user",
            ModelMessage::Assistant(_) => "assistant",
            ModelMessage::Tool(_) => "tool",
        }
    }

    /// Returns the text content of this message.
    pub fn content(&self) -> &str {
        match self {
            ModelMessage::System(content) | ModelMessage::User(content) => {
                content
            }
            ModelMessage::Assistant(msg) => &msg.content,
            ModelMessage::Tool(result) => &result.content,
        }
    }
}

/// An assistant message.
///
/// When the model issued tool calls in this turn, they are kept verbatim
/// (including the raw argument text) so that the next request replays
/// exactly what the model produced.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct AssistantMessage {
    /// The text content, may be empty when the turn only calls tools.
    pub content: String,
    /// Tool calls issued in this turn, in the order the server indexed them.
    pub tool_calls: Vec<ToolCallRequest>,
}

/// The result of calling a tool.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ToolCallResult {
    /// The unique identifier for the tool call request.
    pub id: String,
    /// Name of the tool that was called.
    pub name: String,
    /// The result (or error) text of the tool call.
    pub content: String,
}

/// Describes a tool that can be used by the model.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModelTool {
    /// Name of the tool.
    pub name: String,
    /// Description of the tool.
    pub description: String,
    /// Parameters definition of the tool.
    ///
    /// For most model providers, the parameters should typically be
    /// defined by a [JSON schema](https://json-schema.org/) whose root
    /// has `"type": "object"`.
    pub parameters: Value,
}
