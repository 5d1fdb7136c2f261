use producer_model::{ModelMessage, ModelRequest, ModelTool, ToolCallRequest};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::OpenAIConfig;

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct FunctionDelta {
    pub name: Option<String>,
    pub arguments: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ToolCallDelta {
    #[serde(default)]
    pub index: usize,
    pub id: Option<String>,
    pub function: Option<FunctionDelta>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub delta: Delta,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Delta {
    pub content: Option<String>,
    // Providers disagree on the name of the reasoning field.
    pub reasoning: Option<String>,
    pub thinking: Option<String>,
    pub tool_calls: Option<Vec<ToolCallDelta>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ModelList {
    #[serde(default)]
    pub data: Vec<ModelEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ModelEntry {
    pub id: String,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
struct FunctionTool {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
struct Tool {
    r#type: &'static str,
    function: FunctionTool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct FunctionCall {
    name: String,
    arguments: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ToolCall {
    id: String,
    r#type: &'static str,
    function: FunctionCall,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: String,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    Tool {
        tool_call_id: String,
        content: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    stream: bool,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(
    req: &ModelRequest,
    config: &OpenAIConfig,
) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: config.model.clone(),
        messages: req.messages.iter().map(create_message).collect(),
        tools: req.tools.iter().map(create_tool).collect(),
        stream: true,
    }
}

#[inline]
fn create_message(msg: &ModelMessage) -> Message {
    match msg {
        ModelMessage::System(content) => Message::System {
            content: content.clone(),
        },
        ModelMessage::User(content) => Message::User {
            content: content.clone(),
        },
        ModelMessage::Assistant(msg) => Message::Assistant {
            content: msg.content.clone(),
            tool_calls: msg.tool_calls.iter().map(create_tool_call).collect(),
        },
        ModelMessage::Tool(result) => Message::Tool {
            tool_call_id: result.id.clone(),
            content: result.content.clone(),
        },
    }
}

#[inline]
fn create_tool_call(req: &ToolCallRequest) -> ToolCall {
    ToolCall {
        id: req.id.clone(),
        r#type: "function",
        function: FunctionCall {
            name: req.name.clone(),
            arguments: req.arguments.clone(),
        },
    }
}

#[inline]
fn create_tool(tool: &ModelTool) -> Tool {
    Tool {
        r#type: "function",
        function: FunctionTool {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.parameters.clone(),
        },
    }
}
