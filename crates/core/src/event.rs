//! Events published by the conversation manager.

/// Something observable happened in the conversation.
///
/// Within a turn, events arrive in this order: `ProcessingStarted`, then
/// for every model round `StreamStarted`, deltas and `StreamFinished`,
/// followed by one `ToolCallStarted`/`ToolCallCompleted` pair per tool
/// call if the round asked for tools. The last round ends with
/// `ResponseReceived` (when it produced text) and `ProcessingFinished`.
/// `Error` may appear anywhere; configuration and busy errors are not
/// part of a turn.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AgentEvent {
    /// A turn has begun; input should be disabled.
    ProcessingStarted,
    /// A streaming request has been opened.
    StreamStarted,
    /// A chunk of assistant text.
    ContentDelta(String),
    /// A chunk of model reasoning.
    ThinkingDelta(String),
    /// A tool is about to run.
    ToolCallStarted {
        /// Name of the tool.
        name: String,
        /// The argument object, as JSON text.
        arguments: String,
    },
    /// A tool has finished.
    ToolCallCompleted {
        /// Name of the tool.
        name: String,
        /// The tool result, or its error text.
        result: String,
    },
    /// The current stream has ended.
    StreamFinished,
    /// The final assistant text of the turn.
    ResponseReceived(String),
    /// Something went wrong; the text is meant for the user.
    Error(String),
    /// The turn is over; input may be enabled again.
    ProcessingFinished,
}
