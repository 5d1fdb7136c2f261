use std::time::Instant;

use producer_core::AgentEvent;
use serde_json::Value;

use super::ScrollTracker;

/// How many characters of reasoning are shown while it streams.
pub const THINKING_BUDGET: usize = 800;

/// One entry of the transcript view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Artifact {
    /// A message typed by the user.
    User(String),
    /// Assistant text, complete or still streaming.
    Assistant(String),
    /// A collapsible block of model reasoning, trimmed to
    /// [`THINKING_BUDGET`] characters.
    Thinking(String),
    /// A collapsible code block for one tool call.
    ToolCall {
        /// Name of the tool.
        name: String,
        /// The argument object, as JSON text.
        arguments: String,
        /// The result once the call completed, pretty printed if it is a
        /// JSON object.
        result: Option<String>,
    },
    /// An error message.
    Error(String),
}

/// A change a renderer must apply to catch up with the view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ViewChange {
    /// An artifact was appended at this index.
    Inserted(usize),
    /// The artifact at this index changed.
    Updated(usize),
    /// Every artifact was removed.
    Cleared,
    /// The input control should be enabled or disabled.
    InputEnabled(bool),
    /// The renderer should scroll to the bottom.
    ScrollToBottom,
}

/// A headless transcript view fed with manager events.
///
/// At most one thinking block, one assistant block and one tool call
/// block are live at a time; deltas update them in place. Live blocks are
/// released when a stream finishes, so the next round of a turn starts
/// fresh ones.
#[derive(Debug)]
pub struct ChatView {
    artifacts: Vec<Artifact>,
    thinking: String,
    content: String,
    live_thinking: Option<usize>,
    live_content: Option<usize>,
    live_tool_call: Option<usize>,
    /// Set when streamed text already showed what `ResponseReceived` is
    /// about to repeat.
    streamed_response: bool,
    input_enabled: bool,
    scroll: ScrollTracker,
}

impl Default for ChatView {
    fn default() -> Self {
        Self {
            artifacts: vec![],
            thinking: String::new(),
            content: String::new(),
            live_thinking: None,
            live_content: None,
            live_tool_call: None,
            streamed_response: false,
            input_enabled: true,
            scroll: ScrollTracker::new(),
        }
    }
}

impl ChatView {
    /// Creates an empty view.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every artifact, oldest first.
    #[inline]
    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    /// Returns whether the user may type.
    #[inline]
    pub fn is_input_enabled(&self) -> bool {
        self.input_enabled
    }

    /// Gives the renderer access to the auto-scroll policy, to report
    /// scroll position changes.
    #[inline]
    pub fn scroll_tracker_mut(&mut self) -> &mut ScrollTracker {
        &mut self.scroll
    }

    /// Shows a message the user just sent.
    pub fn push_user_message(&mut self, message: &str) -> Vec<ViewChange> {
        self.apply_at(Instant::now(), |view| {
            vec![view.push(Artifact::User(message.to_owned()))]
        })
    }

    /// Applies a manager event.
    #[inline]
    pub fn apply(&mut self, event: &AgentEvent) -> Vec<ViewChange> {
        self.apply_with_time(event, Instant::now())
    }

    /// Applies a manager event at a given time.
    pub fn apply_with_time(
        &mut self,
        event: &AgentEvent,
        now: Instant,
    ) -> Vec<ViewChange> {
        self.apply_at(now, |view| view.handle(event))
    }

    /// Removes every artifact. Pair it with clearing the manager history.
    pub fn clear(&mut self) -> Vec<ViewChange> {
        self.artifacts.clear();
        self.release_live();
        self.thinking.clear();
        self.content.clear();
        self.streamed_response = false;
        vec![ViewChange::Cleared]
    }

    fn apply_at(
        &mut self,
        now: Instant,
        f: impl FnOnce(&mut Self) -> Vec<ViewChange>,
    ) -> Vec<ViewChange> {
        let mut changes = f(self);
        let grew = changes.iter().any(|change| {
            matches!(change, ViewChange::Inserted(_) | ViewChange::Updated(_))
        });
        if grew && self.scroll.request_scroll(now) {
            changes.push(ViewChange::ScrollToBottom);
        }
        changes
    }

    fn handle(&mut self, event: &AgentEvent) -> Vec<ViewChange> {
        match event {
            AgentEvent::ProcessingStarted => {
                self.streamed_response = false;
                self.set_input_enabled(false)
            }
            AgentEvent::StreamStarted => {
                self.release_live();
                self.thinking.clear();
                self.content.clear();
                vec![]
            }
            AgentEvent::ThinkingDelta(delta) => {
                self.thinking.push_str(delta);
                let text = tail(&self.thinking, THINKING_BUDGET);
                vec![self.upsert(Slot::Thinking, Artifact::Thinking(text))]
            }
            AgentEvent::ContentDelta(delta) => {
                self.content.push_str(delta);
                let text = self.content.clone();
                vec![self.upsert(Slot::Content, Artifact::Assistant(text))]
            }
            AgentEvent::ToolCallStarted { name, arguments } => {
                let change = self.push(Artifact::ToolCall {
                    name: name.clone(),
                    arguments: arguments.clone(),
                    result: None,
                });
                if let ViewChange::Inserted(index) = change {
                    self.live_tool_call = Some(index);
                }
                vec![change]
            }
            AgentEvent::ToolCallCompleted { name, result } => {
                vec![self.complete_tool_call(name, result)]
            }
            AgentEvent::StreamFinished => {
                if !self.content.is_empty() {
                    self.streamed_response = true;
                }
                self.release_live();
                vec![]
            }
            AgentEvent::ResponseReceived(response) => {
                if std::mem::take(&mut self.streamed_response) {
                    return vec![];
                }
                vec![self.push(Artifact::Assistant(response.clone()))]
            }
            AgentEvent::Error(error) => {
                vec![self.push(Artifact::Error(error.clone()))]
            }
            AgentEvent::ProcessingFinished => self.set_input_enabled(true),
        }
    }

    fn complete_tool_call(&mut self, name: &str, result: &str) -> ViewChange {
        let result = display_result(result);
        let live = self.live_tool_call.take().and_then(|index| {
            match self.artifacts.get_mut(index) {
                Some(Artifact::ToolCall {
                    name: live_name,
                    result: slot,
                    ..
                }) if live_name == name && slot.is_none() => {
                    *slot = Some(result.clone());
                    Some(index)
                }
                _ => None,
            }
        });
        match live {
            Some(index) => ViewChange::Updated(index),
            None => self.push(Artifact::ToolCall {
                name: name.to_owned(),
                arguments: String::new(),
                result: Some(result),
            }),
        }
    }

    fn upsert(&mut self, slot: Slot, artifact: Artifact) -> ViewChange {
        let live = match slot {
            Slot::Thinking => &mut self.live_thinking,
            Slot::Content => &mut self.live_content,
        };
        match *live {
            Some(index) => {
                self.artifacts[index] = artifact;
                ViewChange::Updated(index)
            }
            None => {
                *live = Some(self.artifacts.len());
                self.artifacts.push(artifact);
                ViewChange::Inserted(self.artifacts.len() - 1)
            }
        }
    }

    fn push(&mut self, artifact: Artifact) -> ViewChange {
        self.artifacts.push(artifact);
        ViewChange::Inserted(self.artifacts.len() - 1)
    }

    fn set_input_enabled(&mut self, enabled: bool) -> Vec<ViewChange> {
        self.input_enabled = enabled;
        vec![ViewChange::InputEnabled(enabled)]
    }

    fn release_live(&mut self) {
        self.live_thinking = None;
        self.live_content = None;
        self.live_tool_call = None;
    }
}

enum Slot {
    Thinking,
    Content,
}

/// Keeps the last `budget` characters, marking the cut with `...`.
fn tail(text: &str, budget: usize) -> String {
    let count = text.chars().count();
    if count <= budget {
        return text.to_owned();
    }
    let (start, _) = text
        .char_indices()
        .nth(count - budget)
        .unwrap_or((text.len(), ' '));
    format!("...{}", &text[start..])
}

fn display_result(result: &str) -> String {
    match serde_json::from_str::<Value>(result) {
        Ok(value @ Value::Object(_)) => {
            serde_json::to_string_pretty(&value)
                .unwrap_or_else(|_| result.to_owned())
        }
        _ => result.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply_all(
        view: &mut ChatView,
        events: &[AgentEvent],
    ) -> Vec<ViewChange> {
        events.iter().flat_map(|event| view.apply(event)).collect()
    }

    fn without_scroll(changes: Vec<ViewChange>) -> Vec<ViewChange> {
        changes
            .into_iter()
            .filter(|change| *change != ViewChange::ScrollToBottom)
            .collect()
    }

    #[test]
    fn test_streamed_turn() {
        let mut view = ChatView::new();
        view.push_user_message("make it faster");

        let changes = apply_all(
            &mut view,
            &[
                AgentEvent::ProcessingStarted,
                AgentEvent::StreamStarted,
                AgentEvent::ThinkingDelta("Hmm".to_owned()),
                AgentEvent::ContentDelta("Sure".to_owned()),
                AgentEvent::ThinkingDelta(", ok".to_owned()),
                AgentEvent::ContentDelta(", done.".to_owned()),
                AgentEvent::StreamFinished,
                AgentEvent::ResponseReceived("Sure, done.".to_owned()),
                AgentEvent::ProcessingFinished,
            ],
        );
        assert_eq!(
            without_scroll(changes),
            [
                ViewChange::InputEnabled(false),
                ViewChange::Inserted(1),
                ViewChange::Inserted(2),
                ViewChange::Updated(1),
                ViewChange::Updated(2),
                ViewChange::InputEnabled(true),
            ]
        );
        assert_eq!(
            view.artifacts(),
            [
                Artifact::User("make it faster".to_owned()),
                Artifact::Thinking("Hmm, ok".to_owned()),
                Artifact::Assistant("Sure, done.".to_owned()),
            ]
        );
        assert!(view.is_input_enabled());
    }

    #[test]
    fn test_tool_rounds() {
        let mut view = ChatView::new();
        apply_all(
            &mut view,
            &[
                AgentEvent::ProcessingStarted,
                AgentEvent::StreamStarted,
                AgentEvent::ContentDelta("Setting tempo.".to_owned()),
                AgentEvent::StreamFinished,
                AgentEvent::ToolCallStarted {
                    name: "set_tempo".to_owned(),
                    arguments: r#"{"bpm":128}"#.to_owned(),
                },
                AgentEvent::ToolCallCompleted {
                    name: "set_tempo".to_owned(),
                    result: r#"{"success":true}"#.to_owned(),
                },
                AgentEvent::StreamStarted,
                AgentEvent::ContentDelta("Done".to_owned()),
                AgentEvent::StreamFinished,
                AgentEvent::ResponseReceived("Done".to_owned()),
                AgentEvent::ProcessingFinished,
            ],
        );
        assert_eq!(
            view.artifacts(),
            [
                Artifact::Assistant("Setting tempo.".to_owned()),
                Artifact::ToolCall {
                    name: "set_tempo".to_owned(),
                    arguments: r#"{"bpm":128}"#.to_owned(),
                    result: Some("{\n  \"success\": true\n}".to_owned()),
                },
                Artifact::Assistant("Done".to_owned()),
            ]
        );
    }

    #[test]
    fn test_unstreamed_response_and_errors() {
        let mut view = ChatView::new();
        apply_all(
            &mut view,
            &[
                AgentEvent::ProcessingStarted,
                AgentEvent::ResponseReceived("Hello".to_owned()),
                AgentEvent::ToolCallCompleted {
                    name: "get_tempo".to_owned(),
                    result: "Unknown tool: get_tempo".to_owned(),
                },
                AgentEvent::Error("Network error: reset".to_owned()),
                AgentEvent::ProcessingFinished,
            ],
        );
        assert_eq!(
            view.artifacts(),
            [
                Artifact::Assistant("Hello".to_owned()),
                Artifact::ToolCall {
                    name: "get_tempo".to_owned(),
                    arguments: String::new(),
                    result: Some("Unknown tool: get_tempo".to_owned()),
                },
                Artifact::Error("Network error: reset".to_owned()),
            ]
        );

        assert_eq!(view.clear(), [ViewChange::Cleared]);
        assert!(view.artifacts().is_empty());
    }

    #[test]
    fn test_thinking_budget() {
        let mut view = ChatView::new();
        view.apply(&AgentEvent::StreamStarted);
        view.apply(&AgentEvent::ThinkingDelta("é".repeat(THINKING_BUDGET)));
        assert_eq!(
            view.artifacts()[0],
            Artifact::Thinking("é".repeat(THINKING_BUDGET))
        );

        view.apply(&AgentEvent::ThinkingDelta("xyz".to_owned()));
        let expected =
            format!("...{}xyz", "é".repeat(THINKING_BUDGET - 3));
        assert_eq!(view.artifacts()[0], Artifact::Thinking(expected));
    }

    #[test]
    fn test_scroll_requests() {
        let start = Instant::now();
        let mut view = ChatView::new();
        let changes =
            view.apply_with_time(&AgentEvent::Error("x".to_owned()), start);
        assert_eq!(
            changes,
            [ViewChange::Inserted(0), ViewChange::ScrollToBottom]
        );

        let later = start + std::time::Duration::from_secs(1);
        view.scroll_tracker_mut().on_scroll(1000, 1000, later);
        view.scroll_tracker_mut().on_scroll(0, 1000, later);
        let changes =
            view.apply_with_time(&AgentEvent::Error("y".to_owned()), start);
        assert_eq!(changes, [ViewChange::Inserted(1)]);

        let changes =
            view.apply_with_time(&AgentEvent::ProcessingFinished, start);
        assert_eq!(changes, [ViewChange::InputEnabled(true)]);
    }
}
