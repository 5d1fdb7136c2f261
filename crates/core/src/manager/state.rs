use std::mem;

use producer_actor::{Actor, Message};
use producer_model::{
    AssistantMessage, ModelMessage, ModelProviderError, ModelRequest,
    ModelResponseEvent, ToolCallRequest, ToolCallResult,
};

use super::{BUSY, CANCELLED_TOOL_CALL, ManagerState, NOT_CONFIGURED};
use crate::event::AgentEvent;
use crate::settings::{self, AgentSettings};

/// What one stream has produced so far.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    pub content: String,
    pub thinking: String,
    pub tool_calls: Vec<ToolCallRequest>,
}

impl ManagerState {
    fn emit(&self, event: AgentEvent) {
        trace!("emitting {event:?}");
        for observer in &self.observers {
            observer(&event);
        }
    }

    fn send_user_message(&mut self, text: String, handle: &Actor<Self>) {
        if !self.settings.is_configured() {
            self.emit(AgentEvent::Error(NOT_CONFIGURED.to_owned()));
            return;
        }
        if self.is_processing {
            self.emit(AgentEvent::Error(BUSY.to_owned()));
            return;
        }

        self.transcript.append_user(text);
        self.is_processing = true;
        self.emit(AgentEvent::ProcessingStarted);
        self.start_stream(handle);
    }

    /// Opens a streaming request for the transcript as it is now.
    fn start_stream(&mut self, handle: &Actor<Self>) {
        self.generation += 1;
        self.accumulator = StreamAccumulator::default();

        let model_client = self
            .model_client
            .get_or_insert_with(|| (self.client_factory)(&self.settings))
            .clone();
        let request = ModelRequest {
            messages: self.transcript.to_request_messages(&self.system_prompt),
            tools: self.registry.describe_all(),
        };
        debug!(
            "starting stream #{} with {} messages",
            self.generation,
            request.messages.len()
        );
        self.emit(AgentEvent::StreamStarted);

        let generation = self.generation;
        let event_handle = handle.clone();
        let end_handle = handle.clone();
        self.current_stream = Some(tokio::spawn(async move {
            let result = model_client
                .send_request(request, move |event| {
                    event_handle.send(StreamEvent { generation, event }).ok();
                })
                .await;
            end_handle.send(StreamEnded { generation, result }).ok();
        }));
    }

    fn handle_stream_event(&mut self, event: ModelResponseEvent) {
        match event {
            ModelResponseEvent::MessageDelta(delta) => {
                self.accumulator.content.push_str(&delta);
                self.emit(AgentEvent::ContentDelta(delta));
            }
            ModelResponseEvent::ThinkingDelta(delta) => {
                self.accumulator.thinking.push_str(&delta);
                self.emit(AgentEvent::ThinkingDelta(delta));
            }
            ModelResponseEvent::ToolCall(call) => {
                self.accumulator.tool_calls.push(call);
            }
            ModelResponseEvent::ServerError(message) => {
                warn!("server reported an error: {message}");
                self.emit(AgentEvent::Error(format!("API error: {message}")));
            }
            ModelResponseEvent::Completed(reason) => {
                trace!("stream completed: {reason:?}");
            }
        }
    }

    fn handle_stream_end(
        &mut self,
        result: Result<(), Box<dyn ModelProviderError>>,
        handle: &Actor<Self>,
    ) {
        self.current_stream = None;
        let accumulator = mem::take(&mut self.accumulator);
        self.emit(AgentEvent::StreamFinished);

        if let Err(err) = result {
            self.emit(AgentEvent::Error(format!("Network error: {err}")));
            self.finish_turn();
            return;
        }

        let StreamAccumulator {
            content,
            thinking,
            tool_calls,
        } = accumulator;
        trace!("stream ended with {} bytes of thinking", thinking.len());

        if !tool_calls.is_empty() {
            debug!("model requested {} tool calls", tool_calls.len());
            self.pending_tool_calls = tool_calls.iter().cloned().collect();
            self.transcript.append_assistant(AssistantMessage {
                content,
                tool_calls,
            });
            handle
                .send(RunNextTool(self.generation))
                .expect("the actor is alive while handling a message");
        } else if !content.is_empty() {
            self.transcript.append(ModelMessage::assistant(content.clone()));
            self.emit(AgentEvent::ResponseReceived(content));
            self.finish_turn();
        } else {
            debug!("model returned an empty response");
            self.finish_turn();
        }
    }

    /// Runs the next pending tool call, or re-enters the model once they
    /// have all run.
    fn run_next_tool(&mut self, handle: &Actor<Self>) {
        let Some(call) = self.pending_tool_calls.pop_front() else {
            self.start_stream(handle);
            return;
        };

        let arguments = call.parse_arguments();
        self.emit(AgentEvent::ToolCallStarted {
            name: call.name.clone(),
            arguments: arguments.to_string(),
        });

        let content = match self.registry.execute(
            &call.name,
            arguments,
            self.host.as_mut(),
        ) {
            Ok(payload) => payload,
            Err(err) => err.to_string(),
        };
        self.transcript.append_tool_result(ToolCallResult {
            id: call.id,
            name: call.name.clone(),
            content: content.clone(),
        });
        self.emit(AgentEvent::ToolCallCompleted {
            name: call.name,
            result: content,
        });

        handle
            .send(RunNextTool(self.generation))
            .expect("the actor is alive while handling a message");
    }

    fn cancel(&mut self) {
        self.generation += 1;
        if let Some(stream) = self.current_stream.take() {
            debug!("aborting the current stream");
            stream.abort();
        }
        self.accumulator = StreamAccumulator::default();

        // Every issued call must be answered before the next request.
        for call in self.pending_tool_calls.drain(..) {
            self.transcript.append_tool_result(ToolCallResult {
                id: call.id,
                name: call.name,
                content: CANCELLED_TOOL_CALL.to_owned(),
            });
        }

        if self.is_processing {
            self.finish_turn();
        }
    }

    fn finish_turn(&mut self) {
        debug_assert!(self.transcript.tool_results_are_paired());
        self.is_processing = false;
        self.emit(AgentEvent::ProcessingFinished);
    }

    pub(super) fn configure(
        &mut self,
        settings: AgentSettings,
    ) -> Result<(), settings::Error> {
        debug!("configuring with {settings:?}");
        self.model_client = None;
        self.settings = settings;
        self.settings.save(self.settings_store.as_mut())
    }
}

#[derive(Debug)]
pub struct SendUserMessage(pub String);

impl Message<ManagerState> for SendUserMessage {
    #[inline]
    fn handle(self, state: &mut ManagerState, handle: &Actor<ManagerState>) {
        state.send_user_message(self.0, handle);
    }
}

#[derive(Debug)]
pub struct Cancel;

impl Message<ManagerState> for Cancel {
    #[inline]
    fn handle(self, state: &mut ManagerState, _handle: &Actor<ManagerState>) {
        state.cancel();
    }
}

#[derive(Debug)]
pub struct ClearHistory;

impl Message<ManagerState> for ClearHistory {
    #[inline]
    fn handle(self, state: &mut ManagerState, _handle: &Actor<ManagerState>) {
        state.cancel();
        state.transcript.clear();
    }
}

#[derive(Debug)]
struct StreamEvent {
    generation: u64,
    event: ModelResponseEvent,
}

impl Message<ManagerState> for StreamEvent {
    fn handle(self, state: &mut ManagerState, _handle: &Actor<ManagerState>) {
        if self.generation != state.generation {
            warn!("dropping event of stale stream #{}", self.generation);
            return;
        }
        state.handle_stream_event(self.event);
    }
}

#[derive(Debug)]
struct StreamEnded {
    generation: u64,
    result: Result<(), Box<dyn ModelProviderError>>,
}

impl Message<ManagerState> for StreamEnded {
    fn handle(self, state: &mut ManagerState, handle: &Actor<ManagerState>) {
        if self.generation != state.generation {
            warn!("dropping end of stale stream #{}", self.generation);
            return;
        }
        state.handle_stream_end(self.result, handle);
    }
}

#[derive(Debug)]
struct RunNextTool(u64);

impl Message<ManagerState> for RunNextTool {
    fn handle(self, state: &mut ManagerState, handle: &Actor<ManagerState>) {
        if self.0 != state.generation {
            debug!("skipping tool round of cancelled turn");
            return;
        }
        state.run_next_tool(handle);
    }
}
