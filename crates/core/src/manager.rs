//! The conversation manager, which drives a turn from the user's message
//! through model streams and tool calls to the final answer.

mod builder;
mod state;

use std::collections::VecDeque;

use producer_actor::define_actor;
use producer_model::{ModelMessage, ToolCallRequest};
use tokio::task::JoinHandle;

use crate::event::AgentEvent;
use crate::host::HostAdapter;
use crate::model_client::ModelClient;
use crate::settings::{self, AgentSettings, SettingsStore};
use crate::tool::Registry;
use crate::transcript::Transcript;
pub use builder::ConversationManagerBuilder;
use state::{Cancel, ClearHistory, SendUserMessage, StreamAccumulator};

type ClientFactory = Box<dyn Fn(&AgentSettings) -> ModelClient + Send + Sync>;
type Observer = Box<dyn Fn(&AgentEvent) + Send + Sync>;

/// Error text emitted when `send` is called without an API key.
pub const NOT_CONFIGURED: &str =
    "api key not set up... please set your api key.";
/// Error text emitted when `send` is called during a turn.
pub const BUSY: &str = "already processing a request... please wait.";
/// Result recorded for tool calls skipped by a cancellation.
pub const CANCELLED_TOOL_CALL: &str = "Tool call cancelled by the user";

define_actor! {
    /// A conversation with the model, together with everything it needs:
    /// the transcript, the tools, the host they act on and the settings.
    ///
    /// All state lives on one actor task, so events are published and
    /// tools run strictly one after another. Methods only enqueue work and
    /// return immediately; progress is reported through the observers
    /// registered with [`ConversationManagerBuilder::on_event`].
    ///
    /// Only one turn runs at a time. A turn started while another one is
    /// running is rejected with an error event rather than queued.
    #[wrapper_type(ConversationManager)]
    pub struct ManagerState {
        client_factory: ClientFactory,
        model_client: Option<ModelClient>,
        settings: AgentSettings,
        settings_store: Box<dyn SettingsStore>,
        registry: Registry,
        host: Box<dyn HostAdapter>,
        system_prompt: String,
        observers: Vec<Observer>,

        transcript: Transcript,
        is_processing: bool,
        // Bumped whenever the current stream or tool round is abandoned.
        generation: u64,
        current_stream: Option<JoinHandle<()>>,
        accumulator: StreamAccumulator,
        pending_tool_calls: VecDeque<ToolCallRequest>,
    }
}

impl ConversationManager {
    /// Starts a turn with the given user message.
    ///
    /// Emits [`AgentEvent::Error`] and does nothing else if no API key is
    /// configured or a turn is already running.
    pub fn send<S: Into<String>>(&self, text: S) {
        self.handle()
            .send(SendUserMessage(text.into()))
            .expect("conversation manager has been dropped too early");
    }

    /// Abandons the current turn, if any.
    ///
    /// The open stream is aborted and the remaining tool calls of the
    /// round are skipped. Messages already in the transcript stay there.
    pub fn cancel(&self) {
        self.handle()
            .send(Cancel)
            .expect("conversation manager has been dropped too early");
    }

    /// Cancels the current turn and empties the transcript.
    pub fn clear_history(&self) {
        self.handle()
            .send(ClearHistory)
            .expect("conversation manager has been dropped too early");
    }

    /// Changes and persists the API key and the model. The next request
    /// uses a provider built from the new settings.
    pub async fn configure<K, M>(
        &self,
        api_key: K,
        model: M,
    ) -> Result<(), settings::Error>
    where
        K: Into<String>,
        M: Into<String>,
    {
        let settings = AgentSettings {
            api_key: api_key.into(),
            model: model.into(),
        };
        self.handle()
            .ask(move |state| state.configure(settings))
            .await
            .expect("conversation manager has been dropped too early")
    }

    /// Returns whether a turn is running.
    pub async fn is_processing(&self) -> bool {
        self.handle()
            .ask(|state| state.is_processing)
            .await
            .expect("conversation manager has been dropped too early")
    }

    /// Returns a snapshot of the transcript, without the system prompt.
    pub async fn transcript(&self) -> Vec<ModelMessage> {
        self.handle()
            .ask(|state| state.transcript.snapshot().to_vec())
            .await
            .expect("conversation manager has been dropped too early")
    }

    /// Returns the current settings.
    pub async fn settings(&self) -> AgentSettings {
        self.handle()
            .ask(|state| state.settings.clone())
            .await
            .expect("conversation manager has been dropped too early")
    }
}

impl ConversationManager {
    fn spawn_from_builder(builder: ConversationManagerBuilder) -> Self {
        let ConversationManagerBuilder {
            client_factory,
            registry,
            host,
            settings_store,
            system_prompt,
            observers,
        } = builder;

        let settings = AgentSettings::load(settings_store.as_ref());
        debug!("building conversation manager with {settings:?}");
        let state = ManagerState {
            client_factory,
            model_client: None,
            settings,
            settings_store,
            registry,
            host,
            system_prompt,
            observers,
            transcript: Transcript::new(),
            is_processing: false,
            generation: 0,
            current_stream: None,
            accumulator: StreamAccumulator::default(),
            pending_tool_calls: VecDeque::new(),
        };
        Self::spawn(state, Some("conversation manager"))
    }
}
