use producer_core::host::HostAdapter;
use producer_core::settings::{self, AgentSettings, SettingsStore};
use producer_core::tool::Tool;
use producer_core::{
    AgentEvent, ConversationManager, ConversationManagerBuilder,
};
use producer_model::ModelProvider;
use producer_openai_model::{
    CatalogModel, DEFAULT_BASE_URL, Error as OpenAIError, ModelCatalog,
    OpenAIConfigBuilder, OpenAIProvider,
};

use crate::tools::builtin_tools;

/// The system prompt a session starts with.
pub const SYSTEM_PROMPT: &str = include_str!("./system_prompt.md");

/// A session builder.
///
/// See [`Session`].
pub struct SessionBuilder {
    manager_builder: ConversationManagerBuilder,
    catalog: ModelCatalog,
}

impl SessionBuilder {
    /// Creates a session builder whose tools act on `host`, talking to the
    /// default endpoint.
    #[inline]
    pub fn new<H: HostAdapter>(host: H) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, host)
    }

    /// Creates a session builder talking to an OpenAI-compatible endpoint
    /// at `base_url`.
    pub fn with_base_url<S, H>(base_url: S, host: H) -> Self
    where
        S: Into<String>,
        H: HostAdapter,
    {
        let base_url = base_url.into();
        let catalog = ModelCatalog::new(base_url.clone());
        let mut builder = Self::with_provider_factory(
            move |settings: &AgentSettings| {
                let config =
                    OpenAIConfigBuilder::with_api_key(&settings.api_key)
                        .with_model(&settings.model)
                        .with_base_url(&base_url)
                        .build();
                OpenAIProvider::new(config)
            },
            host,
        );
        builder.catalog = catalog;
        builder
    }

    /// Creates a session builder with a custom model provider, built from
    /// the settings whenever they change.
    pub fn with_provider_factory<F, P, H>(provider_factory: F, host: H) -> Self
    where
        F: Fn(&AgentSettings) -> P + Send + Sync + 'static,
        P: ModelProvider + 'static,
        H: HostAdapter,
    {
        let manager_builder =
            ConversationManagerBuilder::new(provider_factory, host)
                .with_registry(builtin_tools())
                .with_system_prompt(SYSTEM_PROMPT);
        Self {
            manager_builder,
            catalog: ModelCatalog::default(),
        }
    }

    /// Loads and persists the API key and model with `store`.
    #[inline]
    pub fn with_settings_store<S: SettingsStore>(mut self, store: S) -> Self {
        self.manager_builder = self.manager_builder.with_settings_store(store);
        self
    }

    /// Replaces the system prompt.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.manager_builder = self.manager_builder.with_system_prompt(prompt);
        self
    }

    /// Registers a tool next to the built-in ones.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.manager_builder = self.manager_builder.with_tool(tool);
        self
    }

    /// Attaches a callback invoked with every conversation event.
    #[inline]
    pub fn on_event(
        mut self,
        on_event: impl Fn(&AgentEvent) + Send + Sync + 'static,
    ) -> Self {
        self.manager_builder = self.manager_builder.on_event(on_event);
        self
    }

    /// Builds a new session.
    ///
    /// Must be called within a Tokio runtime.
    pub fn build(self) -> Session {
        Session {
            manager: self.manager_builder.build(),
            catalog: self.catalog,
        }
    }
}

/// A chat session, like a panel that displays messages and has an input
/// box.
///
/// The session holds a fully configured conversation manager that you can
/// use directly, and it is basically a wrapper around
/// [`ConversationManager`].
#[derive(Clone, Debug)]
pub struct Session {
    manager: ConversationManager,
    catalog: ModelCatalog,
}

impl Session {
    /// Sends a message to the session.
    #[inline]
    pub fn send_message(&self, message: &str) {
        self.manager.send(message);
    }

    /// Abandons the running turn.
    #[inline]
    pub fn cancel(&self) {
        self.manager.cancel();
    }

    /// Cancels the running turn and forgets the conversation.
    #[inline]
    pub fn clear_history(&self) {
        self.manager.clear_history();
    }

    /// Returns the current settings.
    #[inline]
    pub async fn settings(&self) -> AgentSettings {
        self.manager.settings().await
    }

    /// Replaces the API key, keeping the model.
    pub async fn set_api_key(
        &self,
        api_key: &str,
    ) -> Result<(), settings::Error> {
        let settings = self.manager.settings().await;
        self.manager.configure(api_key, settings.model).await
    }

    /// Switches to another model, keeping the API key.
    pub async fn set_model(&self, model: &str) -> Result<(), settings::Error> {
        let settings = self.manager.settings().await;
        self.manager.configure(settings.api_key, model).await
    }

    /// Lists the models the endpoint offers.
    #[inline]
    pub async fn available_models(
        &self,
    ) -> Result<Vec<CatalogModel>, OpenAIError> {
        self.catalog.fetch().await
    }

    /// Returns the underlying conversation manager.
    #[inline]
    pub fn manager(&self) -> &ConversationManager {
        &self.manager
    }
}
