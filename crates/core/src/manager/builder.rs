use producer_model::ModelProvider;

use super::{ClientFactory, ConversationManager, Observer};
use crate::event::AgentEvent;
use crate::host::HostAdapter;
use crate::model_client::ModelClient;
use crate::settings::{AgentSettings, MemorySettings, SettingsStore};
use crate::tool::{Registry, Tool};

/// [`ConversationManager`] builder.
pub struct ConversationManagerBuilder {
    pub(crate) client_factory: ClientFactory,
    pub(crate) registry: Registry,
    pub(crate) host: Box<dyn HostAdapter>,
    pub(crate) settings_store: Box<dyn SettingsStore>,
    pub(crate) system_prompt: String,
    pub(crate) observers: Vec<Observer>,
}

impl ConversationManagerBuilder {
    /// Creates a new builder.
    ///
    /// `provider_factory` is called with the current settings whenever a
    /// request needs a provider and the settings changed since the last
    /// one was built. Tools act on `host`.
    ///
    /// Settings are kept in memory unless a store is attached with
    /// [`with_settings_store`](Self::with_settings_store).
    pub fn new<F, P, H>(provider_factory: F, host: H) -> Self
    where
        F: Fn(&AgentSettings) -> P + Send + Sync + 'static,
        P: ModelProvider + 'static,
        H: HostAdapter,
    {
        Self {
            client_factory: Box::new(move |settings| {
                ModelClient::new(provider_factory(settings))
            }),
            registry: Registry::new(),
            host: Box::new(host),
            settings_store: Box::new(MemorySettings::new()),
            system_prompt: String::new(),
            observers: vec![],
        }
    }

    /// Uses `store` to load and persist the settings.
    #[inline]
    pub fn with_settings_store<S: SettingsStore>(mut self, store: S) -> Self {
        self.settings_store = Box::new(store);
        self
    }

    /// Sets the system prompt sent at the start of every request.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Registers a tool.
    ///
    /// # Panics
    ///
    /// Panics if a tool with the same name is already registered.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.registry.register(tool);
        self
    }

    /// Replaces the tool registry.
    #[inline]
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Attaches an observer. Observers are called on the manager's task,
    /// in registration order, and must not block.
    #[inline]
    pub fn on_event(
        mut self,
        on_event: impl Fn(&AgentEvent) + Send + Sync + 'static,
    ) -> Self {
        self.observers.push(Box::new(on_event));
        self
    }

    /// Builds the manager and starts its task.
    ///
    /// Must be called within a Tokio runtime.
    #[inline]
    pub fn build(self) -> ConversationManager {
        ConversationManager::spawn_from_builder(self)
    }
}
