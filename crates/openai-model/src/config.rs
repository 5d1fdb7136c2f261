use std::fmt::Debug;

/// The default endpoint, an OpenAI-compatible router.
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// The model used when none has been chosen.
pub const DEFAULT_MODEL: &str = "anthropic/claude-4-5-sonnet";

const DEFAULT_REFERER: &str = "https://lmms.io";
const DEFAULT_TITLE: &str = "LMMS AI Producer";

/// Builder for [`OpenAIConfig`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct OpenAIConfigBuilder {
    api_key: String,
    model: Option<String>,
    base_url: Option<String>,
    attribution: Option<(String, String)>,
}

impl OpenAIConfigBuilder {
    /// Creates a builder with the given API key.
    #[inline]
    pub fn with_api_key<S: Into<String>>(api_key: S) -> Self {
        Self {
            api_key: api_key.into(),
            model: None,
            base_url: None,
            attribution: None,
        }
    }

    /// Sets the model to use.
    #[inline]
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets a custom base URL.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the `HTTP-Referer` and `X-Title` headers the router uses to
    /// attribute requests to an application.
    #[inline]
    pub fn with_attribution<S1: Into<String>, S2: Into<String>>(
        mut self,
        referer: S1,
        title: S2,
    ) -> Self {
        self.attribution = Some((referer.into(), title.into()));
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> OpenAIConfig {
        let (referer, title) = self.attribution.unwrap_or_else(|| {
            (DEFAULT_REFERER.to_owned(), DEFAULT_TITLE.to_owned())
        });
        OpenAIConfig {
            api_key: self.api_key,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
            base_url: self
                .base_url
                .map(|url| url.trim_end_matches('/').to_owned())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
            referer,
            title,
        }
    }
}

impl Debug for OpenAIConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIConfigBuilder")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("attribution", &self.attribution)
            .finish()
    }
}

/// Configuration for the OpenAI-compatible provider.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct OpenAIConfig {
    pub(crate) api_key: String,
    pub(crate) model: String,
    pub(crate) base_url: String,
    pub(crate) referer: String,
    pub(crate) title: String,
}

impl OpenAIConfig {
    /// Returns the model identifier sent with every request.
    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the base URL, without a trailing slash.
    #[inline]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Debug for OpenAIConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("referer", &self.referer)
            .field("title", &self.title)
            .finish()
    }
}
