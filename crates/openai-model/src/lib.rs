//! A model provider for OpenAI-compatible chat completion APIs, such as
//! the OpenRouter endpoint the assistant talks to by default.

#[macro_use]
extern crate tracing;

mod catalog;
mod config;
mod io;
mod proto;
mod response;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use mime::Mime;
use producer_model::{
    ErrorKind, ModelProvider, ModelProviderError, ModelRequest,
};
use reqwest::{Client, StatusCode, header};
use serde_json::Value;

pub use catalog::{
    ALLOWED_PROVIDERS, CatalogModel, ModelCatalog, fetch_models,
    filter_catalog, parse_catalog,
};
pub use config::{
    DEFAULT_BASE_URL, DEFAULT_MODEL, OpenAIConfig, OpenAIConfigBuilder,
};
use io::{Chunks, Sse};
pub use response::OpenAIResponse;

/// Error type for [`OpenAIProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// OpenAI-compatible model provider.
#[derive(Clone, Debug)]
pub struct OpenAIProvider {
    client: Client,
    config: Arc<OpenAIConfig>,
}

impl OpenAIProvider {
    /// Creates a new `OpenAIProvider` with the given configuration.
    #[inline]
    pub fn new(config: OpenAIConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }

    /// Returns the configuration of this provider.
    #[inline]
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }
}

impl ModelProvider for OpenAIProvider {
    type Error = Error;
    type Response = OpenAIResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let openai_req = proto::create_request(req, &self.config);
        debug!(
            "sending {} messages with {} tools to {}",
            req.messages.len(),
            req.tools.len(),
            self.config.model
        );
        let resp_fut = self
            .client
            .post(format!("{}{}", self.config.base_url, "/chat/completions"))
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.config.api_key),
            )
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "text/event-stream")
            .header("HTTP-Referer", &self.config.referer)
            .header("X-Title", &self.config.title)
            .json(&openai_req)
            .send();

        async move {
            let resp = resp_fut.await.map_err(|err| {
                error!("request failed: {err}");
                Error::new(err.to_string(), ErrorKind::Network)
            })?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                let message = error_message(&body)
                    .unwrap_or_else(|| format!("HTTP {status}"));
                error!("server returned {status}: {message}");
                let kind = if status == StatusCode::TOO_MANY_REQUESTS {
                    ErrorKind::RateLimitExceeded
                } else {
                    ErrorKind::Network
                };
                return Err(Error::new(message, kind));
            }

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            if let Some(content_type) = content_type {
                let is_event_stream = content_type
                    .parse::<Mime>()
                    .map(|m| {
                        m.type_() == mime::TEXT
                            && m.subtype() == mime::EVENT_STREAM
                    })
                    .unwrap_or(false);
                if !is_event_stream {
                    return Err(Error::new(
                        format!("Unexpected content type: {content_type}"),
                        ErrorKind::Network,
                    ));
                }
            }

            let chunks = Chunks::from_response(resp);
            let sse = Sse::new(chunks);
            Ok(OpenAIResponse::from_sse(sse))
        }
    }
}

/// Extracts `error.message` from an error body, if it has one.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(ToOwned::to_owned)
}
