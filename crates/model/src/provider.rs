use std::error::Error;

use crate::error::ErrorKind;
use crate::request::ModelRequest;
use crate::response::ModelResponse;

/// The error type for a model provider.
pub trait ModelProviderError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;
}

/// A model provider, the entry point for opening streaming completions.
///
/// Providers are cheap to build and carry their credentials. The
/// conversation manager builds a fresh one whenever the user changes the
/// API key or the model, and drops the old one at any time.
pub trait ModelProvider: Send + Sync {
    /// The error type that may be returned by the provider.
    type Error: ModelProviderError;

    /// The response type for this provider.
    type Response: ModelResponse<Error = Self::Error>;

    /// Opens a streaming request.
    ///
    /// The returned future resolves once the response headers arrived;
    /// events are then pulled from the response.
    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static;
}
