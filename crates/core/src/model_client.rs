use std::future::poll_fn;
use std::pin::{Pin, pin};
use std::sync::Arc;

use producer_model::{
    ModelProvider, ModelProviderError, ModelRequest, ModelResponse,
    ModelResponseEvent,
};
use tracing::Instrument;

type SendRequestResult = Result<(), Box<dyn ModelProviderError>>;
type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
type EventCallback = Box<dyn Fn(ModelResponseEvent) + Send + 'static>;
#[rustfmt::skip]
type HandlerFn = Arc<
    dyn Fn(ModelRequest, EventCallback) -> BoxedSendRequestFuture
        + Send + Sync
>;

/// A wrapper around a model provider that maintains an execution
/// environment for the provider and provides a type-erased interface
/// for the other modules.
#[derive(Clone)]
pub struct ModelClient {
    handler_fn: HandlerFn,
}

impl ModelClient {
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since `ModelClient` doesn't have a
        // generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(move |req, on_event| {
            let fut = provider.send_request(&req);
            Box::pin(
                async move {
                    trace!("got a request: {:?}", req);
                    let resp_or_err = fut.await;
                    handle_response::<P>(resp_or_err, on_event).await
                }
                .instrument(trace_span!("model client req")),
            )
        });
        Self { handler_fn }
    }

    /// Sends a request and forwards every event of the response to
    /// `on_event`, in arrival order. Resolves once the response has ended.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. The response stops streaming further
    /// events when this operation is cancelled.
    #[inline]
    pub async fn send_request(
        &self,
        req: ModelRequest,
        on_event: impl Fn(ModelResponseEvent) + Send + 'static,
    ) -> SendRequestResult {
        (self.handler_fn)(req, Box::new(on_event)).await
    }
}

async fn handle_response<P: ModelProvider + 'static>(
    resp_or_err: Result<P::Response, P::Error>,
    on_event: EventCallback,
) -> SendRequestResult {
    let resp = match resp_or_err {
        Ok(resp) => resp,
        Err(err) => {
            error!("request failed: {err}");
            return Err(Box::new(err));
        }
    };

    debug!("start receiving events");

    let mut pinned_resp = pin!(resp);
    loop {
        let event_or_err =
            poll_fn(|cx| pinned_resp.as_mut().poll_next_event(cx)).await;
        let event = match event_or_err {
            Ok(event) => event,
            Err(err) => {
                error!("stream broke: {err}");
                return Err(Box::new(err));
            }
        };

        let Some(event) = event else {
            break;
        };
        trace!("got an event: {event:?}");
        on_event(event);
    }

    debug!("finished a request");
    Ok(())
}
