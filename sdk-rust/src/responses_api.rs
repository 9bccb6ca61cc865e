use std::{
    pin::Pin,
    task::{Context, Poll},
};

use crate::{LLMResult, Request, Response, ResponseEvent};
use futures::Stream;

/// The operations of a Responses endpoint.
///
/// Implemented by [`Client`](crate::Client) and by the
/// [`MockResponsesApi`](crate::responses_test::MockResponsesApi) test double,
/// so application code can take either.
#[async_trait::async_trait]
pub trait ResponsesApi: Send + Sync {
    /// Send a request and wait for the complete response.
    async fn send(&self, request: &Request) -> LLMResult<Response>;

    /// Open a streaming response. The request is sent with `stream` set to
    /// true regardless of its own flag.
    async fn stream(&self, request: &Request) -> LLMResult<ResponseEventStream>;

    /// Whether a credential is configured. Never touches the network.
    fn is_authenticated(&self) -> bool;
}

/// A forward-only, single-consumer stream of response events.
///
/// Dropping it releases the underlying connection.
pub struct ResponseEventStream(Pin<Box<dyn Stream<Item = LLMResult<ResponseEvent>> + Send>>);

impl ResponseEventStream {
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = LLMResult<ResponseEvent>> + Send + 'static,
    {
        Self(Box::pin(stream))
    }
}

impl Stream for ResponseEventStream {
    type Item = LLMResult<ResponseEvent>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.0.as_mut().poll_next(cx)
    }
}

impl std::fmt::Debug for ResponseEventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseEventStream").finish_non_exhaustive()
    }
}
