use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard, PoisonError},
};

use futures::stream;

use crate::{
    LLMError, LLMResult, Request, Response, ResponseEvent, ResponseEventStream, ResponsesApi,
};

/// Result for a mocked `send` call.
/// It can either be a full response or an error to return.
pub enum MockSendResult {
    Response(Box<Response>),
    Error(LLMError),
}

impl MockSendResult {
    /// Construct a result that yields the provided response.
    pub fn response(response: Response) -> Self {
        Self::Response(Box::new(response))
    }

    /// Construct a result that yields the provided error.
    pub fn error(error: LLMError) -> Self {
        Self::Error(error)
    }
}

impl From<Response> for MockSendResult {
    fn from(response: Response) -> Self {
        Self::response(response)
    }
}

impl From<LLMError> for MockSendResult {
    fn from(error: LLMError) -> Self {
        Self::Error(error)
    }
}

impl From<LLMResult<Response>> for MockSendResult {
    fn from(result: LLMResult<Response>) -> Self {
        match result {
            Ok(response) => Self::response(response),
            Err(error) => Self::Error(error),
        }
    }
}

/// Result for a mocked `stream` call.
/// It either opens a stream yielding the given items, or fails to open.
pub enum MockStreamResult {
    /// Items yielded in order. An `Err` item behaves like a mid-stream
    /// failure and ends the stream.
    Events(Vec<LLMResult<ResponseEvent>>),
    Error(LLMError),
}

impl MockStreamResult {
    /// Construct a result that yields the provided events.
    pub fn events(events: Vec<ResponseEvent>) -> Self {
        Self::Events(events.into_iter().map(Ok).collect())
    }

    /// Construct a result whose stream fails to open.
    pub fn error(error: LLMError) -> Self {
        Self::Error(error)
    }
}

impl From<Vec<ResponseEvent>> for MockStreamResult {
    fn from(events: Vec<ResponseEvent>) -> Self {
        Self::events(events)
    }
}

impl From<LLMError> for MockStreamResult {
    fn from(error: LLMError) -> Self {
        Self::Error(error)
    }
}

#[derive(Default)]
struct MockResponsesApiState {
    mocked_send_results: VecDeque<MockSendResult>,
    mocked_stream_results: VecDeque<MockStreamResult>,
    tracked_send_requests: Vec<Request>,
    tracked_stream_requests: Vec<Request>,
}

impl MockResponsesApiState {
    fn reset(&mut self) {
        self.tracked_send_requests.clear();
        self.tracked_stream_requests.clear();
    }

    fn restore(&mut self) {
        self.mocked_send_results.clear();
        self.mocked_stream_results.clear();
        self.reset();
    }
}

/// A mock Responses endpoint that records requests and replays queued
/// results in order.
pub struct MockResponsesApi {
    authenticated: bool,
    state: Mutex<MockResponsesApiState>,
}

impl Default for MockResponsesApi {
    fn default() -> Self {
        Self {
            authenticated: true,
            state: Mutex::new(MockResponsesApiState::default()),
        }
    }
}

impl MockResponsesApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override what `is_authenticated` reports.
    pub fn set_authenticated(&mut self, authenticated: bool) {
        self.authenticated = authenticated;
    }

    fn state(&self) -> MutexGuard<'_, MockResponsesApiState> {
        // A panicking test thread must not hide the recorded requests.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueue a mocked send result.
    pub fn enqueue_send<R>(&self, result: R) -> &Self
    where
        R: Into<MockSendResult>,
    {
        self.state().mocked_send_results.push_back(result.into());
        self
    }

    /// Enqueue a mocked stream result.
    pub fn enqueue_stream<R>(&self, result: R) -> &Self
    where
        R: Into<MockStreamResult>,
    {
        self.state().mocked_stream_results.push_back(result.into());
        self
    }

    /// Requests passed to `send` so far.
    #[must_use]
    pub fn tracked_send_requests(&self) -> Vec<Request> {
        self.state().tracked_send_requests.clone()
    }

    /// Requests passed to `stream` so far, with `stream` forced to true.
    #[must_use]
    pub fn tracked_stream_requests(&self) -> Vec<Request> {
        self.state().tracked_stream_requests.clone()
    }

    /// Reset tracked requests without touching enqueued results.
    pub fn reset(&self) {
        self.state().reset();
    }

    /// Clear both tracked requests and enqueued results.
    pub fn restore(&self) {
        self.state().restore();
    }
}

#[async_trait::async_trait]
impl ResponsesApi for MockResponsesApi {
    async fn send(&self, request: &Request) -> LLMResult<Response> {
        let mut state = self.state();
        state.tracked_send_requests.push(request.clone());

        match state.mocked_send_results.pop_front() {
            Some(MockSendResult::Response(response)) => Ok(*response),
            Some(MockSendResult::Error(error)) => Err(error),
            None => Err(LLMError::InvalidResponse),
        }
    }

    async fn stream(&self, request: &Request) -> LLMResult<ResponseEventStream> {
        let mut state = self.state();
        state.tracked_stream_requests.push(request.with_stream(true));

        match state.mocked_stream_results.pop_front() {
            Some(MockStreamResult::Events(events)) => Ok(stream_from_events(events)),
            Some(MockStreamResult::Error(error)) => Err(error),
            None => Err(LLMError::InvalidResponse),
        }
    }

    fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}

fn stream_from_events(events: Vec<LLMResult<ResponseEvent>>) -> ResponseEventStream {
    // Nothing after the first error is yielded, like a real stream.
    let mut failed = false;
    let events: Vec<_> = events
        .into_iter()
        .take_while(|event| {
            let keep = !failed;
            failed |= event.is_err();
            keep
        })
        .collect();
    ResponseEventStream::from_stream(stream::iter(events))
}
