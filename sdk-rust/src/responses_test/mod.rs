//! Test doubles for code that talks to a [`ResponsesApi`](crate::ResponsesApi).

mod api;

pub use api::{MockResponsesApi, MockSendResult, MockStreamResult};
