mod accumulator;
mod client;
pub mod config;
mod conversation;
mod errors;
mod event;
mod request;
mod response;
mod responses_api;
pub mod responses_test;
mod sse;
mod telemetry;
mod tool;
mod types;
mod types_ext;

pub use accumulator::StreamAccumulator;
pub use client::{Client, ClientOptions, DEFAULT_BASE_URL};
pub use config::ConfigParameter;
pub use conversation::Conversation;
pub use errors::*;
pub use event::*;
pub use request::{Request, RequestBuilder};
pub use response::*;
pub use responses_api::{ResponseEventStream, ResponsesApi};
pub use sse::decode_event_stream;
pub use tool::*;
pub use types::*;
