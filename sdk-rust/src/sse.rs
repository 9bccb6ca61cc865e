use crate::{event::ErrorEvent, LLMError, ResponseEvent, ResponseEventStream};
use eventsource_stream::{Event, EventStreamError, Eventsource};
use futures::{Stream, StreamExt};
use serde::Deserialize;

const DONE_SENTINEL: &str = "[DONE]";

#[derive(Deserialize)]
struct TypeTag {
    #[serde(rename = "type", default)]
    event_type: Option<String>,
}

/// Decode a byte stream in Server-Sent Events framing into response events.
///
/// The returned stream is pull-driven: bytes are read from `bytes` only when
/// the consumer asks for the next event, and dropping it drops `bytes`.
/// It ends after a terminal event (`response.completed`,
/// `response.failed`, `response.incomplete`) or a `[DONE]` line. Reaching the
/// end of `bytes` before either yields a final `NetworkError`.
///
/// `status` is the HTTP status of the streaming response, reported by
/// `ServerError` when the server sends an `error` event.
pub fn decode_event_stream<S, B, E>(bytes: S, status: u16) -> ResponseEventStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<LLMError> + Send + 'static,
{
    let mut sse_stream = Box::pin(bytes.eventsource());

    let stream = async_stream::try_stream! {
        let mut finished = false;

        while let Some(event) = sse_stream.next().await {
            let event = event.map_err(stream_error)?;

            if event.data.is_empty() {
                continue;
            }
            if event.data.trim() == DONE_SENTINEL {
                finished = true;
                break;
            }

            let event_type = event_type(&event)?;
            if event_type == "error" {
                let error: ErrorEvent = serde_json::from_str(&event.data)
                    .map_err(|e| LLMError::from_json(&e))?;
                Err(LLMError::ServerError {
                    status,
                    message: error.into_message(),
                })?;
            }

            let decoded = ResponseEvent::decode(&event_type, &event.data)?;
            if let ResponseEvent::Unknown { event_type, .. } = &decoded {
                tracing::debug!(event_type = %event_type, "unrecognized stream event");
            }

            let terminal = decoded.is_terminal();
            yield decoded;
            if terminal {
                finished = true;
                break;
            }
        }

        if !finished {
            Err(LLMError::NetworkError(
                "connection closed before the response completed".to_string(),
            ))?;
        }
    };

    ResponseEventStream::from_stream(stream)
}

// Blocks without an `event:` line report the default type `message`; the
// payload's own `type` field names the event then.
fn event_type(event: &Event) -> Result<String, LLMError> {
    if !event.event.is_empty() && event.event != "message" {
        return Ok(event.event.clone());
    }
    let tag: TypeTag = serde_json::from_str(&event.data).map_err(|e| LLMError::from_json(&e))?;
    Ok(tag.event_type.unwrap_or_else(|| event.event.clone()))
}

fn stream_error<E: Into<LLMError>>(error: EventStreamError<E>) -> LLMError {
    match error {
        EventStreamError::Utf8(error) => {
            LLMError::DecodingFailed(format!("invalid UTF-8 in event stream: {error}"))
        }
        EventStreamError::Parser(error) => {
            LLMError::DecodingFailed(format!("invalid event stream data: {error}"))
        }
        EventStreamError::Transport(error) => error.into(),
    }
}
