use crate::{LLMError, LLMResult, OutputContent, OutputItem, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// A typed server-sent event from a streaming response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseEvent {
    /// `response.created`
    Created(ResponseLifecycleEvent),
    /// `response.in_progress`
    InProgress(ResponseLifecycleEvent),
    /// `response.output_item.added`
    OutputItemAdded(OutputItemEvent),
    /// `response.content_part.added`
    ContentPartAdded(ContentPartEvent),
    /// `response.output_text.delta`
    OutputTextDelta(TextDeltaEvent),
    /// `response.output_text.done`
    OutputTextDone(TextDoneEvent),
    /// `response.refusal.delta`
    RefusalDelta(TextDeltaEvent),
    /// `response.refusal.done`
    RefusalDone(RefusalDoneEvent),
    /// `response.function_call_arguments.delta`
    FunctionCallArgumentsDelta(FunctionCallArgumentsDeltaEvent),
    /// `response.function_call_arguments.done`
    FunctionCallArgumentsDone(FunctionCallArgumentsDoneEvent),
    /// `response.content_part.done`
    ContentPartDone(ContentPartEvent),
    /// `response.output_item.done`
    OutputItemDone(OutputItemEvent),
    /// `response.completed`
    Completed(ResponseLifecycleEvent),
    /// `response.failed`
    Failed(ResponseLifecycleEvent),
    /// `response.incomplete`
    Incomplete(ResponseLifecycleEvent),
    /// Any event type without a typed representation.
    Unknown { event_type: String, payload: Value },
}

/// Carries the full response snapshot at a lifecycle transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseLifecycleEvent {
    pub response: Response,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputItemEvent {
    /// The index of the output item in the response's `output` array.
    pub output_index: usize,

    pub item: OutputItem,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPartEvent {
    pub item_id: String,

    pub output_index: usize,

    /// The index of the content part within the output item.
    pub content_index: usize,

    pub part: OutputContent,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<u64>,
}

/// A chunk of text appended to a content part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextDeltaEvent {
    pub item_id: String,

    pub output_index: usize,

    pub content_index: usize,

    pub delta: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextDoneEvent {
    pub item_id: String,

    pub output_index: usize,

    pub content_index: usize,

    /// The final text of the content part.
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefusalDoneEvent {
    pub item_id: String,

    pub output_index: usize,

    pub content_index: usize,

    pub refusal: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCallArgumentsDeltaEvent {
    pub item_id: String,

    pub output_index: usize,

    /// A fragment of the JSON-encoded arguments.
    pub delta: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCallArgumentsDoneEvent {
    pub item_id: String,

    pub output_index: usize,

    pub arguments: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<u64>,
}

/// Payload of an `error` event.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorEvent {
    #[serde(default)]
    pub code: Option<String>,

    #[serde(default)]
    pub message: Option<String>,

    // Some servers nest the details like an HTTP error body.
    #[serde(default)]
    pub error: Option<ErrorEventDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorEventDetail {
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorEvent {
    pub(crate) fn into_message(self) -> String {
        self.message
            .or_else(|| self.error.and_then(|detail| detail.message))
            .or(self.code)
            .unwrap_or_else(|| "stream reported an error".to_string())
    }
}

impl ResponseEvent {
    /// Decode the `data` of an SSE block whose type is `event_type`.
    ///
    /// Malformed JSON yields `JsonParsingError`; well-formed JSON that does
    /// not match the type's schema yields `DecodingFailed`.
    pub fn decode(event_type: &str, data: &str) -> LLMResult<Self> {
        let payload: Value = serde_json::from_str(data).map_err(|e| LLMError::from_json(&e))?;

        let event = match event_type {
            "response.created" => Self::Created(typed(payload)?),
            "response.in_progress" => Self::InProgress(typed(payload)?),
            "response.output_item.added" => Self::OutputItemAdded(typed(payload)?),
            "response.content_part.added" => Self::ContentPartAdded(typed(payload)?),
            "response.output_text.delta" => Self::OutputTextDelta(typed(payload)?),
            "response.output_text.done" => Self::OutputTextDone(typed(payload)?),
            "response.refusal.delta" => Self::RefusalDelta(typed(payload)?),
            "response.refusal.done" => Self::RefusalDone(typed(payload)?),
            "response.function_call_arguments.delta" => {
                Self::FunctionCallArgumentsDelta(typed(payload)?)
            }
            "response.function_call_arguments.done" => {
                Self::FunctionCallArgumentsDone(typed(payload)?)
            }
            "response.content_part.done" => Self::ContentPartDone(typed(payload)?),
            "response.output_item.done" => Self::OutputItemDone(typed(payload)?),
            "response.completed" => Self::Completed(typed(payload)?),
            "response.failed" => Self::Failed(typed(payload)?),
            "response.incomplete" => Self::Incomplete(typed(payload)?),
            other => Self::Unknown {
                event_type: other.to_string(),
                payload,
            },
        };
        Ok(event)
    }

    /// The wire name of this event.
    #[must_use]
    pub fn event_type(&self) -> &str {
        match self {
            Self::Created(_) => "response.created",
            Self::InProgress(_) => "response.in_progress",
            Self::OutputItemAdded(_) => "response.output_item.added",
            Self::ContentPartAdded(_) => "response.content_part.added",
            Self::OutputTextDelta(_) => "response.output_text.delta",
            Self::OutputTextDone(_) => "response.output_text.done",
            Self::RefusalDelta(_) => "response.refusal.delta",
            Self::RefusalDone(_) => "response.refusal.done",
            Self::FunctionCallArgumentsDelta(_) => "response.function_call_arguments.delta",
            Self::FunctionCallArgumentsDone(_) => "response.function_call_arguments.done",
            Self::ContentPartDone(_) => "response.content_part.done",
            Self::OutputItemDone(_) => "response.output_item.done",
            Self::Completed(_) => "response.completed",
            Self::Failed(_) => "response.failed",
            Self::Incomplete(_) => "response.incomplete",
            Self::Unknown { event_type, .. } => event_type,
        }
    }

    /// Whether this event ends the stream.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed(_) | Self::Failed(_) | Self::Incomplete(_)
        )
    }

    /// The final response carried by a terminal event.
    #[must_use]
    pub fn final_response(&self) -> Option<&Response> {
        match self {
            Self::Completed(event) | Self::Failed(event) | Self::Incomplete(event) => {
                Some(&event.response)
            }
            _ => None,
        }
    }
}

fn typed<T: DeserializeOwned>(payload: Value) -> LLMResult<T> {
    serde_json::from_value(payload).map_err(|e| LLMError::from_json(&e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_text_delta() {
        let event = ResponseEvent::decode(
            "response.output_text.delta",
            r#"{"type":"response.output_text.delta","item_id":"msg_1","output_index":0,"content_index":0,"delta":"Hel","sequence_number":4}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            ResponseEvent::OutputTextDelta(TextDeltaEvent {
                item_id: "msg_1".to_string(),
                output_index: 0,
                content_index: 0,
                delta: "Hel".to_string(),
                sequence_number: Some(4),
            })
        );
        assert_eq!(event.event_type(), "response.output_text.delta");
        assert!(!event.is_terminal());
    }

    #[test]
    fn unknown_type_keeps_raw_payload() {
        let event = ResponseEvent::decode(
            "response.reasoning_summary_text.delta",
            r#"{"delta":"hmm","summary_index":0}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            ResponseEvent::Unknown {
                event_type: "response.reasoning_summary_text.delta".to_string(),
                payload: json!({ "delta": "hmm", "summary_index": 0 }),
            }
        );
    }

    #[test]
    fn classifies_bad_payloads() {
        assert!(matches!(
            ResponseEvent::decode("response.output_text.delta", "{\"delta\":"),
            Err(LLMError::JsonParsingError(_))
        ));
        assert!(matches!(
            ResponseEvent::decode("response.output_text.delta", r#"{"delta":5}"#),
            Err(LLMError::DecodingFailed(_))
        ));
    }

    #[test]
    fn completed_carries_final_response() {
        let event = ResponseEvent::decode(
            "response.completed",
            &json!({
                "type": "response.completed",
                "sequence_number": 9,
                "response": {
                    "id": "resp_1",
                    "status": "completed",
                    "model": "gpt-4o",
                    "output": []
                }
            })
            .to_string(),
        )
        .unwrap();
        assert!(event.is_terminal());
        assert_eq!(event.final_response().map(|r| r.id.as_str()), Some("resp_1"));
    }

    #[test]
    fn error_event_message_fallbacks() {
        let event: ErrorEvent =
            serde_json::from_value(json!({ "code": "server_error", "message": "boom" })).unwrap();
        assert_eq!(event.into_message(), "boom");

        let event: ErrorEvent =
            serde_json::from_value(json!({ "error": { "message": "nested" } })).unwrap();
        assert_eq!(event.into_message(), "nested");

        let event: ErrorEvent = serde_json::from_value(json!({ "code": "overloaded" })).unwrap();
        assert_eq!(event.into_message(), "overloaded");
    }
}
