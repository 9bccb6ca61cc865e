use crate::Role;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A response returned by the Responses endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Unique identifier for this Response.
    pub id: String,

    /// The object type of this resource - always set to `response`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,

    /// Unix timestamp (in seconds) of when this Response was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,

    /// The status of the response generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ResponseStatus>,

    /// Model ID used to generate the response.
    pub model: String,

    /// An array of content items generated by the model, in order.
    #[serde(default)]
    pub output: Vec<OutputItem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,

    /// The error returned when the model fails to generate a response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,

    /// Details about why the response is incomplete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incomplete_details: Option<IncompleteDetails>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_response_id: Option<String>,

    /// Every other field the server sent, kept as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Completed,
    Failed,
    InProgress,
    Cancelled,
    Queued,
    Incomplete,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseError {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncompleteDetails {
    /// The reason why the response is incomplete.
    pub reason: String,
}

/// Token usage of a response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,

    pub output_tokens: u32,

    #[serde(default)]
    pub total_tokens: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens_details: Option<InputTokensDetails>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_tokens_details: Option<OutputTokensDetails>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputTokensDetails {
    /// The number of tokens that were retrieved from the cache.
    #[serde(default)]
    pub cached_tokens: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputTokensDetails {
    #[serde(default)]
    pub reasoning_tokens: u32,
}

/// An item in a response's `output` array.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputItem {
    Message(OutputMessage),
    FunctionCall(FunctionCall),
    FileSearchCall(FileSearchCall),
    WebSearchCall(WebSearchCall),
    Reasoning(ReasoningItem),
    /// Any other tool call item (e.g. `code_interpreter_call`, `mcp_call`),
    /// kept generically.
    ToolCall(ToolCall),
}

/// An output message from the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputMessage {
    /// The unique ID of the output message.
    pub id: String,

    /// The role of the output message. Always `assistant`.
    pub role: Role,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    pub content: Vec<OutputContent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputContent {
    OutputText(OutputText),
    Refusal(Refusal),
}

/// A text output from the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputText {
    pub text: String,

    /// Citations and file paths, passed through as-is.
    #[serde(default)]
    pub annotations: Vec<Value>,
}

/// A refusal from the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Refusal {
    pub refusal: String,
}

/// A tool call to run a function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// The unique ID of the function tool call item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// The ID generated by the model, echoed back in the tool output.
    pub call_id: String,

    pub name: String,

    /// A JSON string of the arguments to pass to the function.
    pub arguments: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// The results of a file search tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSearchCall {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default)]
    pub queries: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<Value>>,
}

/// The results of a web search tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebSearchCall {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Value>,
}

/// A description of the chain of thought used by a reasoning model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningItem {
    pub id: String,

    #[serde(default)]
    pub summary: Vec<ReasoningSummaryText>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningSummaryText {
    pub text: String,
}

/// A tool call item this library has no dedicated type for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(rename = "type")]
    pub item_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

// Hand-written so unknown item types fall back to `ToolCall` while known
// types still fail loudly when their payload is malformed.
impl Serialize for OutputItem {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        #[derive(Serialize)]
        struct Helper<'a, T: Serialize> {
            #[serde(rename = "type")]
            type_: &'static str,
            #[serde(flatten)]
            inner: &'a T,
        }

        match self {
            Self::Message(inner) => Helper {
                type_: "message",
                inner,
            }
            .serialize(serializer),
            Self::FunctionCall(inner) => Helper {
                type_: "function_call",
                inner,
            }
            .serialize(serializer),
            Self::FileSearchCall(inner) => Helper {
                type_: "file_search_call",
                inner,
            }
            .serialize(serializer),
            Self::WebSearchCall(inner) => Helper {
                type_: "web_search_call",
                inner,
            }
            .serialize(serializer),
            Self::Reasoning(inner) => Helper {
                type_: "reasoning",
                inner,
            }
            .serialize(serializer),
            Self::ToolCall(inner) => inner.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for OutputItem {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error as _;

        let value = Value::deserialize(deserializer)?;
        let type_str = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| D::Error::missing_field("type"))?;

        match type_str {
            "message" => serde_json::from_value(value)
                .map(Self::Message)
                .map_err(D::Error::custom),
            "function_call" => serde_json::from_value(value)
                .map(Self::FunctionCall)
                .map_err(D::Error::custom),
            "file_search_call" => serde_json::from_value(value)
                .map(Self::FileSearchCall)
                .map_err(D::Error::custom),
            "web_search_call" => serde_json::from_value(value)
                .map(Self::WebSearchCall)
                .map_err(D::Error::custom),
            "reasoning" => serde_json::from_value(value)
                .map(Self::Reasoning)
                .map_err(D::Error::custom),
            _ => serde_json::from_value(value)
                .map(Self::ToolCall)
                .map_err(D::Error::custom),
        }
    }
}

impl OutputItem {
    /// The item's ID, when the server assigned one.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Message(item) => Some(&item.id),
            Self::FunctionCall(item) => item.id.as_deref(),
            Self::FileSearchCall(item) => Some(&item.id),
            Self::WebSearchCall(item) => Some(&item.id),
            Self::Reasoning(item) => Some(&item.id),
            Self::ToolCall(item) => item.id.as_deref(),
        }
    }
}

impl OutputMessage {
    /// The concatenated `output_text` parts of this message.
    #[must_use]
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|content| match content {
                OutputContent::OutputText(text) => Some(text.text.as_str()),
                OutputContent::Refusal(_) => None,
            })
            .collect()
    }
}

impl Response {
    /// Output messages whose role is `assistant`.
    pub fn assistant_messages(&self) -> impl Iterator<Item = &OutputMessage> {
        self.output.iter().filter_map(|item| match item {
            OutputItem::Message(message) if message.role == Role::Assistant => Some(message),
            _ => None,
        })
    }

    /// Every tool call item in the output.
    pub fn tool_calls(&self) -> impl Iterator<Item = &OutputItem> {
        self.output
            .iter()
            .filter(|item| !matches!(item, OutputItem::Message(_) | OutputItem::Reasoning(_)))
    }

    /// Function calls the caller is expected to execute.
    pub fn function_calls(&self) -> impl Iterator<Item = &FunctionCall> {
        self.output.iter().filter_map(|item| match item {
            OutputItem::FunctionCall(call) => Some(call),
            _ => None,
        })
    }

    /// The text of all assistant messages, joined in output order.
    #[must_use]
    pub fn output_text(&self) -> String {
        self.assistant_messages().map(OutputMessage::text).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "id": "resp_1",
            "object": "response",
            "created_at": 1_741_476_542,
            "status": "completed",
            "model": "gpt-4o-2024-08-06",
            "output": [
                {
                    "type": "reasoning",
                    "id": "rs_1",
                    "summary": [{ "type": "summary_text", "text": "thinking" }]
                },
                {
                    "type": "message",
                    "id": "msg_1",
                    "status": "completed",
                    "role": "assistant",
                    "content": [
                        { "type": "output_text", "text": "Hello", "annotations": [] },
                        { "type": "output_text", "text": ", world" }
                    ]
                },
                {
                    "type": "function_call",
                    "id": "fc_1",
                    "call_id": "call_1",
                    "name": "get_weather",
                    "arguments": "{\"city\":\"Paris\"}",
                    "status": "completed"
                },
                {
                    "type": "web_search_call",
                    "id": "ws_1",
                    "status": "completed"
                },
                {
                    "type": "code_interpreter_call",
                    "id": "ci_1",
                    "status": "completed",
                    "code": "print(1)"
                }
            ],
            "usage": {
                "input_tokens": 36,
                "input_tokens_details": { "cached_tokens": 0 },
                "output_tokens": 87,
                "output_tokens_details": { "reasoning_tokens": 0 },
                "total_tokens": 123
            },
            "parallel_tool_calls": true,
            "temperature": 1.0
        })
    }

    #[test]
    fn decodes_output_items() {
        let response: Response = serde_json::from_value(sample()).unwrap();

        assert_eq!(response.id, "resp_1");
        assert_eq!(response.status, Some(ResponseStatus::Completed));
        assert_eq!(response.output.len(), 5);
        assert!(matches!(response.output[0], OutputItem::Reasoning(_)));
        assert_eq!(response.output_text(), "Hello, world");
        assert_eq!(response.assistant_messages().count(), 1);

        let tool_calls: Vec<_> = response.tool_calls().collect();
        assert_eq!(tool_calls.len(), 3);
        assert_eq!(tool_calls[2].id(), Some("ci_1"));
        match tool_calls[2] {
            OutputItem::ToolCall(call) => {
                assert_eq!(call.item_type, "code_interpreter_call");
                assert_eq!(call.fields["code"], json!("print(1)"));
            }
            other => panic!("unexpected item: {other:?}"),
        }

        let call = response.function_calls().next().unwrap();
        assert_eq!(call.call_id, "call_1");
        assert_eq!(call.name, "get_weather");

        assert_eq!(response.usage.as_ref().unwrap().total_tokens, 123);
        assert_eq!(response.extra["parallel_tool_calls"], json!(true));
    }

    #[test]
    fn reencodes_to_the_same_json() {
        let response: Response = serde_json::from_value(sample()).unwrap();
        let encoded = serde_json::to_value(&response).unwrap();
        let decoded: Response = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, response);
    }

    #[test]
    fn malformed_known_item_fails() {
        let mut value = sample();
        value["output"][2] = json!({ "type": "function_call", "name": "x" });
        assert!(serde_json::from_value::<Response>(value).is_err());
    }

    #[test]
    fn tolerates_minimal_compatible_servers() {
        let response: Response = serde_json::from_value(json!({
            "id": "resp_2",
            "model": "llama",
            "status": "some_new_status",
            "output": [],
            "usage": { "input_tokens": 1, "output_tokens": 2 }
        }))
        .unwrap();
        assert_eq!(response.status, Some(ResponseStatus::Unknown));
        assert_eq!(response.usage.as_ref().unwrap().total_tokens, 0);
        assert_eq!(response.output_text(), "");
    }
}
