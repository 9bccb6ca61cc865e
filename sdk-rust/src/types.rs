use crate::{LLMError, LLMResult};
use serde::{ser::SerializeMap, Deserialize, Serialize};
use serde_json::Value;

/// The speaker of a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[serde(alias = "developer")]
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

/// The detail level of an image input. Defaults to `auto` on the server.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImageDetail {
    Auto,
    Low,
    High,
}

/// One piece of multimodal message content.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    Text(String),
    /// An image referenced by a fully qualified URL or a base64 data URL.
    ImageRef {
        url: String,
        detail: Option<ImageDetail>,
    },
    /// A file previously uploaded to the provider.
    FileRef { file_id: String },
    /// An inline file encoded as a base64 data URL.
    FileData {
        data_url: String,
        filename: Option<String>,
    },
}

/// A non-empty, ordered list of content parts.
#[derive(Debug, Clone, PartialEq)]
pub struct Content(Vec<ContentPart>);

impl Content {
    pub fn new(parts: Vec<ContentPart>) -> LLMResult<Self> {
        if parts.is_empty() {
            return Err(LLMError::InvalidValue(
                "message content must contain at least one part".to_string(),
            ));
        }
        Ok(Self(parts))
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self(vec![ContentPart::Text(text.into())])
    }

    #[must_use]
    pub fn parts(&self) -> &[ContentPart] {
        &self.0
    }
}

/// The output of a function call, fed back to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// The `call_id` of the function call this output answers.
    pub call_id: String,
    /// The output of the function, usually a JSON string.
    pub output: String,
}

/// A message in the conversation input.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    System(Content),
    User(Content),
    Assistant(Content),
    Tool(ToolOutput),
}

// The wire format uses "input_text" for user/system content and
// "output_text" for assistant content, so parts are written through this
// wrapper with the tag chosen by the owning message.
struct WirePart<'a> {
    part: &'a ContentPart,
    text_type: &'static str,
}

impl Serialize for WirePart<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        match self.part {
            ContentPart::Text(text) => {
                map.serialize_entry("type", self.text_type)?;
                map.serialize_entry("text", text)?;
            }
            ContentPart::ImageRef { url, detail } => {
                map.serialize_entry("type", "input_image")?;
                map.serialize_entry("image_url", url)?;
                if let Some(detail) = detail {
                    map.serialize_entry("detail", detail)?;
                }
            }
            ContentPart::FileRef { file_id } => {
                map.serialize_entry("type", "input_file")?;
                map.serialize_entry("file_id", file_id)?;
            }
            ContentPart::FileData { data_url, filename } => {
                map.serialize_entry("type", "input_file")?;
                map.serialize_entry("file_data", data_url)?;
                if let Some(filename) = filename {
                    map.serialize_entry("filename", filename)?;
                }
            }
        }
        map.end()
    }
}

struct WireContent<'a> {
    content: &'a Content,
    text_type: &'static str,
}

impl Serialize for WireContent<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.content.parts().iter().map(|part| WirePart {
            part,
            text_type: self.text_type,
        }))
    }
}

impl Serialize for ContentPart {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        WirePart {
            part: self,
            text_type: "input_text",
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ContentPart {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        content_part_from_value(&value).map_err(serde::de::Error::custom)
    }
}

fn str_field(value: &Value, field: &str) -> Option<String> {
    value.get(field).and_then(Value::as_str).map(str::to_string)
}

fn content_part_from_value(value: &Value) -> Result<ContentPart, String> {
    let type_str = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| "content part is missing `type`".to_string())?;

    match type_str {
        "input_text" | "output_text" | "text" => str_field(value, "text")
            .map(ContentPart::Text)
            .ok_or_else(|| format!("`{type_str}` part is missing `text`")),
        "input_image" => {
            let url = str_field(value, "image_url")
                .ok_or_else(|| "`input_image` part is missing `image_url`".to_string())?;
            let detail = match value.get("detail") {
                None | Some(Value::Null) => None,
                Some(detail) => Some(
                    serde_json::from_value(detail.clone())
                        .map_err(|e| format!("invalid image detail: {e}"))?,
                ),
            };
            Ok(ContentPart::ImageRef { url, detail })
        }
        "input_file" => {
            if let Some(data_url) = str_field(value, "file_data") {
                Ok(ContentPart::FileData {
                    data_url,
                    filename: str_field(value, "filename"),
                })
            } else if let Some(file_id) = str_field(value, "file_id") {
                Ok(ContentPart::FileRef { file_id })
            } else {
                Err("`input_file` part needs `file_id` or `file_data`".to_string())
            }
        }
        other => Err(format!("unknown content part type `{other}`")),
    }
}

impl Serialize for Message {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        match self {
            Self::System(content) | Self::User(content) | Self::Assistant(content) => {
                let text_type = if matches!(self, Self::Assistant(_)) {
                    "output_text"
                } else {
                    "input_text"
                };
                map.serialize_entry("type", "message")?;
                map.serialize_entry("role", self.role().as_str())?;
                map.serialize_entry("content", &WireContent { content, text_type })?;
            }
            Self::Tool(output) => {
                map.serialize_entry("type", "function_call_output")?;
                map.serialize_entry("call_id", &output.call_id)?;
                map.serialize_entry("output", &output.output)?;
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Message {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error as _;

        let value = Value::deserialize(deserializer)?;
        let type_str = value.get("type").and_then(Value::as_str).unwrap_or("message");

        match type_str {
            "message" => {
                let role = value
                    .get("role")
                    .cloned()
                    .ok_or_else(|| D::Error::missing_field("role"))?;
                let role: Role = serde_json::from_value(role).map_err(D::Error::custom)?;

                let parts = match value.get("content") {
                    Some(Value::String(text)) => vec![ContentPart::Text(text.clone())],
                    Some(Value::Array(items)) => items
                        .iter()
                        .map(content_part_from_value)
                        .collect::<Result<Vec<_>, _>>()
                        .map_err(D::Error::custom)?,
                    _ => return Err(D::Error::missing_field("content")),
                };
                let content = Content::new(parts).map_err(D::Error::custom)?;

                match role {
                    Role::System => Ok(Self::System(content)),
                    Role::User => Ok(Self::User(content)),
                    Role::Assistant => Ok(Self::Assistant(content)),
                    Role::Tool => Err(D::Error::custom(
                        "tool results must be sent as `function_call_output` items",
                    )),
                }
            }
            "function_call_output" => serde_json::from_value(value)
                .map(Self::Tool)
                .map_err(D::Error::custom),
            _ => Err(D::Error::unknown_variant(
                type_str,
                &["message", "function_call_output"],
            )),
        }
    }
}
