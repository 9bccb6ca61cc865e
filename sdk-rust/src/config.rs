//! Configuration parameters for a [`Request`](crate::Request).
//!
//! Every parameter validates its value when it is constructed, so a parameter
//! that exists is always safe to apply. Applying is plain field assignment:
//! when two parameters target the same field, the later one wins.

use crate::{tool::validate_name, LLMError, LLMResult, Request, Tool, ToolChoice};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

const MAX_METADATA_PAIRS: usize = 16;
const MAX_METADATA_KEY_LENGTH: usize = 64;
const MAX_METADATA_VALUE_LENGTH: usize = 512;

macro_rules! bounded_parameter {
    ($(#[$meta:meta])* $name:ident, $wire:literal, $ty:ty, $min:expr, $max:expr) => {
        bounded_parameter!(
            @define $(#[$meta])* $name, $ty, value, ($min..=$max).contains(&value),
            format!("{} must be between {} and {}, got {}", $wire, $min, $max, value)
        );
    };
    ($(#[$meta:meta])* $name:ident, $wire:literal, $ty:ty, $min:expr) => {
        bounded_parameter!(
            @define $(#[$meta])* $name, $ty, value, value >= $min,
            format!("{} must be at least {}, got {}", $wire, $min, value)
        );
    };
    (@define $(#[$meta:meta])* $name:ident, $ty:ty, $value:ident, $check:expr, $message:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub struct $name($ty);

        impl $name {
            pub fn new($value: $ty) -> LLMResult<Self> {
                if $check {
                    Ok(Self($value))
                } else {
                    Err(LLMError::InvalidValue($message))
                }
            }

            #[must_use]
            pub fn value(self) -> $ty {
                self.0
            }
        }
    };
}

bounded_parameter!(
    /// Sampling temperature, between 0 and 2.
    Temperature, "temperature", f64, 0.0, 2.0
);
bounded_parameter!(
    /// Nucleus sampling probability mass, between 0 and 1.
    TopP, "top_p", f64, 0.0, 1.0
);
bounded_parameter!(FrequencyPenalty, "frequency_penalty", f64, -2.0, 2.0);
bounded_parameter!(PresencePenalty, "presence_penalty", f64, -2.0, 2.0);
bounded_parameter!(
    /// Maximum number of built-in tool calls in one response.
    MaxToolCalls, "max_tool_calls", i64, 1, 128
);
bounded_parameter!(
    /// Number of most likely tokens to return at each position.
    TopLogprobs, "top_logprobs", i64, 0, 20
);
bounded_parameter!(
    /// Upper bound for generated tokens, including reasoning tokens.
    MaxOutputTokens, "max_output_tokens", i64, 1
);
bounded_parameter!(Seed, "seed", i64, 0);

/// The tools the model may call. Never empty, and every function name is
/// valid.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolsList(Vec<Tool>);

impl ToolsList {
    pub fn new(tools: Vec<Tool>) -> LLMResult<Self> {
        if tools.is_empty() {
            return Err(LLMError::InvalidValue(
                "tools must contain at least one tool".to_string(),
            ));
        }
        for name in tools.iter().filter_map(Tool::function_name) {
            validate_name("tools.name", name)?;
        }
        Ok(Self(tools))
    }

    #[must_use]
    pub fn tools(&self) -> &[Tool] {
        &self.0
    }
}

/// Options for streaming responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamOptions {
    /// When true, random characters are added to an `obfuscation` field on
    /// delta events to normalize payload sizes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_obfuscation: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    Minimal,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningSummary {
    Auto,
    Concise,
    Detailed,
}

/// Configuration for reasoning models.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reasoning {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effort: Option<ReasoningEffort>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ReasoningSummary>,
}

/// The truncation strategy used when the context exceeds the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Truncation {
    Auto,
    Disabled,
}

/// Up to 16 key-value pairs attached to the response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, String>);

impl Metadata {
    pub fn new<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> LLMResult<Self>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let map: BTreeMap<String, String> = pairs
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();

        if map.len() > MAX_METADATA_PAIRS {
            return Err(LLMError::invalid_parameter(
                "metadata",
                format!("at most {MAX_METADATA_PAIRS} pairs are allowed"),
            ));
        }
        for (key, value) in &map {
            if key.chars().count() > MAX_METADATA_KEY_LENGTH {
                return Err(LLMError::invalid_parameter(
                    "metadata",
                    format!("key `{key}` exceeds {MAX_METADATA_KEY_LENGTH} characters"),
                ));
            }
            if value.chars().count() > MAX_METADATA_VALUE_LENGTH {
                return Err(LLMError::invalid_parameter(
                    "metadata",
                    format!("value for `{key}` exceeds {MAX_METADATA_VALUE_LENGTH} characters"),
                ));
            }
        }
        Ok(Self(map))
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

/// Configuration for a text response: plain text or structured JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextConfig {
    pub format: TextFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextFormat {
    Text,
    JsonObject,
    JsonSchema(JsonSchemaFormat),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonSchemaFormat {
    /// Must match `[A-Za-z0-9_-]{1,64}`.
    pub name: String,

    pub schema: Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
}

impl TextFormat {
    /// Structured output constrained to a JSON schema.
    pub fn json_schema(name: impl Into<String>, schema: Value, strict: bool) -> LLMResult<Self> {
        let name = name.into();
        validate_name("text.format.name", &name)?;
        Ok(Self::JsonSchema(JsonSchemaFormat {
            name,
            schema,
            description: None,
            strict: Some(strict),
        }))
    }
}

/// A validated setting applied to a request draft.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigParameter {
    Temperature(Temperature),
    TopP(TopP),
    MaxOutputTokens(MaxOutputTokens),
    FrequencyPenalty(FrequencyPenalty),
    PresencePenalty(PresencePenalty),
    MaxToolCalls(MaxToolCalls),
    ToolChoice(ToolChoice),
    Tools(ToolsList),
    TopLogprobs(TopLogprobs),
    Seed(Seed),
    StreamOptions(StreamOptions),
    Instructions(String),
    ParallelToolCalls(bool),
    Store(bool),
    Reasoning(Reasoning),
    Truncation(Truncation),
    Metadata(Metadata),
    User(String),
    TextFormat(TextFormat),
}

impl ConfigParameter {
    pub fn temperature(value: f64) -> LLMResult<Self> {
        Temperature::new(value).map(Self::Temperature)
    }

    pub fn top_p(value: f64) -> LLMResult<Self> {
        TopP::new(value).map(Self::TopP)
    }

    pub fn max_output_tokens(value: i64) -> LLMResult<Self> {
        MaxOutputTokens::new(value).map(Self::MaxOutputTokens)
    }

    pub fn frequency_penalty(value: f64) -> LLMResult<Self> {
        FrequencyPenalty::new(value).map(Self::FrequencyPenalty)
    }

    pub fn presence_penalty(value: f64) -> LLMResult<Self> {
        PresencePenalty::new(value).map(Self::PresencePenalty)
    }

    pub fn max_tool_calls(value: i64) -> LLMResult<Self> {
        MaxToolCalls::new(value).map(Self::MaxToolCalls)
    }

    pub fn tool_choice(value: &str) -> LLMResult<Self> {
        ToolChoice::parse(value).map(Self::ToolChoice)
    }

    pub fn tools(tools: Vec<Tool>) -> LLMResult<Self> {
        ToolsList::new(tools).map(Self::Tools)
    }

    pub fn top_logprobs(value: i64) -> LLMResult<Self> {
        TopLogprobs::new(value).map(Self::TopLogprobs)
    }

    pub fn seed(value: i64) -> LLMResult<Self> {
        Seed::new(value).map(Self::Seed)
    }

    pub fn instructions(text: impl Into<String>) -> LLMResult<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(LLMError::InvalidValue(
                "instructions must not be empty".to_string(),
            ));
        }
        Ok(Self::Instructions(text))
    }

    pub fn user(id: impl Into<String>) -> LLMResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(LLMError::InvalidValue("user must not be empty".to_string()));
        }
        Ok(Self::User(id))
    }

    /// Assign this parameter's value to its field on the draft.
    pub(crate) fn apply(self, request: &mut Request) {
        match self {
            Self::Temperature(v) => request.temperature = Some(v.value()),
            Self::TopP(v) => request.top_p = Some(v.value()),
            Self::MaxOutputTokens(v) => request.max_output_tokens = Some(v.value()),
            Self::FrequencyPenalty(v) => request.frequency_penalty = Some(v.value()),
            Self::PresencePenalty(v) => request.presence_penalty = Some(v.value()),
            Self::MaxToolCalls(v) => request.max_tool_calls = Some(v.value()),
            Self::ToolChoice(v) => request.tool_choice = Some(v),
            Self::Tools(v) => request.tools = Some(v.0),
            Self::TopLogprobs(v) => request.top_logprobs = Some(v.value()),
            Self::Seed(v) => request.seed = Some(v.value()),
            Self::StreamOptions(v) => request.stream_options = Some(v),
            Self::Instructions(v) => request.instructions = Some(v),
            Self::ParallelToolCalls(v) => request.parallel_tool_calls = Some(v),
            Self::Store(v) => request.store = Some(v),
            Self::Reasoning(v) => request.reasoning = Some(v),
            Self::Truncation(v) => request.truncation = Some(v),
            Self::Metadata(v) => request.metadata = Some(v),
            Self::User(v) => request.user = Some(v),
            Self::TextFormat(format) => request.text = Some(TextConfig { format }),
        }
    }
}

macro_rules! impl_from_parameter {
    ($($ty:ident),* $(,)?) => {
        $(
            impl From<$ty> for ConfigParameter {
                fn from(value: $ty) -> Self {
                    Self::$ty(value)
                }
            }
        )*
    };
}

impl_from_parameter!(
    Temperature,
    TopP,
    MaxOutputTokens,
    FrequencyPenalty,
    PresencePenalty,
    MaxToolCalls,
    ToolChoice,
    TopLogprobs,
    Seed,
    StreamOptions,
    Reasoning,
    Truncation,
    Metadata,
    TextFormat,
);

impl From<ToolsList> for ConfigParameter {
    fn from(value: ToolsList) -> Self {
        Self::Tools(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn temperature_accepts_its_closed_range() {
        for value in [0.0, 0.5, 1.0, 1.7, 2.0] {
            assert_eq!(Temperature::new(value).unwrap().value(), value);
        }
        for value in [-0.1, 2.01, 10.0, f64::NAN] {
            assert!(matches!(
                Temperature::new(value),
                Err(LLMError::InvalidValue(_))
            ));
        }
    }

    #[test]
    fn validates_every_numeric_domain() {
        assert!(TopP::new(1.0).is_ok());
        assert!(TopP::new(1.1).is_err());
        assert!(MaxOutputTokens::new(1).is_ok());
        assert!(MaxOutputTokens::new(0).is_err());
        assert!(MaxOutputTokens::new(-5).is_err());
        assert!(FrequencyPenalty::new(-2.0).is_ok());
        assert!(FrequencyPenalty::new(-2.5).is_err());
        assert!(PresencePenalty::new(2.0).is_ok());
        assert!(PresencePenalty::new(2.1).is_err());
        assert!(MaxToolCalls::new(1).is_ok());
        assert!(MaxToolCalls::new(128).is_ok());
        assert!(MaxToolCalls::new(0).is_err());
        assert!(MaxToolCalls::new(129).is_err());
        assert!(TopLogprobs::new(0).is_ok());
        assert!(TopLogprobs::new(20).is_ok());
        assert!(TopLogprobs::new(21).is_err());
        assert!(Seed::new(0).is_ok());
        assert!(Seed::new(-1).is_err());
    }

    #[test]
    fn error_message_names_the_parameter() {
        let error = TopP::new(3.0).unwrap_err();
        assert_eq!(
            error,
            LLMError::InvalidValue("top_p must be between 0 and 1, got 3".to_string())
        );
    }

    #[test]
    fn open_ended_ranges_state_only_the_minimum() {
        assert_eq!(
            MaxOutputTokens::new(0).unwrap_err(),
            LLMError::InvalidValue("max_output_tokens must be at least 1, got 0".to_string())
        );
        assert_eq!(
            Seed::new(-3).unwrap_err(),
            LLMError::InvalidValue("seed must be at least 0, got -3".to_string())
        );
        assert_eq!(MaxOutputTokens::new(i64::MAX).unwrap().value(), i64::MAX);
    }

    #[test]
    fn tools_list_must_not_be_empty() {
        assert!(matches!(
            ConfigParameter::tools(vec![]),
            Err(LLMError::InvalidValue(_))
        ));
        assert!(ConfigParameter::tools(vec![Tool::web_search()]).is_ok());
    }

    #[test]
    fn text_parameters_must_not_be_empty() {
        assert!(ConfigParameter::instructions("  ").is_err());
        assert!(ConfigParameter::user("").is_err());
        assert_eq!(
            ConfigParameter::instructions("be terse").unwrap(),
            ConfigParameter::Instructions("be terse".to_string())
        );
    }

    #[test]
    fn metadata_limits() {
        let metadata = Metadata::new([("team", "search")]).unwrap();
        assert_eq!(metadata.get("team"), Some("search"));

        let too_many = (0..17).map(|i| (format!("k{i}"), "v".to_string()));
        assert!(matches!(
            Metadata::new(too_many),
            Err(LLMError::InvalidParameter { name, .. }) if name == "metadata"
        ));
        assert!(Metadata::new([("k".repeat(65), "v")]).is_err());
        assert!(Metadata::new([("k", "v".repeat(513))]).is_err());
    }

    #[test]
    fn json_schema_format_validates_name() {
        let format = TextFormat::json_schema("answer", json!({ "type": "object" }), true).unwrap();
        assert_eq!(
            serde_json::to_value(TextConfig { format }).unwrap(),
            json!({
                "format": {
                    "type": "json_schema",
                    "name": "answer",
                    "schema": { "type": "object" },
                    "strict": true
                }
            })
        );
        assert!(matches!(
            TextFormat::json_schema("bad name", json!({}), true),
            Err(LLMError::InvalidParameter { name, .. }) if name == "text.format.name"
        ));
    }
}
