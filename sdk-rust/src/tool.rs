use crate::{LLMError, LLMResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const MAX_NAME_LENGTH: usize = 64;

/// A capability the model may call while generating a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Tool {
    Function(FunctionTool),
    FileSearch(FileSearchTool),
    WebSearchPreview(WebSearchTool),
}

/// Defines a function in your own code the model can choose to call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionTool {
    /// The name of the function to call.
    pub name: String,

    /// A description of the function. Used by the model to determine whether or
    /// not to call the function.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// A JSON schema object describing the parameters of the function.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,

    /// Whether to enforce strict parameter validation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
}

/// Searches the contents of uploaded files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileSearchTool {
    /// The IDs of the vector stores to search.
    pub vector_store_ids: Vec<String>,

    /// A filter to apply, passed through as-is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Value>,

    /// The maximum number of results to return, between 1 and 50.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_num_results: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ranking_options: Option<FileSearchRankingOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileSearchRankingOptions {
    /// The ranker to use for the file search.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ranker: Option<String>,

    /// Results scoring below this threshold (0 to 1) are dropped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_threshold: Option<f64>,
}

/// Search the Internet for sources related to the prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebSearchTool {
    /// High level guidance for the amount of context window space to use for
    /// the search. One of `low`, `medium`, or `high`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_context_size: Option<String>,

    /// The approximate location of the user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_location: Option<WebSearchUserLocation>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<WebSearchFilters>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebSearchFilters {
    /// Allowed domains for the search. Subdomains are allowed as well.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_domains: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebSearchUserLocation {
    /// The type of location approximation. Always `approximate`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub location_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    /// Two-letter ISO country code, e.g. `US`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// IANA timezone, e.g. `America/Los_Angeles`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl Tool {
    /// Declare a function tool. The name must match `[A-Za-z0-9_-]{1,64}`.
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
    ) -> LLMResult<Self> {
        let name = name.into();
        validate_name("tools.name", &name)?;
        Ok(Self::Function(FunctionTool {
            name,
            description: Some(description.into()),
            parameters: Some(parameters),
            strict: None,
        }))
    }

    #[must_use]
    pub fn file_search(vector_store_ids: Vec<String>) -> Self {
        Self::FileSearch(FileSearchTool {
            vector_store_ids,
            ..Default::default()
        })
    }

    #[must_use]
    pub fn web_search() -> Self {
        Self::WebSearchPreview(WebSearchTool::default())
    }

    /// The function name, for function tools.
    #[must_use]
    pub fn function_name(&self) -> Option<&str> {
        match self {
            Self::Function(function) => Some(&function.name),
            _ => None,
        }
    }
}

pub(crate) fn validate_name(field: &str, name: &str) -> LLMResult<()> {
    if name.is_empty() || name.len() > MAX_NAME_LENGTH {
        return Err(LLMError::invalid_parameter(
            field,
            format!("`{name}` must be between 1 and {MAX_NAME_LENGTH} characters"),
        ));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(LLMError::invalid_parameter(
            field,
            format!("`{name}` contains invalid character `{c}`"),
        ));
    }
    Ok(())
}

/// How the model should select which tool (or tools) to use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolChoice {
    Mode(ToolChoiceMode),
    Function(ToolChoiceFunction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolChoiceMode {
    None,
    Auto,
    Required,
}

/// Force the model to call a specific function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolChoiceFunction {
    /// For function calling, the type is always `function`.
    #[serde(rename = "type")]
    pub choice_type: String,

    /// The name of the function to call.
    pub name: String,
}

impl ToolChoice {
    /// Parse one of `none`, `auto` or `required`.
    pub fn parse(value: &str) -> LLMResult<Self> {
        match value {
            "none" => Ok(Self::Mode(ToolChoiceMode::None)),
            "auto" => Ok(Self::Mode(ToolChoiceMode::Auto)),
            "required" => Ok(Self::Mode(ToolChoiceMode::Required)),
            other => Err(LLMError::InvalidValue(format!(
                "tool_choice must be one of none, auto, required; got `{other}`"
            ))),
        }
    }

    /// Force a call to the named function.
    pub fn function(name: impl Into<String>) -> LLMResult<Self> {
        let name = name.into();
        validate_name("tool_choice", &name).map_err(|_| {
            LLMError::InvalidValue(format!("tool_choice function name `{name}` is invalid"))
        })?;
        Ok(Self::Function(ToolChoiceFunction {
            choice_type: "function".to_string(),
            name,
        }))
    }
}
