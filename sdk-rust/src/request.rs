use crate::{
    config::{Metadata, Reasoning, StreamOptions, TextConfig, TextFormat, Truncation},
    tool::validate_name,
    ConfigParameter, LLMError, LLMResult, Message, Tool, ToolChoice,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A validated request to the Responses endpoint.
///
/// Built once through [`Request::new`] or [`Request::builder`] and never
/// mutated afterwards. Fields are read through accessors;
/// [`Request::with_stream`] returns a modified copy.
///
/// Deserializing goes through the same validation as the builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RequestWire")]
pub struct Request {
    pub(crate) model: String,

    #[serde(rename = "input")]
    pub(crate) messages: Vec<Message>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) previous_response_id: Option<String>,

    pub(crate) stream: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) instructions: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) temperature: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) top_p: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) max_output_tokens: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) frequency_penalty: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) presence_penalty: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) max_tool_calls: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) tool_choice: Option<ToolChoice>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) tools: Option<Vec<Tool>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) parallel_tool_calls: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) top_logprobs: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) seed: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) stream_options: Option<StreamOptions>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) store: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) reasoning: Option<Reasoning>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) truncation: Option<Truncation>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) metadata: Option<Metadata>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) user: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) text: Option<TextConfig>,
}

impl Request {
    /// Build a non-streaming request from a model, an ordered message list and
    /// parameters applied in the given order.
    pub fn new(
        model: impl Into<String>,
        messages: Vec<Message>,
        config: Vec<ConfigParameter>,
    ) -> LLMResult<Self> {
        Self::builder(model).messages(messages).configs(config).build()
    }

    pub fn builder(model: impl Into<String>) -> RequestBuilder {
        RequestBuilder {
            model: model.into(),
            messages: Vec::new(),
            config: Vec::new(),
            previous_response_id: None,
            stream: false,
        }
    }

    fn draft(model: String) -> Self {
        Self {
            model,
            messages: Vec::new(),
            previous_response_id: None,
            stream: false,
            instructions: None,
            temperature: None,
            top_p: None,
            max_output_tokens: None,
            frequency_penalty: None,
            presence_penalty: None,
            max_tool_calls: None,
            tool_choice: None,
            tools: None,
            parallel_tool_calls: None,
            top_logprobs: None,
            seed: None,
            stream_options: None,
            store: None,
            reasoning: None,
            truncation: None,
            metadata: None,
            user: None,
            text: None,
        }
    }

    /// A copy of this request with the stream flag replaced.
    #[must_use]
    pub fn with_stream(&self, stream: bool) -> Self {
        Self {
            stream,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[must_use]
    pub fn previous_response_id(&self) -> Option<&str> {
        self.previous_response_id.as_deref()
    }

    #[must_use]
    pub fn stream(&self) -> bool {
        self.stream
    }

    #[must_use]
    pub fn instructions(&self) -> Option<&str> {
        self.instructions.as_deref()
    }

    #[must_use]
    pub fn temperature(&self) -> Option<f64> {
        self.temperature
    }

    #[must_use]
    pub fn top_p(&self) -> Option<f64> {
        self.top_p
    }

    #[must_use]
    pub fn max_output_tokens(&self) -> Option<i64> {
        self.max_output_tokens
    }

    #[must_use]
    pub fn frequency_penalty(&self) -> Option<f64> {
        self.frequency_penalty
    }

    #[must_use]
    pub fn presence_penalty(&self) -> Option<f64> {
        self.presence_penalty
    }

    #[must_use]
    pub fn max_tool_calls(&self) -> Option<i64> {
        self.max_tool_calls
    }

    #[must_use]
    pub fn tool_choice(&self) -> Option<&ToolChoice> {
        self.tool_choice.as_ref()
    }

    #[must_use]
    pub fn tools(&self) -> Option<&[Tool]> {
        self.tools.as_deref()
    }

    #[must_use]
    pub fn parallel_tool_calls(&self) -> Option<bool> {
        self.parallel_tool_calls
    }

    #[must_use]
    pub fn top_logprobs(&self) -> Option<i64> {
        self.top_logprobs
    }

    #[must_use]
    pub fn seed(&self) -> Option<i64> {
        self.seed
    }

    #[must_use]
    pub fn stream_options(&self) -> Option<&StreamOptions> {
        self.stream_options.as_ref()
    }

    #[must_use]
    pub fn store(&self) -> Option<bool> {
        self.store
    }

    #[must_use]
    pub fn reasoning(&self) -> Option<&Reasoning> {
        self.reasoning.as_ref()
    }

    #[must_use]
    pub fn truncation(&self) -> Option<Truncation> {
        self.truncation
    }

    #[must_use]
    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    #[must_use]
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    #[must_use]
    pub fn text(&self) -> Option<&TextConfig> {
        self.text.as_ref()
    }

    // A forced function must be one of the declared function tools.
    fn check_tool_choice(&self) -> LLMResult<()> {
        let Some(ToolChoice::Function(choice)) = &self.tool_choice else {
            return Ok(());
        };
        let declared = self
            .tools
            .iter()
            .flatten()
            .any(|tool| tool.function_name() == Some(choice.name.as_str()));
        if declared {
            Ok(())
        } else {
            Err(LLMError::invalid_parameter(
                "tool_choice",
                format!("function `{}` is not declared in tools", choice.name),
            ))
        }
    }
}

/// Collects the inputs of a [`Request`]. Nothing is validated until
/// [`RequestBuilder::build`].
#[derive(Debug, Clone)]
#[must_use]
pub struct RequestBuilder {
    model: String,
    messages: Vec<Message>,
    config: Vec<ConfigParameter>,
    previous_response_id: Option<String>,
    stream: bool,
}

impl RequestBuilder {
    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn messages(mut self, messages: impl IntoIterator<Item = Message>) -> Self {
        self.messages.extend(messages);
        self
    }

    pub fn config(mut self, parameter: impl Into<ConfigParameter>) -> Self {
        self.config.push(parameter.into());
        self
    }

    pub fn configs(mut self, parameters: impl IntoIterator<Item = ConfigParameter>) -> Self {
        self.config.extend(parameters);
        self
    }

    /// Continue from a response stored on the server.
    pub fn previous_response_id(mut self, id: impl Into<String>) -> Self {
        self.previous_response_id = Some(id.into());
        self
    }

    pub fn stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Validate the model, apply the parameters in order and produce the
    /// request.
    pub fn build(self) -> LLMResult<Request> {
        if self.model.trim().is_empty() {
            return Err(LLMError::MissingModel);
        }

        let mut request = Request::draft(self.model);
        for parameter in self.config {
            parameter.apply(&mut request);
        }
        request.check_tool_choice()?;

        request.messages = self.messages;
        request.previous_response_id = self.previous_response_id;
        request.stream = self.stream;
        Ok(request)
    }
}

/// The request as it appears on the wire, before validation.
#[derive(Deserialize)]
struct RequestWire {
    model: String,
    #[serde(default)]
    input: Vec<Message>,
    previous_response_id: Option<String>,
    #[serde(default)]
    stream: bool,
    instructions: Option<String>,
    temperature: Option<f64>,
    top_p: Option<f64>,
    max_output_tokens: Option<i64>,
    frequency_penalty: Option<f64>,
    presence_penalty: Option<f64>,
    max_tool_calls: Option<i64>,
    tool_choice: Option<ToolChoice>,
    tools: Option<Vec<Tool>>,
    parallel_tool_calls: Option<bool>,
    top_logprobs: Option<i64>,
    seed: Option<i64>,
    stream_options: Option<StreamOptions>,
    store: Option<bool>,
    reasoning: Option<Reasoning>,
    truncation: Option<Truncation>,
    metadata: Option<BTreeMap<String, String>>,
    user: Option<String>,
    text: Option<TextConfig>,
}

impl TryFrom<RequestWire> for Request {
    type Error = LLMError;

    fn try_from(wire: RequestWire) -> LLMResult<Self> {
        let config = [
            wire.instructions.map(ConfigParameter::instructions).transpose()?,
            wire.temperature.map(ConfigParameter::temperature).transpose()?,
            wire.top_p.map(ConfigParameter::top_p).transpose()?,
            wire.max_output_tokens
                .map(ConfigParameter::max_output_tokens)
                .transpose()?,
            wire.frequency_penalty
                .map(ConfigParameter::frequency_penalty)
                .transpose()?,
            wire.presence_penalty
                .map(ConfigParameter::presence_penalty)
                .transpose()?,
            wire.max_tool_calls.map(ConfigParameter::max_tool_calls).transpose()?,
            wire.tools.map(ConfigParameter::tools).transpose()?,
            wire.tool_choice.map(checked_tool_choice).transpose()?,
            wire.top_logprobs.map(ConfigParameter::top_logprobs).transpose()?,
            wire.seed.map(ConfigParameter::seed).transpose()?,
            wire.stream_options.map(ConfigParameter::StreamOptions),
            wire.parallel_tool_calls.map(ConfigParameter::ParallelToolCalls),
            wire.store.map(ConfigParameter::Store),
            wire.reasoning.map(ConfigParameter::Reasoning),
            wire.truncation.map(ConfigParameter::Truncation),
            wire.metadata
                .map(|pairs| Metadata::new(pairs).map(ConfigParameter::Metadata))
                .transpose()?,
            wire.user.map(ConfigParameter::user).transpose()?,
            wire.text.map(|text| checked_text_format(text.format)).transpose()?,
        ];

        let mut builder = Self::builder(wire.model)
            .messages(wire.input)
            .configs(config.into_iter().flatten())
            .stream(wire.stream);
        if let Some(id) = wire.previous_response_id {
            builder = builder.previous_response_id(id);
        }
        builder.build()
    }
}

fn checked_tool_choice(choice: ToolChoice) -> LLMResult<ConfigParameter> {
    match choice {
        ToolChoice::Function(function) if function.choice_type == "function" => {
            ToolChoice::function(function.name).map(ConfigParameter::ToolChoice)
        }
        ToolChoice::Function(function) => Err(LLMError::InvalidValue(format!(
            "unsupported tool_choice type `{}`",
            function.choice_type
        ))),
        mode @ ToolChoice::Mode(_) => Ok(ConfigParameter::ToolChoice(mode)),
    }
}

fn checked_text_format(format: TextFormat) -> LLMResult<ConfigParameter> {
    if let TextFormat::JsonSchema(schema) = &format {
        validate_name("text.format.name", &schema.name)?;
    }
    Ok(ConfigParameter::TextFormat(format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_model_is_rejected() {
        assert_eq!(
            Request::new("", vec![Message::user("hi")], vec![]),
            Err(LLMError::MissingModel)
        );
        assert_eq!(
            Request::builder("   ").build(),
            Err(LLMError::MissingModel)
        );
    }

    #[test]
    fn unset_fields_are_omitted() {
        let request = Request::new("gpt-4o", vec![], vec![]).unwrap();
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "model": "gpt-4o", "input": [], "stream": false })
        );
    }

    #[test]
    fn tool_choice_must_name_a_declared_function() {
        let tool = Tool::function("get_weather", "Get the weather", json!({})).unwrap();

        let result = Request::builder("gpt-4o")
            .config(ToolChoice::function("get_time").unwrap())
            .config(ConfigParameter::tools(vec![tool.clone()]).unwrap())
            .build();
        assert!(matches!(
            result,
            Err(LLMError::InvalidParameter { name, .. }) if name == "tool_choice"
        ));

        let request = Request::builder("gpt-4o")
            .config(ToolChoice::function("get_weather").unwrap())
            .config(ConfigParameter::tools(vec![tool]).unwrap())
            .build()
            .unwrap();
        assert_eq!(
            serde_json::to_value(&request).unwrap()["tool_choice"],
            json!({ "type": "function", "name": "get_weather" })
        );
    }

    #[test]
    fn deserializing_validates_like_the_builder() {
        assert!(serde_json::from_str::<Request>(r#"{"model":"","temperature":9.5}"#).is_err());
        assert!(
            serde_json::from_str::<Request>(r#"{"model":"gpt-4o","temperature":9.5}"#).is_err()
        );
        assert!(
            serde_json::from_str::<Request>(r#"{"model":"gpt-4o","max_tool_calls":0}"#).is_err()
        );
        assert!(serde_json::from_str::<Request>(r#"{"model":"gpt-4o","tools":[]}"#).is_err());
        assert!(serde_json::from_str::<Request>(
            r#"{"model":"gpt-4o","tool_choice":{"type":"function","name":"undeclared"}}"#
        )
        .is_err());
        assert!(serde_json::from_str::<Request>(
            r#"{"model":"gpt-4o","tools":[{"type":"function","name":"bad name"}]}"#
        )
        .is_err());

        let request: Request = serde_json::from_str(
            r#"{"model":"gpt-4o","input":[],"temperature":1.5,"previous_response_id":"resp_1"}"#,
        )
        .unwrap();
        assert_eq!(request.temperature(), Some(1.5));
        assert_eq!(request.previous_response_id(), Some("resp_1"));
        assert!(!request.stream());
    }

    #[test]
    fn with_stream_copies() {
        let request = Request::new("gpt-4o", vec![Message::user("hi")], vec![]).unwrap();
        let streaming = request.with_stream(true);
        assert!(!request.stream());
        assert!(streaming.stream());
        assert_eq!(streaming.messages(), request.messages());
    }
}
