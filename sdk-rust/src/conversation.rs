use crate::{ConfigParameter, LLMResult, Message, Request, Response};

/// Append-only message history that produces requests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    messages: Vec<Message>,
    last_response_id: Option<String>,
}

impl Conversation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: Message) -> &mut Self {
        self.messages.push(message);
        self
    }

    pub fn append_system(&mut self, text: impl Into<String>) -> &mut Self {
        self.append(Message::system(text))
    }

    pub fn append_user(&mut self, text: impl Into<String>) -> &mut Self {
        self.append(Message::user(text))
    }

    pub fn append_assistant(&mut self, text: impl Into<String>) -> &mut Self {
        self.append(Message::assistant(text))
    }

    /// Record the output of a function call.
    pub fn append_tool(&mut self, call_id: impl Into<String>, output: impl Into<String>) -> &mut Self {
        self.append(Message::tool(call_id, output))
    }

    /// Append the assistant text of `response` and remember its id.
    ///
    /// Responses without text (e.g. only function calls) only update the id.
    pub fn append_response(&mut self, response: &Response) -> &mut Self {
        let text = response.output_text();
        if !text.is_empty() {
            self.messages.push(Message::assistant(text));
        }
        self.last_response_id = Some(response.id.clone());
        self
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The id of the last appended response, usable as
    /// `previous_response_id` when the server stores responses.
    #[must_use]
    pub fn last_response_id(&self) -> Option<&str> {
        self.last_response_id.as_deref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Build a request from the full history.
    pub fn request(
        &self,
        model: impl Into<String>,
        config: Vec<ConfigParameter>,
    ) -> LLMResult<Request> {
        Request::new(model, self.messages.clone(), config)
    }

    /// Build a request from the history followed by `input`. The history is
    /// left unchanged.
    pub fn request_with(
        &self,
        model: impl Into<String>,
        input: Vec<Message>,
        config: Vec<ConfigParameter>,
    ) -> LLMResult<Request> {
        Request::builder(model)
            .messages(self.messages.iter().cloned())
            .messages(input)
            .configs(config)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LLMError;
    use serde_json::json;

    #[test]
    fn builds_requests_from_history() {
        let mut conversation = Conversation::new();
        conversation.append_system("be terse").append_user("2+2?");

        let request = conversation
            .request_with("gpt-4o", vec![Message::user("and 3+3?")], vec![])
            .unwrap();
        assert_eq!(request.messages().len(), 3);
        assert_eq!(conversation.len(), 2);

        let request = conversation.request("gpt-4o", vec![]).unwrap();
        assert_eq!(request.messages(), conversation.messages());

        assert_eq!(
            conversation.request("", vec![]),
            Err(LLMError::MissingModel)
        );
    }

    #[test]
    fn appends_responses() {
        let response: Response = serde_json::from_value(json!({
            "id": "resp_1",
            "model": "gpt-4o",
            "output": [{
                "type": "message",
                "id": "msg_1",
                "role": "assistant",
                "content": [{ "type": "output_text", "text": "4" }]
            }]
        }))
        .unwrap();

        let mut conversation = Conversation::new();
        conversation.append_user("2+2?").append_response(&response);
        assert_eq!(conversation.messages()[1], Message::assistant("4"));
        assert_eq!(conversation.last_response_id(), Some("resp_1"));

        conversation.append_tool("call_1", "{}");
        assert_eq!(conversation.messages()[2].text(), "{}");
    }
}
