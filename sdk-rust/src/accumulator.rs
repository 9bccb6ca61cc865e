use crate::{LLMError, LLMResult, Response, ResponseEvent};
use std::collections::BTreeMap;

/// Accumulated arguments of one function call item
#[derive(Debug, Clone, Default)]
struct AccumulatedArguments {
    item_id: String,
    arguments: String,
}

/// Folds a stream of [`ResponseEvent`]s into text, function call arguments
/// and the final [`Response`].
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    /// Text keyed by `(output_index, content_index)`, in output order
    text_parts: BTreeMap<(usize, usize), String>,
    /// Function call arguments keyed by `output_index`
    arguments: BTreeMap<usize, AccumulatedArguments>,
    response: Option<Response>,
}

impl StreamAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one event to the accumulator.
    ///
    /// `done` events replace what the deltas built, so a missed delta does not
    /// leave the text short.
    pub fn add_event(&mut self, event: &ResponseEvent) {
        match event {
            ResponseEvent::OutputTextDelta(delta) => {
                self.text_parts
                    .entry((delta.output_index, delta.content_index))
                    .or_default()
                    .push_str(&delta.delta);
            }
            ResponseEvent::OutputTextDone(done) => {
                self.text_parts
                    .insert((done.output_index, done.content_index), done.text.clone());
            }
            ResponseEvent::FunctionCallArgumentsDelta(delta) => {
                let accumulated = self.arguments.entry(delta.output_index).or_default();
                accumulated.item_id.clone_from(&delta.item_id);
                accumulated.arguments.push_str(&delta.delta);
            }
            ResponseEvent::FunctionCallArgumentsDone(done) => {
                self.arguments.insert(
                    done.output_index,
                    AccumulatedArguments {
                        item_id: done.item_id.clone(),
                        arguments: done.arguments.clone(),
                    },
                );
            }
            ResponseEvent::Completed(event)
            | ResponseEvent::Failed(event)
            | ResponseEvent::Incomplete(event) => {
                self.response = Some(event.response.clone());
            }
            _ => {}
        }
    }

    /// All text received so far, in output order.
    #[must_use]
    pub fn text(&self) -> String {
        self.text_parts.values().map(String::as_str).collect()
    }

    /// The arguments received so far for a function call item.
    #[must_use]
    pub fn function_arguments(&self, item_id: &str) -> Option<&str> {
        self.arguments
            .values()
            .find(|accumulated| accumulated.item_id == item_id)
            .map(|accumulated| accumulated.arguments.as_str())
    }

    /// Whether a terminal event has been seen.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.response.is_some()
    }

    #[must_use]
    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    /// The response carried by the terminal event.
    ///
    /// # Errors
    /// Returns `InvalidResponse` if the stream never reached a terminal event.
    pub fn into_response(self) -> LLMResult<Response> {
        self.response.ok_or(LLMError::InvalidResponse)
    }

    pub fn clear(&mut self) {
        self.text_parts.clear();
        self.arguments.clear();
        self.response = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{
        FunctionCallArgumentsDeltaEvent, ResponseLifecycleEvent, TextDeltaEvent, TextDoneEvent,
    };
    use serde_json::json;

    fn text_delta(output_index: usize, delta: &str) -> ResponseEvent {
        ResponseEvent::OutputTextDelta(TextDeltaEvent {
            item_id: format!("msg_{output_index}"),
            output_index,
            content_index: 0,
            delta: delta.to_string(),
            sequence_number: None,
        })
    }

    #[test]
    fn concatenates_text_in_output_order() {
        let mut accumulator = StreamAccumulator::new();
        accumulator.add_event(&text_delta(1, "world"));
        accumulator.add_event(&text_delta(0, "Hello, "));
        assert_eq!(accumulator.text(), "Hello, world");
        assert!(!accumulator.is_complete());
        assert_eq!(accumulator.into_response(), Err(LLMError::InvalidResponse));
    }

    #[test]
    fn done_event_replaces_deltas() {
        let mut accumulator = StreamAccumulator::new();
        accumulator.add_event(&text_delta(0, "Hel"));
        accumulator.add_event(&ResponseEvent::OutputTextDone(TextDoneEvent {
            item_id: "msg_0".to_string(),
            output_index: 0,
            content_index: 0,
            text: "Hello".to_string(),
            sequence_number: None,
        }));
        assert_eq!(accumulator.text(), "Hello");
    }

    #[test]
    fn collects_function_arguments_and_final_response() {
        let mut accumulator = StreamAccumulator::new();
        for delta in ["{\"city\":", "\"Paris\"}"] {
            accumulator.add_event(&ResponseEvent::FunctionCallArgumentsDelta(
                FunctionCallArgumentsDeltaEvent {
                    item_id: "fc_1".to_string(),
                    output_index: 0,
                    delta: delta.to_string(),
                    sequence_number: None,
                },
            ));
        }
        assert_eq!(
            accumulator.function_arguments("fc_1"),
            Some("{\"city\":\"Paris\"}")
        );

        let response: Response = serde_json::from_value(json!({
            "id": "resp_1",
            "model": "gpt-4o",
            "output": []
        }))
        .unwrap();
        accumulator.add_event(&ResponseEvent::Completed(ResponseLifecycleEvent {
            response: response.clone(),
            sequence_number: Some(3),
        }));
        assert!(accumulator.is_complete());
        assert_eq!(accumulator.into_response(), Ok(response));
    }
}
