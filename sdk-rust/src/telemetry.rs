use crate::{LLMResult, Request, Response, ResponseEvent, ResponseEventStream, Usage};
use futures::StreamExt;
use opentelemetry::trace::Status;
use std::time::Instant;
use tracing::{info_span, Span};
use tracing_futures::Instrument;
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// A `gen_ai` span around one send or stream call. Request attributes and
/// collected usage are recorded when the span is dropped.
pub(crate) struct ResponseSpan {
    span: Span,
    usage: Option<Usage>,
    response_id: Option<String>,
    response_model: Option<String>,
    start_time: Instant,
    time_to_first_token: Option<f64>,
    max_output_tokens: Option<i64>,
    temperature: Option<f64>,
    top_p: Option<f64>,
    presence_penalty: Option<f64>,
    frequency_penalty: Option<f64>,
    seed: Option<i64>,
}

impl ResponseSpan {
    pub fn new(method: &str, request: &Request) -> Self {
        let span = if method == "stream" {
            info_span!("responses_dsl.stream")
        } else {
            info_span!("responses_dsl.send")
        };
        span.set_attribute("gen_ai.operation.name", "chat");
        span.set_attribute("gen_ai.request.model", request.model().to_string());
        span.set_attribute("responses_dsl.method", method.to_string());

        Self {
            span,
            usage: None,
            response_id: None,
            response_model: None,
            start_time: Instant::now(),
            time_to_first_token: None,
            max_output_tokens: request.max_output_tokens(),
            temperature: request.temperature(),
            top_p: request.top_p(),
            presence_penalty: request.presence_penalty(),
            frequency_penalty: request.frequency_penalty(),
            seed: request.seed(),
        }
    }

    fn span(&self) -> Span {
        self.span.clone()
    }

    pub async fn instrument_future<F>(&self, future: F) -> F::Output
    where
        F: std::future::Future,
    {
        future.instrument(self.span()).await
    }

    pub fn on_response(&mut self, response: &Response) {
        self.usage.clone_from(&response.usage);
        self.response_id = Some(response.id.clone());
        self.response_model = Some(response.model.clone());
    }

    pub fn on_event(&mut self, event: &ResponseEvent) {
        if matches!(
            event,
            ResponseEvent::OutputTextDelta(_) | ResponseEvent::FunctionCallArgumentsDelta(_)
        ) && self.time_to_first_token.is_none()
        {
            self.time_to_first_token = Some(self.start_time.elapsed().as_secs_f64());
        }
        if let Some(response) = event.final_response() {
            self.on_response(response);
        }
    }

    pub fn on_error(&mut self, error: &(dyn std::error::Error + 'static)) {
        self.span
            .set_attribute("exception.message", error.to_string());
        self.span.set_status(Status::error(error.to_string()));
    }

    fn on_end(&mut self) {
        if let Some(usage) = &self.usage {
            self.span
                .set_attribute("gen_ai.usage.input_tokens", i64::from(usage.input_tokens));
            self.span
                .set_attribute("gen_ai.usage.output_tokens", i64::from(usage.output_tokens));
        }
        if let Some(id) = self.response_id.take() {
            self.span.set_attribute("gen_ai.response.id", id);
        }
        if let Some(model) = self.response_model.take() {
            self.span.set_attribute("gen_ai.response.model", model);
        }
        if let Some(time_to_first_token) = self.time_to_first_token {
            self.span
                .set_attribute("gen_ai.server.time_to_first_token", time_to_first_token);
        }

        if let Some(max_output_tokens) = self.max_output_tokens {
            self.span
                .set_attribute("gen_ai.request.max_tokens", max_output_tokens);
        }
        if let Some(temperature) = self.temperature {
            self.span
                .set_attribute("gen_ai.request.temperature", temperature);
        }
        if let Some(top_p) = self.top_p {
            self.span.set_attribute("gen_ai.request.top_p", top_p);
        }
        if let Some(presence_penalty) = self.presence_penalty {
            self.span
                .set_attribute("gen_ai.request.presence_penalty", presence_penalty);
        }
        if let Some(frequency_penalty) = self.frequency_penalty {
            self.span
                .set_attribute("gen_ai.request.frequency_penalty", frequency_penalty);
        }
        if let Some(seed) = self.seed {
            self.span.set_attribute("gen_ai.request.seed", seed);
        }
    }
}

impl Drop for ResponseSpan {
    fn drop(&mut self) {
        self.on_end();
    }
}

pub(crate) async fn trace_send<'a, F, Fut>(request: &'a Request, f: F) -> LLMResult<Response>
where
    F: FnOnce(&'a Request) -> Fut,
    Fut: std::future::Future<Output = LLMResult<Response>>,
{
    let mut span = ResponseSpan::new("send", request);
    let result = span.instrument_future(f(request)).await;

    match &result {
        Ok(response) => span.on_response(response),
        Err(error) => span.on_error(error),
    }

    result
}

pub(crate) async fn trace_stream<'a, F, Fut>(
    request: &'a Request,
    f: F,
) -> LLMResult<ResponseEventStream>
where
    F: FnOnce(&'a Request) -> Fut,
    Fut: std::future::Future<Output = LLMResult<ResponseEventStream>>,
{
    let mut span = ResponseSpan::new("stream", request);
    let stream_result = span.instrument_future(f(request)).await;

    match stream_result {
        Ok(mut stream) => {
            let span_handle = span.span();
            let instrumented = async_stream::try_stream! {
                let mut span_state = span;

                while let Some(item) = stream.next().await {
                    match item {
                        Ok(event) => {
                            span_state.on_event(&event);
                            yield event;
                        }
                        Err(err) => {
                            span_state.on_error(&err);
                            Err(err)?;
                        }
                    }
                }
            }
            .instrument(span_handle);

            Ok(ResponseEventStream::from_stream(instrumented))
        }
        Err(error) => {
            span.on_error(&error);
            Err(error)
        }
    }
}
