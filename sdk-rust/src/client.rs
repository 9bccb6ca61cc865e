use crate::{
    sse::decode_event_stream,
    telemetry::{trace_send, trace_stream},
    LLMError, LLMResult, Request, Response, ResponseEventStream, ResponsesApi,
};
use futures::TryStreamExt;
use reqwest::{
    header::{self, HeaderMap, HeaderValue},
    StatusCode, Url,
};
use serde::Deserialize;
use serde_json::Value;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const API_KEY_ENV: &str = "OPENAI_API_KEY";
const BASE_URL_ENV: &str = "OPENAI_BASE_URL";

#[derive(Clone, Default)]
pub struct ClientOptions {
    /// Base URL of the API, e.g. `https://api.openai.com/v1`. Requests go to
    /// `<base_url>/responses`.
    pub base_url: String,
    /// Sent as a bearer token when present.
    pub api_key: Option<String>,
    /// The HTTP client to use. Timeouts, proxies and retries configured on it
    /// apply to every call; none are added here.
    pub http_client: Option<reqwest::Client>,
}

impl ClientOptions {
    /// Options for the official OpenAI endpoint.
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: Some(api_key.into()),
            http_client: None,
        }
    }

    /// Read `OPENAI_API_KEY` and `OPENAI_BASE_URL` from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.is_empty());
        let base_url = std::env::var(BASE_URL_ENV)
            .ok()
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            base_url,
            api_key,
            http_client: None,
        }
    }
}

impl std::fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientOptions")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

/// Client for a Responses endpoint. Cheap to clone and safe to share across
/// tasks; nothing in it changes after construction.
#[derive(Clone)]
pub struct Client {
    endpoint: Url,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl Client {
    pub fn new(options: ClientOptions) -> LLMResult<Self> {
        let ClientOptions {
            base_url,
            api_key,
            http_client,
        } = options;

        let base_url = base_url.trim();
        if base_url.is_empty() {
            return Err(LLMError::MissingBaseURL);
        }
        let endpoint = Url::parse(&format!("{}/responses", base_url.trim_end_matches('/')))
            .map_err(|e| LLMError::InvalidURL(format!("{base_url}: {e}")))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(LLMError::InvalidURL(format!(
                "{base_url}: unsupported scheme `{}`",
                endpoint.scheme()
            )));
        }

        Ok(Self {
            endpoint,
            api_key,
            client: http_client.unwrap_or_default(),
        })
    }

    /// The URL requests are posted to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    fn headers(&self, streaming: bool) -> LLMResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        if let Some(api_key) = &self.api_key {
            let mut value = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|_| {
                LLMError::InvalidValue("api key contains invalid header characters".to_string())
            })?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }
        if streaming {
            headers.insert(header::ACCEPT, HeaderValue::from_static("text/event-stream"));
            headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
            headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        } else {
            headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        }
        Ok(headers)
    }

    /// POST the request and return the response once its status is a success.
    async fn post(&self, request: &Request) -> LLMResult<reqwest::Response> {
        let body = serde_json::to_vec(request).map_err(|e| LLMError::EncodingFailed(e.to_string()))?;
        let headers = self.headers(request.stream())?;

        tracing::debug!(
            endpoint = %self.endpoint,
            model = request.model(),
            stream = request.stream(),
            "sending responses request"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .headers(headers)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_else(|error| {
            tracing::debug!(error = %error, "failed to read error body");
            String::new()
        });
        tracing::debug!(status = status.as_u16(), "responses request failed");
        Err(status_error(status, &body))
    }

    async fn send_inner(&self, request: &Request) -> LLMResult<Response> {
        let response = self.post(request).await?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| LLMError::from_body(&e))?;
        decode_response(status, &body)
    }

    async fn stream_inner(&self, request: &Request) -> LLMResult<ResponseEventStream> {
        let request = request.with_stream(true);
        let response = self.post(&request).await?;
        let status = response.status().as_u16();
        let bytes = response.bytes_stream().map_err(|e| LLMError::from_body(&e));
        Ok(decode_event_stream(bytes, status))
    }
}

#[async_trait::async_trait]
impl ResponsesApi for Client {
    async fn send(&self, request: &Request) -> LLMResult<Response> {
        trace_send(request, |request| self.send_inner(request)).await
    }

    async fn stream(&self, request: &Request) -> LLMResult<ResponseEventStream> {
        trace_stream(request, |request| self.stream_inner(request)).await
    }

    fn is_authenticated(&self) -> bool {
        self.api_key.is_some()
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.endpoint.as_str())
            .field("authenticated", &self.api_key.is_some())
            .finish_non_exhaustive()
    }
}

fn status_error(status: StatusCode, body: &str) -> LLMError {
    match status {
        StatusCode::UNAUTHORIZED => LLMError::AuthenticationFailed,
        StatusCode::TOO_MANY_REQUESTS => LLMError::RateLimit,
        _ => LLMError::HttpError {
            status: status.as_u16(),
            message: error_message(body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unknown status")
                    .to_string()
            }),
        },
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Object { message: String },
    Text(String),
}

/// Pull a human-readable message out of an error body.
fn error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            error: ErrorDetail::Object { message } | ErrorDetail::Text(message),
        }) => Some(message),
        Err(_) => Some(body.to_string()),
    }
}

fn decode_response(status: u16, body: &str) -> LLMResult<Response> {
    if body.trim().is_empty() {
        return Err(LLMError::InvalidResponse);
    }
    let value: Value = serde_json::from_str(body).map_err(|e| LLMError::from_json(&e))?;

    // Some compatible servers report failures with a success status.
    if value.get("id").is_none() {
        if let Some(error) = value.get("error").filter(|error| !error.is_null()) {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .map_or_else(|| error.to_string(), str::to_string);
            return Err(LLMError::ServerError { status, message });
        }
    }

    serde_json::from_value(value).map_err(|e| LLMError::from_json(&e))
}
