use thiserror::Error;

/// Every failure the client can surface. Values are comparable so callers can
/// branch on the kind (e.g. back off on `RateLimit`, prompt for a key on
/// `AuthenticationFailed`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LLMError {
    #[error("Invalid URL: {0}")]
    InvalidURL(String),
    #[error("A model identifier is required")]
    MissingModel,
    #[error("A base URL is required")]
    MissingBaseURL,
    /// A configuration value is outside its valid domain.
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    /// A parameter has the wrong shape or conflicts with another parameter.
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },
    #[error("Failed to encode request: {0}")]
    EncodingFailed(String),
    /// The payload was valid JSON but did not match the expected schema.
    #[error("Failed to decode response: {0}")]
    DecodingFailed(String),
    /// The payload was not valid JSON.
    #[error("JSON parsing error: {0}")]
    JsonParsingError(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("The request timed out")]
    Timeout,
    #[error("TLS error: {0}")]
    SslError(String),
    #[error("Authentication failed")]
    AuthenticationFailed,
    #[error("Rate limit exceeded")]
    RateLimit,
    /// The request returns a non-success status code
    #[error("HTTP error: {message} (Status {status})")]
    HttpError { status: u16, message: String },
    /// The server reported a failure inside an otherwise successful exchange
    /// (an error body with a 2xx status, or an `error` event mid-stream).
    #[error("Server error: {message} (Status {status})")]
    ServerError { status: u16, message: String },
    #[error("Invalid response")]
    InvalidResponse,
}

pub type LLMResult<T> = Result<T, LLMError>;

impl LLMError {
    pub(crate) fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// The HTTP status associated with this error, if any.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::AuthenticationFailed => Some(401),
            Self::RateLimit => Some(429),
            Self::HttpError { status, .. } | Self::ServerError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether repeating the same call may succeed. The client never retries
    /// on its own; this only helps callers write their own policy.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimit | Self::Timeout | Self::NetworkError(_) => true,
            Self::HttpError { status, .. } | Self::ServerError { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// A failure while reading a response body. reqwest reports these as
    /// decode errors, but the connection is what broke.
    pub(crate) fn from_body(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::NetworkError(error.to_string())
        }
    }

    /// Split `serde_json` failures into syntax errors and schema mismatches.
    pub(crate) fn from_json(error: &serde_json::Error) -> Self {
        match error.classify() {
            serde_json::error::Category::Syntax | serde_json::error::Category::Eof => {
                Self::JsonParsingError(error.to_string())
            }
            serde_json::error::Category::Data | serde_json::error::Category::Io => {
                Self::DecodingFailed(error.to_string())
            }
        }
    }
}

impl From<reqwest::Error> for LLMError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            return Self::Timeout;
        }
        if error.is_builder() {
            return Self::InvalidURL(
                error
                    .url()
                    .map_or_else(|| error.to_string(), ToString::to_string),
            );
        }
        if error.is_decode() {
            return Self::DecodingFailed(error.to_string());
        }
        if let Some(message) = tls_failure(&error) {
            return Self::SslError(message);
        }
        Self::NetworkError(error.to_string())
    }
}

/// reqwest does not expose TLS failures as a kind, so walk the source chain.
fn tls_failure(error: &reqwest::Error) -> Option<String> {
    let mut source: Option<&(dyn std::error::Error + 'static)> = std::error::Error::source(error);
    while let Some(inner) = source {
        let message = inner.to_string();
        let lower = message.to_ascii_lowercase();
        if lower.contains("certificate") || lower.contains("tls") || lower.contains("ssl") {
            return Some(message);
        }
        source = inner.source();
    }
    None
}
