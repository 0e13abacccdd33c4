//! Client error types and response classification.

use reqwest::StatusCode;
use thiserror::Error;

/// Client error type.
#[derive(Debug, Error)]
pub enum Error {
    /// The exchange never produced a response (connection refused, DNS, timeout).
    #[error("Network error: {message}")]
    Network {
        /// Description of the transport failure.
        message: String,
        /// Underlying HTTP client error, when there is one.
        #[source]
        source: Option<reqwest::Error>,
    },

    /// Server rejected the credentials (HTTP 401).
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Server returned any other non-2xx response.
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from server, or a fallback built from the status.
        message: String,
    },

    /// A request body could not be built. Nothing was sent.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// A 2xx response body did not match the expected shape.
    #[error("Failed to parse response: {message}")]
    Parse {
        /// Decoder error.
        message: String,
        /// The body that failed to decode.
        body: String,
    },

    /// Base URL and path did not compose into a valid URL.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Build a network error from an HTTP client failure.
    pub fn from_transport(err: reqwest::Error) -> Self {
        Error::Network {
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Build a parse error for a body that failed to decode.
    pub fn parse(err: serde_json::Error, body: impl Into<String>) -> Self {
        Error::Parse {
            message: err.to_string(),
            body: body.into(),
        }
    }

    /// HTTP status associated with this error, if the server responded.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Auth(_) => Some(401),
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Api { status: 404, .. })
    }

    /// Check if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Auth(_))
    }

    /// Check if this is a rate limit error.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::Api { status: 429, .. })
    }

    /// Check if this is a server error.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::Api { status, .. } if *status >= 500)
    }

    /// Whether a caller-side retry policy could reasonably try again.
    ///
    /// The client itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Network { .. }) || self.is_rate_limited() || self.is_server_error()
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::from_transport(err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::InvalidEndpoint(err.to_string())
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error response from the server.
#[derive(Debug, serde::Deserialize)]
struct ErrorResponse {
    message: Option<String>,
}

/// Classify a completed exchange.
///
/// Returns `None` for any 2xx status; the body is then handed back untouched.
/// Never fails on a malformed body, it degrades to a message built from the status.
pub fn classify(status: StatusCode, body: &str) -> Option<Error> {
    if status.is_success() {
        return None;
    }

    let reason = status.canonical_reason().unwrap_or("Unknown");

    if status == StatusCode::UNAUTHORIZED {
        return Some(Error::Auth(reason.to_string()));
    }

    let message = match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse {
            message: Some(message),
        }) => message,
        Ok(ErrorResponse { message: None }) => "Unknown error".to_string(),
        Err(_) => format!("Error {}: {}", status.as_u16(), reason),
    };

    Some(Error::Api {
        status: status.as_u16(),
        message,
    })
}
