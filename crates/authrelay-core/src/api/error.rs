use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Unknown alias: {0}")]
    UnknownAlias(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Unauthorized - token may be expired")]
    AuthenticationExpired,

    /// Non-2xx answer other than 401, kept whole; only `Display` truncates.
    #[error("Request failed with status {status}: {}", truncate_body(.body))]
    Status {
        status: StatusCode,
        headers: HeaderMap,
        body: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("No async runtime: {0}")]
    Runtime(String),

    #[error("Request task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Truncate a response body to avoid logging excessive data
fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
}

impl ClientError {
    /// Classify a non-success response. 401 is the only recoverable one.
    pub fn from_status(status: StatusCode, headers: HeaderMap, body: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => ClientError::AuthenticationExpired,
            _ => ClientError::Status {
                status,
                headers,
                body,
            },
        }
    }

    /// Whether this failure should trigger re-authentication and a retry.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, ClientError::AuthenticationExpired)
    }
}
