//! Gateway error taxonomy.

use serde::Deserialize;

/// Errors produced by `Gateway::send` and the request/response helpers.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The server rejected the credential (HTTP 401). The session side
    /// effect has already been applied when the caller sees this.
    #[error("unauthorized: {path}")]
    Unauthorized { path: String, body: String },

    /// HTTP 5xx.
    #[error("server error {status} on {path}")]
    Server { path: String, status: u16, body: String },

    /// Any other non-2xx status, passed through unchanged.
    #[error("request to {path} failed with status {status}")]
    Status { path: String, status: u16, body: String },

    #[error("request to {path} timed out")]
    Timeout { path: String },

    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    /// The stored token cannot be sent as a header value.
    #[error("stored credential is not a valid header value")]
    InvalidCredential(#[from] reqwest::header::InvalidHeaderValue),

    #[error("request body encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("response decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl GatewayError {
    /// HTTP status carried by the error, if the server answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Server { status, .. } | Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw response body preserved from the server.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { body, .. } | Self::Server { body, .. } | Self::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    /// The `message` field of a JSON error body, when the server sent one.
    #[must_use]
    pub fn server_message(&self) -> Option<String> {
        let body = self.body()?;
        serde_json::from_str::<ErrorBody>(body).ok()?.message
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}
