//! Error types for the pipeline API client.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.

/// Fallback message when a transport error carries no useful detail.
pub const GENERIC_TRANSPORT_MESSAGE: &str = "could not reach the service";

/// Errors produced by calls against the pipeline API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server explicitly rejected the request with a caller-facing detail
    /// message (bad input, auth failure, not-found, stage not reached).
    #[error("{detail}")]
    Api { status: u16, detail: String },

    /// The request never produced a structured response (connection refused,
    /// timeout, DNS failure, ...).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered but the body could not be decoded.
    #[error("unexpected response from the service: {0}")]
    InvalidResponse(String),

    /// The request was rejected locally before any network traffic.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Local file access failed (upload source or download destination).
    #[error("file error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// The string shown to the user for this failure.
    ///
    /// Structured API errors surface their `detail` verbatim; anything else
    /// falls back to the underlying error's message, or a generic string when
    /// that message is empty.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Api { detail, .. } => detail.clone(),
            ApiError::Transport(err) => {
                let msg = err.to_string();
                if msg.is_empty() {
                    GENERIC_TRANSPORT_MESSAGE.to_string()
                } else {
                    msg
                }
            }
            ApiError::InvalidResponse(msg) => format!("unexpected response from the service: {msg}"),
            ApiError::InvalidInput(msg) => msg.clone(),
            ApiError::Io(err) => err.to_string(),
        }
    }

    /// HTTP status code for structured rejections, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            ApiError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Convenience type alias for Results with ApiError.
pub type ApiResult<T> = Result<T, ApiError>;
