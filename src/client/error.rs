//! Client Error Types
//!
//! `ApiError` is what every network-facing operation of the client returns.
//! It is `Clone` because one result may be fanned out to several waiters (a
//! deduplicated query, a coalesced token refresh).

use crate::shared::error::SharedError;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request never produced a response
    #[error("Network error: {message}")]
    Network { message: String },

    /// The request or refresh exceeded its time budget
    #[error("Request timed out")]
    Timeout,

    /// The server answered 401
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Any other non-success status
    #[error("Request failed with status {status}: {message}")]
    Server { status: u16, message: String },

    /// The body could not be decoded into the expected type
    #[error("Failed to parse response: {message}")]
    Decode { message: String },

    /// Form input rejected before sending
    #[error("Invalid input: {}", join_errors(.errors))]
    Validation { errors: Vec<SharedError> },

    /// The in-flight request was aborted
    #[error("Request cancelled")]
    Cancelled,

    /// A cache entry held a different type than requested
    #[error("Cache error: {message}")]
    Cache { message: String },
}

impl ApiError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Build the error for a non-success response, using the `{message}`
    /// field of a JSON body when present
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    status.canonical_reason().unwrap_or("").to_string()
                } else {
                    body.trim().to_string()
                }
            });

        if status == StatusCode::UNAUTHORIZED {
            Self::Unauthorized { message }
        } else {
            Self::Server {
                status: status.as_u16(),
                message,
            }
        }
    }

    /// Worth retrying for reads: the server might answer next time
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } | Self::Timeout => true,
            Self::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message reported by the server, if any
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { message } | Self::Server { message, .. } => Some(message),
            _ => None,
        }
    }
}

fn join_errors(errors: &[SharedError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::decode(err.to_string())
        } else {
            Self::network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::decode(err.to_string())
    }
}

impl From<Vec<SharedError>> for ApiError {
    fn from(errors: Vec<SharedError>) -> Self {
        Self::Validation { errors }
    }
}
