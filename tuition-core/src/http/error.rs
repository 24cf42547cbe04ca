use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::validation::ValidationErrors;

/// Everything a call against the API can end in.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The session was rejected. `redirect` tells whether the client
    /// logged out and moved to the login route because of it.
    #[error("Unauthorized{}", suffix(.message))]
    Unauthorized {
        redirect: bool,
        message: Option<String>,
    },

    /// Optimistic concurrency check failed.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Server responded with {status}{}", suffix(.message))]
    Server {
        status: StatusCode,
        message: Option<String>,
    },

    /// 2xx response whose envelope carried `success: false`.
    #[error("Request rejected{}", suffix(.0))]
    Rejected(Option<String>),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unable to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

fn suffix(message: &Option<String>) -> String {
    message
        .as_ref()
        .map(|message| format!(": {}", message))
        .unwrap_or_default()
}

impl ApiError {
    pub fn transport<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Transport(err.to_string())
    }

    /// Message meant for the person who triggered the action: whatever the
    /// server said, otherwise `fallback` (e.g. "Failed to fetch batches").
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Unauthorized {
                message: Some(message),
                ..
            }
            | ApiError::Server {
                message: Some(message),
                ..
            }
            | ApiError::Rejected(Some(message))
            | ApiError::Conflict(message) => message.clone(),
            ApiError::Validation(errors) => errors.to_string(),
            _ => fallback.to_string(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.without_url().to_string())
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Pulls `message` (or `error`) out of an error response body.
pub fn server_message(body: &[u8]) -> Option<String> {
    let body = serde_json::from_slice::<ErrorBody>(body).ok()?;
    body.message
        .or(body.error)
        .filter(|message| !message.trim().is_empty())
}
