//! Error types shared by the API client, the session holder and the
//! notification helper.

use reqwest::StatusCode;
use thiserror::Error;

pub const NETWORK_ERROR_MESSAGE: &str = "Network error - please check if backend is running";

/// Failures talking to the REST backend. Nothing here is retried.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error - please check if backend is running")]
    Network(#[source] reqwest::Error),

    #[error("{}", .message.as_deref().unwrap_or("request failed"))]
    Status {
        status: StatusCode,
        message: Option<String>,
    },

    #[error("Unexpected response from server: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    Request(String),
}

impl ApiError {
    /// The message the server put in its error body, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// What a caller shows the user: the server's message verbatim, the
    /// network text for transport failures, `fallback` otherwise.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Network(_) => NETWORK_ERROR_MESSAGE.to_string(),
            ApiError::Status {
                message: Some(message),
                ..
            } => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Notifications are not supported")]
    Unsupported,

    #[error("Notifications not permitted")]
    NotPermitted,

    #[error("Failed to save notification preferences")]
    Preferences(#[source] ApiError),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage format error: {0}")]
    Json(#[from] serde_json::Error),
}
