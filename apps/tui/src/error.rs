use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Everything that can go wrong talking to the TAAM backend.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Status {
        status: StatusCode,
        message: Option<String>,
    },

    #[error("session is missing or expired")]
    Unauthorized,

    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    InvalidFile(String),

    #[error("request cancelled")]
    Cancelled,
}

impl ApiError {
    /// Text to show the user for an explicit action: the backend's own
    /// message when there is one, `fallback` otherwise.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Status {
                message: Some(message),
                ..
            } => message.clone(),
            Self::InvalidFile(reason) => reason.clone(),
            Self::Unauthorized => "Your session has expired. Please log in again.".to_string(),
            _ => fallback.to_string(),
        }
    }

    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

/// Pulls the most specific human message out of an error body.
///
/// The backend answers with `{"error": ..}`, `{"detail": ..}`, `{"message": ..}`
/// or field validation maps such as `{"file": ["File size must be ..."]}`.
pub fn backend_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let object = value.as_object()?;

    for key in ["error", "detail", "message"] {
        if let Some(text) = object.get(key).and_then(Value::as_str) {
            return Some(text.to_string());
        }
    }

    object.values().find_map(|field| match field {
        Value::Array(items) => items.iter().find_map(Value::as_str).map(str::to_string),
        Value::String(text) => Some(text.clone()),
        _ => None,
    })
}
