use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Every failure the web API can hand back to a page, already classified.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Unauthorized(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        fields: BTreeMap<String, String>,
    },

    #[error("API error: {0}")]
    Api(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

/// Coarse category used to pick the message and retry affordance shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NetworkUnreachable,
    Unauthorized,
    NotFound,
    ServerError,
    MalformedResponse,
    Validation,
    Rejected,
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut fields = BTreeMap::new();
        fields.insert(field.into(), message.clone());
        AppError::Validation { message, fields }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            AppError::Network(_) => FailureKind::NetworkUnreachable,
            AppError::Unauthorized(_) => FailureKind::Unauthorized,
            AppError::NotFound(_) => FailureKind::NotFound,
            AppError::Server { .. } => FailureKind::ServerError,
            AppError::MalformedResponse(_) | AppError::Decode(_) => FailureKind::MalformedResponse,
            AppError::Validation { .. } => FailureKind::Validation,
            AppError::Api(_) | AppError::Config(_) => FailureKind::Rejected,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            AppError::Network(_) => {
                "Cannot reach the server. Check your network connection and try again.".to_string()
            }
            AppError::Unauthorized(_) => "Your session has expired. Please sign in again.".to_string(),
            AppError::NotFound(_) => {
                "The requested resource was not found. The API route may be missing.".to_string()
            }
            AppError::Server { status, .. } => {
                format!("The server encountered an error ({}). Please try again later.", status)
            }
            AppError::MalformedResponse(_) | AppError::Decode(_) => {
                "The server returned an unexpected response (expected JSON).".to_string()
            }
            AppError::Validation { message, .. } => message.clone(),
            AppError::Api(message) => message.clone(),
            AppError::Config(message) => format!("Client is misconfigured: {}", message),
        }
    }

    /// Whether a "Try Again" action makes sense for this failure.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::Network(_)
                | AppError::Server { .. }
                | AppError::MalformedResponse(_)
                | AppError::NotFound(_)
                | AppError::Api(_)
        )
    }

    pub fn field_errors(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            AppError::Validation { fields, .. } => Some(fields),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_load_failure_has_a_distinct_message() {
        let errors = [
            AppError::Network("connection refused".into()),
            AppError::Unauthorized("token expired".into()),
            AppError::NotFound("/api/web/doctor/chat/sessions".into()),
            AppError::Server { status: 502, message: "bad gateway".into() },
            AppError::MalformedResponse("<!DOCTYPE html>".into()),
        ];

        let mut messages: Vec<String> = errors.iter().map(AppError::user_message).collect();
        messages.sort();
        messages.dedup();
        assert_eq!(messages.len(), errors.len());
    }

    #[test]
    fn test_unauthorized_is_not_retryable() {
        assert!(!AppError::Unauthorized("expired".into()).is_retryable());
        assert!(AppError::Network("down".into()).is_retryable());
        assert_eq!(AppError::Decode("eof".into()).kind(), FailureKind::MalformedResponse);
    }

    #[test]
    fn test_field_error_carries_field_name() {
        let err = AppError::field("nik", "NIK must be 16 digits");
        let fields = err.field_errors().unwrap();

        assert_eq!(fields.get("nik").map(String::as_str), Some("NIK must be 16 digits"));
        assert_eq!(err.user_message(), "NIK must be 16 digits");
    }
}
