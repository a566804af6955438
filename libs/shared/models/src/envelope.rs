use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Uniform response wrapper used by every `/api/web` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, String>>,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            error: None,
            errors: None,
        }
    }

    /// Best human-readable explanation the backend gave.
    pub fn reason(&self) -> String {
        self.error
            .clone()
            .or_else(|| self.message.clone())
            .unwrap_or_else(|| "Request was not successful".to_string())
    }

    /// Unwraps `data`, turning `success: false` into an error.
    pub fn into_result(self) -> Result<Option<T>, AppError> {
        if !self.success {
            if let Some(fields) = self.errors.clone().filter(|f| !f.is_empty()) {
                return Err(AppError::Validation {
                    message: self.reason(),
                    fields,
                });
            }
            return Err(AppError::Api(self.reason()));
        }
        Ok(self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failed_envelope_uses_error_before_message() {
        let envelope: ApiEnvelope<serde_json::Value> = serde_json::from_value(json!({
            "success": false,
            "message": "Request failed",
            "error": "Queue is closed"
        }))
        .unwrap();

        assert_eq!(envelope.into_result().unwrap_err(), AppError::Api("Queue is closed".into()));
    }

    #[test]
    fn test_failed_envelope_with_field_errors_is_validation() {
        let envelope: ApiEnvelope<serde_json::Value> = serde_json::from_value(json!({
            "success": false,
            "message": "Invalid input",
            "errors": { "phone": "Phone is required" }
        }))
        .unwrap();

        let err = envelope.into_result().unwrap_err();
        assert_eq!(err.field_errors().unwrap()["phone"], "Phone is required");
    }

    #[test]
    fn test_success_without_data_is_none() {
        let envelope: ApiEnvelope<Vec<u32>> =
            serde_json::from_value(json!({ "success": true, "message": "done" })).unwrap();

        assert_eq!(envelope.into_result().unwrap(), None);
    }
}
