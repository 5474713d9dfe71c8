//! Structured error types for RPC responses.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error codes for programmatic error handling.
///
/// Serialized with the same names the browser client matches on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Empty or oversized input, rejected before persistence.
    BadRequest,
    /// Duplicate category name.
    Conflict,
    /// Stale or unknown id.
    NotFound,
    /// Batch failures and store errors.
    InternalServerError,
}

impl ErrorCode {
    /// HTTP status code used by the server binding.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorCode::BadRequest => 400,
            ErrorCode::Conflict => 409,
            ErrorCode::NotFound => 404,
            ErrorCode::InternalServerError => 500,
        }
    }
}

/// Structured error for RPC responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    // Convenience constructors

    pub fn invalid_input(field: &str, reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, reason).with_field(field)
    }

    pub fn missing_field(field: &str) -> Self {
        Self::invalid_input(field, format!("{} is required", field))
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    pub fn task_not_found(task_id: i64) -> Self {
        Self::new(ErrorCode::NotFound, format!("Task with id {} not found", task_id))
    }

    pub fn category_not_found(category_id: i64) -> Self {
        Self::new(
            ErrorCode::NotFound,
            format!("Category with id {} not found", category_id),
        )
        .with_field("categoryId")
    }

    pub fn unknown_procedure(name: &str) -> Self {
        Self::new(ErrorCode::NotFound, format!("Unknown procedure: {}", name))
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalServerError, err.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        self.code == ErrorCode::NotFound
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<ApiError>() {
            Ok(api_err) => api_err,
            Err(err) => ApiError::internal(err),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::new(ErrorCode::BadRequest, format!("Invalid input: {}", err))
    }
}

/// Result type for RPC operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_serializes_screaming_snake() {
        let json = serde_json::to_string(&ErrorCode::InternalServerError).unwrap();
        assert_eq!(json, "\"INTERNAL_SERVER_ERROR\"");
    }

    #[test]
    fn test_anyhow_downcast_preserves_api_error() {
        let err: anyhow::Error = ApiError::conflict("dup").into();
        let back = ApiError::from(err);
        assert_eq!(back.code, ErrorCode::Conflict);
        assert_eq!(back.message, "dup");
    }

    #[test]
    fn test_foreign_anyhow_error_becomes_internal() {
        let back = ApiError::from(anyhow::anyhow!("disk on fire"));
        assert_eq!(back.code, ErrorCode::InternalServerError);
    }

    #[test]
    fn test_field_omitted_when_absent() {
        let json = serde_json::to_value(ApiError::task_not_found(7)).unwrap();
        assert!(json.get("field").is_none());
        assert_eq!(json["code"], "NOT_FOUND");
    }
}
