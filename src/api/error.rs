//! Unified API error handling.
//!
//! All endpoints return errors in a standard JSON envelope with a
//! machine-readable code and an appropriate HTTP status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::CoreError;

/// Error codes for API responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Client errors (4xx)
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    ValidationError,

    // Server errors (5xx)
    InternalError,
    DatabaseError,
}

impl ErrorCode {
    /// Get the default HTTP status code for this error code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "bad_request",
            ErrorCode::Unauthorized => "unauthorized",
            ErrorCode::Forbidden => "forbidden",
            ErrorCode::NotFound => "not_found",
            ErrorCode::Conflict => "conflict",
            ErrorCode::ValidationError => "validation_error",
            ErrorCode::InternalError => "internal_error",
            ErrorCode::DatabaseError => "database_error",
        }
    }
}

/// The inner error object in the response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional field-level validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Vec<String>>>,
}

/// The full error response envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Unified API error type
#[derive(Debug)]
pub struct ApiError {
    code: ErrorCode,
    status: StatusCode,
    message: String,
    details: Option<HashMap<String, Vec<String>>>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status: code.status_code(),
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Validation error (400) with field-level details
    pub fn validation(errors: HashMap<String, Vec<String>>) -> Self {
        let message = if errors.len() == 1 {
            errors
                .values()
                .next()
                .and_then(|v| v.first())
                .cloned()
                .unwrap_or_else(|| "Validation failed".to_string())
        } else {
            format!("Validation failed for {} fields", errors.len())
        };

        let mut err = Self::new(ErrorCode::ValidationError, message);
        err.details = Some(errors);
        err
    }

    /// Single field validation error
    pub fn validation_field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = HashMap::new();
        errors.insert(field.to_string(), vec![message.into()]);
        Self::validation(errors)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let response = ErrorResponse {
            error: ErrorBody {
                code: self.code.as_str().to_string(),
                message: self.message,
                details: self.details,
            },
        };

        (self.status, Json(response)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {}", err);

        match &err {
            sqlx::Error::RowNotFound => ApiError::not_found("Resource not found"),
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                if msg.contains("UNIQUE constraint failed") {
                    ApiError::conflict("A resource with this identifier already exists")
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    ApiError::bad_request("Referenced resource does not exist")
                } else {
                    ApiError::database("A database error occurred")
                }
            }
            _ => ApiError::database("A database error occurred"),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound(what) => ApiError::not_found(format!("{} not found", what)),
            CoreError::Forbidden => ApiError::forbidden("You do not have access to this device"),
            CoreError::NotOwner => ApiError::forbidden("Only the device owner may do this"),
            CoreError::Conflict(msg) => ApiError::conflict(msg),
            CoreError::InvalidInput(msg) => ApiError::bad_request(msg),
            CoreError::Storage(e) => {
                tracing::error!("Storage error: {}", e);
                ApiError::database("A database error occurred")
            }
        }
    }
}

/// Builder for collecting multiple validation errors
#[derive(Debug, Default)]
pub struct ValidationErrorBuilder {
    errors: HashMap<String, Vec<String>>,
}

impl ValidationErrorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) -> &mut Self {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Return Ok(()) if no errors, or Err(ApiError) if there are errors
    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation(self.errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_status_codes() {
        assert_eq!(ErrorCode::BadRequest.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::Conflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ErrorCode::DatabaseError.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn core_errors_map_to_expected_codes() {
        let err = ApiError::from(CoreError::NotFound("Device"));
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Device not found");

        // NotOwner and Forbidden are distinct in the core but both surface
        // as 403 here.
        let err = ApiError::from(CoreError::NotOwner);
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        let err = ApiError::from(CoreError::Forbidden);
        assert_eq!(err.status, StatusCode::FORBIDDEN);

        let err = ApiError::from(CoreError::Conflict("dup"));
        assert_eq!(err.code, ErrorCode::Conflict);

        let err = ApiError::from(CoreError::InvalidInput("bad"));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn validation_error_builder_collects_fields() {
        let mut builder = ValidationErrorBuilder::new();
        builder.add("name", "Name is required");
        builder.add("password", "Password is required");
        builder.add("name", "Name is too short");

        assert!(!builder.is_empty());

        let err = builder.finish().unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        let details = err.details.unwrap();
        assert_eq!(details.get("name").unwrap().len(), 2);
        assert_eq!(details.get("password").unwrap().len(), 1);
    }
}
