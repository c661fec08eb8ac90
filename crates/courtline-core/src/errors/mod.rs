// ABOUTME: Unified error type, error codes, and HTTP error envelope for the platform
// ABOUTME: Every service and route returns AppResult so failures map to stable API errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Unified Error Handling System
//!
//! Errors carry an [`ErrorCode`] that decides the HTTP status and the stable
//! machine-readable name clients switch on, plus a human-readable message.

#[cfg(feature = "database-errors")]
mod database;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Standard error codes used throughout the application
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Authentication & Authorization
    /// No credentials supplied
    AuthRequired,
    /// Credentials supplied but not valid
    AuthInvalid,
    /// Token expired
    AuthExpired,
    /// Authenticated but not allowed to perform the action
    PermissionDenied,

    // Validation
    /// Generic invalid input
    InvalidInput,
    /// A required field is absent
    MissingRequiredField,
    /// A value is outside its allowed range
    ValueOutOfRange,

    // Resource management
    /// Resource does not exist (or is not visible to the caller)
    ResourceNotFound,
    /// Resource already exists
    ResourceAlreadyExists,
    /// Request conflicts with the current resource state
    ResourceConflict,
    /// Resource exists but cannot be used right now
    ResourceUnavailable,
    /// A business limit (usage cap, pending booking cap) was reached
    LimitExceeded,

    // External services
    /// Upstream service returned an error
    ExternalServiceError,
    /// Upstream service could not be reached
    ExternalServiceUnavailable,

    // Configuration
    /// Configuration is invalid
    ConfigError,
    /// Required configuration is absent
    ConfigMissing,

    // Internal
    /// Database failure
    DatabaseError,
    /// Anything else
    InternalError,
}

impl ErrorCode {
    /// HTTP status code for this error
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::AuthRequired | Self::AuthInvalid | Self::AuthExpired => 401,
            Self::PermissionDenied => 403,
            Self::InvalidInput | Self::MissingRequiredField | Self::ValueOutOfRange => 400,
            Self::ResourceNotFound => 404,
            Self::ResourceAlreadyExists | Self::ResourceConflict | Self::ResourceUnavailable => {
                409
            }
            Self::LimitExceeded => 422,
            Self::ExternalServiceError => 502,
            Self::ExternalServiceUnavailable => 503,
            Self::ConfigError | Self::ConfigMissing | Self::DatabaseError | Self::InternalError => {
                500
            }
        }
    }

    /// Stable name used in the JSON error envelope
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AuthRequired => "AUTH_REQUIRED",
            Self::AuthInvalid => "AUTH_INVALID",
            Self::AuthExpired => "AUTH_EXPIRED",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::InvalidInput => "INVALID_INPUT",
            Self::MissingRequiredField => "MISSING_REQUIRED_FIELD",
            Self::ValueOutOfRange => "VALUE_OUT_OF_RANGE",
            Self::ResourceNotFound => "RESOURCE_NOT_FOUND",
            Self::ResourceAlreadyExists => "RESOURCE_ALREADY_EXISTS",
            Self::ResourceConflict => "RESOURCE_CONFLICT",
            Self::ResourceUnavailable => "RESOURCE_UNAVAILABLE",
            Self::LimitExceeded => "LIMIT_EXCEEDED",
            Self::ExternalServiceError => "EXTERNAL_SERVICE_ERROR",
            Self::ExternalServiceUnavailable => "EXTERNAL_SERVICE_UNAVAILABLE",
            Self::ConfigError => "CONFIG_ERROR",
            Self::ConfigMissing => "CONFIG_MISSING",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Whether the message is safe to show to API clients verbatim
    #[must_use]
    pub const fn is_client_facing(self) -> bool {
        !matches!(
            self,
            Self::DatabaseError | Self::InternalError | Self::ConfigError | Self::ConfigMissing
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application error with a code and message
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct AppError {
    /// Error classification
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Request correlation ID, when known
    pub request_id: Option<String>,
}

/// Result alias used across the platform
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create an error with an explicit code
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            request_id: None,
        }
    }

    /// Attach a request correlation ID
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Missing credentials
    #[must_use]
    pub fn auth_required() -> Self {
        Self::new(ErrorCode::AuthRequired, "Authentication required")
    }

    /// Invalid credentials
    #[must_use]
    pub fn auth_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthInvalid, message)
    }

    /// Expired token
    #[must_use]
    pub fn auth_expired() -> Self {
        Self::new(ErrorCode::AuthExpired, "Authentication token has expired")
    }

    /// Caller lacks permission
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PermissionDenied, message)
    }

    /// Invalid request input
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Required field missing
    #[must_use]
    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("Missing required field: {field}"),
        )
    }

    /// Value outside its permitted range
    #[must_use]
    pub fn out_of_range(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValueOutOfRange, message)
    }

    /// Resource not found
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceNotFound,
            format!("{} not found", resource.into()),
        )
    }

    /// Resource already exists
    #[must_use]
    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResourceAlreadyExists, message)
    }

    /// Request conflicts with current state
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResourceConflict, message)
    }

    /// Resource exists but is not usable
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResourceUnavailable, message)
    }

    /// Business limit reached
    #[must_use]
    pub fn limit_exceeded(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::LimitExceeded, message)
    }

    /// Upstream service failure
    #[must_use]
    pub fn external_service(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ExternalServiceError,
            format!("{}: {}", service.into(), message.into()),
        )
    }

    /// Upstream service unreachable
    #[must_use]
    pub fn external_unavailable(service: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ExternalServiceUnavailable,
            format!("{} is unavailable", service.into()),
        )
    }

    /// Configuration problem
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Database failure
    #[must_use]
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Internal failure
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

/// JSON body of an error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error details
    pub error: ErrorBody,
}

/// Error details inside [`ErrorResponse`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable error code
    pub code: ErrorCode,
    /// Message for clients
    pub message: String,
    /// Request correlation ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl From<&AppError> for ErrorResponse {
    fn from(error: &AppError) -> Self {
        // Internal details stay in the logs
        let message = if error.code.is_client_facing() {
            error.message.clone()
        } else {
            "An internal error occurred".to_owned()
        };
        Self {
            error: ErrorBody {
                code: error.code,
                message,
                request_id: error.request_id.clone(),
            },
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::invalid_input(format!("Invalid JSON: {error}"))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::internal(format!("{error:#}"))
    }
}

impl From<uuid::Error> for AppError {
    fn from(error: uuid::Error) -> Self {
        Self::invalid_input(format!("Invalid identifier: {error}"))
    }
}

#[cfg(feature = "provider-errors")]
impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() || error.is_connect() {
            Self::new(
                ErrorCode::ExternalServiceUnavailable,
                format!("Upstream request failed: {error}"),
            )
        } else {
            Self::new(
                ErrorCode::ExternalServiceError,
                format!("Upstream request failed: {error}"),
            )
        }
    }
}

#[cfg(feature = "http-response")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = http::StatusCode::from_u16(self.http_status())
            .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(code = %self.code, message = %self.message, "Request failed");
        } else {
            tracing::debug!(code = %self.code, message = %self.message, "Request rejected");
        }

        (status, axum::Json(ErrorResponse::from(&self))).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::auth_required().http_status(), 401);
        assert_eq!(AppError::forbidden("no").http_status(), 403);
        assert_eq!(AppError::not_found("Session").http_status(), 404);
        assert_eq!(AppError::conflict("taken").http_status(), 409);
        assert_eq!(AppError::limit_exceeded("cap").http_status(), 422);
        assert_eq!(AppError::external_service("paypal", "x").http_status(), 502);
        assert_eq!(AppError::database("boom").http_status(), 500);
    }

    #[test]
    fn test_internal_messages_are_hidden() {
        let response = ErrorResponse::from(&AppError::database("syntax error near FROM"));
        assert_eq!(response.error.message, "An internal error occurred");

        let response = ErrorResponse::from(&AppError::not_found("Time slot"));
        assert_eq!(response.error.message, "Time slot not found");
    }

    #[test]
    fn test_code_serializes_as_screaming_snake_case() {
        let json = serde_json::to_value(ErrorCode::ResourceAlreadyExists).unwrap();
        assert_eq!(json, "RESOURCE_ALREADY_EXISTS");
        assert_eq!(
            ErrorCode::ResourceAlreadyExists.as_str(),
            "RESOURCE_ALREADY_EXISTS"
        );
    }
}
