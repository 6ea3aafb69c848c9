// ABOUTME: Unified error taxonomy for the portal with HTTP status mapping
// ABOUTME: Defines ErrorCode, AppError and conversions from anyhow, sqlx and axum rejections
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

//! # Unified Error Handling
//!
//! Every handler returns [`AppResult`]. Each [`ErrorCode`] belongs to exactly one
//! client-visible category (validation, unauthenticated, forbidden, not found,
//! conflict, unexpected) and carries its HTTP status.
//!
//! Unexpected failures are logged server-side and rendered with a generic message.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the portal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Validation (400)
    /// Input present but malformed or out of range
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput,
    /// Required field absent or empty
    #[serde(rename = "MISSING_REQUIRED_FIELD")]
    MissingRequiredField,

    // Unauthenticated (401)
    /// No bearer token, or the header is malformed
    #[serde(rename = "AUTH_REQUIRED")]
    AuthRequired,
    /// Token failed signature or structural verification
    #[serde(rename = "AUTH_INVALID")]
    AuthInvalid,
    /// Token is past its expiry timestamp
    #[serde(rename = "AUTH_EXPIRED")]
    AuthExpired,
    /// Handle/secret pair rejected
    #[serde(rename = "INVALID_CREDENTIALS")]
    InvalidCredentials,

    // Forbidden (403)
    /// Valid principal without sufficient rights
    #[serde(rename = "PERMISSION_DENIED")]
    PermissionDenied,
    /// Credentials matched but the account is not activated
    #[serde(rename = "ACCOUNT_INACTIVE")]
    AccountInactive,

    // Not found (404)
    /// No matching record
    #[serde(rename = "RESOURCE_NOT_FOUND")]
    ResourceNotFound,

    // Conflict (409)
    /// Uniqueness violation
    #[serde(rename = "RESOURCE_ALREADY_EXISTS")]
    ResourceAlreadyExists,

    // Unexpected (500)
    /// Anything else
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError,
    /// Storage layer failure
    #[serde(rename = "DATABASE_ERROR")]
    DatabaseError,
    /// Missing or invalid server configuration
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::InvalidInput | Self::MissingRequiredField => 400,
            Self::AuthRequired | Self::AuthInvalid | Self::AuthExpired | Self::InvalidCredentials => {
                401
            }
            Self::PermissionDenied | Self::AccountInactive => 403,
            Self::ResourceNotFound => 404,
            Self::ResourceAlreadyExists => 409,
            Self::InternalError | Self::DatabaseError | Self::ConfigError => 500,
        }
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::InvalidInput => "The provided input is invalid",
            Self::MissingRequiredField => "A required field is missing from the request",
            Self::AuthRequired => "Authentication is required to access this resource",
            Self::AuthInvalid => "The provided authentication token is invalid",
            Self::AuthExpired => "The authentication token has expired",
            Self::InvalidCredentials => "Invalid credentials",
            Self::PermissionDenied => "You do not have permission to perform this action",
            Self::AccountInactive => "Account is not activated",
            Self::ResourceNotFound => "The requested resource was not found",
            Self::ResourceAlreadyExists => "A resource with this identifier already exists",
            Self::InternalError => "An internal server error occurred",
            Self::DatabaseError => "Database operation failed",
            Self::ConfigError => "Server configuration error",
        }
    }

    /// Whether the error belongs to the unexpected (500) category
    #[must_use]
    pub const fn is_unexpected(self) -> bool {
        self.http_status() >= 500
    }
}

/// Unified error type for the portal
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Message safe to show to a client
    ///
    /// Unexpected errors never leak their internal message.
    #[must_use]
    pub fn client_message(&self) -> &str {
        if self.code.is_unexpected() {
            self.code.description()
        } else {
            &self.message
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// HTTP error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Client-visible message
    pub error: String,
    /// Machine-readable code
    pub code: ErrorCode,
}

impl From<&AppError> for ErrorResponse {
    fn from(error: &AppError) -> Self {
        Self {
            error: error.client_message().to_owned(),
            code: error.code,
        }
    }
}

/// Convenience constructors for common errors
impl AppError {
    /// Authentication required
    #[must_use]
    pub fn auth_required() -> Self {
        Self::new(ErrorCode::AuthRequired, "Authentication required")
    }

    /// Invalid authentication token
    pub fn auth_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthInvalid, message)
    }

    /// Authentication token expired
    #[must_use]
    pub fn auth_expired() -> Self {
        Self::new(ErrorCode::AuthExpired, "Authentication token has expired")
    }

    /// Handle/secret rejected
    #[must_use]
    pub fn invalid_credentials() -> Self {
        Self::new(ErrorCode::InvalidCredentials, "Invalid credentials")
    }

    /// Account exists but is not activated
    #[must_use]
    pub fn account_inactive() -> Self {
        Self::new(
            ErrorCode::AccountInactive,
            "Account is not activated. Contact an administrator.",
        )
    }

    /// Valid principal without sufficient rights
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PermissionDenied, message)
    }

    /// Resource not found
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceNotFound,
            format!("{} not found", resource.into()),
        )
    }

    /// Uniqueness violation
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResourceAlreadyExists, message)
    }

    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Required field missing
    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("{field} is required"),
        )
    }

    /// Internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }
}

/// Conversion from `anyhow::Error` to `AppError`
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::internal(format!("{error:#}"))
    }
}

#[cfg(feature = "database-errors")]
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::RowNotFound => Self::not_found("Record"),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::conflict("A record with this value already exists").with_source(error)
            }
            _ => Self::database(error.to_string()).with_source(error),
        }
    }
}

#[cfg(feature = "http-response")]
mod http_response {
    use super::{AppError, ErrorResponse};
    use axum::{
        extract::rejection::{JsonRejection, QueryRejection},
        response::{IntoResponse, Response},
        Json,
    };
    use http::StatusCode;

    impl IntoResponse for AppError {
        fn into_response(self) -> Response {
            let status = StatusCode::from_u16(self.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

            if self.code.is_unexpected() {
                tracing::error!(code = ?self.code, error = %self.message, "Request failed");
            } else {
                tracing::debug!(code = ?self.code, error = %self.message, "Request rejected");
            }

            (status, Json(ErrorResponse::from(&self))).into_response()
        }
    }

    impl From<JsonRejection> for AppError {
        fn from(rejection: JsonRejection) -> Self {
            Self::invalid_input(rejection.body_text())
        }
    }

    impl From<QueryRejection> for AppError {
        fn from(rejection: QueryRejection) -> Self {
            Self::invalid_input(rejection.body_text())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_http_status() {
        assert_eq!(ErrorCode::MissingRequiredField.http_status(), 400);
        assert_eq!(ErrorCode::AuthExpired.http_status(), 401);
        assert_eq!(ErrorCode::InvalidCredentials.http_status(), 401);
        assert_eq!(ErrorCode::PermissionDenied.http_status(), 403);
        assert_eq!(ErrorCode::AccountInactive.http_status(), 403);
        assert_eq!(ErrorCode::ResourceNotFound.http_status(), 404);
        assert_eq!(ErrorCode::ResourceAlreadyExists.http_status(), 409);
        assert_eq!(ErrorCode::DatabaseError.http_status(), 500);
    }

    #[test]
    fn test_unexpected_errors_hide_message() {
        let error = AppError::database("no such table: accounts");
        assert_eq!(error.client_message(), "Database operation failed");

        let error = AppError::not_found("Device");
        assert_eq!(error.client_message(), "Device not found");
    }

    #[test]
    fn test_error_response_serialization() {
        let response = ErrorResponse::from(&AppError::invalid_credentials());
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["error"], "Invalid credentials");
        assert_eq!(json["code"], "INVALID_CREDENTIALS");
    }

    #[test]
    fn test_anyhow_conversion_is_internal() {
        let error: AppError = anyhow::anyhow!("boom").into();
        assert_eq!(error.code, ErrorCode::InternalError);
    }

    #[cfg(feature = "http-response")]
    #[tokio::test]
    async fn test_into_response_body() {
        use axum::response::IntoResponse;

        let response = AppError::forbidden("Admin privileges required").into_response();
        assert_eq!(response.status().as_u16(), 403);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Admin privileges required");
    }
}
