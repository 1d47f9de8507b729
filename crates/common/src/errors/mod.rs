//! Error types for SpaceBio services
//!
//! Every error maps to:
//! - a machine-readable `ErrorCode`
//! - an HTTP status code
//! - a JSON body of the form `{"error": "<message>", "code": "<CODE>"}`

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// User-facing message for an upstream 429
pub const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded. Please try again later.";

/// User-facing message for an upstream 402
pub const CREDITS_DEPLETED_MESSAGE: &str = "AI credits depleted. Please add credits to continue.";

/// User-facing message for any other upstream failure
pub const AI_SERVICE_MESSAGE: &str = "AI service error";

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    ValidationError,
    InvalidFormat,

    // Resource errors
    NotFound,
    PublicationNotFound,

    // Rate limiting / billing
    RateLimited,
    CreditsDepleted,

    // Database errors
    DatabaseError,
    ConnectionError,

    // External service errors
    UpstreamError,
    SourceFetchError,
    AiServiceError,

    // Internal errors
    InternalError,
    ConfigurationError,
    SerializationError,
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    // Resource errors
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound { resource_type: String, id: String },

    #[error("Publication not found: {id}")]
    PublicationNotFound { id: String },

    // Local throttling
    #[error("Too many requests")]
    TooManyRequests,

    // Upstream AI gateway outcomes
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("AI credits depleted. Please add credits to continue.")]
    CreditsDepleted,

    #[error("AI service error")]
    AiService { status: u16, body: String },

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    // External service errors
    #[error("Failed to fetch publications: {status}")]
    SourceFetch { status: u16 },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    // Internal errors
    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("{message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
            AppError::NotFound { .. } => ErrorCode::NotFound,
            AppError::PublicationNotFound { .. } => ErrorCode::PublicationNotFound,
            AppError::TooManyRequests | AppError::RateLimited => ErrorCode::RateLimited,
            AppError::CreditsDepleted => ErrorCode::CreditsDepleted,
            AppError::AiService { .. } => ErrorCode::AiServiceError,
            AppError::Database(_) | AppError::Migration(_) => ErrorCode::DatabaseError,
            AppError::DatabaseConnection { .. } => ErrorCode::ConnectionError,
            AppError::SourceFetch { .. } => ErrorCode::SourceFetchError,
            AppError::HttpClient(_) => ErrorCode::UpstreamError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation { .. } |
            AppError::InvalidFormat { .. } => StatusCode::BAD_REQUEST,

            // 402 Payment Required
            AppError::CreditsDepleted => StatusCode::PAYMENT_REQUIRED,

            // 404 Not Found
            AppError::NotFound { .. } |
            AppError::PublicationNotFound { .. } => StatusCode::NOT_FOUND,

            // 429 Too Many Requests
            AppError::TooManyRequests |
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,

            // 500 Internal Server Error; upstream failures surface as 500 too
            AppError::AiService { .. } |
            AppError::Database(_) |
            AppError::DatabaseConnection { .. } |
            AppError::Migration(_) |
            AppError::SourceFetch { .. } |
            AppError::HttpClient(_) |
            AppError::Internal { .. } |
            AppError::Configuration { .. } |
            AppError::Serialization(_) |
            AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// Error body returned by every endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: ErrorCode,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        // Log based on severity
        if self.is_server_error() {
            match &self {
                AppError::AiService { status: upstream, body } => tracing::error!(
                    upstream_status = upstream,
                    upstream_body = %body,
                    status = status.as_u16(),
                    "AI gateway error"
                ),
                _ => tracing::error!(
                    error = %message,
                    code = ?code,
                    status = status.as_u16(),
                    "Server error"
                ),
            }
        } else if self.is_client_error() {
            tracing::warn!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
        }

        let body = ErrorResponse {
            error: message,
            code,
        };

        (status, Json(body)).into_response()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal {
            message: err.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::PublicationNotFound { id: "test".into() };
        assert_eq!(err.code(), ErrorCode::PublicationNotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_upstream_rate_limit_is_not_a_server_error() {
        let err = AppError::RateLimited;
        assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.to_string(), RATE_LIMIT_MESSAGE);
        assert!(!err.is_server_error());
    }

    #[test]
    fn test_credits_depleted() {
        let err = AppError::CreditsDepleted;
        assert_eq!(err.status_code(), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(err.to_string(), CREDITS_DEPLETED_MESSAGE);
    }

    #[test]
    fn test_ai_service_error_hides_upstream_body() {
        let err = AppError::AiService { status: 503, body: "overloaded".into() };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), AI_SERVICE_MESSAGE);
    }

    #[test]
    fn test_source_fetch_message() {
        let err = AppError::SourceFetch { status: 404 };
        assert_eq!(err.to_string(), "Failed to fetch publications: 404");
        assert!(err.is_server_error());
    }

    #[test]
    fn test_validation_error() {
        let err = AppError::Validation {
            message: "limit out of range".into(),
            field: Some("limit".into()),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(!err.is_server_error());
        assert!(err.is_client_error());
    }
}
