//! Unified error handling.
//!
//! Provides a single error type for the repository, cache and external API
//! layers that renders as an Axum HTTP response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    // Resource errors
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    // Validation
    #[error("{0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // External API errors, classified by the upstream status code
    #[error("External API rejected the request with status {status}")]
    ExternalBadRequest { status: u16, detail: Value },

    #[error("External API returned client error {status}")]
    ExternalClient { status: u16, detail: Value },

    #[error("External API returned server error {status}")]
    ExternalServer { status: u16, body: String },

    // Broken storage assumptions (e.g. an update touching more than one row)
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Service unavailable")]
    ServiceUnavailable(String),

    // Infrastructure errors
    #[cfg(feature = "database")]
    #[error("Database error")]
    Database(sea_orm::DbErr),

    #[cfg(feature = "cache")]
    #[error("Cache error")]
    Cache(#[from] redis::RedisError),

    // Internal
    #[error("Internal server error")]
    Internal(String),
}

/// Error response body for HTTP
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

impl AppError {
    /// Get error code for client
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::ExternalBadRequest { .. } => "EXTERNAL_BAD_REQUEST",
            AppError::ExternalClient { .. } => "EXTERNAL_CLIENT_ERROR",
            AppError::ExternalServer { .. } => "EXTERNAL_SERVER_ERROR",
            AppError::InvariantViolation(_) => "INVARIANT_VIOLATION",
            AppError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            #[cfg(feature = "database")]
            AppError::Database(_) => "DATABASE_ERROR",
            #[cfg(feature = "cache")]
            AppError::Cache(_) => "CACHE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ExternalBadRequest { .. }
            | AppError::ExternalClient { .. }
            | AppError::ExternalServer { .. } => StatusCode::BAD_GATEWAY,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get user-facing message (hides internal details)
    pub fn user_message(&self) -> String {
        match self {
            // Show full message for client errors
            AppError::NotFound(msg) | AppError::Conflict(msg) | AppError::Validation(msg) => {
                msg.clone()
            }

            AppError::ExternalBadRequest { status, detail }
            | AppError::ExternalClient { status, detail } => {
                tracing::warn!(status, %detail, "External API client error");
                format!("External service rejected the request ({})", status)
            }
            AppError::ExternalServer { status, body } => {
                tracing::error!(status, body = %body, "External API server error");
                "External service failed".to_string()
            }

            // Hide details for internal errors
            AppError::Configuration(msg) => {
                tracing::error!("Configuration error: {}", msg);
                "An internal error occurred".to_string()
            }
            AppError::InvariantViolation(msg) => {
                tracing::error!("Invariant violated: {}", msg);
                "An internal error occurred".to_string()
            }
            #[cfg(feature = "database")]
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "A database error occurred".to_string()
            }
            #[cfg(feature = "cache")]
            AppError::Cache(e) => {
                tracing::error!("Cache error: {:?}", e);
                "A cache error occurred".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }
            AppError::ServiceUnavailable(service) => {
                tracing::error!("Service unavailable: {}", service);
                format!("Service {} is unavailable", service)
            }
        }
    }
}

// =============================================================================
// HTTP Response (Axum)
// =============================================================================

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code().to_string(),
                message: self.user_message(),
            },
        };

        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Storage Error Conversion
// =============================================================================

#[cfg(feature = "database")]
impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err.sql_err().and_then(AppError::from_sql_err) {
            Some(mapped) => mapped,
            None => AppError::Database(err),
        }
    }
}

#[cfg(feature = "database")]
impl AppError {
    /// Constraint violations the client can act on; `None` for the rest.
    fn from_sql_err(err: sea_orm::SqlErr) -> Option<Self> {
        match err {
            sea_orm::SqlErr::UniqueConstraintViolation(detail) => {
                tracing::debug!("Unique constraint violated: {}", detail);
                Some(AppError::Conflict("Record already exists".to_string()))
            }
            _ => None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("serialization failed: {}", err))
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Convenience constructors
impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        AppError::Configuration(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        AppError::InvariantViolation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    pub fn service_unavailable(service: impl Into<String>) -> Self {
        AppError::ServiceUnavailable(service.into())
    }

    /// Whether the error is a `NotFound`
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }
}
