//! Domain error types for the GitHub App backend.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.
//! Every variant maps to one HTTP status at the handler boundary.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use std::fmt;

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A required secret or setting is missing for this operation
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Missing or invalid session, or missing installation context
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Webhook signature did not match
    #[error("Invalid webhook signature")]
    Signature,

    /// Caller is authenticated but may not see this resource
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// GitHub or the generation API answered with a non-success status
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// The generation model failed or produced no text
    #[error("Generation error: {0}")]
    Generation(String),

    /// Resource not found
    #[error("{0} not found")]
    NotFound(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) | AppError::Signature => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Configuration(_)
            | AppError::Upstream(_)
            | AppError::Generation(_)
            | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (error_code, response_message) = match self {
            AppError::Configuration(detail) => {
                tracing::error!("Configuration error: {}", detail);
                (
                    "CONFIGURATION_ERROR",
                    "The server is missing required configuration".to_string(),
                )
            }
            AppError::Upstream(detail) => {
                tracing::error!("Upstream error: {}", detail);
                (
                    "UPSTREAM_ERROR",
                    "An upstream service request failed".to_string(),
                )
            }
            AppError::Generation(detail) => {
                tracing::error!("Generation error: {}", detail);
                (
                    "GENERATION_ERROR",
                    "Review generation failed".to_string(),
                )
            }
            AppError::Database(detail) => {
                tracing::error!("Database error: {}", detail);
                (
                    "DATABASE_ERROR",
                    "An internal database error occurred".to_string(),
                )
            }
            AppError::Unauthorized(_) => ("UNAUTHORIZED", self.to_string()),
            AppError::Signature => ("INVALID_SIGNATURE", self.to_string()),
            AppError::Forbidden(_) => ("FORBIDDEN", self.to_string()),
            AppError::NotFound(_) => ("NOT_FOUND", self.to_string()),
            AppError::InvalidInput(_) => ("INVALID_INPUT", self.to_string()),
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: error_code.to_string(),
            message: response_message,
        })
    }
}

/// Error response body matching OpenAPI schema.
#[derive(Debug, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::Database(err.to_string())
    }
}
