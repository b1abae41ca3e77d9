use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Unauthorized: {0}")]
    Unauthorized(anyhow::Error),

    #[error("Forbidden: {0}")]
    Forbidden(anyhow::Error),

    #[error("Conflict: {0}")]
    Conflict(anyhow::Error),

    #[error("Email error: {0}")]
    Email(String),

    #[error("Configuration error: {0}")]
    Config(anyhow::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<lettre::error::Error> for ServiceError {
    fn from(err: lettre::error::Error) -> Self {
        ServiceError::Email(err.to_string())
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        ServiceError::Internal(anyhow::Error::new(err))
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorBody {
            error: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<String>,
        }

        let (status, error_message, details) = match self {
            ServiceError::Validation(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Validation error".to_string(),
                Some(err.to_string()),
            ),
            ServiceError::BadRequest(err) => (StatusCode::BAD_REQUEST, err.to_string(), None),
            ServiceError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string(), None),
            ServiceError::Unauthorized(err) => (StatusCode::UNAUTHORIZED, err.to_string(), None),
            ServiceError::Forbidden(err) => (StatusCode::FORBIDDEN, err.to_string(), None),
            ServiceError::Conflict(err) => (StatusCode::CONFLICT, err.to_string(), None),
            ServiceError::Email(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Email error".to_string(),
                Some(msg),
            ),
            ServiceError::Config(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Configuration error".to_string(),
                Some(err.to_string()),
            ),
            ServiceError::Internal(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                Some(err.to_string()),
            ),
        };

        (
            status,
            Json(ErrorBody {
                error: error_message,
                details,
            }),
        )
            .into_response()
    }
}

/// The canonical "don't leak which part failed" credential error.
///
/// Absent and expired tokens, unknown accounts, and wrong passwords all
/// surface identically so callers cannot probe the store.
pub fn invalid_token() -> ServiceError {
    ServiceError::NotFound(anyhow::anyhow!("Invalid or expired token"))
}

pub fn invalid_credentials() -> ServiceError {
    ServiceError::Unauthorized(anyhow::anyhow!("Invalid credentials"))
}
