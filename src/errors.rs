use crate::schemas::ErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use tracing::{error, warn};

/// Errors surfaced by the HTTP handlers. Every variant renders as
/// `{"error": "<display>"}` with the status from [`ApiError::status`].
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid JSON or empty request body")]
    EmptyBody,

    #[error("Unsupported content type")]
    UnsupportedContentType,

    #[error("a field is empty")]
    EmptyField(String),

    #[error("{0}")]
    BadRequest(String),

    /// Users are looked up with a 400 and an empty message; existing clients
    /// depend on it.
    #[error("")]
    UserNotFound(i32),

    /// A user id segment that is not an integer; reported like a missing user.
    #[error("")]
    InvalidUserId(String),

    #[error("Product not found")]
    ProductNotFound(i32),

    #[error("Product not found")]
    InvalidProductId(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Failed to upload image")]
    Upload(#[source] anyhow::Error),

    #[error("Internal server error")]
    Database(#[from] DbErr),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::EmptyBody
            | Self::UnsupportedContentType
            | Self::EmptyField(_)
            | Self::BadRequest(_)
            | Self::UserNotFound(_)
            | Self::InvalidUserId(_) => StatusCode::BAD_REQUEST,
            Self::ProductNotFound(_) | Self::InvalidProductId(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Upload(_) | Self::Database(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Maps a failed insert/update of a user, turning a unique-constraint
    /// violation on the email column into a conflict.
    pub fn from_user_write(db_error: DbErr, email: &str) -> Self {
        let unique_violation = matches!(
            db_error.sql_err(),
            Some(SqlErr::UniqueConstraintViolation(_))
        ) || db_error.to_string().to_lowercase().contains("unique");

        if unique_violation {
            Self::Conflict(format!("Email '{}' is already registered", email))
        } else {
            Self::Database(db_error)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Upload(source) => error!("Image upload failed: {:#}", source),
            Self::Database(source) => error!("Database error: {}", source),
            Self::Internal(source) => error!("Internal error: {:#}", source),
            Self::EmptyField(field) => warn!("Rejected empty field '{}'", field),
            Self::UserNotFound(id) => warn!("User with ID {} not found", id),
            Self::ProductNotFound(id) => warn!("Product with ID {} not found", id),
            Self::InvalidUserId(reason) | Self::InvalidProductId(reason) => {
                warn!("Rejected id path segment: {}", reason)
            }
            other => warn!("Rejected request ({}): {}", status, other),
        }

        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
