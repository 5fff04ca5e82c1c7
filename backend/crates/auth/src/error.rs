//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.
//!
//! Credential failures are deliberately coarse: an unknown email and a
//! wrong password both surface as `InvalidCredentials`, and a malformed,
//! expired, replayed, or revoked refresh token all surface as
//! `InvalidRefreshToken`. The caller never learns which check failed.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed input (e.g., invalid email format)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Password fails the strength policy
    #[error("Password validation failed: {0}")]
    WeakPassword(String),

    /// Email address already has an account
    #[error("Email address is already registered")]
    EmailAlreadyRegistered,

    /// Invalid credentials (unknown email or wrong password)
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Refresh token rejected (malformed, expired, replayed, or revoked)
    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    /// Access token rejected (missing, malformed, or expired)
    #[error("Invalid access token")]
    InvalidAccessToken,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) | AuthError::WeakPassword(_) => StatusCode::BAD_REQUEST,
            AuthError::EmailAlreadyRegistered => StatusCode::CONFLICT,
            AuthError::InvalidCredentials
            | AuthError::InvalidRefreshToken
            | AuthError::InvalidAccessToken => StatusCode::UNAUTHORIZED,
            AuthError::Database(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Validation(_) | AuthError::WeakPassword(_) => ErrorKind::BadRequest,
            AuthError::EmailAlreadyRegistered => ErrorKind::Conflict,
            AuthError::InvalidCredentials
            | AuthError::InvalidRefreshToken
            | AuthError::InvalidAccessToken => ErrorKind::Unauthorized,
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.to_string())
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::InvalidRefreshToken => {
                tracing::warn!("Refresh token rejected");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        match err.kind() {
            ErrorKind::BadRequest => AuthError::Validation(err.message().to_string()),
            _ => AuthError::Internal(err.to_string()),
        }
    }
}
