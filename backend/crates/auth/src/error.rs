//! Auth Error Types
//!
//! Auth-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Message shown for every 5xx; the cause only goes to the log
const INTERNAL_MESSAGE: &str = "Internal server error";

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed input, rejected before any store access
    #[error("{0}")]
    Validation(String),

    #[error("Email is already registered")]
    DuplicateEmail,

    #[error("User name is already taken")]
    DuplicateUserName,

    #[error("User not found")]
    UserNotFound,

    /// Wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No bearer token on a protected route
    #[error("Authentication required")]
    MissingToken,

    /// Bad signature, malformed, or wrong token type
    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    /// Refresh token is not bound to a live session (revoked, rotated away, or forged)
    #[error("Session is no longer valid")]
    SessionMismatch,

    /// Missing role
    #[error("Insufficient permissions")]
    Forbidden,

    #[error("Token signing failed: {0}")]
    Signing(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// A new session collided with the unique refresh-token index
    pub fn refresh_token_taken() -> Self {
        AuthError::Internal("Refresh token already bound to a session".to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) | AuthError::InvalidCredentials => StatusCode::BAD_REQUEST,
            AuthError::DuplicateEmail | AuthError::DuplicateUserName => StatusCode::CONFLICT,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::MissingToken | AuthError::InvalidToken | AuthError::ExpiredToken => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::SessionMismatch | AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::Signing(_) | AuthError::Database(_) | AuthError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Validation(_) | AuthError::InvalidCredentials => ErrorKind::BadRequest,
            AuthError::DuplicateEmail | AuthError::DuplicateUserName => ErrorKind::Conflict,
            AuthError::UserNotFound => ErrorKind::NotFound,
            AuthError::MissingToken | AuthError::InvalidToken | AuthError::ExpiredToken => {
                ErrorKind::Unauthorized
            }
            AuthError::SessionMismatch | AuthError::Forbidden => ErrorKind::Forbidden,
            AuthError::Signing(_) | AuthError::Database(_) | AuthError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    pub fn is_server_error(&self) -> bool {
        self.kind().is_server_error()
    }

    /// Convert to AppError; server errors lose their detail
    pub fn to_app_error(&self) -> AppError {
        if self.is_server_error() {
            return AppError::new(self.kind(), INTERNAL_MESSAGE);
        }

        let err = AppError::new(self.kind(), self.to_string());
        match self {
            AuthError::ExpiredToken => err.with_action("Refresh the access token or sign in again"),
            AuthError::SessionMismatch => err.with_action("Sign in again"),
            _ => err,
        }
    }

    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Signing(msg) => {
                tracing::error!(message = %msg, "Auth token signing error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::SessionMismatch => {
                tracing::warn!("Refresh token not bound to a live session");
            }
            AuthError::Forbidden => {
                tracing::warn!("Access denied by role policy");
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

/// Value objects report through `AppError`: client-side kinds become
/// `Validation`, anything else is internal.
impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        if err.kind().is_client_error() {
            AuthError::Validation(err.message().to_string())
        } else {
            AuthError::Internal(err.to_string())
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
        match err.kind() {
            JwtErrorKind::ExpiredSignature => AuthError::ExpiredToken,
            _ => AuthError::InvalidToken,
        }
    }
}
