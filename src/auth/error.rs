use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use super::dto::{ErrorListResponse, ErrorResponse};

pub const DUPLICATE_EMAIL_MESSAGE: &str = "email already exists";
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid credentials";

/// Failures reported by the user store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already exists")]
    DuplicateEmail,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Failures of the credential lifecycle, as seen by callers.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("email already exists")]
    DuplicateEmail,

    // Unknown email and wrong password both end up here.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("internal error: {0:#}")]
    Internal(anyhow::Error),
}

impl AuthError {
    /// Field messages for the 400 body; empty for non-list errors.
    pub fn messages(&self) -> Vec<String> {
        match self {
            AuthError::Validation(errors) => errors.clone(),
            AuthError::DuplicateEmail => vec![DUPLICATE_EMAIL_MESSAGE.to_string()],
            _ => Vec::new(),
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => AuthError::DuplicateEmail,
            StoreError::Backend(e) => AuthError::Internal(e),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::Validation(_) | AuthError::DuplicateEmail => (
                StatusCode::BAD_REQUEST,
                Json(ErrorListResponse {
                    success: false,
                    errors: self.messages(),
                }),
            )
                .into_response(),
            AuthError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    success: false,
                    error: INVALID_CREDENTIALS_MESSAGE.into(),
                }),
            )
                .into_response(),
            AuthError::Internal(e) => {
                let detail = format!("{e:#}");
                error!(error = %detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        success: false,
                        error: "Internal server error".into(),
                    }),
                )
                    .into_response()
            }
        }
    }
}
