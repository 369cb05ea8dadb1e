use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use compforge_ai::GenerationError;
use compforge_core::{AuthError, OAuthError, StoreError};
use serde_json::json;

const SERVER_ERROR: &str = "Server error";

/// Error returned by every handler, rendered as `{success: false, message}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "success": false, "message": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::unauthorized(err.to_string()),
            AuthError::WeakPassword { .. } | AuthError::EmailTaken | AuthError::InvalidInput(_) => {
                Self::bad_request(err.to_string())
            }
            AuthError::InvalidToken(_) | AuthError::TokenExpired | AuthError::UserNotFound => {
                Self::unauthorized("Not authorized, token failed")
            }
            AuthError::Hashing(_) | AuthError::Config(_) | AuthError::Store(_) => {
                tracing::error!(error = %err, "auth failure");
                Self::internal(SERVER_ERROR)
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail { .. } => Self::bad_request("User already exists"),
            StoreError::NotFound { kind: "session", .. } => Self::not_found("Session not found"),
            StoreError::NotFound { .. } => Self::not_found("Not found"),
            StoreError::Backend { .. } => {
                tracing::error!(error = %err, "store failure");
                Self::internal(SERVER_ERROR)
            }
        }
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Validation(message) => Self::bad_request(message),
            // Display carries only the generic per-operation message.
            GenerationError::Upstream { .. } => Self::internal(err.to_string()),
        }
    }
}

impl From<OAuthError> for ApiError {
    fn from(err: OAuthError) -> Self {
        match err {
            OAuthError::MissingEmail { .. } => Self::bad_request(err.to_string()),
            OAuthError::NotConfigured(_) => Self::not_found(err.to_string()),
            OAuthError::Exchange { .. } => {
                tracing::warn!(error = %err, "oauth code exchange failed");
                Self::unauthorized("OAuth authentication failed")
            }
            OAuthError::Http { .. } | OAuthError::Store(_) => {
                tracing::error!(error = %err, "oauth failure");
                Self::internal("OAuth authentication failed")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_map_to_statuses() {
        assert_eq!(
            ApiError::from(AuthError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::EmailTaken).status(),
            StatusCode::BAD_REQUEST
        );
        let internal = ApiError::from(AuthError::hashing("boom"));
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(internal.to_string(), SERVER_ERROR);
    }

    #[test]
    fn missing_session_is_not_found() {
        let err = ApiError::from(StoreError::session_not_found(uuid::Uuid::new_v4()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Session not found");
    }
}
