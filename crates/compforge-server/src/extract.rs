use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use compforge_core::User;

use crate::error::ApiError;
use crate::state::AppState;

/// The user behind a valid `Authorization: Bearer <jwt>` header.
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ApiError::unauthorized("Not authorized, no token"))?;

        let user = state.auth.authenticate(token).await.map_err(|err| {
            tracing::debug!(error = %err, "bearer token rejected");
            ApiError::from(err)
        })?;
        Ok(Self(user))
    }
}
