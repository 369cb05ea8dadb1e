use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use compforge_core::{Authenticated, OAuthKind, link_or_create_user};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
}

fn signed_in(auth: Authenticated) -> Json<Value> {
    Json(json!({ "success": true, "token": auth.token, "user": auth.user }))
}

pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(body) = body?;
    let auth = state
        .auth
        .register(&body.email, &body.password, &body.name)
        .await?;
    Ok((StatusCode::CREATED, signed_in(auth)))
}

pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::bad_request("Please provide email and password"));
    }
    Ok(signed_in(state.auth.login(&body.email, &body.password).await?))
}

pub async fn me(AuthUser(user): AuthUser) -> Json<Value> {
    Json(json!({ "success": true, "user": user }))
}

pub async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Json<Value>, ApiError> {
    oauth_callback(&state, OAuthKind::Google, query).await
}

pub async fn github_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Json<Value>, ApiError> {
    oauth_callback(&state, OAuthKind::Github, query).await
}

#[tracing::instrument(skip(state, query))]
async fn oauth_callback(
    state: &AppState,
    kind: OAuthKind,
    query: CallbackQuery,
) -> Result<Json<Value>, ApiError> {
    let code = query
        .code
        .filter(|code| !code.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing authorization code"))?;
    let provider = state.oauth_provider(kind)?;
    let profile = provider.exchange_code(&code).await?;
    let user = link_or_create_user(state.store.as_ref(), kind, profile).await?;
    Ok(signed_in(state.auth.issue_for(user)?))
}
