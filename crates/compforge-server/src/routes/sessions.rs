use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use compforge_core::{
    ChatMessage, ChatRole, ComponentUpdate, NewSession, Session, SessionId, SessionPatch, User,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MessageBody {
    role: ChatRole,
    content: String,
}

fn data(session: &Session) -> Json<Value> {
    Json(json!({ "success": true, "data": session }))
}

/// Loads a session, hiding sessions owned by someone else.
pub(crate) async fn owned(
    state: &AppState,
    user: &User,
    id: SessionId,
) -> Result<Session, ApiError> {
    match state.store.session(id).await? {
        Some(session) if session.owner == user.id => Ok(session),
        _ => Err(ApiError::not_found("Session not found")),
    }
}

pub async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>, ApiError> {
    let sessions = state.store.sessions_for(user.id).await?;
    Ok(Json(json!({
        "success": true,
        "count": sessions.len(),
        "data": sessions,
    })))
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    body: Result<Json<NewSession>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(mut body) = body?;
    body.name = body.name.trim().to_owned();
    if body.name.is_empty() {
        return Err(ApiError::bad_request("Session name is required"));
    }
    let session = state.store.create_session(user.id, body).await?;
    Ok((StatusCode::CREATED, data(&session)))
}

pub async fn show(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<SessionId>,
) -> Result<Json<Value>, ApiError> {
    Ok(data(&owned(&state, &user, id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<SessionId>,
    body: Result<Json<SessionPatch>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(patch) = body?;
    if patch.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(ApiError::bad_request("Session name is required"));
    }
    let mut session = owned(&state, &user, id).await?;
    session.apply(patch);
    Ok(data(&state.store.update_session(session).await?))
}

pub async fn remove(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<SessionId>,
) -> Result<Json<Value>, ApiError> {
    owned(&state, &user, id).await?;
    state.store.delete_session(id).await?;
    tracing::info!(session_id = %id, "session deleted");
    Ok(Json(json!({ "success": true, "message": "Session deleted" })))
}

pub async fn append_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<SessionId>,
    body: Result<Json<MessageBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    if body.content.trim().is_empty() {
        return Err(ApiError::bad_request("Message content is required"));
    }
    let mut session = owned(&state, &user, id).await?;
    session.push_message(ChatMessage::new(body.role, body.content));
    Ok(data(&state.store.update_session(session).await?))
}

pub async fn replace_component(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<SessionId>,
    body: Result<Json<ComponentUpdate>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    let mut session = owned(&state, &user, id).await?;
    session.replace_component(body.jsx_code, body.css_code, body.metadata);
    let session = state.store.update_session(session).await?;
    tracing::debug!(
        session_id = %id,
        version = session.current_component.version,
        "component replaced"
    );
    Ok(data(&session))
}
