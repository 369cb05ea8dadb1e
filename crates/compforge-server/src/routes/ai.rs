use std::convert::Infallible;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::sse::{Event, Sse};
use compforge_ai::{
    GenerationRequest, GenerationResult, HistoryMessage, StreamEvent, validate_instruction,
    validate_prompt,
};
use compforge_core::{ChatMessage, ChatRole, Session, SessionId, User};
use futures::{Stream, StreamExt as _};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::sessions::owned;
use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::state::AppState;

const EVENT_BUFFER: usize = 64;
const CHAT_REPLY: &str = "Component generated";

/// A chat log entry as sent by the client. Roles other than `user` and
/// `assistant` are dropped before the history reaches the model.
#[derive(Debug, Deserialize)]
pub struct HistoryEntry {
    role: String,
    #[serde(default)]
    content: String,
}

fn to_history(entries: Vec<HistoryEntry>) -> Vec<HistoryMessage> {
    entries
        .into_iter()
        .filter_map(|entry| match entry.role.as_str() {
            "user" => Some(HistoryMessage::user(entry.content)),
            "assistant" => Some(HistoryMessage::assistant(entry.content)),
            _ => None,
        })
        .collect()
}

/// The user and assistant turns of a stored chat log.
fn session_history(session: &Session) -> Vec<HistoryMessage> {
    session
        .chat_history
        .iter()
        .filter_map(|message| match message.role {
            ChatRole::User => Some(HistoryMessage::user(message.content.clone())),
            ChatRole::Assistant => Some(HistoryMessage::assistant(message.content.clone())),
            ChatRole::System => None,
        })
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateBody {
    #[serde(default)]
    prompt: String,
    #[serde(default)]
    chat_history: Vec<HistoryEntry>,
    /// When set, the exchange is recorded in this session.
    #[serde(default)]
    session_id: Option<SessionId>,
}

impl GenerateBody {
    fn into_request(self) -> (GenerationRequest, Option<SessionId>) {
        let request = GenerationRequest::new(self.prompt).history(to_history(self.chat_history));
        (request, self.session_id)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatBody {
    #[serde(default)]
    message: String,
    session_id: SessionId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyBody {
    #[serde(default)]
    original_code: String,
    #[serde(default)]
    modification_prompt: String,
    #[serde(default)]
    chat_history: Vec<HistoryEntry>,
}

pub async fn generate(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    body: Result<Json<GenerateBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    tracing::debug!(user_id = %user.id, "generate requested");
    let (request, session_id) = body.into_request();
    if let Some(id) = session_id {
        owned(&state, &user, id).await?;
    }
    let result = state.generation.generate_request(&request).await?;
    if let Some(id) = session_id {
        record_exchange(&state, &user, id, request.prompt, &result).await?;
    }
    Ok(Json(json!({ "success": true, "data": result })))
}

/// Generates inside a session: the stored chat log is the history, and the
/// exchange plus the new component are saved back to the session.
pub async fn chat(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    body: Result<Json<ChatBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    validate_prompt(&body.message)?;
    let session = owned(&state, &user, body.session_id).await?;
    let request = GenerationRequest::new(body.message).history(session_history(&session));
    let result = state.generation.generate_request(&request).await?;
    let session = record_exchange(&state, &user, session.id, request.prompt, &result).await?;
    Ok(Json(json!({
        "success": true,
        "message": CHAT_REPLY,
        "jsxCode": result.jsx_code,
        "cssCode": result.css_code,
        "session": session,
    })))
}

/// Appends the prompt and the generated component to the chat log and makes
/// the component current. The session is reloaded so edits made while the
/// model was running are kept.
async fn record_exchange(
    state: &AppState,
    user: &User,
    id: SessionId,
    prompt: String,
    result: &GenerationResult,
) -> Result<Session, ApiError> {
    let mut session = owned(state, user, id).await?;
    session.push_message(ChatMessage::new(ChatRole::User, prompt));
    session.push_message(ChatMessage::new(ChatRole::Assistant, json!(result).to_string()));
    session.replace_component(result.jsx_code.clone(), result.css_code.clone(), None);
    let session = state.store.update_session(session).await?;
    tracing::debug!(
        session_id = %id,
        version = session.current_component.version,
        "exchange recorded"
    );
    Ok(session)
}

pub async fn modify(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    body: Result<Json<ModifyBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    tracing::debug!(user_id = %user.id, "modify requested");
    let result = state
        .generation
        .modify(
            &body.original_code,
            &body.modification_prompt,
            &to_history(body.chat_history),
        )
        .await?;
    Ok(Json(json!({ "success": true, "data": result })))
}

/// Streams generation events as SSE `data:` frames.
///
/// Invalid input is answered with 400 before the SSE response opens. The
/// generation task stops as soon as the client disconnects: dropping the
/// response drops the receiver, which closes the task's sink.
pub async fn stream(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    body: Result<Json<GenerateBody>, JsonRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let Json(body) = body?;
    let (request, _) = body.into_request();
    validate_prompt(&request.prompt)?;
    let (mut tx, rx) = mpsc::channel::<StreamEvent>(EVENT_BUFFER);
    tokio::spawn(async move {
        tracing::debug!(user_id = %user.id, "stream opened");
        state
            .generation
            .generate_streaming(&request.prompt, &request.history, &mut tx)
            .await;
    });
    Ok(sse(rx))
}

pub async fn modify_stream(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    body: Result<Json<ModifyBody>, JsonRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let Json(body) = body?;
    validate_instruction(&body.modification_prompt)?;
    let (mut tx, rx) = mpsc::channel::<StreamEvent>(EVENT_BUFFER);
    tokio::spawn(async move {
        tracing::debug!(user_id = %user.id, "modify stream opened");
        state
            .generation
            .modify_streaming(
                &body.original_code,
                &body.modification_prompt,
                &to_history(body.chat_history),
                &mut tx,
            )
            .await;
    });
    Ok(sse(rx))
}

fn sse(rx: mpsc::Receiver<StreamEvent>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    Sse::new(
        ReceiverStream::new(rx).map(|event| Ok(Event::default().data(event.payload().to_string()))),
    )
}
