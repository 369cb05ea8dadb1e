//! HTTP surface. Every JSON body uses camelCase field names.
mod ai;
mod auth;
mod health;
mod sessions;

use axum::Router;
use axum::routing::{get, post, put};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/google/callback", get(auth::google_callback))
        .route("/api/auth/github/callback", get(auth::github_callback))
        .route(
            "/api/sessions",
            get(sessions::list).post(sessions::create),
        )
        .route(
            "/api/sessions/{id}",
            get(sessions::show)
                .put(sessions::update)
                .patch(sessions::update)
                .delete(sessions::remove),
        )
        .route("/api/sessions/{id}/chat", post(sessions::append_message))
        .route("/api/sessions/{id}/component", put(sessions::replace_component))
        .route("/api/ai/generate", post(ai::generate))
        .route("/api/ai/chat", post(ai::chat))
        .route("/api/ai/stream", post(ai::stream))
        .route("/api/ai/modify", post(ai::modify))
        .route("/api/ai/modify/stream", post(ai::modify_stream))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
