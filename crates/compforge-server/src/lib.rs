//! HTTP front end for CompForge: auth, design sessions and component
//! generation, with generation also available as Server-Sent Events.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

/// Builds the full application router.
pub fn app(state: AppState) -> axum::Router {
    routes::router(state)
}
