use axum::Json;
use serde_json::{Value, json};

#[tracing::instrument(skip_all)]
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}
