use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::infrastructure::repositories::AudioStorage;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn health_ready(State(storage): State<Arc<AudioStorage>>) -> impl IntoResponse {
    let cache_ok = storage.is_writable().await;
    let remote = storage.remote_reachable().await;

    let cache_field = if cache_ok { "writable" } else { "unavailable" };
    let remote_field = match remote {
        None => "not_configured",
        Some(true) => "reachable",
        Some(false) => "unreachable",
    };

    // A configured but dead remote tier means writes would fail; that is
    // not ready.
    if cache_ok && remote.unwrap_or(true) {
        (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "cache": cache_field,
                "remote": remote_field
            })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "not_ready",
                "cache": cache_field,
                "remote": remote_field
            })),
        )
    }
}
