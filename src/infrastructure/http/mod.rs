use axum::{routing::get, routing::post, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::controllers::{audio::AudioController, health, jobs::JobController};
use crate::infrastructure::config::Config;
use crate::infrastructure::repositories::AudioStorage;

/// Assemble the application router.
///
/// Kept separate from the listener so tests can mount the exact same
/// routes on an ephemeral port.
pub fn build_router(
    audio_controller: Arc<AudioController>,
    job_controller: Arc<JobController>,
    storage: Arc<AudioStorage>,
) -> Router {
    let audio_routes = Router::new()
        .route("/api/audio/generate", post(AudioController::generate))
        .route("/api/audio/merge", post(AudioController::merge))
        .route("/api/audio/export", post(AudioController::export))
        .with_state(audio_controller);

    let job_routes = Router::new()
        .route("/api/jobs", get(JobController::list_jobs))
        .route("/api/jobs/:jobId", get(JobController::get_job))
        .with_state(job_controller);

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .with_state(storage)
        .merge(audio_routes)
        .merge(job_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server with all routes configured
pub async fn start_http_server(config: Arc<Config>, app: Router) -> anyhow::Result<()> {
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
