use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use echoform::controllers::{audio::AudioController, jobs::JobController};
use echoform::domain::job::{spawn_retention_sweep, InMemoryJobStore, JobStore};
use echoform::domain::pipeline::PipelineService;
use echoform::infrastructure::config::{Config, LogFormat};
use echoform::infrastructure::http::{build_router, start_http_server};
use echoform::infrastructure::repositories::{
    AudioStorage, HttpSynthesisRepository, ObjectStore, S3ObjectStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        "Starting Echoform on {}:{}",
        config.host,
        config.port
    );

    if config.synthesis_api_key.is_none() {
        tracing::warn!(
            "SYNTHESIS_API_KEY not set; generation requests will be rejected until it is configured"
        );
    }

    // Remote durable store is optional; without it the service runs
    // local-cache-only.
    let remote: Option<Arc<dyn ObjectStore>> = match &config.s3_bucket {
        Some(bucket) => {
            tracing::info!(bucket = %bucket, region = %config.aws_region, "Initializing S3 artifact store");
            let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
                .region(aws_config::Region::new(config.aws_region.clone()))
                .load()
                .await;
            let client = Arc::new(aws_sdk_s3::Client::new(&aws_config));
            Some(Arc::new(S3ObjectStore::new(
                client,
                bucket.clone(),
                config.aws_region.clone(),
            )))
        }
        None => {
            tracing::info!("No S3 bucket configured, running with local cache only");
            None
        }
    };

    let config = Arc::new(config);

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Instantiate repositories
    tracing::info!("Instantiating repositories...");
    let storage = Arc::new(AudioStorage::new(
        PathBuf::from(&config.audio_cache_dir),
        remote,
    ));
    let synthesis = Arc::new(HttpSynthesisRepository::new(
        config.synthesis_api_url.clone(),
        config.synthesis_api_key.clone(),
    ));

    // 2. Instantiate the job store and its retention sweep
    let job_store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
    spawn_retention_sweep(
        job_store.clone(),
        Duration::from_secs(config.job_retention_hours * 3600),
        Duration::from_secs(3600),
    );

    // 3. Instantiate services (inject repositories)
    tracing::info!("Instantiating services...");
    let pipeline = Arc::new(PipelineService::new(
        job_store.clone(),
        storage.clone(),
        synthesis,
        config.chunk_max_chars,
        Duration::from_secs(config.export_retention_secs),
    ));

    // 4. Instantiate controllers (inject services)
    tracing::info!("Instantiating controllers...");
    let audio_controller = Arc::new(AudioController::new(pipeline));
    let job_controller = Arc::new(JobController::new(job_store));

    // Start HTTP server with all routes
    let app = build_router(audio_controller, job_controller, storage);
    start_http_server(config, app).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "echoform=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "echoform=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
