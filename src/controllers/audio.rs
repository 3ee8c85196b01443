use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    domain::pipeline::{GenerateOutcome, GenerateRequest, PipelineService},
    error::{AppError, AppResult},
};

/// Upper bound on submitted text; anything longer should be split by the
/// caller into separate contents.
const MAX_TEXT_CHARS: usize = 100_000;

/// Response for POST /api/audio/generate
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
}

/// Request for POST /api/audio/merge and /api/audio/export
#[derive(Debug, Serialize, Deserialize)]
pub struct ArtifactListRequest {
    pub locations: Vec<String>,
}

/// Response carrying one new artifact reference
#[derive(Debug, Serialize, Deserialize)]
pub struct ArtifactResponse {
    pub location: String,
}

pub struct AudioController {
    pipeline: Arc<PipelineService>,
}

impl AudioController {
    pub fn new(pipeline: Arc<PipelineService>) -> Self {
        Self { pipeline }
    }

    /// POST /api/audio/generate - generate audio for one (content, language) pair
    ///
    /// Returns the existing artifact immediately on a hit, or a job id to
    /// poll while synthesis runs in the background.
    pub async fn generate(
        State(controller): State<Arc<AudioController>>,
        Json(request): Json<GenerateRequest>,
    ) -> AppResult<(StatusCode, Json<GenerateResponse>)> {
        if request.text.trim().is_empty() {
            return Err(AppError::BadRequest("Text cannot be empty".to_string()));
        }
        if request.text.len() > MAX_TEXT_CHARS {
            return Err(AppError::PayloadTooLarge(format!(
                "Text must be {} characters or less",
                MAX_TEXT_CHARS
            )));
        }
        if request.content_id.trim().is_empty() || request.language.trim().is_empty() {
            return Err(AppError::BadRequest(
                "content_id and language are required".to_string(),
            ));
        }

        let outcome = controller.pipeline.clone().generate(request).await?;

        Ok(match outcome {
            GenerateOutcome::Cached { location } => (
                StatusCode::OK,
                Json(GenerateResponse {
                    cached: true,
                    location: Some(location),
                    job_id: None,
                }),
            ),
            GenerateOutcome::Enqueued { job_id } => (
                StatusCode::ACCEPTED,
                Json(GenerateResponse {
                    cached: false,
                    location: None,
                    job_id: Some(job_id),
                }),
            ),
        })
    }

    /// POST /api/audio/merge - concatenate stored WAV artifacts into one
    pub async fn merge(
        State(controller): State<Arc<AudioController>>,
        Json(request): Json<ArtifactListRequest>,
    ) -> AppResult<Json<ArtifactResponse>> {
        let location = controller.pipeline.merge(&request.locations).await?;
        Ok(Json(ArtifactResponse { location }))
    }

    /// POST /api/audio/export - bundle artifacts into a downloadable archive
    pub async fn export(
        State(controller): State<Arc<AudioController>>,
        Json(request): Json<ArtifactListRequest>,
    ) -> AppResult<Json<ArtifactResponse>> {
        let location = controller
            .pipeline
            .clone()
            .export(&request.locations)
            .await?;
        Ok(Json(ArtifactResponse { location }))
    }
}
