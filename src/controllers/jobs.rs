use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    domain::job::{Job, JobStore},
    error::{AppError, AppResult},
};

/// Query for GET /api/jobs
#[derive(Debug, Deserialize)]
pub struct ListJobsQuery {
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JobListResponse {
    pub jobs: Vec<Job>,
}

pub struct JobController {
    jobs: Arc<dyn JobStore>,
}

impl JobController {
    pub fn new(jobs: Arc<dyn JobStore>) -> Self {
        Self { jobs }
    }

    /// GET /api/jobs/:jobId - poll one job until a terminal state appears
    ///
    /// 404 means the id is unknown or the job was already reaped; a client
    /// that observed the terminal state earlier loses nothing.
    pub async fn get_job(
        State(controller): State<Arc<JobController>>,
        Path(job_id): Path<String>,
    ) -> AppResult<Json<Job>> {
        controller
            .jobs
            .get(&job_id)
            .await
            .map(Json)
            .ok_or_else(|| AppError::NotFound(format!("job {}", job_id)))
    }

    /// GET /api/jobs?session_id=... - jobs for a session, newest first
    pub async fn list_jobs(
        State(controller): State<Arc<JobController>>,
        Query(query): Query<ListJobsQuery>,
    ) -> AppResult<Json<JobListResponse>> {
        let jobs = controller.jobs.list_by_session(&query.session_id).await;
        Ok(Json(JobListResponse { jobs }))
    }
}
