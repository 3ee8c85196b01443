use super::model::{Job, JobStatus, JobUpdate};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Registry of audio-generation jobs, keyed by id and queryable by session.
///
/// The backing is injectable: the in-memory implementation below serves a
/// single-process deployment and tests; an external store must preserve the
/// same transition atomicity.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Create a job in `pending` state and return it.
    async fn create(&self, session_id: &str, content_id: &str, language: &str) -> Job;

    /// Merge a partial update into a job, bumping `updated_at`.
    ///
    /// Returns `None` when the id is unknown (e.g. the job was already
    /// reaped); callers treat that as a non-fatal no-op.
    async fn update(&self, id: &str, update: JobUpdate) -> Option<Job>;

    async fn get(&self, id: &str) -> Option<Job>;

    /// Jobs for a session, newest first.
    async fn list_by_session(&self, session_id: &str) -> Vec<Job>;

    /// Delete jobs older than `retention`, returning how many were removed.
    async fn sweep(&self, retention: Duration) -> usize;
}

/// In-memory job registry guarded by an async lock.
#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<String, Job>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create(&self, session_id: &str, content_id: &str, language: &str) -> Job {
        let now = Utc::now();
        let mut jobs = self.jobs.write().await;

        // Creation time makes the id unique across repeated requests for the
        // same (content, language) pair; rapid resubmissions can land within
        // the same millisecond, so disambiguate with a sequence suffix.
        let base = format!(
            "{}-{}-{}-{}",
            session_id,
            content_id,
            language,
            now.timestamp_millis()
        );
        let mut id = base.clone();
        let mut seq = 1u32;
        while jobs.contains_key(&id) {
            id = format!("{}-{}", base, seq);
            seq += 1;
        }

        let job = Job {
            id: id.clone(),
            session_id: session_id.to_string(),
            content_id: content_id.to_string(),
            language: language.to_string(),
            status: JobStatus::Pending,
            progress: None,
            result_location: None,
            error: None,
            created_at: now,
            updated_at: now,
        };

        jobs.insert(id, job.clone());
        job
    }

    async fn update(&self, id: &str, update: JobUpdate) -> Option<Job> {
        let mut jobs = self.jobs.write().await;
        let job = match jobs.get_mut(id) {
            Some(job) => job,
            None => {
                tracing::debug!(job_id = id, "Update for unknown job ignored");
                return None;
            }
        };

        if let Some(status) = update.status {
            job.status = status;
        }
        if let Some(progress) = update.progress {
            job.progress = Some(progress);
        }
        if let Some(location) = update.result_location {
            job.result_location = Some(location);
        }
        if let Some(error) = update.error {
            job.error = Some(error);
        }

        // updated_at must strictly increase even when two transitions land
        // within the clock's resolution.
        let now = Utc::now();
        job.updated_at = if now > job.updated_at {
            now
        } else {
            job.updated_at + ChronoDuration::milliseconds(1)
        };

        Some(job.clone())
    }

    async fn get(&self, id: &str) -> Option<Job> {
        self.jobs.read().await.get(id).cloned()
    }

    async fn list_by_session(&self, session_id: &str) -> Vec<Job> {
        let jobs = self.jobs.read().await;
        let mut matching: Vec<Job> = jobs
            .values()
            .filter(|j| j.session_id == session_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching
    }

    async fn sweep(&self, retention: Duration) -> usize {
        let cutoff = Utc::now()
            - ChronoDuration::from_std(retention).unwrap_or_else(|_| ChronoDuration::hours(24));
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, job| job.created_at > cutoff);
        before - jobs.len()
    }
}

/// Periodically reap jobs older than the retention window.
///
/// Deleting a finished job does not affect a client that already observed
/// its terminal state; a later poll simply sees 404.
pub fn spawn_retention_sweep(
    store: Arc<dyn JobStore>,
    retention: Duration,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; skip it so a fresh boot does
        // not log a pointless sweep.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = store.sweep(retention).await;
            if removed > 0 {
                tracing::info!(removed, "Reaped expired jobs");
            }
        }
    })
}
