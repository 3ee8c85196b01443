use super::error::PipelineError;
use crate::domain::audio::{chunk_text, encode_wav, merge_wavs, SampleFormat};
use crate::domain::job::{JobStatus, JobStore, JobUpdate};
use crate::infrastructure::repositories::{AudioStorage, SynthesisRepository, SynthesizedAudio};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// One audio-generation request as submitted by a caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub session_id: String,
    pub content_id: String,
    pub language: String,
    pub text: String,
}

/// Immediate answer to a generation request: either an existing artifact
/// or a job handle to poll.
#[derive(Debug, Clone)]
pub enum GenerateOutcome {
    Cached { location: String },
    Enqueued { job_id: String },
}

/// Event-triggered coordinator for the chunk/synthesize/assemble pipeline.
///
/// `generate` is the fast synchronous phase: an artifact lookup that either
/// short-circuits or hands off to a spawned task. The spawned task owns all
/// slow work and records every transition on the job, so a poller always
/// reaches a terminal state; step failures never escape the task.
pub struct PipelineService {
    jobs: Arc<dyn JobStore>,
    storage: Arc<AudioStorage>,
    synthesis: Arc<dyn SynthesisRepository>,
    chunk_limit: usize,
    export_retention: Duration,
}

impl PipelineService {
    pub fn new(
        jobs: Arc<dyn JobStore>,
        storage: Arc<AudioStorage>,
        synthesis: Arc<dyn SynthesisRepository>,
        chunk_limit: usize,
        export_retention: Duration,
    ) -> Self {
        Self {
            jobs,
            storage,
            synthesis,
            chunk_limit,
            export_retention,
        }
    }

    /// Submit a generation request.
    ///
    /// An existing artifact for the (content, language) pair is returned
    /// immediately and no job is created. Otherwise a pending job is
    /// created, the pipeline runs in a spawned task, and the job id is
    /// returned without blocking on synthesis.
    pub async fn generate(
        self: Arc<Self>,
        request: GenerateRequest,
    ) -> Result<GenerateOutcome, PipelineError> {
        tracing::info!(
            session_id = %request.session_id,
            content_id = %request.content_id,
            language = %request.language,
            text_length = request.text.len(),
            "Audio generation requested"
        );

        if let Some(existing) = self
            .storage
            .lookup(&request.content_id, &request.language)
            .await?
        {
            tracing::info!(
                content_id = %request.content_id,
                language = %request.language,
                location = %existing.location,
                "Existing artifact found, skipping synthesis"
            );
            return Ok(GenerateOutcome::Cached {
                location: existing.location,
            });
        }

        // A missing credential must surface to the submitter before any
        // job exists, not as a failed job later.
        if !self.synthesis.is_configured() {
            return Err(PipelineError::Configuration(
                "no synthesis credential available".to_string(),
            ));
        }

        let job = self
            .jobs
            .create(&request.session_id, &request.content_id, &request.language)
            .await;

        let service = Arc::clone(&self);
        let job_id = job.id.clone();
        tokio::spawn(async move {
            service.run_pipeline(&job_id, request).await;
        });

        Ok(GenerateOutcome::Enqueued { job_id: job.id })
    }

    /// Execute the pipeline for one job, capturing any failure into the
    /// job record.
    async fn run_pipeline(&self, job_id: &str, request: GenerateRequest) {
        self.jobs
            .update(job_id, JobUpdate::status(JobStatus::Processing))
            .await;

        match self.execute(job_id, &request).await {
            Ok(location) => {
                tracing::info!(job_id, location = %location, "Pipeline completed");
                self.jobs
                    .update(job_id, JobUpdate::completed(location))
                    .await;
            }
            Err(error) => {
                tracing::error!(job_id, error = %error, "Pipeline failed");
                self.jobs
                    .update(job_id, JobUpdate::failed(error.to_string()))
                    .await;
            }
        }
    }

    async fn execute(&self, job_id: &str, request: &GenerateRequest) -> Result<String, PipelineError> {
        let chunks = chunk_text(&request.text, self.chunk_limit);
        tracing::info!(
            job_id,
            chunk_count = chunks.len(),
            text_length = request.text.len(),
            "Text chunked"
        );

        // Chunks are synthesized strictly in order; provider rate limits
        // and output ordering both rule out parallel calls. Any chunk
        // failure aborts the job before anything is persisted.
        let mut outputs = Vec::with_capacity(chunks.len());
        for (index, chunk) in chunks.iter().enumerate() {
            self.jobs
                .update(
                    job_id,
                    JobUpdate {
                        progress: Some(format!(
                            "synthesizing chunk {}/{}",
                            index + 1,
                            chunks.len()
                        )),
                        ..JobUpdate::default()
                    },
                )
                .await;

            let output = self.synthesis.synthesize(chunk, &request.language).await?;
            outputs.push(output);
        }

        let (bytes, extension) = assemble(outputs)?;

        let stored = self
            .storage
            .store(&request.content_id, &request.language, bytes, extension)
            .await?;
        Ok(stored.location)
    }

    /// Merge previously stored WAV artifacts into a single new artifact.
    pub async fn merge(&self, locations: &[String]) -> Result<String, PipelineError> {
        if locations.is_empty() {
            return Err(PipelineError::Invalid(
                "no artifacts to merge".to_string(),
            ));
        }

        let mut files = Vec::with_capacity(locations.len());
        for location in locations {
            files.push(self.storage.read(location).await?);
        }

        let merged = merge_wavs(&files)?;
        let prefix = format!("merged-{}-", Uuid::new_v4().simple());
        let stored = self.storage.store_with_prefix(&prefix, merged, "wav").await?;

        tracing::info!(
            input_count = locations.len(),
            location = %stored.location,
            "Artifacts merged"
        );
        Ok(stored.location)
    }

    /// Bundle artifacts into a zip archive for bulk download.
    ///
    /// Archives are disposable derived artifacts; the stored copy is
    /// scheduled for deletion after the retention window.
    pub async fn export(self: Arc<Self>, locations: &[String]) -> Result<String, PipelineError> {
        if locations.is_empty() {
            return Err(PipelineError::Invalid(
                "no artifacts to export".to_string(),
            ));
        }

        let mut archive = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options = zip::write::FileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        for (index, location) in locations.iter().enumerate() {
            let bytes = self.storage.read(location).await?;
            let name = location
                .rsplit('/')
                .next()
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("artifact-{}", index));
            archive
                .start_file(name, options)
                .map_err(|e| PipelineError::Archive(e.to_string()))?;
            archive
                .write_all(&bytes)
                .map_err(|e| PipelineError::Archive(e.to_string()))?;
        }

        let cursor = archive
            .finish()
            .map_err(|e| PipelineError::Archive(e.to_string()))?;

        let prefix = format!("export-{}-", Uuid::new_v4().simple());
        let stored = self
            .storage
            .store_with_prefix(&prefix, cursor.into_inner(), "zip")
            .await?;

        tracing::info!(
            input_count = locations.len(),
            location = %stored.location,
            "Export archive stored"
        );

        // Reap the archive once the retention window passes; the caller is
        // expected to have downloaded it by then.
        let service = Arc::clone(&self);
        let location = stored.location.clone();
        let retention = self.export_retention;
        tokio::spawn(async move {
            tokio::time::sleep(retention).await;
            if let Err(error) = service.storage.delete(&location).await {
                tracing::warn!(location = %location, error = %error, "Failed to reap export archive");
            }
        });

        Ok(stored.location)
    }
}

/// Combine per-chunk provider outputs into a single playable artifact.
///
/// All-PCM outputs are concatenated and wrapped in one WAV container; the
/// single conversion happens here, after every chunk has succeeded.
/// Already-encoded outputs are concatenated verbatim.
fn assemble(outputs: Vec<SynthesizedAudio>) -> Result<(Vec<u8>, &'static str), PipelineError> {
    let Some(first) = outputs.first() else {
        // Degenerate empty input: a valid zero-sample container
        return Ok((encode_wav(&[], 24000, 1, 16), "wav"));
    };

    match first.format.clone() {
        SampleFormat::RawPcm {
            sample_rate,
            channels,
            bits_per_sample,
        } => {
            let mut pcm = Vec::new();
            for output in &outputs {
                if output.format != first.format {
                    return Err(PipelineError::MixedFormats);
                }
                pcm.extend_from_slice(&output.data);
            }
            Ok((
                encode_wav(&pcm, sample_rate, channels, bits_per_sample),
                "wav",
            ))
        }
        SampleFormat::Encoded { .. } => {
            let extension = first.format.extension();
            let mut bytes = Vec::new();
            for output in &outputs {
                if !matches!(output.format, SampleFormat::Encoded { .. }) {
                    return Err(PipelineError::MixedFormats);
                }
                bytes.extend_from_slice(&output.data);
            }
            Ok((bytes, extension))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::audio::WavHeader;
    use crate::domain::job::InMemoryJobStore;
    use crate::infrastructure::repositories::SynthesisError;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FakeSynthesis {
        calls: AtomicU32,
        fail: bool,
        configured: bool,
    }

    impl FakeSynthesis {
        fn ok() -> Self {
            Self {
                calls: AtomicU32::new(0),
                fail: false,
                configured: true,
            }
        }
    }

    #[async_trait]
    impl SynthesisRepository for FakeSynthesis {
        async fn synthesize(
            &self,
            text: &str,
            _language: &str,
        ) -> Result<SynthesizedAudio, SynthesisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SynthesisError::Provider {
                    status: 503,
                    message: "overloaded".to_string(),
                });
            }
            Ok(SynthesizedAudio {
                data: vec![0u8; text.len()],
                format: SampleFormat::RawPcm {
                    sample_rate: 24000,
                    channels: 1,
                    bits_per_sample: 16,
                },
            })
        }

        fn is_configured(&self) -> bool {
            self.configured
        }
    }

    struct Harness {
        service: Arc<PipelineService>,
        jobs: Arc<InMemoryJobStore>,
        synthesis: Arc<FakeSynthesis>,
        _dir: tempfile::TempDir,
    }

    fn harness(synthesis: FakeSynthesis, chunk_limit: usize) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let jobs = Arc::new(InMemoryJobStore::new());
        let storage = Arc::new(AudioStorage::new(dir.path().to_path_buf(), None));
        let synthesis = Arc::new(synthesis);
        let service = Arc::new(PipelineService::new(
            jobs.clone(),
            storage,
            synthesis.clone(),
            chunk_limit,
            Duration::from_secs(60),
        ));
        Harness {
            service,
            jobs,
            synthesis,
            _dir: dir,
        }
    }

    fn request(content_id: &str, text: &str) -> GenerateRequest {
        GenerateRequest {
            session_id: "session-1".to_string(),
            content_id: content_id.to_string(),
            language: "en".to_string(),
            text: text.to_string(),
        }
    }

    async fn wait_terminal(jobs: &InMemoryJobStore, job_id: &str) -> crate::domain::job::Job {
        for _ in 0..200 {
            if let Some(job) = jobs.get(job_id).await {
                if job.status.is_terminal() {
                    return job;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {} never reached a terminal state", job_id);
    }

    #[tokio::test]
    async fn test_generate_enqueues_and_completes() {
        let h = harness(FakeSynthesis::ok(), 5000);

        let outcome = h
            .service
            .clone()
            .generate(request("article", "One sentence. Another sentence."))
            .await
            .unwrap();
        let GenerateOutcome::Enqueued { job_id } = outcome else {
            panic!("expected a job handle");
        };

        let job = wait_terminal(&h.jobs, &job_id).await;
        assert_eq!(job.status, JobStatus::Completed);
        let location = job.result_location.expect("completed job has a location");
        assert!(job.error.is_none());
        assert!(job.updated_at > job.created_at);

        // Single chunk, single synthesis call, valid container on disk
        assert_eq!(h.synthesis.calls.load(Ordering::SeqCst), 1);
        let bytes = std::fs::read(&location).unwrap();
        let header = WavHeader::parse(&bytes).unwrap();
        assert_eq!(header.sample_rate, 24000);
        assert_eq!(bytes.len(), 44 + header.data_len as usize);
    }

    #[tokio::test]
    async fn test_existing_artifact_short_circuits_synthesis() {
        let h = harness(FakeSynthesis::ok(), 5000);

        let first = h
            .service
            .clone()
            .generate(request("article", "Some text."))
            .await
            .unwrap();
        let GenerateOutcome::Enqueued { job_id } = first else {
            panic!("expected a job handle");
        };
        wait_terminal(&h.jobs, &job_id).await;
        let calls_after_first = h.synthesis.calls.load(Ordering::SeqCst);

        let second = h
            .service
            .clone()
            .generate(request("article", "Some text."))
            .await
            .unwrap();
        assert!(matches!(second, GenerateOutcome::Cached { .. }));
        assert_eq!(h.synthesis.calls.load(Ordering::SeqCst), calls_after_first);
    }

    #[tokio::test]
    async fn test_multi_chunk_synthesis_is_sequential_and_concatenated() {
        let h = harness(FakeSynthesis::ok(), 40);

        let text = "First sentence here. Second sentence here. Third sentence here.";
        let outcome = h
            .service
            .clone()
            .generate(request("long-article", text))
            .await
            .unwrap();
        let GenerateOutcome::Enqueued { job_id } = outcome else {
            panic!("expected a job handle");
        };

        let job = wait_terminal(&h.jobs, &job_id).await;
        assert_eq!(job.status, JobStatus::Completed);

        let chunks = chunk_text(text, 40);
        assert!(chunks.len() > 1);
        assert_eq!(h.synthesis.calls.load(Ordering::SeqCst), chunks.len() as u32);

        // One container around the concatenated PCM of all chunks
        let expected_pcm: usize = chunks.iter().map(|c| c.len()).sum();
        let bytes = std::fs::read(job.result_location.unwrap()).unwrap();
        let header = WavHeader::parse(&bytes).unwrap();
        assert_eq!(header.data_len as usize, expected_pcm);
    }

    #[tokio::test]
    async fn test_chunk_failure_fails_the_job_with_message() {
        let h = harness(
            FakeSynthesis {
                calls: AtomicU32::new(0),
                fail: true,
                configured: true,
            },
            5000,
        );

        let outcome = h
            .service
            .clone()
            .generate(request("article", "Some text."))
            .await
            .unwrap();
        let GenerateOutcome::Enqueued { job_id } = outcome else {
            panic!("expected a job handle");
        };

        let job = wait_terminal(&h.jobs, &job_id).await;
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.result_location.is_none());
        assert!(job.error.unwrap().contains("503"));

        // No partial artifact was persisted
        let second = h
            .service
            .clone()
            .generate(request("article", "Some text."))
            .await
            .unwrap();
        assert!(matches!(second, GenerateOutcome::Enqueued { .. }));
    }

    #[tokio::test]
    async fn test_missing_credential_rejected_before_job_creation() {
        let h = harness(
            FakeSynthesis {
                calls: AtomicU32::new(0),
                fail: false,
                configured: false,
            },
            5000,
        );

        let result = h
            .service
            .clone()
            .generate(request("article", "Some text."))
            .await;
        assert!(matches!(result, Err(PipelineError::Configuration(_))));
        assert!(h.jobs.list_by_session("session-1").await.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_jobs_both_reach_terminal_state() {
        let h = harness(FakeSynthesis::ok(), 5000);

        let a = h
            .service
            .clone()
            .generate(request("article-a", "Text a."))
            .await
            .unwrap();
        let b = h
            .service
            .clone()
            .generate(request("article-b", "Text b."))
            .await
            .unwrap();

        let (GenerateOutcome::Enqueued { job_id: id_a }, GenerateOutcome::Enqueued { job_id: id_b }) =
            (a, b)
        else {
            panic!("expected two job handles");
        };

        let job_a = wait_terminal(&h.jobs, &id_a).await;
        let job_b = wait_terminal(&h.jobs, &id_b).await;
        assert_eq!(job_a.status, JobStatus::Completed);
        assert_eq!(job_b.status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn test_merge_produces_new_artifact() {
        let h = harness(FakeSynthesis::ok(), 5000);

        // Two completed artifacts with a shared format
        let mut locations = Vec::new();
        for (content, payload) in [("m-one", 1000usize), ("m-two", 2000usize)] {
            let wav = encode_wav(&vec![0u8; payload], 24000, 1, 16);
            let dir = h._dir.path();
            let path = dir.join(format!("{}-en-1700000000000.wav", content));
            std::fs::write(&path, wav).unwrap();
            locations.push(path.to_string_lossy().into_owned());
        }

        let merged = h.service.merge(&locations).await.unwrap();
        let bytes = std::fs::read(&merged).unwrap();
        assert_eq!(bytes.len(), 44 + 1000 + 2000);
        assert_ne!(merged, locations[0]);
    }

    #[tokio::test]
    async fn test_export_bundles_artifacts_into_zip() {
        let h = harness(FakeSynthesis::ok(), 5000);

        let wav = encode_wav(&[0u8; 100], 24000, 1, 16);
        let path = h._dir.path().join("e-one-en-1700000000000.wav");
        std::fs::write(&path, wav).unwrap();

        let archive = h
            .service
            .clone()
            .export(&[path.to_string_lossy().into_owned()])
            .await
            .unwrap();
        assert!(archive.ends_with(".zip"));
        let bytes = std::fs::read(&archive).unwrap();
        // Zip local-file signature
        assert_eq!(&bytes[0..4], b"PK\x03\x04");
    }

    #[test]
    fn test_assemble_rejects_mixed_formats() {
        let pcm = SynthesizedAudio {
            data: vec![0u8; 4],
            format: SampleFormat::RawPcm {
                sample_rate: 24000,
                channels: 1,
                bits_per_sample: 16,
            },
        };
        let encoded = SynthesizedAudio {
            data: vec![0u8; 4],
            format: SampleFormat::Encoded {
                codec: "mpeg".to_string(),
            },
        };
        assert!(matches!(
            assemble(vec![pcm, encoded]),
            Err(PipelineError::MixedFormats)
        ));
    }

    #[test]
    fn test_assemble_concatenates_encoded_outputs_verbatim() {
        let chunk = |data: Vec<u8>| SynthesizedAudio {
            data,
            format: SampleFormat::Encoded {
                codec: "mpeg".to_string(),
            },
        };
        let (bytes, extension) = assemble(vec![chunk(vec![1, 2]), chunk(vec![3])]).unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
        assert_eq!(extension, "mp3");
    }

    #[test]
    fn test_assemble_of_nothing_is_an_empty_container() {
        let (bytes, extension) = assemble(Vec::new()).unwrap();
        assert_eq!(bytes.len(), 44);
        assert_eq!(extension, "wav");
    }
}
