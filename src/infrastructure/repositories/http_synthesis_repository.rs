use super::synthesis_repository::{SynthesisError, SynthesisRepository, SynthesizedAudio};
use crate::domain::audio::SampleFormat;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default retry ceiling for transient provider failures.
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Initial backoff delay, doubled on each retry.
const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    language: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesisResponse {
    audio_content: Option<String>,
    mime_type: Option<String>,
}

/// HTTP implementation of the synthesis repository.
///
/// Calls the provider's synthesize endpoint once per chunk and retries
/// transient failures with exponential backoff. The retry is an explicit
/// bounded loop; after the ceiling, the most recent error is surfaced.
pub struct HttpSynthesisRepository {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    max_attempts: u32,
    initial_backoff: Duration,
}

impl HttpSynthesisRepository {
    pub fn new(endpoint: String, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: DEFAULT_BACKOFF,
        }
    }

    /// Override retry tuning (used by tests to keep backoff short).
    pub fn with_retry(mut self, max_attempts: u32, initial_backoff: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.initial_backoff = initial_backoff;
        self
    }

    /// One provider round trip, no retry.
    async fn call_provider(
        &self,
        text: &str,
        language: &str,
        api_key: &str,
    ) -> Result<SynthesizedAudio, SynthesisError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", api_key)
            .json(&SynthesisRequest { text, language })
            .send()
            .await
            .map_err(|e| SynthesisError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SynthesisError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let body: SynthesisResponse = response
            .json()
            .await
            .map_err(|e| SynthesisError::MalformedResponse(e.to_string()))?;

        let audio_content = body.audio_content.ok_or_else(|| {
            SynthesisError::MalformedResponse("response carried no audio payload".to_string())
        })?;
        let data = BASE64
            .decode(audio_content.as_bytes())
            .map_err(|e| SynthesisError::MalformedResponse(format!("invalid base64: {}", e)))?;

        let descriptor = body
            .mime_type
            .unwrap_or_else(|| "audio/L16;codec=pcm;rate=24000".to_string());
        let format = SampleFormat::from_descriptor(&descriptor);

        tracing::debug!(
            audio_size = data.len(),
            descriptor = %descriptor,
            "Synthesis response received"
        );

        Ok(SynthesizedAudio { data, format })
    }
}

#[async_trait]
impl SynthesisRepository for HttpSynthesisRepository {
    async fn synthesize(
        &self,
        text: &str,
        language: &str,
    ) -> Result<SynthesizedAudio, SynthesisError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(SynthesisError::MissingCredential)?;

        let start_time = std::time::Instant::now();
        let mut delay = self.initial_backoff;

        for attempt in 1..=self.max_attempts {
            match self.call_provider(text, language, api_key).await {
                Ok(audio) => {
                    tracing::info!(
                        attempt,
                        latency_ms = start_time.elapsed().as_millis() as u64,
                        text_length = text.len(),
                        audio_size_bytes = audio.data.len(),
                        "Synthesis completed"
                    );
                    return Ok(audio);
                }
                Err(error) if error.is_retryable() && attempt < self.max_attempts => {
                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Transient synthesis failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(error) => {
                    tracing::error!(
                        attempt,
                        error = %error,
                        "Synthesis failed"
                    );
                    return Err(error);
                }
            }
        }

        unreachable!("retry loop always returns on the final attempt")
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}
