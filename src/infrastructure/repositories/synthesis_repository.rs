use crate::domain::audio::SampleFormat;
use async_trait::async_trait;

/// Audio returned for one chunk of text, with its format decided once at
/// this boundary.
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    pub data: Vec<u8>,
    pub format: SampleFormat,
}

#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    /// No provider credential configured. Never retried.
    #[error("synthesis provider credential is missing")]
    MissingCredential,

    /// The provider answered with an error status. 5xx responses are
    /// transient and retried; 4xx responses are permanent.
    #[error("synthesis provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    /// The provider answered 200 but the payload was unusable. Never
    /// retried: the same request would fail the same way.
    #[error("malformed synthesis response: {0}")]
    MalformedResponse(String),

    /// The request never completed (connect/timeout). Treated as transient.
    #[error("synthesis transport error: {0}")]
    Transport(String),
}

impl SynthesisError {
    pub fn is_retryable(&self) -> bool {
        match self {
            SynthesisError::Provider { status, .. } => *status >= 500,
            SynthesisError::Transport(_) => true,
            SynthesisError::MissingCredential | SynthesisError::MalformedResponse(_) => false,
        }
    }
}

/// Repository for speech synthesis.
/// Abstracts the underlying provider behind one call per text chunk.
///
/// Implementations are responsible for:
/// - Provider-specific request/response encoding
/// - Bounded retry with backoff on transient failures
/// - Reporting the sample format of the returned audio
#[async_trait]
pub trait SynthesisRepository: Send + Sync {
    /// Synthesize one chunk of text in the target language.
    async fn synthesize(
        &self,
        text: &str,
        language: &str,
    ) -> Result<SynthesizedAudio, SynthesisError>;

    /// Whether a credential is available. Checked before any job is
    /// created so a misconfigured deployment fails at submission time.
    fn is_configured(&self) -> bool {
        true
    }
}
