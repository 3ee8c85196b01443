use crate::domain::audio::WavError;
use crate::error::AppError;
use crate::infrastructure::repositories::{StorageError, SynthesisError};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("audio assembly failed: {0}")]
    Audio(#[from] WavError),

    #[error("archive failed: {0}")]
    Archive(String),

    #[error("chunks returned mismatched sample formats")]
    MixedFormats,

    #[error("synthesis provider is not configured: {0}")]
    Configuration(String),

    #[error("invalid input: {0}")]
    Invalid(String),
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Invalid(msg) => AppError::BadRequest(msg),
            PipelineError::Configuration(msg) => AppError::Configuration(msg),
            PipelineError::Storage(e) => AppError::Storage(e.to_string()),
            PipelineError::Synthesis(e) => AppError::ExternalService(e.to_string()),
            PipelineError::Audio(e) => AppError::BadRequest(e.to_string()),
            PipelineError::Archive(msg) => AppError::Internal(msg),
            PipelineError::MixedFormats => {
                AppError::Internal("chunks returned mismatched sample formats".to_string())
            }
        }
    }
}
