pub mod error;
pub mod service;

pub use error::PipelineError;
pub use service::{GenerateOutcome, GenerateRequest, PipelineService};
