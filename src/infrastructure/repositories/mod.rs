pub mod audio_storage;
pub mod http_synthesis_repository;
pub mod object_store;
pub mod s3_object_store;
pub mod synthesis_repository;

pub use audio_storage::{AudioStorage, StorageError, StoredAudio};
pub use http_synthesis_repository::HttpSynthesisRepository;
pub use object_store::ObjectStore;
pub use s3_object_store::S3ObjectStore;
pub use synthesis_repository::{SynthesisError, SynthesisRepository, SynthesizedAudio};
