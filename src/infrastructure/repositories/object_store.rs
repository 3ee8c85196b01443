use super::audio_storage::StorageError;
use async_trait::async_trait;

/// Durable remote object store backing the second storage tier.
/// Abstracts the concrete provider (S3, MinIO, an in-memory double in tests).
///
/// Keys are bare artifact filenames; a location is the provider-specific
/// URL under which the object is reachable.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Keys under `prefix`, in unspecified order.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Store an object and return its location.
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Location a key would be served under, without touching the store.
    fn location(&self, key: &str) -> String;
}
