use super::object_store::ObjectStore;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Extensions we recognize as finished artifacts during prefix scans.
const ARTIFACT_EXTENSIONS: [&str; 4] = ["wav", "mp3", "ogg", "zip"];

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("remote store error: {0}")]
    Remote(String),

    #[error("artifact not found: {0}")]
    NotFound(String),
}

/// Result of a storage lookup or write.
#[derive(Debug, Clone)]
pub struct StoredAudio {
    pub location: String,
    pub cache_hit: bool,
    pub size_bytes: Option<u64>,
    pub stored_at: Option<DateTime<Utc>>,
}

/// Two-tier artifact storage: a fast local filesystem cache consulted
/// first, and an optional durable remote store behind it.
///
/// Artifacts are immutable once written. Every write uses a fresh
/// timestamped filename under the deterministic `{content_id}-{language}-`
/// prefix, so concurrent writers never collide; readers resolve the newest
/// object under the prefix.
pub struct AudioStorage {
    cache_dir: PathBuf,
    remote: Option<Arc<dyn ObjectStore>>,
}

/// Deterministic key prefix for one (content, language) pair.
pub fn artifact_prefix(content_id: &str, language: &str) -> String {
    format!("{}-{}-", content_id, language)
}

fn has_artifact_extension(name: &str) -> bool {
    ARTIFACT_EXTENSIONS
        .iter()
        .any(|ext| name.ends_with(&format!(".{}", ext)))
}

fn content_type_for(ext: &str) -> &'static str {
    match ext {
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "ogg" => "audio/ogg",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

impl AudioStorage {
    pub fn new(cache_dir: PathBuf, remote: Option<Arc<dyn ObjectStore>>) -> Self {
        Self { cache_dir, remote }
    }

    /// Find an existing artifact for the pair, cache tier first.
    ///
    /// A local hit short-circuits without any remote call. Remote lookup
    /// failures are swallowed and treated as "not found" so local-only
    /// operation always works.
    pub async fn lookup(
        &self,
        content_id: &str,
        language: &str,
    ) -> Result<Option<StoredAudio>, StorageError> {
        let prefix = artifact_prefix(content_id, language);

        if let Some(hit) = self.lookup_local(&prefix).await? {
            tracing::debug!(prefix = %prefix, location = %hit.location, "Local cache hit");
            return Ok(Some(hit));
        }

        if let Some(remote) = &self.remote {
            match remote.list(&prefix).await {
                Ok(keys) => {
                    // Timestamped names make the lexicographic maximum the
                    // most recent object.
                    if let Some(key) = keys
                        .into_iter()
                        .filter(|k| has_artifact_extension(k))
                        .max()
                    {
                        let location = remote.location(&key);
                        tracing::debug!(prefix = %prefix, location = %location, "Remote store hit");
                        return Ok(Some(StoredAudio {
                            location,
                            cache_hit: false,
                            size_bytes: None,
                            stored_at: None,
                        }));
                    }
                }
                Err(error) => {
                    tracing::warn!(
                        prefix = %prefix,
                        error = %error,
                        "Remote lookup failed, treating as not found"
                    );
                }
            }
        }

        Ok(None)
    }

    /// Persist a finished artifact for the pair under a fresh timestamped
    /// name. Goes to the remote store when one is configured, otherwise to
    /// the local cache. Remote write failures are fatal.
    pub async fn store(
        &self,
        content_id: &str,
        language: &str,
        bytes: Vec<u8>,
        extension: &str,
    ) -> Result<StoredAudio, StorageError> {
        self.store_with_prefix(&artifact_prefix(content_id, language), bytes, extension)
            .await
    }

    /// Persist under an arbitrary prefix (merge/export artifacts carry
    /// synthetic ids rather than a content pair).
    pub async fn store_with_prefix(
        &self,
        prefix: &str,
        bytes: Vec<u8>,
        extension: &str,
    ) -> Result<StoredAudio, StorageError> {
        let filename = format!("{}{}.{}", prefix, Utc::now().timestamp_millis(), extension);
        let size = bytes.len() as u64;

        let location = if let Some(remote) = &self.remote {
            let location = remote
                .put(&filename, bytes, content_type_for(extension))
                .await?;
            tracing::info!(key = %filename, size_bytes = size, "Artifact stored remotely");
            location
        } else {
            tokio::fs::create_dir_all(&self.cache_dir).await?;
            let path = self.cache_dir.join(&filename);
            tokio::fs::write(&path, bytes).await?;
            tracing::info!(path = %path.display(), size_bytes = size, "Artifact stored locally");
            path.to_string_lossy().into_owned()
        };

        Ok(StoredAudio {
            location,
            cache_hit: false,
            size_bytes: Some(size),
            stored_at: Some(Utc::now()),
        })
    }

    /// Read an artifact back from whichever tier its location points at.
    pub async fn read(&self, location: &str) -> Result<Vec<u8>, StorageError> {
        if let Some(path) = self.resolve_local(location) {
            return Ok(tokio::fs::read(path).await?);
        }

        if let Some(remote) = &self.remote {
            let key = location.rsplit('/').next().unwrap_or(location);
            return remote.get(key).await;
        }

        Err(StorageError::NotFound(location.to_string()))
    }

    /// Remove an artifact (used for disposable export archives).
    pub async fn delete(&self, location: &str) -> Result<(), StorageError> {
        if let Some(path) = self.resolve_local(location) {
            tokio::fs::remove_file(path).await?;
            return Ok(());
        }

        if let Some(remote) = &self.remote {
            let key = location.rsplit('/').next().unwrap_or(location);
            return remote.delete(key).await;
        }

        Ok(())
    }

    /// Resolve a location to a file inside the cache directory.
    ///
    /// Callers hand us arbitrary location strings; anything resolving
    /// outside the cache directory is not ours to touch, symlinks
    /// included.
    fn resolve_local(&self, location: &str) -> Option<std::path::PathBuf> {
        let path = Path::new(location).canonicalize().ok()?;
        let cache = self.cache_dir.canonicalize().ok()?;
        path.starts_with(&cache).then_some(path)
    }

    /// Writability check for the readiness endpoint.
    pub async fn is_writable(&self) -> bool {
        tokio::fs::create_dir_all(&self.cache_dir).await.is_ok()
    }

    /// Remote tier reachability check for the readiness endpoint.
    /// `None` when no remote store is configured.
    pub async fn remote_reachable(&self) -> Option<bool> {
        let remote = self.remote.as_ref()?;
        match remote.list("readiness-check-").await {
            Ok(_) => Some(true),
            Err(error) => {
                tracing::warn!(error = %error, "Remote store unreachable");
                Some(false)
            }
        }
    }

    async fn lookup_local(&self, prefix: &str) -> Result<Option<StoredAudio>, StorageError> {
        let mut dir = match tokio::fs::read_dir(&self.cache_dir).await {
            Ok(dir) => dir,
            // Missing cache directory just means an empty cache
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut newest: Option<String> = None;
        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(prefix) && has_artifact_extension(&name) {
                if newest.as_deref().map_or(true, |current| name.as_str() > current) {
                    newest = Some(name);
                }
            }
        }

        let Some(name) = newest else {
            return Ok(None);
        };

        let path = self.cache_dir.join(&name);
        let metadata = tokio::fs::metadata(&path).await?;
        let stored_at = metadata.modified().ok().map(DateTime::<Utc>::from);

        Ok(Some(StoredAudio {
            location: path.to_string_lossy().into_owned(),
            cache_hit: true,
            size_bytes: Some(metadata.len()),
            stored_at,
        }))
    }
}
