//! File-backed TTL cache.
//!
//! Each entry is one JSON file named after a sha1 key. The file wraps the
//! value together with the time it was written, so expiry is checked on read
//! and nothing has to sweep the directory in the background.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to create cache directory at {path}: {source}")]
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read cache file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write cache file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize data: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

#[derive(Serialize, Deserialize)]
struct CacheEntry<T> {
    stored_at: DateTime<Utc>,
    value: T,
}

/// `sha1(parts.join(":"))`, hex encoded.
///
/// Key families carry a version token (`v1`, `v2`, ...) among their parts so
/// a format change invalidates old entries without wiping the directory.
pub fn cache_key(parts: &[&str]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(parts.join(":").as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Clone)]
pub struct FileCache {
    dir: PathBuf,
    ttl: Duration,
    lock: Arc<RwLock<()>>,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
            lock: Arc::new(RwLock::new(())),
        }
    }

    /// At least one hour; values past what `Duration` can hold never expire.
    pub fn with_ttl_hours(dir: impl Into<PathBuf>, hours: u64) -> Self {
        let ttl = i64::try_from(hours.max(1))
            .ok()
            .and_then(Duration::try_hours)
            .unwrap_or(Duration::MAX);
        Self::new(dir, ttl)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Returns `Ok(None)` on a miss, an expired entry, or a corrupted file.
    /// Corrupted files are deleted so the next write starts clean.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let _guard = self.lock.read().await;
        let path = self.entry_path(key);

        let content = match tokio::fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Cache miss: {}", key);
                return Ok(None);
            }
            Err(e) => return Err(CacheError::ReadFailed { path, source: e }),
        };

        let entry: CacheEntry<T> = match serde_json::from_slice(&content) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(
                    "Cache corruption detected for {}: {}. Deleting corrupted file.",
                    path.display(),
                    e
                );
                if let Err(rm_err) = tokio::fs::remove_file(&path).await {
                    warn!("Failed to delete corrupted cache file: {}", rm_err);
                }
                return Ok(None);
            }
        };

        if Utc::now() - entry.stored_at >= self.ttl {
            debug!("Cache expired: {} (stored {})", key, entry.stored_at);
            return Ok(None);
        }

        debug!("Cache hit: {}", key);
        Ok(Some(entry.value))
    }

    /// Writes through a temp file and a rename, so readers never see a torn entry.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let entry = CacheEntry {
            stored_at: Utc::now(),
            value,
        };
        let json = serde_json::to_vec(&entry)?;

        let _guard = self.lock.write().await;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| CacheError::DirectoryCreationFailed {
                path: self.dir.clone(),
                source: e,
            })?;

        let path = self.entry_path(key);
        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, &json)
            .await
            .map_err(|e| CacheError::WriteFailed {
                path: temp_path.clone(),
                source: e,
            })?;
        tokio::fs::rename(&temp_path, &path)
            .await
            .map_err(|e| CacheError::WriteFailed { path, source: e })?;

        debug!("Cache saved: {}", key);
        Ok(())
    }

    /// Removes every entry. Subdirectories (such as the id-mapping namespace)
    /// are left to their own cache instance.
    pub async fn clear(&self) -> Result<(), CacheError> {
        let _guard = self.lock.write().await;
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(CacheError::ReadFailed {
                    path: self.dir.clone(),
                    source: e,
                })
            }
        };

        let mut removed = 0usize;
        while let Some(entry) = entries.next_entry().await.map_err(|e| CacheError::ReadFailed {
            path: self.dir.clone(),
            source: e,
        })? {
            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }
            let path = entry.path();
            tokio::fs::remove_file(&path)
                .await
                .map_err(|e| CacheError::WriteFailed { path, source: e })?;
            removed += 1;
        }

        debug!("Cache cleared: {} ({} entries)", self.dir.display(), removed);
        Ok(())
    }

    /// `get` that logs I/O failures and reports them as a miss.
    pub async fn lookup<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Cache read failed for {}: {}", key, e);
                None
            }
        }
    }

    /// `set` that logs failures instead of returning them.
    pub async fn store<T: Serialize>(&self, key: &str, value: &T) {
        if let Err(e) = self.set(key, value).await {
            warn!("Cache write failed for {}: {}", key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cache_key_is_sha1_of_joined_parts() {
        assert_eq!(cache_key(&["a", "b"]), cache_key(&["a:b"]));
        assert_eq!(cache_key(&["abc"]), "a9993e364706816aba3e25717850c26c9cd0d89d");
        assert_ne!(cache_key(&["tmdb", "trending", "movie", "v1"]), cache_key(&["tmdb", "trending", "movie", "v2"]));
    }

    #[test]
    fn test_ttl_hours_is_clamped() {
        let temp_dir = TempDir::new().unwrap();
        assert_eq!(FileCache::with_ttl_hours(temp_dir.path(), 0).ttl(), Duration::hours(1));
        assert_eq!(FileCache::with_ttl_hours(temp_dir.path(), 48).ttl(), Duration::hours(48));
        assert_eq!(FileCache::with_ttl_hours(temp_dir.path(), u64::MAX).ttl(), Duration::MAX);
        assert_eq!(
            FileCache::with_ttl_hours(temp_dir.path(), i64::MAX as u64).ttl(),
            Duration::MAX
        );
    }

    #[tokio::test]
    async fn test_set_then_get_within_ttl() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FileCache::with_ttl_hours(temp_dir.path(), 24);

        cache.set("k", &vec!["one".to_string(), "two".to_string()]).await.unwrap();
        let value: Option<Vec<String>> = cache.get("k").await.unwrap();
        assert_eq!(value, Some(vec!["one".to_string(), "two".to_string()]));
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FileCache::new(temp_dir.path(), Duration::zero());

        cache.set("k", &42u32).await.unwrap();
        let value: Option<u32> = cache.get("k").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_corrupted_entry_is_deleted() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FileCache::with_ttl_hours(temp_dir.path(), 24);
        let path = temp_dir.path().join("bad.json");
        std::fs::write(&path, b"{not json").unwrap();

        let value: Option<u32> = cache.get("bad").await.unwrap();
        assert_eq!(value, None);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_clear_removes_entries_but_not_subdirectories() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FileCache::with_ttl_hours(temp_dir.path(), 24);
        let ids = FileCache::with_ttl_hours(temp_dir.path().join("ids"), 24);

        cache.set("a", &1u32).await.unwrap();
        ids.set("b", &2u32).await.unwrap();
        cache.clear().await.unwrap();

        assert_eq!(cache.get::<u32>("a").await.unwrap(), None);
        assert_eq!(ids.get::<u32>("b").await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_clear_missing_directory_is_ok() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FileCache::with_ttl_hours(temp_dir.path().join("never-created"), 24);
        cache.clear().await.unwrap();
    }
}
