/// On-disk durable store: one JSON file per key
use super::{DurableStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// A stored value with its expiry metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub key: String,
    pub stored_at: DateTime<Utc>,
    pub ttl_seconds: u64,
    pub value: String,
}

impl FileEntry {
    pub fn age_seconds(&self) -> i64 {
        (Utc::now() - self.stored_at).num_seconds().max(0)
    }

    pub fn is_expired(&self) -> bool {
        let ttl = chrono::Duration::seconds(self.ttl_seconds.min(i64::MAX as u64) as i64);
        Utc::now() >= self.stored_at + ttl
    }
}

/// Summary of a stored entry for listing
#[derive(Debug, Clone)]
pub struct StoredEntryInfo {
    pub key: String,
    pub stored_at: DateTime<Utc>,
    pub age_seconds: i64,
    pub is_valid: bool,
    pub size_bytes: usize,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct FileStoreStats {
    pub total_files: usize,
    pub valid_files: usize,
    pub expired_files: usize,
    pub unreadable_files: usize,
}

#[derive(Debug, Clone)]
pub struct FileStore {
    cache_dir: PathBuf,
}

impl FileStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{:x}.json", md5::compute(key.as_bytes())))
    }

    async fn read_entry(path: &Path) -> Result<FileEntry, StoreError> {
        let content = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    async fn json_files(&self) -> Result<Vec<PathBuf>, StoreError> {
        let mut files = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.cache_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(files),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                files.push(path);
            }
        }
        Ok(files)
    }

    /// Remove expired entries, returning how many were deleted
    pub async fn cleanup_expired(&self) -> Result<usize, StoreError> {
        let mut removed = 0;
        for path in self.json_files().await? {
            if let Ok(entry) = Self::read_entry(&path).await {
                if entry.is_expired() && tokio::fs::remove_file(&path).await.is_ok() {
                    removed += 1;
                    debug!("🗑️ Removed expired entry {}", entry.key);
                }
            }
        }

        if removed > 0 {
            info!("🧹 Cleaned up {} expired cache files", removed);
        }
        Ok(removed)
    }

    pub async fn stats(&self) -> Result<FileStoreStats, StoreError> {
        let mut stats = FileStoreStats::default();
        for path in self.json_files().await? {
            stats.total_files += 1;
            match Self::read_entry(&path).await {
                Ok(entry) if entry.is_expired() => stats.expired_files += 1,
                Ok(_) => stats.valid_files += 1,
                Err(_) => stats.unreadable_files += 1,
            }
        }
        Ok(stats)
    }

    /// All readable entries, newest first
    pub async fn list_entries(&self) -> Result<Vec<StoredEntryInfo>, StoreError> {
        let mut listed = Vec::new();
        for path in self.json_files().await? {
            match Self::read_entry(&path).await {
                Ok(entry) => listed.push(StoredEntryInfo {
                    age_seconds: entry.age_seconds(),
                    is_valid: !entry.is_expired(),
                    size_bytes: entry.value.len(),
                    stored_at: entry.stored_at,
                    key: entry.key,
                }),
                Err(e) => warn!("Skipping unreadable cache file {}: {}", path.display(), e),
            }
        }

        listed.sort_by(|a, b| b.stored_at.cmp(&a.stored_at));
        Ok(listed)
    }
}

#[async_trait]
impl DurableStore for FileStore {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.entry_path(key);
        let entry = match Self::read_entry(&path).await {
            Ok(entry) => entry,
            Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        if entry.key != key {
            warn!("Cache file {} holds {} instead of {}", path.display(), entry.key, key);
            return Ok(None);
        }

        if entry.is_expired() {
            debug!("⏰ Cache expired for key: {}", key);
            let _ = tokio::fs::remove_file(&path).await;
            return Ok(None);
        }

        Ok(Some(entry.value))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.cache_dir).await?;

        let entry = FileEntry {
            key: key.to_string(),
            stored_at: Utc::now(),
            ttl_seconds: ttl.as_secs(),
            value: value.to_string(),
        };

        let path = self.entry_path(key);
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, serde_json::to_string_pretty(&entry)?).await?;
        tokio::fs::rename(&tmp_path, &path).await?;

        debug!("💾 Saved {} to {}", key, path.display());
        Ok(())
    }
}
