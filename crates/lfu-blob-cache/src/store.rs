//! File-based blob storage with an in-memory frequency index

use crate::config::{CacheConfig, ContentExtensions};
use crate::error::{CacheError, Result};
use crate::frequency::FrequencyIndex;
use crate::types::{CacheStats, FrequencyRecord};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// A capacity-bounded blob cache evicting the least frequently used keys
///
/// Every operation that touches the frequency index holds a single lock for
/// its whole duration, including the paired file operations, so an eviction
/// pass is never observed half done.
#[derive(Debug)]
pub struct CacheStore {
    /// Access counts for keys written or read during this process lifetime
    index: Mutex<FrequencyIndex>,
    /// Directory where cached blobs are stored, one file per key
    root: PathBuf,
    /// Maximum number of content files
    capacity: usize,
    content_extensions: ContentExtensions,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl CacheStore {
    /// Create a store, making sure the root directory exists
    ///
    /// Only an invalid configuration fails. If the directory cannot be
    /// created the store is still returned; reads will miss and writes will
    /// fail until the directory becomes available.
    pub async fn open(config: CacheConfig) -> Result<Self> {
        config.validate()?;

        if let Err(e) = fs::create_dir_all(&config.root).await {
            warn!(cache_dir = ?config.root, error = %e, "Failed to create cache directory");
        } else {
            info!(cache_dir = ?config.root, capacity = config.capacity, "Cache initialized");
        }

        Ok(Self {
            index: Mutex::new(FrequencyIndex::default()),
            root: config.root,
            capacity: config.capacity,
            content_extensions: config.content_extensions,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Read a blob, returning `None` if no file exists for `key`
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        validate_key(key)?;
        let path = self.root.join(key);

        let mut index = self.index.lock().await;
        match fs::read(&path).await {
            Ok(data) => {
                let access_count = index.touch(key);
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key, access_count, size = data.len(), "Cache hit");
                Ok(Some(data))
            }
            // A missing root degrades to a miss rather than a read failure.
            Err(e) if e.kind() != io::ErrorKind::NotFound && self.root_available().await => {
                Err(CacheError::Read {
                    key: key.to_string(),
                    source: e,
                })
            }
            Err(_) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(key, "Cache miss");
                Ok(None)
            }
        }
    }

    /// Store a blob, evicting the least frequently used keys first if the
    /// new entry would exceed capacity
    pub async fn set(&self, key: &str, data: &[u8]) -> Result<()> {
        validate_key(key)?;
        let path = self.root.join(key);

        let mut index = self.index.lock().await;

        let entries = self.count_entries().await;
        if entries + 1 > self.capacity {
            self.evict_least_frequent(&mut index).await;
        }

        // The record is only touched once the bytes are on disk.
        fs::write(&path, data).await.map_err(|e| CacheError::Write {
            key: key.to_string(),
            source: e,
        })?;

        let access_count = index.touch(key);
        debug!(key, access_count, size = data.len(), "Cached blob");

        Ok(())
    }

    /// Remove every file under the root and forget all access counts.
    /// Returns the number of files removed.
    pub async fn evict_all(&self) -> Result<usize> {
        let mut index = self.index.lock().await;

        // Records are only forgotten once the root has been listed.
        let mut dir = match fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                index.clear();
                return Ok(0);
            }
            Err(e) => return Err(self.directory_error(e)),
        };
        index.clear();

        let mut removed = 0;
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| self.directory_error(e))?
        {
            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }

            match fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) => {
                    warn!(path = ?entry.path(), error = %e, "Failed to remove cached file");
                }
            }
        }

        info!(removed, "Evicted whole cache");
        Ok(removed)
    }

    /// Total size of every file under the root, in kilobytes (1 kB = 1000 bytes)
    pub async fn total_disk_size(&self) -> Result<f64> {
        let bytes = self.total_disk_size_bytes().await?;
        Ok(bytes as f64 / 1000.0)
    }

    /// Total size of every file under the root, in bytes
    pub async fn total_disk_size_bytes(&self) -> Result<u64> {
        let mut dir = match fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(self.directory_error(e)),
        };

        let mut total = 0;
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| self.directory_error(e))?
        {
            if let Ok(metadata) = entry.metadata().await {
                if metadata.is_file() {
                    total += metadata.len();
                }
            }
        }

        Ok(total)
    }

    /// Number of content files under the root counted against capacity
    pub async fn entry_count(&self) -> usize {
        self.count_entries().await
    }

    /// Current access count for `key`, if it has been read or written since startup
    pub async fn access_count(&self, key: &str) -> Option<u64> {
        self.index.lock().await.get(key)
    }

    pub async fn frequency_records(&self) -> Vec<FrequencyRecord> {
        self.index.lock().await.records()
    }

    /// Get current cache statistics
    pub async fn stats(&self) -> CacheStats {
        let tracked_keys = self.index.lock().await.len();
        let total_size_kb = match self.total_disk_size().await {
            Ok(size) => size,
            Err(e) => {
                warn!(error = %e, "Failed to compute cache size");
                0.0
            }
        };

        CacheStats {
            entries: self.count_entries().await,
            tracked_keys,
            total_size_kb,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Delete every key sharing the lowest access count.
    ///
    /// Runs with the index lock held by the caller. A file that fails to
    /// delete does not stop the pass; its record is dropped either way.
    async fn evict_least_frequent(&self, index: &mut FrequencyIndex) -> usize {
        let victims = index.eviction_candidates();
        if victims.is_empty() {
            debug!(tracked = index.len(), "No eviction candidates, keeping all entries");
            return 0;
        }

        for key in &victims {
            match fs::remove_file(self.root.join(key)).await {
                Ok(()) => debug!(key = %key, "Evicted cache entry"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!(key = %key, error = %e, "Failed to delete evicted entry"),
            }
            index.remove(key);
        }

        self.evictions
            .fetch_add(victims.len() as u64, Ordering::Relaxed);
        info!(evicted = victims.len(), remaining = index.len(), "Eviction pass complete");
        victims.len()
    }

    async fn count_entries(&self) -> usize {
        let mut dir = match fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!(cache_dir = ?self.root, error = %e, "Failed to list cache directory");
                }
                return 0;
            }
        };

        let mut count = 0;
        loop {
            match dir.next_entry().await {
                Ok(Some(entry)) => {
                    let is_file = entry
                        .file_type()
                        .await
                        .map(|t| t.is_file())
                        .unwrap_or(false);
                    if is_file && self.content_extensions.matches(&entry.path()) {
                        count += 1;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(cache_dir = ?self.root, error = %e, "Failed to list cache directory");
                    break;
                }
            }
        }
        count
    }

    async fn root_available(&self) -> bool {
        fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    fn directory_error(&self, source: io::Error) -> CacheError {
        CacheError::Directory {
            path: self.root.clone(),
            source,
        }
    }
}

/// Keys name files directly under the root, so they may not be able to
/// address anything outside it
fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() || key == "." || key == ".." || key.contains(['/', '\\', '\0']) {
        return Err(CacheError::InvalidKey(key.to_string()));
    }
    Ok(())
}
