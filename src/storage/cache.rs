// Load cache implementation
// Author: Gabriel Demetrios Lafis

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant, SystemTime};

use log::debug;

use crate::data::{DataError, DatasetLoader, LoadReport};
use super::StorageError;

/// Identity of a source file at one point in time
#[derive(Debug, Clone, PartialEq, Eq)]
struct Fingerprint {
    modified: Option<SystemTime>,
    len: u64,
}

/// Canonical source path plus the delimiter it was parsed with
type CacheKey = (PathBuf, u8);

/// Cache entry with expiration
struct CacheEntry {
    fingerprint: Fingerprint,
    report: Arc<LoadReport>,
    sequence: u64,
    expires_at: Option<Instant>,
}

/// Hit and miss counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Memoizes load results per source file.
///
/// Entries are keyed by canonical path and loader delimiter, and are only
/// reused while the file's modification time and length are unchanged. Once `capacity` entries are
/// held the oldest one is evicted.
pub struct LoadCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    capacity: usize,
    default_ttl: Option<Duration>,
    hits: AtomicU64,
    misses: AtomicU64,
    sequence: AtomicU64,
}

impl LoadCache {
    /// Create a new cache holding at most `capacity` sources
    pub fn new(capacity: usize) -> Self {
        LoadCache {
            entries: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
            default_ttl: None,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            sequence: AtomicU64::new(0),
        }
    }

    /// Set the time-to-live for cache entries
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Return the cached load of `path`, loading it on a miss
    pub fn get_or_load<P: AsRef<Path>>(
        &self,
        path: P,
        loader: &DatasetLoader,
    ) -> Result<Arc<LoadReport>, StorageError> {
        let (path, fingerprint) = identify(path.as_ref())?;
        let key = (path, loader.delimiter());

        {
            let entries = self.entries.read().map_err(|_| {
                StorageError::Other("Failed to acquire read lock".to_string())
            })?;

            if let Some(entry) = entries.get(&key) {
                let fresh = entry.expires_at.map_or(true, |expires| expires > Instant::now());
                if fresh && entry.fingerprint == fingerprint {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    debug!("Cache hit for '{}'", key.0.display());
                    return Ok(entry.report.clone());
                }
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!("Cache miss for '{}'", key.0.display());
        let report = Arc::new(loader.load(&key.0)?);

        let mut entries = self.entries.write().map_err(|_| {
            StorageError::Other("Failed to acquire write lock".to_string())
        })?;

        entries.remove(&key);
        while entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.sequence)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    entries.remove(&key);
                }
                None => break,
            }
        }

        entries.insert(key, CacheEntry {
            fingerprint,
            report: report.clone(),
            sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
            expires_at: self.default_ttl.map(|ttl| Instant::now() + ttl),
        });

        Ok(report)
    }

    /// Drop every entry for one source, whatever delimiter it was loaded with
    pub fn invalidate<P: AsRef<Path>>(&self, path: P) -> Result<bool, StorageError> {
        let path = fs::canonicalize(path.as_ref()).unwrap_or_else(|_| path.as_ref().to_path_buf());

        let mut entries = self.entries.write().map_err(|_| {
            StorageError::Other("Failed to acquire write lock".to_string())
        })?;

        let before = entries.len();
        entries.retain(|(cached, _), _| *cached != path);
        Ok(entries.len() < before)
    }

    /// Clear expired entries from the cache
    pub fn clear_expired(&self) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(|_| {
            StorageError::Other("Failed to acquire write lock".to_string())
        })?;

        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at.map_or(true, |expires| expires > now));

        Ok(())
    }

    /// Clear all entries from the cache
    pub fn clear_all(&self) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(|_| {
            StorageError::Other("Failed to acquire write lock".to_string())
        })?;

        entries.clear();
        Ok(())
    }

    /// Number of cached sources
    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    /// Check if nothing is cached
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hit and miss counts since creation
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

fn identify(path: &Path) -> Result<(PathBuf, Fingerprint), StorageError> {
    let not_found = |err: io::Error| match err.kind() {
        io::ErrorKind::NotFound => StorageError::DataError(DataError::SourceNotFound(path.display().to_string())),
        _ => StorageError::IoError(err),
    };

    let key = fs::canonicalize(path).map_err(not_found)?;
    let metadata = fs::metadata(&key).map_err(not_found)?;

    Ok((key, Fingerprint {
        modified: metadata.modified().ok(),
        len: metadata.len(),
    }))
}
