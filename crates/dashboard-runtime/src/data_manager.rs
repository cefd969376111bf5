//! File-identity cache for loaded datasets.
//!
//! Wraps [`load_dataset`] with a cache keyed by path. Each entry remembers
//! the file's size and modification time when it was read; a lookup whose
//! file identity no longer matches reloads transparently. Callers can also
//! drop entries by hand with [`DatasetCache::invalidate`].
//!
//! Loading is never retried: an unreadable or malformed file is reported
//! immediately and the previous entry, if any, is discarded.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use dashboard_core::error::{DashboardError, Result};
use dashboard_core::schema::SchemaConfig;
use dashboard_data::normalizer::NormalizedDataset;
use dashboard_data::reader::load_dataset;

// ── FileIdentity ──────────────────────────────────────────────────────────────

/// What the cache compares to decide whether a file changed on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileIdentity {
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl FileIdentity {
    /// Stat `path`.
    pub fn of(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path).map_err(|source| DashboardError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

// ── DatasetCache ──────────────────────────────────────────────────────────────

struct CacheEntry {
    identity: FileIdentity,
    data: NormalizedDataset,
}

/// Path-keyed cache of normalized datasets.
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use dashboard_core::schema::SchemaConfig;
/// use dashboard_runtime::data_manager::DatasetCache;
///
/// let mut cache = DatasetCache::new();
/// let data = cache.get(Path::new("Data.csv"), &SchemaConfig::default()).unwrap();
/// println!("{} rows", data.dataset.len());
/// ```
#[derive(Default)]
pub struct DatasetCache {
    entries: HashMap<PathBuf, CacheEntry>,
    /// Number of loads from disk since creation.
    loads: usize,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Return the dataset for `path`, reading it only when not cached or when
    /// the file changed since it was cached.
    ///
    /// The entry is tied to `schema` only through the caller: invalidate
    /// before switching schemas.
    pub fn get(&mut self, path: &Path, schema: &SchemaConfig) -> Result<&NormalizedDataset> {
        let identity = match FileIdentity::of(path) {
            Ok(identity) => identity,
            Err(e) => {
                self.entries.remove(path);
                return Err(e);
            }
        };

        let entry = match self.entries.entry(path.to_path_buf()) {
            Entry::Occupied(o) if o.get().identity == identity => {
                tracing::debug!("returning cached dataset for {}", path.display());
                o.into_mut()
            }
            Entry::Occupied(o) => {
                tracing::info!("{} changed on disk; reloading", path.display());
                let fresh = match load_dataset(path, schema) {
                    Ok(data) => data,
                    Err(e) => {
                        o.remove();
                        return Err(e);
                    }
                };
                self.loads += 1;
                let slot = o.into_mut();
                *slot = CacheEntry {
                    identity,
                    data: fresh,
                };
                slot
            }
            Entry::Vacant(v) => {
                let fresh = load_dataset(path, schema)?;
                self.loads += 1;
                v.insert(CacheEntry {
                    identity,
                    data: fresh,
                })
            }
        };

        Ok(&entry.data)
    }

    /// Drop the entry for `path`, forcing the next [`get`](Self::get) to read.
    pub fn invalidate(&mut self, path: &Path) {
        if self.entries.remove(path).is_some() {
            tracing::debug!("cache invalidated for {}", path.display());
        }
    }

    /// Reads from disk since creation; cache hits do not count.
    pub fn load_count(&self) -> usize {
        self.loads
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
