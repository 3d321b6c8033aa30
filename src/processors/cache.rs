// assetprep/src/processors/cache.rs
//! Record of images already optimised, persisted next to the assets.
//!
//! ```json
//! {
//!   "/repo/assets/img/photo.jpg": {
//!     "hash": "183421_1700000000.123456",
//!     "optimized_at": "1700000000.123456"
//!   }
//! }
//! ```

use crate::core::Result;
use crate::utils::{file_hash, mtime_string};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const CACHE_FILE_NAME: &str = ".image_optimization_cache.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// `<size>_<mtime>` of the file as last written.
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub optimized_at: String,
}

impl CacheEntry {
    /// Snapshot of `path` as it is on disk now.
    pub fn for_file(path: &Path) -> Result<Self> {
        Ok(Self {
            hash: file_hash(path)?,
            optimized_at: mtime_string(path)?,
        })
    }
}

/// Path-keyed cache, loaded once at the start of a run and saved once at the
/// end. Entries for deleted files are never pruned.
#[derive(Debug, Default)]
pub struct OptimizationCache {
    path: PathBuf,
    entries: BTreeMap<String, CacheEntry>,
}

impl OptimizationCache {
    pub fn empty(assets_dir: &Path) -> Self {
        Self {
            path: assets_dir.join(CACHE_FILE_NAME),
            entries: BTreeMap::new(),
        }
    }

    /// Never fails: a missing or unparsable cache file is an empty cache.
    pub fn load(assets_dir: &Path) -> Self {
        let mut cache = Self::empty(assets_dir);

        let content = match std::fs::read_to_string(&cache.path) {
            Ok(content) => content,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("Cannot read {}: {}", cache.path.display(), e);
                }
                return cache;
            }
        };

        match serde_json::from_str(&content) {
            Ok(entries) => cache.entries = entries,
            Err(e) => log::debug!("Discarding unreadable cache {}: {}", cache.path.display(), e),
        }

        log::debug!("Loaded {} cache entries", cache.entries.len());
        cache
    }

    /// Overwrites the cache file with the current entries.
    pub fn save(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn key(image: &Path) -> String {
        image.to_string_lossy().into_owned()
    }

    pub fn get(&self, image: &Path) -> Option<&CacheEntry> {
        self.entries.get(&Self::key(image))
    }

    pub fn contains(&self, image: &Path) -> bool {
        self.entries.contains_key(&Self::key(image))
    }

    /// True when the entry for `image` carries exactly `hash`.
    pub fn matches(&self, image: &Path, hash: &str) -> bool {
        self.get(image).is_some_and(|entry| entry.hash == hash)
    }

    pub fn insert(&mut self, image: &Path, entry: CacheEntry) {
        self.entries.insert(Self::key(image), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn file_path(&self) -> &Path {
        &self.path
    }
}
