//! Plan cache for repeated CLI runs.
//!
//! Planning itself is cheap; decoding and analysing a large photo is not.
//! The cache lets `plan` skip both when the same image is planned for the
//! same device under the same policy again.
//!
//! ## Cache keys
//!
//! Entries are **content-addressed** by [`PlanKey`]:
//!
//! - **`image_hash`**: SHA-256 of the source file bytes ([`hash_file`]), or
//!   of the dimensions plus RGBA pixels for in-memory sources
//!   ([`hash_source`]). Renaming a file does not invalidate its plans.
//! - **`device_id`** and **`strategy`**: which plan was asked for.
//! - **`policy_hash`**: SHA-256 of the analysis, placement and tone policies
//!   and the built frame spec ([`hash_policy`]). Retuning any threshold or
//!   editing the device entry changes the hash, so old plans never leak into
//!   a new configuration.
//!
//! ## Storage
//!
//! The cache is a JSON file at `<dir>/.plan-cache.json`. A missing file, a
//! version mismatch, or an unparseable file all load as an empty cache.
//!
//! ## Bypassing the cache
//!
//! Pass `--no-cache` to `plan` to start from an empty cache. The file is
//! still rewritten with the fresh plans.

use crate::config::EngineConfig;
use crate::frame::FrameSpec;
use crate::imaging::PixelSource;
use crate::types::{OptimizedConfig, Strategy};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the cache file within the cache directory.
const CACHE_FILENAME: &str = ".plan-cache.json";

/// Version of the cache file format. Bump this to invalidate all
/// existing caches when the format or key computation changes.
const CACHE_VERSION: u32 = 1;

/// Everything a cached plan depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlanKey {
    pub image_hash: String,
    pub device_id: String,
    pub strategy: Strategy,
    pub policy_hash: String,
}

impl PlanKey {
    fn content_key(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.image_hash, self.device_id, self.strategy, self.policy_hash
        )
    }
}

/// On-disk plan cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanCache {
    pub version: u32,
    entries: HashMap<String, OptimizedConfig>,
    #[serde(skip)]
    stats: CacheStats,
}

impl PlanCache {
    /// Create an empty cache (used for `--no-cache` or the first run).
    pub fn empty() -> Self {
        Self {
            version: CACHE_VERSION,
            entries: HashMap::new(),
            stats: CacheStats::default(),
        }
    }

    /// Load from `dir`. Returns an empty cache if the file doesn't exist or
    /// can't be parsed (version mismatch, corruption).
    pub fn load(dir: &Path) -> Self {
        let path = cache_path(dir);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(_) => return Self::empty(),
        };
        let cache: Self = match serde_json::from_str(&content) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("ignoring unreadable plan cache {}: {e}", path.display());
                return Self::empty();
            }
        };
        if cache.version != CACHE_VERSION {
            log::debug!(
                "plan cache version {} != {CACHE_VERSION}, starting empty",
                cache.version
            );
            return Self::empty();
        }
        cache
    }

    /// Save to `dir`.
    pub fn save(&self, dir: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(cache_path(dir), json)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &PlanKey) -> Option<&OptimizedConfig> {
        self.entries.get(&key.content_key())
    }

    pub fn insert(&mut self, key: &PlanKey, plan: OptimizedConfig) {
        self.entries.insert(key.content_key(), plan);
    }

    /// Return the cached plan for `key`, or compute, store and return it.
    ///
    /// `plan` may fail (typically while decoding the image); failures are
    /// not cached.
    pub fn get_or_plan<E>(
        &mut self,
        key: &PlanKey,
        plan: impl FnOnce() -> Result<OptimizedConfig, E>,
    ) -> Result<OptimizedConfig, E> {
        let content_key = key.content_key();
        if let Some(hit) = self.entries.get(&content_key) {
            self.stats.hits += 1;
            log::debug!("plan cache hit for {} / {}", key.device_id, key.strategy);
            return Ok(hit.clone());
        }
        self.stats.misses += 1;
        let fresh = plan()?;
        self.entries.insert(content_key, fresh.clone());
        Ok(fresh)
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

/// SHA-256 hash of a file's contents, returned as a hex string.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(hash_bytes(&bytes))
}

/// SHA-256 hash of an encoded image held in memory.
pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// SHA-256 hash of a pixel source's dimensions and RGBA data.
pub fn hash_source(source: &dyn PixelSource) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"rgba\0");
    hasher.update(source.width().to_le_bytes());
    hasher.update(source.height().to_le_bytes());
    for y in 0..source.height() {
        for x in 0..source.width() {
            hasher.update(source.rgba(x, y));
        }
    }
    format!("{:x}", hasher.finalize())
}

/// SHA-256 hash of every setting a plan for `frame` depends on.
pub fn hash_policy(config: &EngineConfig, frame: &FrameSpec) -> Result<String, serde_json::Error> {
    let mut hasher = Sha256::new();
    hasher.update(b"policy\0");
    hasher.update(serde_json::to_vec(&config.analysis)?);
    hasher.update(serde_json::to_vec(&config.placement)?);
    hasher.update(serde_json::to_vec(&config.tone)?);
    hasher.update(serde_json::to_vec(frame)?);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Summary of cache performance for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} planned ({} total)",
                self.hits,
                self.misses,
                self.total()
            )
        } else {
            write!(f, "{} planned", self.misses)
        }
    }
}

/// Resolve the cache file path for a directory.
pub fn cache_path(dir: &Path) -> PathBuf {
    dir.join(CACHE_FILENAME)
}
