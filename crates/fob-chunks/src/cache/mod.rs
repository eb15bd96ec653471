//! Content-hash cache for generated fragments and the chunks manifest.
//!
//! Every cached artifact is stored under a key (`css|<entry>`, `js|<entry>`
//! or `chunks-manifest.json`) together with the [`ETag`] of the inputs it was
//! computed from. A lookup hits only when the requested ETag equals the stored
//! one; there is no TTL and no explicit invalidation.
//!
//! # Backends
//!
//! - [`MemoryCache`]: `DashMap` slots, lives as long as the process (watch mode)
//! - [`PersistentCache`]: a single redb file, survives across builds
//!
//! Both implement [`ContentCache`], which is all the pipeline depends on.

mod memory;
mod storage;

pub use memory::{CacheStats, MemoryCache};
pub use storage::{CACHE_FORMAT_VERSION, PersistentCache};

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::compilation::RawSource;
use crate::emit::EntryCache;

/// Opaque fingerprint of one or more asset contents.
///
/// Leaf fingerprints are BLAKE3 hex digests. [`ETag::merge`] joins two
/// fingerprints with `|`, which is associative but order-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ETag(String);

impl ETag {
    /// Fingerprint of a single source.
    pub fn of(source: &RawSource) -> Self {
        Self(blake3::hash(source.as_bytes()).to_hex().to_string())
    }

    /// Combine two fingerprints into a new one.
    pub fn merge(&self, other: &ETag) -> Self {
        Self(format!("{}|{}", self.0, other.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ETag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Left-fold fingerprints with [`ContentCache::merge_etags`].
///
/// A single fingerprint is returned as-is, without calling `merge_etags`.
/// Returns `None` for an empty input.
pub fn fold_etags<I>(cache: &dyn ContentCache, etags: I) -> Option<ETag>
where
    I: IntoIterator<Item = ETag>,
{
    etags
        .into_iter()
        .reduce(|acc, next| cache.merge_etags(&acc, &next))
}

/// A value stored in the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CachedItem {
    /// An emission-ready fragment for one `(entry, kind)` pair.
    Entry(EntryCache),
    /// The serialized chunks manifest.
    Manifest(RawSource),
}

/// The cache interface the pipeline talks to.
///
/// One slot per key. `get` returns the stored item only when its ETag equals
/// `etag`; `store` replaces whatever the slot held before.
#[async_trait]
pub trait ContentCache: Send + Sync {
    /// Fingerprint of one source.
    fn etag(&self, source: &RawSource) -> ETag {
        ETag::of(source)
    }

    /// Combine two fingerprints.
    fn merge_etags(&self, a: &ETag, b: &ETag) -> ETag {
        a.merge(b)
    }

    async fn get(&self, key: &str, etag: &ETag) -> CacheResult<Option<CachedItem>>;

    async fn store(&self, key: &str, etag: &ETag, item: CachedItem) -> CacheResult<()>;
}

/// Error types for cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Cache database error.
    #[error("cache database error: {0}")]
    Database(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Cache version mismatch.
    #[error("cache version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    /// A blocking cache task panicked or was cancelled.
    #[error("cache task failed: {0}")]
    Task(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Configuration for the persistent chunks cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory holding `chunks-cache.redb`.
    pub dir: PathBuf,

    /// Skip cache reads. Results are still written, so the next build is warm.
    pub force_rebuild: bool,

    /// Options fingerprint rows are written under. Rows from another scope
    /// read as misses. See [`ChunksPluginOptions::fingerprint`].
    ///
    /// [`ChunksPluginOptions::fingerprint`]: crate::ChunksPluginOptions::fingerprint
    pub scope: String,
}

impl CacheConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            force_rebuild: false,
            scope: String::new(),
        }
    }

    pub fn with_force_rebuild(mut self, force: bool) -> Self {
        self.force_rebuild = force;
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Check if force rebuild is requested, either here or via `FOB_FORCE_REBUILD`.
    pub fn should_force_rebuild(&self) -> bool {
        self.force_rebuild || std::env::var_os("FOB_FORCE_REBUILD").is_some()
    }

    /// Open the persistent cache described by this config.
    pub fn open(&self) -> CacheResult<PersistentCache> {
        PersistentCache::open(self)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new(".cache/fob-chunks")
    }
}
