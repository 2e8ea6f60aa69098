//! LRU cache of build results.
//!
//! A build is a pure function of its dataset and policy, so a result can
//! be reused whenever both match.
//!
//! ## Cache Key Design
//!
//! The key is an xxh64 digest over:
//! - canonical bytes of the dataset
//! - the policy parameter hash
//! - the output schema version
//!
//! Any change to the records, a spacing constant, the lineage rule or the
//! pinned pivot therefore results in a miss and a full build.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::RwLock;
use xxhash_rust::xxh64::Xxh64;

use crate::builder::{BuildError, FamilyGraphBuilder};
use crate::canonical::to_canonical_bytes;
use crate::policy::LayoutPolicy;
use crate::types::{FamilyDataset, FamilyGraph};
use crate::FAMILY_GRAPH_SCHEMA_VERSION;

/// Fallback capacity when a zero size is configured.
const FALLBACK_CAPACITY: NonZeroUsize = match NonZeroUsize::new(256) {
    Some(n) => n,
    None => unreachable!(),
};

/// Configuration for the build cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries in the cache.
    pub max_entries: usize,
    /// Whether to enable the cache.
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 256,
            enabled: true,
        }
    }
}

/// Cache key for one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct BuildCacheKey(u64);

impl BuildCacheKey {
    fn compute(dataset: &FamilyDataset, policy_params_hash: &str) -> Self {
        let mut hasher = Xxh64::new(0);
        hasher.update(&to_canonical_bytes(dataset));
        hasher.update(b"|");
        hasher.update(policy_params_hash.as_bytes());
        hasher.update(b"|");
        hasher.update(FAMILY_GRAPH_SCHEMA_VERSION.as_bytes());
        Self(hasher.digest())
    }
}

/// Result of a cached build.
#[derive(Debug, Clone)]
pub struct CachedBuild {
    /// The graph.
    pub graph: Arc<FamilyGraph>,
    /// Whether the result came from the cache.
    pub cache_hit: bool,
}

/// Builds through an LRU cache.
#[derive(Debug)]
pub struct BuildCache {
    cache: Option<RwLock<LruCache<BuildCacheKey, Arc<FamilyGraph>>>>,
}

impl BuildCache {
    /// Create a cache with the given configuration.
    pub fn new(config: CacheConfig) -> Self {
        let cache = config.enabled.then(|| {
            let size = NonZeroUsize::new(config.max_entries).unwrap_or(FALLBACK_CAPACITY);
            RwLock::new(LruCache::new(size))
        });
        Self { cache }
    }

    /// Build with `policy`, reusing a cached result when possible.
    ///
    /// Errors are never cached.
    pub fn build(&self, dataset: &FamilyDataset, policy: &LayoutPolicy) -> Result<CachedBuild, BuildError> {
        let key = BuildCacheKey::compute(dataset, &policy.params_hash());

        if let Some(cache) = &self.cache {
            if let Some(graph) = cache.read().peek(&key) {
                return Ok(CachedBuild {
                    graph: Arc::clone(graph),
                    cache_hit: true,
                });
            }
        }

        let graph = Arc::new(FamilyGraphBuilder::new(policy.clone()).build(dataset)?);

        if let Some(cache) = &self.cache {
            cache.write().put(key, Arc::clone(&graph));
        }

        Ok(CachedBuild {
            graph,
            cache_hit: false,
        })
    }

    /// Get cache statistics.
    ///
    /// Returns `None` if caching is disabled.
    pub fn stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|cache| {
            let cache = cache.read();
            CacheStats {
                len: cache.len(),
                cap: cache.cap().get(),
            }
        })
    }

    /// Drop every cached result.
    pub fn clear(&self) {
        if let Some(cache) = &self.cache {
            cache.write().clear();
        }
    }
}

impl Default for BuildCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    /// Current number of entries in the cache.
    pub len: usize,
    /// Maximum capacity of the cache.
    pub cap: usize,
}
