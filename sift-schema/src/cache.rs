//! Attribute path caching.
//!
//! Resolving `department.name` against a schema walks descriptors one hop at
//! a time. Schemas are static after startup, so resolved paths can be shared
//! by every caller.
//!
//! # Examples
//!
//! ```rust
//! use sift_schema::{EntityDescriptor, PathCache, ScalarType, Schema};
//!
//! let schema = Schema::builder()
//!     .entity(EntityDescriptor::entity("Employee").scalar("name", ScalarType::String))
//!     .build()
//!     .unwrap();
//!
//! let cache = PathCache::new();
//! let first = cache.get_or_resolve(&schema, "Employee", "name").unwrap();
//! let second = cache.get_or_resolve(&schema, "Employee", "name").unwrap();
//! assert!(std::sync::Arc::ptr_eq(&first, &second));
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use smol_str::SmolStr;

use crate::error::SchemaResult;
use crate::path::AttributePath;
use crate::provider::SchemaProvider;

/// Paths kept by [`PathCache::new`].
pub const DEFAULT_MAX_PATHS: usize = 1024;

type PathKey = (SmolStr, SmolStr);

#[derive(Debug)]
struct CachedPath {
    path: Arc<AttributePath>,
    uses: AtomicU64,
}

/// A bounded cache of resolved attribute paths keyed by `(root type, dotted path)`.
///
/// Dotted paths usually come from request parameters, and a schema with a
/// relationship cycle admits unboundedly many of them. Once `max_size`
/// paths are cached, inserting a new one evicts the least used quarter.
///
/// Hits only take the read lock; counters are atomic.
#[derive(Debug)]
pub struct PathCache {
    max_size: usize,
    paths: RwLock<HashMap<PathKey, CachedPath>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

/// Statistics for the path cache.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of paths evicted to stay within the size limit.
    pub evictions: u64,
    /// Number of paths currently cached.
    pub cached_count: usize,
}

impl CacheStats {
    /// Get the cache hit rate.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl Default for PathCache {
    fn default() -> Self {
        Self::with_max_size(DEFAULT_MAX_PATHS)
    }
}

impl PathCache {
    /// Create a cache holding up to [`DEFAULT_MAX_PATHS`] paths.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache holding up to `max_size` paths.
    pub fn with_max_size(max_size: usize) -> Self {
        let max_size = max_size.max(1);
        Self {
            max_size,
            paths: RwLock::new(HashMap::with_capacity(max_size.min(DEFAULT_MAX_PATHS))),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Get a cached path or resolve and cache it.
    ///
    /// Resolution failures are not cached.
    pub fn get_or_resolve<P: SchemaProvider + ?Sized>(
        &self,
        provider: &P,
        root: &str,
        dotted: &str,
    ) -> SchemaResult<Arc<AttributePath>> {
        let key = (SmolStr::new(root), SmolStr::new(dotted));

        if let Some(cached) = self.paths.read().get(&key) {
            cached.uses.fetch_add(1, Ordering::Relaxed);
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(&cached.path));
        }

        let path = Arc::new(provider.resolve_path(root, dotted)?);
        self.misses.fetch_add(1, Ordering::Relaxed);

        let mut paths = self.paths.write();
        if paths.len() >= self.max_size && !paths.contains_key(&key) {
            self.evict(&mut paths);
        }
        let path = Arc::clone(
            &paths
                .entry(key)
                .or_insert(CachedPath {
                    path,
                    uses: AtomicU64::new(0),
                })
                .path,
        );
        tracing::trace!(root, path = dotted, "cached attribute path");

        Ok(path)
    }

    /// Drop the least used quarter of the cache, at least one entry.
    fn evict(&self, paths: &mut HashMap<PathKey, CachedPath>) {
        let count = (paths.len() / 4).max(1);
        let mut by_use: Vec<(u64, PathKey)> = paths
            .iter()
            .map(|(key, cached)| (cached.uses.load(Ordering::Relaxed), key.clone()))
            .collect();
        by_use.sort_unstable_by_key(|(uses, _)| *uses);

        for (_, key) in by_use.into_iter().take(count) {
            paths.remove(&key);
        }
        self.evictions.fetch_add(count as u64, Ordering::Relaxed);
        tracing::debug!(evicted = count, max_size = self.max_size, "path cache full");
    }

    /// Check if a path is cached.
    pub fn contains(&self, root: &str, dotted: &str) -> bool {
        self.paths
            .read()
            .contains_key(&(SmolStr::new(root), SmolStr::new(dotted)))
    }

    /// Clear the cache.
    pub fn clear(&self) {
        self.paths.write().clear();
    }

    /// Maximum number of cached paths.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            cached_count: self.paths.read().len(),
        }
    }

    /// Get the number of cached paths.
    pub fn len(&self) -> usize {
        self.paths.read().len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.paths.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{EntityDescriptor, ScalarType, Schema};

    fn schema() -> Schema {
        Schema::builder()
            .entity(
                EntityDescriptor::entity("Employee")
                    .scalar("name", ScalarType::String)
                    .to_one("department", "Department"),
            )
            .entity(
                EntityDescriptor::entity("Department")
                    .scalar("name", ScalarType::String)
                    .to_one("manager", "Employee"),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_cache_hit_and_miss() {
        let schema = schema();
        let cache = PathCache::new();

        let a = cache.get_or_resolve(&schema, "Employee", "department.name").unwrap();
        let b = cache.get_or_resolve(&schema, "Employee", "department.name").unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.cached_count, 1);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_failures_are_not_cached() {
        let schema = schema();
        let cache = PathCache::new();
        assert!(cache.get_or_resolve(&schema, "Employee", "salary").is_err());
        assert!(cache.is_empty());
        assert!(!cache.contains("Employee", "salary"));
    }

    #[test]
    fn test_clear() {
        let schema = schema();
        let cache = PathCache::with_max_size(4);
        cache.get_or_resolve(&schema, "Employee", "name").unwrap();
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_size_is_bounded() {
        let schema = schema();
        let cache = PathCache::with_max_size(8);
        let hot = cache.get_or_resolve(&schema, "Employee", "name").unwrap();
        cache.get_or_resolve(&schema, "Employee", "name").unwrap();

        let mut dotted = String::from("department");
        for _ in 0..50 {
            dotted.push_str(".manager.department");
            cache
                .get_or_resolve(&schema, "Employee", &format!("{}.name", dotted))
                .unwrap();
            assert!(cache.len() <= 8);
        }

        let stats = cache.stats();
        assert_eq!(stats.misses, 51);
        assert!(stats.evictions >= 43);
        assert!(cache.contains("Employee", "name"));
        let again = cache.get_or_resolve(&schema, "Employee", "name").unwrap();
        assert!(Arc::ptr_eq(&hot, &again));
    }

    #[test]
    fn test_concurrent_reads() {
        let schema = schema();
        let cache = PathCache::new();
        cache.get_or_resolve(&schema, "Employee", "name").unwrap();

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..100 {
                        let path = cache.get_or_resolve(&schema, "Employee", "name").unwrap();
                        assert_eq!(path.len(), 1);
                    }
                });
            }
        });
        assert_eq!(cache.stats().hits, 400);
    }
}
