// SPDX-License-Identifier: MPL-2.0
//! Cache of decoded originals for re-cropping.
//!
//! Re-entering the crop step fetches the original from the asset host and
//! decodes it again. Recently reopened originals are kept here, keyed by
//! their asset reference, so repeated edits of the same image skip both.
//!
//! # Design
//!
//! - **LRU eviction**: least recently reopened originals are evicted first
//! - **Entry-bounded**: capacity comes from `[storage] reopen_cache_entries`
//! - **Reference-keyed**: references are content-addressed or unique per
//!   upload, so an entry never goes stale

use crate::domain::settings::AssetRef;
use image_rs::RgbaImage;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Statistics about reopen cache performance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReopenStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl ReopenStats {
    /// Returns the cache hit rate as a percentage (0.0 - 100.0).
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// LRU cache of decoded working copies of originals.
#[derive(Debug)]
pub struct ReopenCache {
    /// `None` when caching is disabled.
    cache: Option<LruCache<AssetRef, Arc<RgbaImage>>>,
    stats: ReopenStats,
}

impl ReopenCache {
    /// Creates a cache holding up to `capacity` originals. Zero disables it.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: NonZeroUsize::new(capacity).map(LruCache::new),
            stats: ReopenStats::default(),
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.cache.is_some()
    }

    /// Looks up an original. Updates LRU order on hit.
    pub fn get(&mut self, reference: &AssetRef) -> Option<Arc<RgbaImage>> {
        let found = self.cache.as_mut().and_then(|c| c.get(reference).cloned());
        if found.is_some() {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
        found
    }

    pub fn insert(&mut self, reference: AssetRef, image: Arc<RgbaImage>) {
        let Some(cache) = self.cache.as_mut() else {
            return;
        };
        if let Some((evicted, _)) = cache.push(reference.clone(), image) {
            // `push` also returns the old value when the key was already present.
            if evicted != reference {
                self.stats.evictions += 1;
            }
        }
        self.stats.entries = cache.len();
    }

    /// Drops an original, e.g. after its asset was deleted.
    pub fn remove(&mut self, reference: &AssetRef) {
        if let Some(cache) = self.cache.as_mut() {
            cache.pop(reference);
            self.stats.entries = cache.len();
        }
    }

    #[must_use]
    pub fn contains(&self, reference: &AssetRef) -> bool {
        self.cache.as_ref().is_some_and(|c| c.contains(reference))
    }

    #[must_use]
    pub fn stats(&self) -> ReopenStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> Arc<RgbaImage> {
        Arc::new(RgbaImage::new(2, 2))
    }

    #[test]
    fn hit_after_insert() {
        let mut cache = ReopenCache::new(2);
        let key = AssetRef::new("a");
        assert!(cache.get(&key).is_none());
        cache.insert(key.clone(), image());
        assert!(cache.get(&key).is_some());
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
        assert!((stats.hit_rate() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn least_recently_used_is_evicted() {
        let mut cache = ReopenCache::new(2);
        let (a, b, c) = (AssetRef::new("a"), AssetRef::new("b"), AssetRef::new("c"));
        cache.insert(a.clone(), image());
        cache.insert(b.clone(), image());
        let _ = cache.get(&a);
        cache.insert(c.clone(), image());
        assert!(cache.contains(&a));
        assert!(!cache.contains(&b));
        assert!(cache.contains(&c));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn reinserting_a_key_is_not_an_eviction() {
        let mut cache = ReopenCache::new(2);
        let key = AssetRef::new("a");
        cache.insert(key.clone(), image());
        cache.insert(key, image());
        assert_eq!(cache.stats().evictions, 0);
        assert_eq!(cache.stats().entries, 1);
    }

    #[test]
    fn zero_capacity_disables_caching() {
        let mut cache = ReopenCache::new(0);
        let key = AssetRef::new("a");
        cache.insert(key.clone(), image());
        assert!(!cache.is_enabled());
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn remove_forgets_entry() {
        let mut cache = ReopenCache::new(2);
        let key = AssetRef::new("a");
        cache.insert(key.clone(), image());
        cache.remove(&key);
        assert!(!cache.contains(&key));
        assert_eq!(cache.stats().entries, 0);
    }
}
