use std::fmt;
use std::num::NonZeroUsize;

use ahash::RandomState;
use lru::LruCache;

pub const DEFAULT_CACHE_SIZE: usize = 1_000_000;

/// Bounded set of canonical position keys with strict least-recently-used
/// eviction. A hit refreshes the key to most-recent.
pub struct TranspositionCache {
    entries: LruCache<String, (), RandomState>,
}

impl fmt::Debug for TranspositionCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranspositionCache")
            .field("len", &self.entries.len())
            .field("cap", &self.entries.cap())
            .finish()
    }
}

impl TranspositionCache {
    pub fn new(max_size: usize) -> Self {
        let capacity = NonZeroUsize::new(max_size).unwrap_or(NonZeroUsize::MIN);
        TranspositionCache {
            entries: LruCache::with_hasher(capacity, RandomState::new()),
        }
    }

    #[inline]
    pub fn has(&mut self, key: &str) -> bool {
        self.entries.get(key).is_some()
    }

    #[inline]
    pub fn add(&mut self, key: String) {
        self.entries.put(key, ());
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TranspositionCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_is_idempotent() {
        let mut cache = TranspositionCache::new(4);
        cache.add("a".into());
        assert!(cache.has("a"));
        assert!(cache.has("a"));
        assert!(!cache.has("b"));
    }

    #[test]
    fn test_eviction_after_capacity_inserts() {
        let mut cache = TranspositionCache::new(3);
        cache.add("k".into());
        for i in 0..3 {
            cache.add(format!("filler{i}"));
        }
        assert!(!cache.has("k"));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_hit_refreshes_lru_order() {
        let mut cache = TranspositionCache::new(2);
        cache.add("a".into());
        cache.add("b".into());
        assert!(cache.has("a"));
        cache.add("c".into());
        assert!(!cache.has("b"));
        assert!(cache.has("a"));
        assert!(cache.has("c"));
    }

    #[test]
    fn test_re_add_refreshes() {
        let mut cache = TranspositionCache::new(2);
        cache.add("a".into());
        cache.add("b".into());
        cache.add("a".into());
        cache.add("c".into());
        assert!(cache.has("a"));
        assert!(!cache.has("b"));
        assert_eq!(cache.len(), 2);
    }
}
