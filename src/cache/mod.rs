//! Kernel value cache
//!
//! LRU cache for kernel matrix entries so repeated K(i, j) lookups during
//! SMO do not re-evaluate the kernel. The matrix is symmetric, so entries
//! are keyed on the unordered index pair.

use lru::LruCache;
use std::num::NonZeroUsize;

/// Unordered index pair, stored with i <= j
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PairKey {
    i: usize,
    j: usize,
}

impl PairKey {
    fn new(i: usize, j: usize) -> Self {
        if i <= j {
            Self { i, j }
        } else {
            Self { i: j, j: i }
        }
    }
}

/// LRU cache for kernel matrix values
pub struct KernelCache {
    entries: LruCache<PairKey, f64>,
    hits: u64,
    misses: u64,
}

impl KernelCache {
    /// Create a cache holding at most `capacity` entries (minimum one)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Create a cache sized from a memory budget in bytes
    pub fn with_memory_limit(memory_bytes: usize) -> Self {
        // key + value + list overhead
        Self::new(memory_bytes / 32)
    }

    /// Look up K(i, j), counting the hit or miss
    pub fn get(&mut self, i: usize, j: usize) -> Option<f64> {
        match self.entries.get(&PairKey::new(i, j)) {
            Some(&value) => {
                self.hits += 1;
                Some(value)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Store K(i, j)
    pub fn put(&mut self, i: usize, j: usize, value: f64) {
        self.entries.put(PairKey::new(i, j), value);
    }

    /// Return the cached value or compute, store and return it
    ///
    /// Errors from `compute` are returned as-is and nothing is stored.
    pub fn get_or_try_insert<E>(
        &mut self,
        i: usize,
        j: usize,
        compute: impl FnOnce() -> Result<f64, E>,
    ) -> Result<f64, E> {
        if let Some(value) = self.get(i, j) {
            return Ok(value);
        }
        let value = compute()?;
        self.put(i, j, value);
        Ok(value)
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            capacity: self.entries.cap().get(),
            size: self.entries.len(),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub capacity: usize,
    pub size: usize,
}
