// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Local Query Cache
//!
//! In-process tier in front of the shared cache. Owned by one resolver,
//! bounded by max entries with oldest-eviction.
//!
//! # Flow
//!
//! ```text
//! resolve(category)
//!       │
//!       ▼
//! ┌─────────────────────────────┐
//! │  Local lookup (not drafts)  │
//! │  key = CacheKey             │
//! └─────────────────────────────┘
//!       │
//!       ├─→ Hit → return cached entry (may be a cached "no restriction")
//!       │
//!       └─→ Miss → shared cache → build, then insert here
//! ```

use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use super::CacheKey;
use crate::query::CachedQuery;

/// Bounded in-process cache of compiled category queries
pub struct LocalQueryCache {
    /// Cached results; `None` fragments are cached "no restriction"
    cache: DashMap<CacheKey, CachedQuery>,
    /// Insertion order for eviction (oldest first)
    order: Mutex<VecDeque<CacheKey>>,
    /// Maximum number of entries
    max_entries: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct LocalCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// Current number of entries
    pub entry_count: usize,
    /// Hit rate (0.0 - 1.0)
    pub hit_rate: f64,
}

impl LocalQueryCache {
    /// Create a cache holding at most `max_entries` results (0 disables it)
    pub fn new(max_entries: usize) -> Self {
        Self {
            cache: DashMap::new(),
            order: Mutex::new(VecDeque::new()),
            max_entries,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// `Some(entry)` on hit, where the entry may itself be "no restriction".
    pub fn get(&self, key: &CacheKey) -> Option<CachedQuery> {
        if let Some(entry) = self.cache.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Some(entry.value().clone());
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub fn insert(&self, key: CacheKey, value: CachedQuery) {
        if self.max_entries == 0 {
            return;
        }

        if !self.cache.contains_key(&key) {
            let mut order = self.order.lock();
            while self.cache.len() >= self.max_entries {
                match order.pop_front() {
                    Some(old_key) => {
                        if self.cache.remove(&old_key).is_some() {
                            self.evictions.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                    None => break,
                }
            }
            order.push_back(key.clone());
        }

        self.cache.insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn stats(&self) -> LocalCacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        LocalCacheStats {
            hits,
            misses,
            evictions: self.evictions.load(Ordering::Relaxed),
            entry_count: self.cache.len(),
            hit_rate: if total > 0 {
                hits as f64 / total as f64
            } else {
                0.0
            },
        }
    }

    /// Clear all cached entries
    pub fn clear(&self) {
        self.cache.clear();
        self.order.lock().clear();
    }
}

impl Default for LocalQueryCache {
    fn default() -> Self {
        Self::new(10_000)
    }
}
