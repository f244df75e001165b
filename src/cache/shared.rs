// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use std::collections::HashSet;

use dashmap::DashMap;

/// Persistent store of encoded fragments shared between workers.
///
/// No transactional guarantees: concurrent writers of one key race and the
/// last write wins. Entries are pure functions of their key, so that is safe.
pub trait SharedQueryCache: Send + Sync {
    fn load(&self, key: &str) -> Option<String>;

    /// Store `value`, attaching `tags` for bulk invalidation
    fn save(&self, key: &str, value: String, tags: &[String]);

    /// Drop every entry carrying one of `tags`. Returns how many were dropped.
    fn invalidate_tags(&self, tags: &[String]) -> usize;
}

/// Shared cache held in memory with a tag → keys index.
///
/// The index is kept in both directions so that dropping an entry also
/// unlinks it from every other tag, and empty tag sets are removed.
pub struct InMemorySharedCache {
    entries: DashMap<String, String>,
    tags: DashMap<String, HashSet<String>>,
    key_tags: DashMap<String, HashSet<String>>,
}

impl InMemorySharedCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            tags: DashMap::new(),
            key_tags: DashMap::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Overwrite a raw entry (used to simulate corrupted storage)
    pub fn put_raw(&self, key: &str, value: impl Into<String>) {
        self.entries.insert(key.to_string(), value.into());
    }

    fn unlink(&self, tag: &str, key: &str) {
        if let Some(mut keys) = self.tags.get_mut(tag) {
            keys.remove(key);
        }
        self.tags.remove_if(tag, |_, keys| keys.is_empty());
    }
}

impl Default for InMemorySharedCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedQueryCache for InMemorySharedCache {
    fn load(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|r| r.value().clone())
    }

    fn save(&self, key: &str, value: String, tags: &[String]) {
        self.entries.insert(key.to_string(), value);
        if let Some((_, previous)) = self.key_tags.remove(key) {
            for tag in previous.iter().filter(|t| !tags.contains(*t)) {
                self.unlink(tag, key);
            }
        }
        self.key_tags
            .insert(key.to_string(), tags.iter().cloned().collect());
        for tag in tags {
            self.tags
                .entry(tag.clone())
                .or_default()
                .insert(key.to_string());
        }
    }

    fn invalidate_tags(&self, tags: &[String]) -> usize {
        let mut removed = 0;
        for tag in tags {
            let Some((_, keys)) = self.tags.remove(tag) else {
                continue;
            };
            for key in keys {
                if let Some((_, linked)) = self.key_tags.remove(&key) {
                    for other in linked.iter().filter(|t| *t != tag) {
                        self.unlink(other, &key);
                    }
                }
                if self.entries.remove(&key).is_some() {
                    removed += 1;
                }
            }
        }
        removed
    }
}
