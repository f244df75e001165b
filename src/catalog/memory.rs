// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use dashmap::DashMap;

use super::traits::CategoryRepository;
use super::Category;

/// Category repository held in memory, keyed by (store, id)
pub struct InMemoryCatalog {
    data: DashMap<(u32, u64), Category>,
}

impl InMemoryCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
        }
    }

    /// Insert or replace a saved category. Unsaved categories are ignored.
    pub fn insert(&self, category: Category) {
        if let Some(id) = category.id {
            self.data.insert((category.store_id, id), category);
        }
    }

    pub fn remove(&self, store_id: u32, id: u64) -> Option<Category> {
        self.data.remove(&(store_id, id)).map(|(_, category)| category)
    }

    /// Get current category count
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<Category> for InMemoryCatalog {
    fn from_iter<I: IntoIterator<Item = Category>>(iter: I) -> Self {
        let catalog = Self::new();
        for category in iter {
            catalog.insert(category);
        }
        catalog
    }
}

impl CategoryRepository for InMemoryCatalog {
    fn load(&self, id: u64, store_id: u32) -> Option<Category> {
        self.data.get(&(store_id, id)).map(|r| r.value().clone())
    }

    fn descendants(&self, category: &Category, store_id: u32) -> Vec<Category> {
        let mut found: Vec<Category> = self
            .data
            .iter()
            .filter(|entry| entry.key().0 == store_id && category.is_ancestor_of(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        // DashMap iteration order is arbitrary
        found.sort_by(|a, b| a.path.len().cmp(&b.path.len()).then_with(|| a.id.cmp(&b.id)));
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> InMemoryCatalog {
        let root = Category::root(1, "Root");
        let a = Category::child_of(&root, 2, "A");
        let b = Category::child_of(&a, 4, "B");
        let c = Category::child_of(&root, 3, "C");
        [root, a, b, c].into_iter().collect()
    }

    #[test]
    fn test_new_catalog_is_empty() {
        let catalog = InMemoryCatalog::new();
        assert!(catalog.is_empty());
        assert_eq!(catalog.len(), 0);
    }

    #[test]
    fn test_load_scoped_by_store() {
        let catalog = tree();
        assert_eq!(catalog.load(2, 0).unwrap().name, "A");
        assert!(catalog.load(2, 1).is_none());
        assert!(catalog.load(99, 0).is_none());
    }

    #[test]
    fn test_descendants_sorted_by_depth_then_id() {
        let catalog = tree();
        let root = catalog.load(1, 0).unwrap();
        let ids: Vec<_> = catalog
            .descendants(&root, 0)
            .into_iter()
            .filter_map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![2, 3, 4]);

        let a = catalog.load(2, 0).unwrap();
        assert_eq!(catalog.descendants(&a, 0).len(), 1);
    }

    #[test]
    fn test_unsaved_not_inserted() {
        let catalog = InMemoryCatalog::new();
        let mut draft = Category::root(5, "Draft");
        draft.id = None;
        catalog.insert(draft);
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_remove() {
        let catalog = tree();
        assert!(catalog.remove(0, 3).is_some());
        assert!(catalog.load(3, 0).is_none());
        assert_eq!(catalog.len(), 3);
    }
}
