// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use super::Category;

/// Read access to the catalog platform's category persistence
pub trait CategoryRepository: Send + Sync {
    /// Load a category with store-scoped values
    fn load(&self, id: u64, store_id: u32) -> Option<Category>;

    /// Every category below `category` in the tree, active or not.
    /// Callers filter; implementations should return a stable order.
    fn descendants(&self, category: &Category, store_id: u32) -> Vec<Category>;
}
