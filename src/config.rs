// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Configuration for the category rule resolver.
//!
//! # Example
//!
//! ```
//! use catalog_search::CatalogSearchConfig;
//!
//! // Minimal config (uses defaults)
//! let config = CatalogSearchConfig::default();
//! assert_eq!(config.category_field, "category_ids");
//! assert!(!config.zero_results_for_disabled_categories);
//!
//! // Policy enabled globally, disabled for store 2
//! let mut config = CatalogSearchConfig {
//!     zero_results_for_disabled_categories: true,
//!     local_cache_max_entries: 500,
//!     ..Default::default()
//! };
//! config.disabled_category_policy_by_store.insert(2, false);
//! assert!(config.disabled_category_policy(1));
//! assert!(!config.disabled_category_policy(2));
//! ```

use std::collections::HashMap;

use serde::Deserialize;

/// Configuration for the resolver and its caches.
///
/// All fields have defaults matching the catalog platform's stock index layout.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSearchConfig {
    /// First component of every composite cache key
    #[serde(default = "default_cache_function_name")]
    pub cache_function_name: String,

    /// Indexed field holding a product's category ids
    #[serde(default = "default_category_field")]
    pub category_field: String,

    /// Document id field, targeted by the zero-result sentinel
    #[serde(default = "default_entity_id_field")]
    pub entity_id_field: String,

    /// Process-local cache bound (oldest entries evicted first)
    #[serde(default = "default_local_cache_max_entries")]
    pub local_cache_max_entries: usize,

    /// Disabled categories compile to a match-nothing query instead of no restriction
    #[serde(default)]
    pub zero_results_for_disabled_categories: bool,

    /// Per-store overrides of `zero_results_for_disabled_categories`
    #[serde(default)]
    pub disabled_category_policy_by_store: HashMap<u32, bool>,

    /// Base tag attached to shared cache entries
    #[serde(default = "default_cache_tag_prefix")]
    pub cache_tag_prefix: String,
}

fn default_cache_function_name() -> String { "category_search_query".to_string() }
fn default_category_field() -> String { "category_ids".to_string() }
fn default_entity_id_field() -> String { "entity_id".to_string() }
fn default_local_cache_max_entries() -> usize { 10_000 }
fn default_cache_tag_prefix() -> String { "catalog_category".to_string() }

impl CatalogSearchConfig {
    /// Whether disabled categories yield zero results in `store_id`.
    #[must_use]
    pub fn disabled_category_policy(&self, store_id: u32) -> bool {
        self.disabled_category_policy_by_store
            .get(&store_id)
            .copied()
            .unwrap_or(self.zero_results_for_disabled_categories)
    }
}

impl Default for CatalogSearchConfig {
    fn default() -> Self {
        Self {
            cache_function_name: default_cache_function_name(),
            category_field: default_category_field(),
            entity_id_field: default_entity_id_field(),
            local_cache_max_entries: default_local_cache_max_entries(),
            zero_results_for_disabled_categories: false,
            disabled_category_policy_by_store: HashMap::new(),
            cache_tag_prefix: default_cache_tag_prefix(),
        }
    }
}
