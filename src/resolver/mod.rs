// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Category rule resolver.
//!
//! Compiles a category (static or virtual, possibly pointing at other
//! virtual categories) into one boolean query over the product index.
//!
//! # Resolution
//!
//! ```text
//! category_query(category)
//!       │
//!       ├─→ Local cache (skipped for drafts) ──→ hit? return
//!       │
//!       ├─→ Shared cache (skipped for drafts) ─→ hit? decode, fill local, return
//!       │
//!       └─→ build(category, exclusions + id)
//!                │
//!                ├─→ id already excluded       → None (cycle)
//!                ├─→ disabled + policy on      → match_nothing sentinel
//!                ├─→ virtual                   → own rule AND resolve(virtual root)
//!                ├─→ static                    → category_ids ∈ {id}
//!                └─→ fold children             → result OR virtual children OR ids ∈ {...}
//! ```
//!
//! `None` means "no restriction"; the sentinel means "restrict to nothing".
//! Only complete results are cached: a result that skipped a category already
//! on the call path is returned but never stored.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use catalog_search::catalog::{Category, InMemoryCatalog};
//! use catalog_search::cache::InMemorySharedCache;
//! use catalog_search::rule::{Condition, ConditionTranslator, ConditionTree, Operator,
//!     SearchContext, SpecialAttributeRegistry};
//! use catalog_search::{CatalogSearchConfig, RuleResolver};
//!
//! let root = Category::root(1, "Root");
//! let red = Category::child_of(&root, 2, "Red")
//!     .virtual_rule(ConditionTree::all(vec![Condition::new("color", Operator::Eq, "red")]));
//! let catalog: InMemoryCatalog = [root, red.clone()].into_iter().collect();
//!
//! let resolver = RuleResolver::new(
//!     CatalogSearchConfig::default(),
//!     Arc::new(catalog),
//!     Arc::new(InMemorySharedCache::new()),
//!     ConditionTranslator::new(SpecialAttributeRegistry::catalog_defaults()),
//! );
//!
//! let query = resolver.category_query(&red, &SearchContext::default()).unwrap();
//! assert!(query.is_some());
//! ```

mod build;
mod exclusions;
mod lookup;

pub use exclusions::Exclusions;

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::cache::{CacheKey, LocalCacheStats, LocalQueryCache, SharedQueryCache};
use crate::catalog::{Category, CategoryRepository};
use crate::config::CatalogSearchConfig;
use crate::error::Result;
use crate::metrics::LatencyTimer;
use crate::query::QueryFragment;
use crate::rule::{ConditionTranslator, SearchContext};

/// Recursive category query compiler with two-tier caching.
///
/// # Thread Safety
///
/// `Send + Sync`. Both caches are concurrent maps; concurrent resolutions of
/// one key may both compute and the last write wins.
pub struct RuleResolver {
    pub(super) config: CatalogSearchConfig,

    /// Category persistence of the catalog platform
    pub(super) repository: Arc<dyn CategoryRepository>,

    /// Persistent tier, shared between workers
    pub(super) shared: Arc<dyn SharedQueryCache>,

    /// In-process tier, owned by this resolver
    pub(super) local: LocalQueryCache,

    pub(super) translator: ConditionTranslator,

    /// Resolved virtual roots by (root id, store id); `None` when rejected
    pub(super) roots: DashMap<(u64, u32), Option<Category>>,
}

impl RuleResolver {
    pub fn new(
        config: CatalogSearchConfig,
        repository: Arc<dyn CategoryRepository>,
        shared: Arc<dyn SharedQueryCache>,
        translator: ConditionTranslator,
    ) -> Self {
        let local = LocalQueryCache::new(config.local_cache_max_entries);
        Self {
            config,
            repository,
            shared,
            local,
            translator,
            roots: DashMap::new(),
        }
    }

    pub fn config(&self) -> &CatalogSearchConfig {
        &self.config
    }

    pub fn translator(&self) -> &ConditionTranslator {
        &self.translator
    }

    pub fn local_cache_stats(&self) -> LocalCacheStats {
        self.local.stats()
    }

    /// Compiled query restricting results to `category`.
    ///
    /// `None` means no restriction.
    pub fn category_query(
        &self,
        category: &Category,
        ctx: &SearchContext,
    ) -> Result<Option<QueryFragment>> {
        let _timer = LatencyTimer::new("resolve");
        self.resolve(category, ctx, &Exclusions::new())
    }

    /// Products must belong to every category in `categories`.
    pub fn merge_category_queries(
        &self,
        categories: &[Category],
        ctx: &SearchContext,
    ) -> Result<QueryFragment> {
        let _timer = LatencyTimer::new("merge");
        let mut clauses = Vec::with_capacity(categories.len());
        for category in categories {
            clauses.extend(self.resolve(category, ctx, &Exclusions::new())?);
        }
        Ok(QueryFragment::and(clauses))
    }

    /// Forget compiled queries after `category_ids` changed, in both tiers.
    ///
    /// Every compiled query is dropped: any of them may embed one of
    /// `category_ids` through a virtual root or a folded child. Hook for the
    /// catalog platform's category and rule save events. Returns the number
    /// of shared entries dropped.
    pub fn invalidate_categories(&self, category_ids: &[u64]) -> usize {
        let local = self.local.len();
        self.local.clear();
        self.roots.clear();
        crate::metrics::set_local_cache_entries(0);

        let shared = self
            .shared
            .invalidate_tags(std::slice::from_ref(&self.config.cache_tag_prefix));

        debug!(
            categories = ?category_ids,
            local_dropped = local,
            shared_dropped = shared,
            "Invalidated category queries"
        );
        shared
    }

    pub(super) fn cache_key(&self, category_id: u64, ctx: &SearchContext) -> CacheKey {
        CacheKey {
            function: self.config.cache_function_name.clone(),
            store_id: ctx.store_id,
            category_id,
            customer_group_id: ctx.customer_group_id,
            disabled_policy: self.config.disabled_category_policy(ctx.store_id),
        }
    }

    pub(super) fn category_tag(&self, category_id: u64) -> String {
        format!("{}_{}", self.config.cache_tag_prefix, category_id)
    }

    /// Tags attached to a shared entry for `category_id`
    pub(super) fn tags_for(&self, category_id: u64) -> Vec<String> {
        vec![
            self.config.cache_tag_prefix.clone(),
            self.category_tag(category_id),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemorySharedCache;
    use crate::catalog::InMemoryCatalog;
    use crate::rule::SpecialAttributeRegistry;

    fn resolver(config: CatalogSearchConfig) -> RuleResolver {
        RuleResolver::new(
            config,
            Arc::new(InMemoryCatalog::new()),
            Arc::new(InMemorySharedCache::new()),
            ConditionTranslator::new(SpecialAttributeRegistry::catalog_defaults()),
        )
    }

    #[test]
    fn test_cache_key_carries_store_policy() {
        let mut config = CatalogSearchConfig::default();
        config.disabled_category_policy_by_store.insert(3, true);
        let resolver = resolver(config);

        let key = resolver.cache_key(7, &SearchContext::new(3, 2));
        assert_eq!(key.function, "category_search_query");
        assert_eq!(key.category_id, 7);
        assert_eq!(key.customer_group_id, 2);
        assert!(key.disabled_policy);
        assert!(!resolver.cache_key(7, &SearchContext::new(1, 2)).disabled_policy);
    }

    #[test]
    fn test_tags_for_category() {
        let resolver = resolver(CatalogSearchConfig {
            cache_tag_prefix: "cat".to_string(),
            ..Default::default()
        });
        assert_eq!(resolver.tags_for(12), vec!["cat".to_string(), "cat_12".to_string()]);
    }

    #[test]
    fn test_static_category_membership() {
        let resolver = resolver(CatalogSearchConfig::default());
        let category = Category::root(1, "Root");
        let child = Category::child_of(&category, 4, "Shoes");

        let query = resolver
            .category_query(&child, &SearchContext::default())
            .unwrap()
            .unwrap();
        assert_eq!(query.query, QueryFragment::term("category_ids", 4i64).query);
        assert_eq!(query.name.as_deref(), Some("Category [1/4] Shoes #4"));
    }

    #[test]
    fn test_unsaved_category_is_never_cached() {
        let resolver = resolver(CatalogSearchConfig::default());
        let mut category = Category::root(1, "Root");
        category.id = None;
        category.is_virtual = true;

        let query = resolver
            .category_query(&category, &SearchContext::default())
            .unwrap();
        assert!(query.is_none());
        assert_eq!(resolver.local_cache_stats().entry_count, 0);
    }

    #[test]
    fn test_merge_of_nothing_is_empty_must() {
        let resolver = resolver(CatalogSearchConfig::default());
        let merged = resolver
            .merge_category_queries(&[], &SearchContext::default())
            .unwrap();
        assert_eq!(merged, QueryFragment::and(Vec::new()));
    }
}
