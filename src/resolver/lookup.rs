// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Cache tiers in front of [`RuleResolver::build`].

use tracing::{debug, warn};

use crate::catalog::Category;
use crate::error::Result;
use crate::metrics;
use crate::query::{codec, CachedQuery, QueryFragment};
use crate::rule::SearchContext;

use super::build::Compiled;
use super::{Exclusions, RuleResolver};

impl RuleResolver {
    /// Resolve `category` through the local then shared cache, building on miss.
    pub fn resolve(
        &self,
        category: &Category,
        ctx: &SearchContext,
        excluded: &Exclusions,
    ) -> Result<Option<QueryFragment>> {
        Ok(self.resolve_tracked(category, ctx, excluded)?.query)
    }

    /// Cached entries are used only when none of the ids they consulted is on
    /// the caller's path. Results are written back only when nothing besides
    /// the category itself was skipped, so every entry is complete.
    pub(super) fn resolve_tracked(
        &self,
        category: &Category,
        ctx: &SearchContext,
        excluded: &Exclusions,
    ) -> Result<Compiled> {
        let cacheable_id = category.id.filter(|_| !category.is_draft);
        let Some(category_id) = cacheable_id else {
            return self.build_tracked(category, ctx, excluded);
        };

        let key = self.cache_key(category_id, ctx);

        match self.local.get(&key) {
            Some(cached) if !excluded.intersects(&cached.consulted) => {
                metrics::record_rule_cache("local", true);
                debug!(category_id = %category_id, "Local rule cache hit");
                return Ok(Compiled::from(cached));
            }
            Some(_) => {
                metrics::record_rule_cache("local", false);
                debug!(category_id = %category_id, "Local rule cache entry overlaps the call path");
            }
            None => metrics::record_rule_cache("local", false),
        }

        let storage_key = key.storage_key();
        match self.shared.load(&storage_key) {
            Some(raw) => match codec::decode(&raw) {
                Ok(cached) if !excluded.intersects(&cached.consulted) => {
                    metrics::record_rule_cache("shared", true);
                    debug!(category_id = %category_id, "Shared rule cache hit");
                    self.local.insert(key, cached.clone());
                    metrics::set_local_cache_entries(self.local.len());
                    return Ok(Compiled::from(cached));
                }
                Ok(_) => metrics::record_rule_cache("shared", false),
                Err(e) => {
                    metrics::record_cache_decode_error();
                    warn!(
                        category_id = %category_id,
                        key = %storage_key,
                        error = %e,
                        "Undecodable shared cache entry, recompiling"
                    );
                }
            },
            None => metrics::record_rule_cache("shared", false),
        }

        let mut compiled = self.build_tracked(category, ctx, excluded)?;
        // A cycle back to this category is covered by this very call
        if !excluded.contains(category_id) {
            compiled.cut.remove(&category_id);
        }

        if compiled.cut.is_empty() {
            let entry = CachedQuery::new(compiled.query.clone(), compiled.consulted.clone());
            let encoded = codec::encode(&entry)?;
            self.shared
                .save(&storage_key, encoded, &self.tags_for(category_id));
            self.local.insert(key, entry);
            metrics::set_local_cache_entries(self.local.len());
        } else {
            debug!(
                category_id = %category_id,
                skipped = ?compiled.cut,
                "Partial category query, not cached"
            );
        }

        Ok(compiled)
    }
}
