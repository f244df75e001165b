// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Query compilation for a single category.
//!
//! Recursion only happens through the cached lookup, always with an
//! exclusion set that already holds the current category, so every id
//! appears at most once per call path and depth is bounded by the tree.
//!
//! Each compilation also reports which ids it checked against the path and
//! which of those it skipped. A result with nothing skipped is the same under
//! any path and may be cached.

use std::collections::BTreeSet;

use tracing::debug;

use crate::catalog::Category;
use crate::error::Result;
use crate::metrics;
use crate::query::{CachedQuery, QueryFragment, TermValue};
use crate::rule::{Condition, Operator, SearchContext};

use super::{Exclusions, RuleResolver};

/// A compiled query with the path bookkeeping caching relies on
#[derive(Debug, Default)]
pub(super) struct Compiled {
    pub(super) query: Option<QueryFragment>,
    /// Category ids checked against the call path
    pub(super) consulted: BTreeSet<u64>,
    /// Consulted ids whose contribution was skipped for being on the path
    pub(super) cut: BTreeSet<u64>,
}

impl Compiled {
    /// Record a path check for `id`; true when it is excluded.
    fn skips(&mut self, id: u64, excluded: &Exclusions) -> bool {
        self.consulted.insert(id);
        if excluded.contains(id) {
            self.cut.insert(id);
            return true;
        }
        false
    }

    /// Take over `other`'s bookkeeping and hand back its query
    fn absorb(&mut self, other: Compiled) -> Option<QueryFragment> {
        self.consulted.extend(other.consulted);
        self.cut.extend(other.cut);
        other.query
    }
}

impl From<CachedQuery> for Compiled {
    fn from(cached: CachedQuery) -> Self {
        Self {
            query: cached.fragment,
            consulted: cached.consulted,
            cut: BTreeSet::new(),
        }
    }
}

impl RuleResolver {
    /// Compile `category` without consulting the caches.
    pub fn build(
        &self,
        category: &Category,
        ctx: &SearchContext,
        excluded: &Exclusions,
    ) -> Result<Option<QueryFragment>> {
        Ok(self.build_tracked(category, ctx, excluded)?.query)
    }

    pub(super) fn build_tracked(
        &self,
        category: &Category,
        ctx: &SearchContext,
        excluded: &Exclusions,
    ) -> Result<Compiled> {
        let mut compiled = Compiled::default();
        let excluded = match category.id {
            Some(id) => {
                if compiled.skips(id, excluded) {
                    metrics::record_cycle_short_circuit();
                    debug!(category_id = %id, "Category already on the call path, short-circuiting");
                    return Ok(compiled);
                }
                excluded.with(id)
            }
            None => excluded.clone(),
        };

        if !category.is_active && self.config.disabled_category_policy(ctx.store_id) {
            // Children are never folded in: a disabled category shows nothing.
            compiled.query = Some(QueryFragment::match_nothing(
                self.config.entity_id_field.as_str(),
            ));
            return Ok(compiled);
        }

        let query = if category.is_virtual && category.is_active {
            self.virtual_category_query(category, ctx, &excluded, &mut compiled)?
        } else if let (Some(id), true) = (category.id, category.is_active) {
            Some(
                self.membership_query(&[id], ctx)?
                    .with_name(category.debug_label()),
            )
        } else {
            None
        };

        let query = match query {
            Some(query) => Some(self.fold_children(query, category, ctx, &excluded, &mut compiled)?),
            None => None,
        };
        compiled.query = query;

        debug!(
            category_id = ?category.id,
            store_id = %ctx.store_id,
            restricted = compiled.query.is_some(),
            partial = !compiled.cut.is_empty(),
            "Built category query"
        );
        Ok(compiled)
    }

    /// A virtual category's own rule, ANDed with its virtual root's query.
    fn virtual_category_query(
        &self,
        category: &Category,
        ctx: &SearchContext,
        excluded: &Exclusions,
        compiled: &mut Compiled,
    ) -> Result<Option<QueryFragment>> {
        let own = self
            .translator
            .translate_tree(&category.conditions, ctx)?
            .map(|query| query.with_name(category.debug_label()));

        let root_query = match self.virtual_root(category, ctx.store_id) {
            Some(root) => {
                let mut covered = false;
                for id in &root.path {
                    covered |= compiled.skips(*id, excluded);
                }
                if covered {
                    debug!(
                        category_id = ?category.id,
                        root_id = ?root.id,
                        "Virtual root already covered by the call path"
                    );
                    None
                } else {
                    let resolved = self.resolve_tracked(&root, ctx, excluded)?;
                    compiled.absorb(resolved)
                }
            }
            None => None,
        };

        Ok(match (own, root_query) {
            (Some(own), Some(root)) => {
                let name = format!(
                    "{} (virtual root: {})",
                    own.name.as_deref().unwrap_or_default(),
                    root.name.as_deref().unwrap_or_default()
                );
                Some(QueryFragment::and(vec![own, root]).with_name(name))
            }
            (own, root) => own.or(root),
        })
    }

    /// The category's configured virtual root, loaded once per (root, store).
    ///
    /// Rejected (`None`) when it is a tree-level root or the store root the
    /// category lives under: anchoring on either adds no restriction.
    pub fn virtual_root(&self, category: &Category, store_id: u32) -> Option<Category> {
        let root_id = category.virtual_root_id?;
        if category.store_root_id() == Some(root_id) {
            debug!(category_id = ?category.id, root_id = %root_id, "Virtual root is the store root, ignoring");
            return None;
        }

        if let Some(cached) = self.roots.get(&(root_id, store_id)) {
            return cached.value().clone();
        }

        let root = self
            .repository
            .load(root_id, store_id)
            .filter(|root| root.level() >= 1);
        if root.is_none() {
            debug!(category_id = ?category.id, root_id = %root_id, "Virtual root missing or tree-level, ignoring");
        }
        self.roots.insert((root_id, store_id), root.clone());
        root
    }

    /// OR `base` with the queries of the category's active descendants.
    ///
    /// Virtual descendants contribute their own resolved query. Static ones
    /// (only considered below a virtual category) are grouped into a single
    /// id membership clause.
    fn fold_children(
        &self,
        base: QueryFragment,
        category: &Category,
        ctx: &SearchContext,
        excluded: &Exclusions,
        compiled: &mut Compiled,
    ) -> Result<QueryFragment> {
        let children: Vec<Category> = self
            .repository
            .descendants(category, ctx.store_id)
            .into_iter()
            .filter(|child| child.is_active)
            .filter(|child| category.is_virtual || child.is_virtual)
            .filter(|child| child.id.map_or(false, |id| !compiled.skips(id, excluded)))
            .collect();

        if children.is_empty() {
            return Ok(base);
        }

        let mut additions = Vec::new();
        let mut static_ids = Vec::new();

        for child in &children {
            if child.is_virtual {
                let resolved = self.resolve_tracked(child, ctx, excluded)?;
                additions.extend(compiled.absorb(resolved));
            } else {
                static_ids.extend(child.id);
            }
        }

        if !static_ids.is_empty() {
            let name = format!("Children of {}", category.debug_label());
            additions.push(self.membership_query(&static_ids, ctx)?.with_name(name));
        }

        if additions.is_empty() {
            return Ok(base);
        }

        let mut clauses = Vec::with_capacity(additions.len() + 1);
        clauses.push(base);
        clauses.extend(additions);
        Ok(QueryFragment::or(clauses).with_name(format!("{} with children", category.debug_label())))
    }

    /// `category_ids ∈ ids`, compiled through the translator
    fn membership_query(&self, ids: &[u64], ctx: &SearchContext) -> Result<QueryFragment> {
        let values: Vec<TermValue> = ids.iter().map(|id| TermValue::from(*id)).collect();
        let condition = Condition::new(self.config.category_field.as_str(), Operator::In, values);
        self.translator.translate(&condition, ctx)
    }
}
