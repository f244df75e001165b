// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! # Catalog Search
//!
//! Document-search backend core for a catalog platform: a schema compiler
//! for the product index and a compiler turning merchandising category
//! rules into one boolean search query.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Schema Compiler                         │
//! │  • Flat / dotted field descriptors → nested mapping tree   │
//! │  • Composite cross-fields (search, spelling, autocomplete) │
//! │  • Weighted multi-field search properties                  │
//! └─────────────────────────────────────────────────────────────┘
//!              (runs once, at index install time)
//!
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Rule Resolver                          │
//! │  • Local cache → shared cache → build                      │
//! │  • Virtual roots, children folding, cycle guard            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Condition → Fragment translator             │
//! │  • Special attributes: stock, discount, dates, full text   │
//! │  • Plain attributes via the compiled schema                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use catalog_search::cache::InMemorySharedCache;
//! use catalog_search::catalog::{Category, InMemoryCatalog};
//! use catalog_search::rule::{Condition, ConditionTranslator, ConditionTree, Operator,
//!     SearchContext, SpecialAttributeRegistry};
//! use catalog_search::{CatalogSearchConfig, RuleResolver};
//!
//! let root = Category::root(1, "Root");
//! let clothes = Category::child_of(&root, 2, "Clothes")
//!     .virtual_rule(ConditionTree::all(vec![Condition::new("color", Operator::Eq, "red")]));
//! let medium = Category::child_of(&root, 3, "Medium")
//!     .virtual_rule(ConditionTree::all(vec![Condition::new("size", Operator::Eq, "M")]))
//!     .virtual_root(2);
//! let catalog: InMemoryCatalog = [root, clothes, medium.clone()].into_iter().collect();
//!
//! let resolver = RuleResolver::new(
//!     CatalogSearchConfig::default(),
//!     Arc::new(catalog),
//!     Arc::new(InMemorySharedCache::new()),
//!     ConditionTranslator::new(SpecialAttributeRegistry::catalog_defaults()),
//! );
//!
//! // size == M AND color == red
//! let query = resolver
//!     .category_query(&medium, &SearchContext::new(0, 0))
//!     .unwrap()
//!     .unwrap();
//! println!("{}", serde_json::to_string_pretty(&query).unwrap());
//! ```
//!
//! ## Modules
//!
//! - [`schema`]: Field descriptors and the mapping tree compiler
//! - [`query`]: The engine-agnostic query fragment tree and its cache codec
//! - [`rule`]: Conditions, special attributes and their translation
//! - [`catalog`]: Category entity and repository seam
//! - [`cache`]: Local and shared tiers for compiled queries
//! - [`resolver`]: The [`RuleResolver`]

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod metrics;
pub mod query;
pub mod resolver;
pub mod rule;
pub mod schema;

pub use config::CatalogSearchConfig;
pub use error::{Result, SearchError};
pub use metrics::LatencyTimer;
pub use query::{FragmentKind, QueryFragment};
pub use resolver::{Exclusions, RuleResolver};
pub use rule::SearchContext;
pub use schema::{CompiledSchema, SchemaCompiler, SchemaField};
