// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search schema
//!
//! Field descriptors and the compiler producing the nested mapping tree
//! installed on the search engine.
//!
//! ```rust
//! use catalog_search::schema::{FieldType, SchemaCompiler, SchemaField};
//!
//! let schema = SchemaCompiler::new()
//!     .compile(
//!         "entity_id",
//!         vec![
//!             SchemaField::new("entity_id", FieldType::Integer),
//!             SchemaField::new("name", FieldType::Text).searchable(2.0).spellcheck(),
//!             SchemaField::new("price.is_discount", FieldType::Boolean).nested("price"),
//!         ],
//!         &[],
//!     )
//!     .unwrap();
//!
//! assert_eq!(schema.tree()["price"].properties.len(), 1);
//! ```

mod compiler;
mod field;

pub use compiler::{
    CompiledSchema, CompositeField, DynamicFieldProvider, FieldFilter, MappingProperty,
    SchemaCompiler, SchemaTree, AUTOCOMPLETE_FIELD, SEARCH_FIELD, SPELLING_FIELD,
};
pub use field::{Analyzer, FieldType, SchemaField};
