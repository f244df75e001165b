// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Compiled query representation
//!
//! # Architecture
//!
//! ```text
//! ConditionTree / Category
//!     ↓  (rule translator, rule resolver)
//! QueryFragment (tagged tree)
//!     ├─→ indexing collaborator (request assembly)
//!     └─→ codec::encode → shared cache
//! ```

pub mod codec;
mod fragment;

pub use codec::CachedQuery;

pub use fragment::{
    Bounds, CombineMode, FieldValueFactor, FragmentBuilder, FragmentKind, QueryFragment,
    ScoreFunction, TermValue, MATCH_NOTHING_NAME,
};
