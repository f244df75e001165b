// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Merchandising rules and their translation into query fragments.

mod condition;
mod fulltext;
mod special;
mod translator;

pub use condition::{Aggregator, Condition, ConditionNode, ConditionTree, ConditionValue, Operator};
pub use fulltext::{
    ExactSpellchecker, FulltextQueryBuilder, Spellchecker, SpellingType, WeightedFulltextBuilder,
};
pub use special::{SpecialAttribute, SpecialAttributeRegistry};
pub use translator::{Clock, ConditionTranslator, SearchContext};
