// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Fulltext collaborators used by the `search` rule attribute.
//!
//! The spelling decision and the query shape are both pluggable; the
//! defaults here search the schema's weighted properties exactly and fall
//! back to a fuzzy match on the spelling cross-field.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::Result;
use crate::query::{FragmentKind, QueryFragment};
use crate::schema::{CompiledSchema, SchemaField, SEARCH_FIELD, SPELLING_FIELD};

/// How the search text should be matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpellingType {
    /// Every term is spelled correctly
    Exact,
    /// Some terms need fuzzy matching
    Fuzzy,
}

/// Decides whether a text needs spelling correction
pub trait Spellchecker: Send + Sync {
    fn spelling_type(&self, text: &str) -> SpellingType;
}

/// Always trusts the text as typed
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactSpellchecker;

impl Spellchecker for ExactSpellchecker {
    fn spelling_type(&self, _text: &str) -> SpellingType {
        SpellingType::Exact
    }
}

/// Builds the fragment for a fulltext condition
pub trait FulltextQueryBuilder: Send + Sync {
    fn build(&self, text: &str, spelling: SpellingType) -> Result<QueryFragment>;
}

/// Multi-match over weighted searchable properties, fuzzy match on `spelling`
#[derive(Debug, Clone)]
pub struct WeightedFulltextBuilder {
    schema: Option<Arc<CompiledSchema>>,
    fuzziness: String,
    minimum_should_match: String,
}

impl WeightedFulltextBuilder {
    /// Without a schema only the `search` cross-field is queried.
    pub fn new(schema: Option<Arc<CompiledSchema>>) -> Self {
        Self {
            schema,
            fuzziness: "AUTO".to_string(),
            minimum_should_match: "100%".to_string(),
        }
    }

    pub fn with_fuzziness(mut self, fuzziness: impl Into<String>) -> Self {
        self.fuzziness = fuzziness.into();
        self
    }

    pub fn with_minimum_should_match(mut self, minimum_should_match: impl Into<String>) -> Self {
        self.minimum_should_match = minimum_should_match.into();
        self
    }

    fn weighted_fields(&self) -> Result<BTreeMap<String, f64>> {
        match &self.schema {
            Some(schema) => {
                let searchable = |f: &SchemaField| f.is_searchable();
                schema.weighted_search_properties(None, Some(SEARCH_FIELD), 1.0, Some(&searchable))
            }
            None => Ok(BTreeMap::from([(SEARCH_FIELD.to_string(), 1.0)])),
        }
    }
}

impl Default for WeightedFulltextBuilder {
    fn default() -> Self {
        Self::new(None)
    }
}

impl FulltextQueryBuilder for WeightedFulltextBuilder {
    fn build(&self, text: &str, spelling: SpellingType) -> Result<QueryFragment> {
        let fragment = match spelling {
            SpellingType::Exact => QueryFragment::new(FragmentKind::MultiMatch {
                fields: self.weighted_fields()?,
                text: text.to_string(),
                fuzziness: None,
                minimum_should_match: Some(self.minimum_should_match.clone()),
            }),
            SpellingType::Fuzzy => QueryFragment::new(FragmentKind::Match {
                field: SPELLING_FIELD.to_string(),
                text: text.to_string(),
                fuzziness: Some(self.fuzziness.clone()),
                minimum_should_match: Some(self.minimum_should_match.clone()),
            }),
        };
        Ok(fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldType, SchemaCompiler};

    #[test]
    fn test_exact_without_schema() {
        let builder = WeightedFulltextBuilder::default();
        let fragment = builder.build("red shoes", SpellingType::Exact).unwrap();
        match fragment.query {
            FragmentKind::MultiMatch { fields, text, minimum_should_match, .. } => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[SEARCH_FIELD], 1.0);
                assert_eq!(text, "red shoes");
                assert_eq!(minimum_should_match.as_deref(), Some("100%"));
            }
            _ => panic!("Expected MultiMatch fragment"),
        }
    }

    #[test]
    fn test_exact_uses_weighted_properties() {
        let schema = SchemaCompiler::new()
            .compile(
                "entity_id",
                vec![
                    SchemaField::new("entity_id", FieldType::Integer),
                    SchemaField::new("name", FieldType::Text).searchable(5.0),
                ],
                &[],
            )
            .unwrap();
        let builder = WeightedFulltextBuilder::new(Some(Arc::new(schema)));

        match builder.build("boots", SpellingType::Exact).unwrap().query {
            FragmentKind::MultiMatch { fields, .. } => {
                assert_eq!(fields[SEARCH_FIELD], 1.0);
                assert_eq!(fields["name"], 5.0);
            }
            _ => panic!("Expected MultiMatch fragment"),
        }
    }

    #[test]
    fn test_fuzzy_targets_spelling() {
        let builder = WeightedFulltextBuilder::default().with_fuzziness("1");
        match builder.build("bots", SpellingType::Fuzzy).unwrap().query {
            FragmentKind::Match { field, fuzziness, .. } => {
                assert_eq!(field, SPELLING_FIELD);
                assert_eq!(fuzziness.as_deref(), Some("1"));
            }
            _ => panic!("Expected Match fragment"),
        }
    }

    #[test]
    fn test_exact_spellchecker() {
        assert_eq!(ExactSpellchecker.spelling_type("anything"), SpellingType::Exact);
    }
}
