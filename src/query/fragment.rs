// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Query Fragment - engine-agnostic AST for compiled search conditions
//!
//! A [`QueryFragment`] is what the rule resolver produces and caches. It is a
//! plain tree of owned values, so it can be encoded, shared and compared
//! without caring about object identity.
//!
//! # Example
//!
//! ```rust
//! use catalog_search::query::{Bounds, FragmentBuilder, QueryFragment};
//!
//! // Simple term
//! let in_stock = QueryFragment::term("stock.is_in_stock", true);
//!
//! // Boolean combinations
//! let query = FragmentBuilder::new()
//!     .push(in_stock)
//!     .push(QueryFragment::range("price", Bounds::default().gte(10).lt(50)))
//!     .build_and()
//!     .unwrap();
//!
//! // Debug labels travel with the fragment
//! let named = query.with_name("Category [1/2/3] Shoes #3");
//! assert_eq!(named.name.as_deref(), Some("Category [1/2/3] Shoes #3"));
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Debug label given to the zero-result sentinel
pub const MATCH_NOTHING_NAME: &str = "match_nothing";

/// Compiled search condition with an optional debug label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryFragment {
    /// Debug label (category path, rule description, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The condition itself
    pub query: FragmentKind,
}

/// Fragment kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FragmentKind {
    /// Boolean composition
    Bool {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        must: Vec<QueryFragment>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        should: Vec<QueryFragment>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        must_not: Vec<QueryFragment>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum_should_match: Option<u32>,
    },
    /// Exact value match
    Term { field: String, value: TermValue },
    /// Membership in a value set
    Terms { field: String, values: Vec<TermValue> },
    /// Numeric/date range
    Range { field: String, bounds: Bounds },
    /// Condition evaluated inside one sub-document of a nested field
    Nested { path: String, query: Box<QueryFragment> },
    /// Negation
    Not { query: Box<QueryFragment> },
    /// Field has a value
    Exists { field: String },
    /// Field has no value
    Missing { field: String },
    /// Analyzed full-text match on one field
    Match {
        field: String,
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fuzziness: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum_should_match: Option<String>,
    },
    /// Full-text match across weighted properties
    MultiMatch {
        fields: BTreeMap<String, f64>,
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fuzziness: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum_should_match: Option<String>,
    },
    /// Relevance adjustment around an inner query
    FunctionScore {
        query: Box<QueryFragment>,
        functions: Vec<ScoreFunction>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        score_mode: Option<CombineMode>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        boost_mode: Option<CombineMode>,
    },
    /// Similar-document lookup
    MoreLikeThis {
        fields: Vec<String>,
        like: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum_should_match: Option<String>,
    },
    /// Prefix match
    Prefix { field: String, value: String },
    /// Regular expression match
    Regexp { field: String, value: String },
}

/// Scalar value used in term, terms and range fragments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TermValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl TermValue {
    /// Loose truthiness used by boolean rule values ("1", "true", 1, true).
    pub fn is_truthy(&self) -> bool {
        match self {
            TermValue::Bool(b) => *b,
            TermValue::Int(i) => *i != 0,
            TermValue::Float(f) => *f != 0.0,
            TermValue::Text(s) => {
                let s = s.trim();
                !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false"))
            }
        }
    }

    /// Integer view of the value, parsing text when needed.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            TermValue::Int(i) => Some(*i),
            TermValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            TermValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl From<bool> for TermValue {
    fn from(v: bool) -> Self {
        TermValue::Bool(v)
    }
}

impl From<i64> for TermValue {
    fn from(v: i64) -> Self {
        TermValue::Int(v)
    }
}

impl From<i32> for TermValue {
    fn from(v: i32) -> Self {
        TermValue::Int(i64::from(v))
    }
}

impl From<u32> for TermValue {
    fn from(v: u32) -> Self {
        TermValue::Int(i64::from(v))
    }
}

impl From<u64> for TermValue {
    fn from(v: u64) -> Self {
        i64::try_from(v).map_or_else(|_| TermValue::Text(v.to_string()), TermValue::Int)
    }
}

impl From<f64> for TermValue {
    fn from(v: f64) -> Self {
        TermValue::Float(v)
    }
}

impl From<&str> for TermValue {
    fn from(v: &str) -> Self {
        TermValue::Text(v.to_string())
    }
}

impl From<String> for TermValue {
    fn from(v: String) -> Self {
        TermValue::Text(v)
    }
}

/// Range bounds; unset bounds are open
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gt: Option<TermValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gte: Option<TermValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lt: Option<TermValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lte: Option<TermValue>,
}

impl Bounds {
    pub fn gt(mut self, v: impl Into<TermValue>) -> Self {
        self.gt = Some(v.into());
        self
    }

    pub fn gte(mut self, v: impl Into<TermValue>) -> Self {
        self.gte = Some(v.into());
        self
    }

    pub fn lt(mut self, v: impl Into<TermValue>) -> Self {
        self.lt = Some(v.into());
        self
    }

    pub fn lte(mut self, v: impl Into<TermValue>) -> Self {
        self.lte = Some(v.into());
        self
    }
}

/// One scoring function of a function-score fragment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreFunction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<QueryFragment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_value_factor: Option<FieldValueFactor>,
}

/// Score contribution read from a numeric field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValueFactor {
    pub field: String,
    pub factor: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing: Option<f64>,
}

/// How function scores are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombineMode {
    Multiply,
    Sum,
    Avg,
    First,
    Max,
    Min,
    Replace,
}

impl QueryFragment {
    /// Wrap a fragment kind without a label
    pub fn new(query: FragmentKind) -> Self {
        Self { name: None, query }
    }

    /// `field == value`
    pub fn term(field: impl Into<String>, value: impl Into<TermValue>) -> Self {
        Self::new(FragmentKind::Term {
            field: field.into(),
            value: value.into(),
        })
    }

    /// `field ∈ values`
    pub fn terms(field: impl Into<String>, values: Vec<TermValue>) -> Self {
        Self::new(FragmentKind::Terms {
            field: field.into(),
            values,
        })
    }

    pub fn range(field: impl Into<String>, bounds: Bounds) -> Self {
        Self::new(FragmentKind::Range {
            field: field.into(),
            bounds,
        })
    }

    pub fn nested(path: impl Into<String>, inner: QueryFragment) -> Self {
        Self::new(FragmentKind::Nested {
            path: path.into(),
            query: Box::new(inner),
        })
    }

    pub fn exists(field: impl Into<String>) -> Self {
        Self::new(FragmentKind::Exists { field: field.into() })
    }

    pub fn missing(field: impl Into<String>) -> Self {
        Self::new(FragmentKind::Missing { field: field.into() })
    }

    /// Analyzed text match on a single property
    pub fn match_text(field: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(FragmentKind::Match {
            field: field.into(),
            text: text.into(),
            fuzziness: None,
            minimum_should_match: None,
        })
    }

    /// Fuzzy text match on a single property
    pub fn fuzzy_match(
        field: impl Into<String>,
        text: impl Into<String>,
        fuzziness: impl Into<String>,
    ) -> Self {
        Self::new(FragmentKind::Match {
            field: field.into(),
            text: text.into(),
            fuzziness: Some(fuzziness.into()),
            minimum_should_match: None,
        })
    }

    /// Text match across weighted properties
    pub fn multi_match(fields: BTreeMap<String, f64>, text: impl Into<String>) -> Self {
        Self::new(FragmentKind::MultiMatch {
            fields,
            text: text.into(),
            fuzziness: None,
            minimum_should_match: None,
        })
    }

    pub fn prefix(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(FragmentKind::Prefix {
            field: field.into(),
            value: value.into(),
        })
    }

    pub fn regexp(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(FragmentKind::Regexp {
            field: field.into(),
            value: value.into(),
        })
    }

    /// Boolean must over `clauses`
    pub fn and(clauses: Vec<QueryFragment>) -> Self {
        Self::new(FragmentKind::Bool {
            must: clauses,
            should: Vec::new(),
            must_not: Vec::new(),
            minimum_should_match: None,
        })
    }

    /// Boolean should over `clauses`; at least one must match
    pub fn or(clauses: Vec<QueryFragment>) -> Self {
        Self::new(FragmentKind::Bool {
            must: Vec::new(),
            should: clauses,
            must_not: Vec::new(),
            minimum_should_match: Some(1),
        })
    }

    /// Negate this fragment
    pub fn negate(self) -> Self {
        Self::new(FragmentKind::Not {
            query: Box::new(self),
        })
    }

    /// Deterministic fragment matching no real document: an id test against id 0.
    pub fn match_nothing(id_field: impl Into<String>) -> Self {
        Self::term(id_field, 0i64).with_name(MATCH_NOTHING_NAME)
    }

    /// Whether this is the sentinel built by [`QueryFragment::match_nothing`]
    pub fn is_match_nothing(&self) -> bool {
        self.name.as_deref() == Some(MATCH_NOTHING_NAME)
            && matches!(&self.query, FragmentKind::Term { value: TermValue::Int(0), .. })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Builder collecting clauses for a single boolean composition
#[derive(Default)]
pub struct FragmentBuilder {
    clauses: Vec<QueryFragment>,
}

impl FragmentBuilder {
    pub fn new() -> Self {
        Self { clauses: Vec::new() }
    }

    pub fn push(mut self, fragment: QueryFragment) -> Self {
        self.clauses.push(fragment);
        self
    }

    pub(crate) fn len(&self) -> usize {
        self.clauses.len()
    }

    /// All clauses must match. `None` when empty, the clause itself when single.
    pub fn build_and(self) -> Option<QueryFragment> {
        self.build(QueryFragment::and)
    }

    /// Any clause may match. `None` when empty, the clause itself when single.
    pub fn build_or(self) -> Option<QueryFragment> {
        self.build(QueryFragment::or)
    }

    fn build(mut self, combine: fn(Vec<QueryFragment>) -> QueryFragment) -> Option<QueryFragment> {
        match self.clauses.len() {
            0 => None,
            1 => self.clauses.pop(),
            _ => Some(combine(self.clauses)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_term() {
        let query = QueryFragment::term("color", "red");
        assert_eq!(
            query.query,
            FragmentKind::Term {
                field: "color".to_string(),
                value: TermValue::Text("red".to_string()),
            }
        );
        assert!(query.name.is_none());
    }

    #[test]
    fn test_and_query() {
        let query = QueryFragment::and(vec![
            QueryFragment::term("color", "red"),
            QueryFragment::range("price", Bounds::default().gte(25).lte(40)),
        ]);

        match query.query {
            FragmentKind::Bool { must, should, .. } => {
                assert_eq!(must.len(), 2);
                assert!(should.is_empty());
            }
            _ => panic!("Expected Bool fragment"),
        }
    }

    #[test]
    fn test_or_requires_one_clause() {
        let query = QueryFragment::or(vec![
            QueryFragment::term("status", "active"),
            QueryFragment::term("status", "pending"),
        ]);

        match query.query {
            FragmentKind::Bool { should, minimum_should_match, .. } => {
                assert_eq!(should.len(), 2);
                assert_eq!(minimum_should_match, Some(1));
            }
            _ => panic!("Expected Bool fragment"),
        }
    }

    #[test]
    fn test_negate() {
        let query = QueryFragment::term("deleted", true).negate();
        match query.query {
            FragmentKind::Not { query } => {
                assert_eq!(*query, QueryFragment::term("deleted", true));
            }
            _ => panic!("Expected Not fragment"),
        }
    }

    #[test]
    fn test_match_nothing_sentinel() {
        let sentinel = QueryFragment::match_nothing("entity_id");
        assert!(sentinel.is_match_nothing());
        assert!(!QueryFragment::term("entity_id", 0i64).is_match_nothing());
        assert!(!QueryFragment::term("entity_id", 5i64)
            .with_name(MATCH_NOTHING_NAME)
            .is_match_nothing());
    }

    #[test]
    fn test_builder_single_clause_is_unwrapped() {
        let single = FragmentBuilder::new()
            .push(QueryFragment::term("a", 1i64))
            .build_or();
        assert_eq!(single, Some(QueryFragment::term("a", 1i64)));
    }

    #[test]
    fn test_empty_builder_is_no_restriction() {
        assert!(FragmentBuilder::new().build_and().is_none());
        assert!(FragmentBuilder::new().build_or().is_none());
    }

    #[test]
    fn test_serialized_shape() {
        let query = QueryFragment::nested(
            "price",
            QueryFragment::term("price.is_discount", true),
        )
        .with_name("discounted");

        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["name"], "discounted");
        assert_eq!(json["query"]["type"], "nested");
        assert_eq!(json["query"]["path"], "price");
        assert_eq!(json["query"]["query"]["query"]["type"], "term");
        assert_eq!(json["query"]["query"]["query"]["value"], true);
    }

    #[test]
    fn test_term_value_numbers_keep_their_kind() {
        let query = QueryFragment::terms(
            "category_ids",
            vec![TermValue::Int(5), TermValue::Float(2.5), TermValue::from("x")],
        );
        let raw = serde_json::to_string(&query).unwrap();
        let back: QueryFragment = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, query);
    }

    #[test]
    fn test_truthiness() {
        assert!(TermValue::from("1").is_truthy());
        assert!(TermValue::from(true).is_truthy());
        assert!(!TermValue::from("0").is_truthy());
        assert!(!TermValue::from("false").is_truthy());
        assert!(!TermValue::Int(0).is_truthy());
    }

    #[test]
    fn test_as_i64() {
        assert_eq!(TermValue::from(" 7 ").as_i64(), Some(7));
        assert_eq!(TermValue::Float(3.0).as_i64(), Some(3));
        assert_eq!(TermValue::Float(3.5).as_i64(), None);
        assert_eq!(TermValue::Bool(true).as_i64(), None);
    }
}
