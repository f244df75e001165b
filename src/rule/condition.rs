// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Merchandising rule conditions
//!
//! ```text
//! ConditionTree(all, true)
//!   ├─ color == red
//!   └─ ConditionTree(any, true)
//!        ├─ size () [M, L]
//!        └─ created_at <= 30
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::query::TermValue;

/// Comparison operators in their rule-editor string form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
    /// Contains
    #[serde(rename = "{}")]
    Contains,
    #[serde(rename = "!{}")]
    NotContains,
    /// Is one of
    #[serde(rename = "()")]
    In,
    #[serde(rename = "!()")]
    NotIn,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::NotEq => "!=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Contains => "{}",
            Operator::NotContains => "!{}",
            Operator::In => "()",
            Operator::NotIn => "!()",
        }
    }

    /// Operator string starts with the negation marker
    pub fn is_negated(self) -> bool {
        self.as_str().starts_with('!')
    }

    /// The operator with its negation marker removed
    pub fn positive(self) -> Operator {
        match self {
            Operator::NotEq => Operator::Eq,
            Operator::NotContains => Operator::Contains,
            Operator::NotIn => Operator::In,
            other => other,
        }
    }

    pub fn is_range(self) -> bool {
        matches!(self, Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Operator::Eq,
            Operator::NotEq,
            Operator::Gt,
            Operator::Gte,
            Operator::Lt,
            Operator::Lte,
            Operator::Contains,
            Operator::NotContains,
            Operator::In,
            Operator::NotIn,
        ]
        .into_iter()
        .find(|op| op.as_str() == s)
        .ok_or_else(|| SearchError::UnsupportedOperator {
            attribute: String::new(),
            operator: s.to_string(),
        })
    }
}

/// Condition operand: one scalar or a list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    List(Vec<TermValue>),
    Single(TermValue),
}

impl ConditionValue {
    /// Operand as a value list. A comma-separated string is split when `split` is set.
    pub fn to_list(&self, split: bool) -> Vec<TermValue> {
        match self {
            ConditionValue::List(values) => values.clone(),
            ConditionValue::Single(TermValue::Text(s)) if split => s
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(TermValue::from)
                .collect(),
            ConditionValue::Single(value) => vec![value.clone()],
        }
    }

    /// The scalar operand, if this is not a list
    pub fn single(&self) -> Option<&TermValue> {
        match self {
            ConditionValue::Single(value) => Some(value),
            ConditionValue::List(values) if values.len() == 1 => values.first(),
            ConditionValue::List(_) => None,
        }
    }

    /// Operand rendered as text (list items joined by spaces)
    pub fn as_text(&self) -> String {
        let render = |v: &TermValue| match v {
            TermValue::Text(s) => s.clone(),
            TermValue::Int(i) => i.to_string(),
            TermValue::Float(f) => f.to_string(),
            TermValue::Bool(b) => b.to_string(),
        };
        match self {
            ConditionValue::Single(value) => render(value),
            ConditionValue::List(values) => {
                values.iter().map(render).collect::<Vec<_>>().join(" ")
            }
        }
    }
}

impl From<TermValue> for ConditionValue {
    fn from(v: TermValue) -> Self {
        ConditionValue::Single(v)
    }
}

impl From<Vec<TermValue>> for ConditionValue {
    fn from(v: Vec<TermValue>) -> Self {
        ConditionValue::List(v)
    }
}

impl From<&str> for ConditionValue {
    fn from(v: &str) -> Self {
        ConditionValue::Single(v.into())
    }
}

impl From<bool> for ConditionValue {
    fn from(v: bool) -> Self {
        ConditionValue::Single(v.into())
    }
}

impl From<i64> for ConditionValue {
    fn from(v: i64) -> Self {
        ConditionValue::Single(v.into())
    }
}

/// Leaf rule: `attribute operator value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub attribute: String,
    pub operator: Operator,
    pub value: ConditionValue,
}

impl Condition {
    pub fn new(
        attribute: impl Into<String>,
        operator: Operator,
        value: impl Into<ConditionValue>,
    ) -> Self {
        Self {
            attribute: attribute.into(),
            operator,
            value: value.into(),
        }
    }
}

/// How children of a condition tree combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregator {
    All,
    Any,
}

/// Child of a condition tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConditionNode {
    Leaf(Condition),
    Tree(ConditionTree),
}

/// "If ALL/ANY of these conditions are TRUE/FALSE"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionTree {
    pub aggregator: Aggregator,
    #[serde(default = "default_expected")]
    pub expected: bool,
    #[serde(default)]
    pub children: Vec<ConditionNode>,
}

fn default_expected() -> bool {
    true
}

impl ConditionTree {
    /// All leaves must hold
    pub fn all(conditions: Vec<Condition>) -> Self {
        Self {
            aggregator: Aggregator::All,
            expected: true,
            children: conditions.into_iter().map(ConditionNode::Leaf).collect(),
        }
    }

    /// Any leaf may hold
    pub fn any(conditions: Vec<Condition>) -> Self {
        Self {
            aggregator: Aggregator::Any,
            ..Self::all(conditions)
        }
    }

    /// Flip the expected outcome ("... are FALSE")
    pub fn expecting(mut self, expected: bool) -> Self {
        self.expected = expected;
        self
    }

    pub fn with_subtree(mut self, tree: ConditionTree) -> Self {
        self.children.push(ConditionNode::Tree(tree));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Default for ConditionTree {
    fn default() -> Self {
        Self::all(Vec::new())
    }
}
