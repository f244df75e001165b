// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Condition → Fragment translator
//!
//! # Translation
//!
//! ```text
//! ConditionTree
//!   all/true   → bool must
//!   any/true   → bool should
//!   all/false  → bool must_not
//!   any/false  → not(bool must)
//!
//! Condition
//!   special attribute? → registered policy
//!   otherwise          → term / terms / range / match on the attribute
//!                        (untouched property, nested wrapper when the
//!                         schema says so)
//! ```
//!
//! # Relative dates
//!
//! The operand is an age in days. With `ref = today - N days`:
//!
//! ```text
//! ==  → ref <= date < ref+1d
//! !=  → not(==)
//! >   → date < ref
//! >=  → date < ref+1d
//! <   → date >= ref+1d
//! <=  → date >= ref
//! ```

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::condition::{Aggregator, Condition, ConditionNode, ConditionTree, Operator};
use super::fulltext::{ExactSpellchecker, FulltextQueryBuilder, Spellchecker, WeightedFulltextBuilder};
use super::special::{SpecialAttribute, SpecialAttributeRegistry};
use crate::error::{Result, SearchError};
use crate::query::{Bounds, FragmentBuilder, FragmentKind, QueryFragment, TermValue};
use crate::schema::CompiledSchema;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Store and customer group a query is compiled for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SearchContext {
    pub store_id: u32,
    pub customer_group_id: u32,
}

impl SearchContext {
    pub fn new(store_id: u32, customer_group_id: u32) -> Self {
        Self {
            store_id,
            customer_group_id,
        }
    }
}

/// Source of "now" for relative dates
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Translates rule conditions into query fragments
#[derive(Clone)]
pub struct ConditionTranslator {
    registry: SpecialAttributeRegistry,
    schema: Option<Arc<CompiledSchema>>,
    /// Custom fulltext builder; the schema-weighted one when unset
    fulltext: Option<Arc<dyn FulltextQueryBuilder>>,
    spellchecker: Arc<dyn Spellchecker>,
    clock: Clock,
}

impl fmt::Debug for ConditionTranslator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionTranslator")
            .field("special_attributes", &self.registry.codes())
            .field("schema", &self.schema.as_ref().map(|s| s.fields().len()))
            .field("custom_fulltext", &self.fulltext.is_some())
            .finish_non_exhaustive()
    }
}

impl ConditionTranslator {
    pub fn new(registry: SpecialAttributeRegistry) -> Self {
        Self {
            registry,
            schema: None,
            fulltext: None,
            spellchecker: Arc::new(ExactSpellchecker),
            clock: Arc::new(Utc::now),
        }
    }

    /// Resolve standard attributes through the compiled schema
    pub fn with_schema(mut self, schema: Arc<CompiledSchema>) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_fulltext(
        mut self,
        builder: Arc<dyn FulltextQueryBuilder>,
        spellchecker: Arc<dyn Spellchecker>,
    ) -> Self {
        self.fulltext = Some(builder);
        self.spellchecker = spellchecker;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn registry(&self) -> &SpecialAttributeRegistry {
        &self.registry
    }

    /// Translate a condition tree. An empty tree is no restriction (`None`).
    pub fn translate_tree(
        &self,
        tree: &ConditionTree,
        ctx: &SearchContext,
    ) -> Result<Option<QueryFragment>> {
        let mut clauses = Vec::with_capacity(tree.children.len());
        for child in &tree.children {
            let fragment = match child {
                ConditionNode::Leaf(condition) => Some(self.translate(condition, ctx)?),
                ConditionNode::Tree(subtree) => self.translate_tree(subtree, ctx)?,
            };
            clauses.extend(fragment);
        }

        if clauses.is_empty() {
            return Ok(None);
        }

        let builder = clauses
            .into_iter()
            .fold(FragmentBuilder::new(), FragmentBuilder::push);

        let fragment = match (tree.aggregator, tree.expected) {
            (Aggregator::All, true) => builder.build_and(),
            (Aggregator::Any, true) => builder.build_or(),
            (Aggregator::Any, false) => builder.build_and().map(QueryFragment::negate),
            (Aggregator::All, false) => {
                if builder.len() == 1 {
                    builder.build_and().map(QueryFragment::negate)
                } else {
                    builder.build_and().map(|all| match all.query {
                        FragmentKind::Bool { must, .. } => QueryFragment::new(FragmentKind::Bool {
                            must: Vec::new(),
                            should: Vec::new(),
                            must_not: must,
                            minimum_should_match: None,
                        }),
                        other => QueryFragment::new(other).negate(),
                    })
                }
            }
        };
        Ok(fragment)
    }

    /// Translate a single leaf condition
    pub fn translate(&self, condition: &Condition, ctx: &SearchContext) -> Result<QueryFragment> {
        match self.registry.get(&condition.attribute) {
            Some(SpecialAttribute::Boolean { field }) => self.boolean(condition, field),
            Some(SpecialAttribute::Terms { field }) => self.categorical(condition, field),
            Some(SpecialAttribute::CustomerGroupScoped {
                path,
                scope_field,
                field,
                boolean,
            }) => self.customer_group_scoped(condition, ctx, path, scope_field, field, *boolean),
            Some(SpecialAttribute::RelativeDate { field }) => self.relative_date(condition, field),
            Some(SpecialAttribute::Fulltext) => self.fulltext(condition),
            None => self.standard(condition),
        }
    }

    fn standard(&self, condition: &Condition) -> Result<QueryFragment> {
        let field = self
            .schema
            .as_ref()
            .and_then(|schema| schema.field(&condition.attribute));
        let property = field.map_or_else(|| condition.attribute.clone(), |f| f.filter_property());
        let is_text = field.map_or(false, |f| f.is_text());

        let positive = match condition.operator.positive() {
            Operator::Contains if is_text => {
                QueryFragment::match_text(condition.attribute.clone(), condition.value.as_text())
            }
            Operator::Eq | Operator::In | Operator::Contains => {
                let split = condition.operator.positive() == Operator::In;
                value_fragment(&property, condition.value.to_list(split))
            }
            op => range_fragment(condition, &property, op)?,
        };

        let positive = match field.and_then(|f| f.nested_path()) {
            Some(path) => QueryFragment::nested(path, positive),
            None => positive,
        };

        Ok(negate_if(positive, condition.operator.is_negated()))
    }

    fn boolean(&self, condition: &Condition, field: &str) -> Result<QueryFragment> {
        match condition.operator.positive() {
            Operator::Eq | Operator::In => {
                let wanted = condition
                    .value
                    .single()
                    .map_or(false, TermValue::is_truthy);
                let fragment = QueryFragment::term(field, wanted);
                Ok(negate_if(fragment, condition.operator.is_negated()))
            }
            _ => Err(unsupported(condition)),
        }
    }

    fn categorical(&self, condition: &Condition, field: &str) -> Result<QueryFragment> {
        match condition.operator.positive() {
            Operator::Eq | Operator::In => {
                let fragment = value_fragment(field, condition.value.to_list(true));
                Ok(negate_if(fragment, condition.operator.is_negated()))
            }
            _ => Err(unsupported(condition)),
        }
    }

    fn customer_group_scoped(
        &self,
        condition: &Condition,
        ctx: &SearchContext,
        path: &str,
        scope_field: &str,
        field: &str,
        boolean: bool,
    ) -> Result<QueryFragment> {
        let target = match condition.operator.positive() {
            Operator::Eq | Operator::In if boolean => {
                let wanted = condition
                    .value
                    .single()
                    .map_or(false, TermValue::is_truthy);
                QueryFragment::term(field, wanted)
            }
            Operator::Eq | Operator::In => value_fragment(field, condition.value.to_list(true)),
            op if op.is_range() && !boolean => range_fragment(condition, field, op)?,
            _ => return Err(unsupported(condition)),
        };

        let scoped = QueryFragment::and(vec![
            QueryFragment::term(scope_field, ctx.customer_group_id),
            target,
        ]);
        let fragment = QueryFragment::nested(path, scoped);
        Ok(negate_if(fragment, condition.operator.is_negated()))
    }

    fn relative_date(&self, condition: &Condition, field: &str) -> Result<QueryFragment> {
        let days = condition
            .value
            .single()
            .and_then(TermValue::as_i64)
            .ok_or_else(|| SearchError::InvalidConditionValue {
                attribute: condition.attribute.clone(),
                reason: "expected a number of days".to_string(),
            })?;

        let today = (self.clock)().date_naive();
        let (reference, next_day) = reference_days(today, days).ok_or_else(|| {
            SearchError::InvalidConditionValue {
                attribute: condition.attribute.clone(),
                reason: format!("{} days is out of the calendar range", days),
            }
        })?;
        let reference = reference.format(DATE_FORMAT).to_string();
        let next_day = next_day.format(DATE_FORMAT).to_string();

        let bounds = match condition.operator {
            Operator::Eq | Operator::NotEq => Bounds::default().gte(reference).lt(next_day),
            Operator::Gt => Bounds::default().lt(reference),
            Operator::Gte => Bounds::default().lt(next_day),
            Operator::Lt => Bounds::default().gte(next_day),
            Operator::Lte => Bounds::default().gte(reference),
            _ => return Err(unsupported(condition)),
        };

        let fragment = QueryFragment::range(field, bounds);
        Ok(negate_if(fragment, condition.operator == Operator::NotEq))
    }

    fn fulltext(&self, condition: &Condition) -> Result<QueryFragment> {
        let text = condition.value.as_text();
        let spelling = self.spellchecker.spelling_type(&text);
        let fragment = match &self.fulltext {
            Some(builder) => builder.build(&text, spelling)?,
            None => WeightedFulltextBuilder::new(self.schema.clone()).build(&text, spelling)?,
        };
        Ok(negate_if(fragment, condition.operator.is_negated()))
    }
}

fn reference_days(today: NaiveDate, days: i64) -> Option<(NaiveDate, NaiveDate)> {
    let reference = today.checked_sub_signed(TimeDelta::try_days(days)?)?;
    let next_day = reference.checked_add_signed(TimeDelta::try_days(1)?)?;
    Some((reference, next_day))
}

fn value_fragment(field: &str, mut values: Vec<TermValue>) -> QueryFragment {
    if values.len() == 1 {
        if let Some(value) = values.pop() {
            return QueryFragment::term(field, value);
        }
    }
    QueryFragment::terms(field, values)
}

fn range_fragment(condition: &Condition, field: &str, op: Operator) -> Result<QueryFragment> {
    let value = condition
        .value
        .single()
        .cloned()
        .ok_or_else(|| SearchError::InvalidConditionValue {
            attribute: condition.attribute.clone(),
            reason: format!("operator '{}' needs a single value", op),
        })?;
    let bounds = match op {
        Operator::Gt => Bounds::default().gt(value),
        Operator::Gte => Bounds::default().gte(value),
        Operator::Lt => Bounds::default().lt(value),
        Operator::Lte => Bounds::default().lte(value),
        _ => return Err(unsupported(condition)),
    };
    Ok(QueryFragment::range(field, bounds))
}

fn negate_if(fragment: QueryFragment, negated: bool) -> QueryFragment {
    if negated {
        fragment.negate()
    } else {
        fragment
    }
}

fn unsupported(condition: &Condition) -> SearchError {
    SearchError::UnsupportedOperator {
        attribute: condition.attribute.clone(),
        operator: condition.operator.to_string(),
    }
}
