// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Field descriptors
//!
//! A [`SchemaField`] describes one indexed attribute: its dotted name, its
//! type, whether it lives inside a nested sub-document, and how it takes part
//! in full-text relevance. Fields are immutable once built.
//!
//! ```text
//! name                 type     nested   analyzers (sub-properties)
//! sku                  keyword  -        untouched
//! name                 text     -        standard, untouched, whitespace, shingle
//! price.is_discount    boolean  price    untouched
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// Indexed value types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Keyword,
    Integer,
    Long,
    Double,
    Date,
    Boolean,
    Object,
    Nested,
}

impl FieldType {
    /// Object and nested types hold child properties instead of values
    pub fn is_container(self) -> bool {
        matches!(self, FieldType::Object | FieldType::Nested)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldType::Text => "text",
            FieldType::Keyword => "keyword",
            FieldType::Integer => "integer",
            FieldType::Long => "long",
            FieldType::Double => "double",
            FieldType::Date => "date",
            FieldType::Boolean => "boolean",
            FieldType::Object => "object",
            FieldType::Nested => "nested",
        };
        f.write_str(s)
    }
}

/// Text analyzers known to the index settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Analyzer {
    Standard,
    Whitespace,
    Shingle,
    Reference,
    Phonetic,
    Sortable,
    /// Raw, not analyzed (exact filtering)
    Untouched,
}

impl Analyzer {
    pub fn as_str(self) -> &'static str {
        match self {
            Analyzer::Standard => "standard",
            Analyzer::Whitespace => "whitespace",
            Analyzer::Shingle => "shingle",
            Analyzer::Reference => "reference",
            Analyzer::Phonetic => "phonetic",
            Analyzer::Sortable => "sortable",
            Analyzer::Untouched => "untouched",
        }
    }
}

impl fmt::Display for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Analyzer {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Analyzer::Standard),
            "whitespace" => Ok(Analyzer::Whitespace),
            "shingle" => Ok(Analyzer::Shingle),
            "reference" => Ok(Analyzer::Reference),
            "phonetic" => Ok(Analyzer::Phonetic),
            "sortable" => Ok(Analyzer::Sortable),
            "untouched" => Ok(Analyzer::Untouched),
            other => Err(SearchError::UnknownAnalyzer(other.to_string())),
        }
    }
}

/// Indexed attribute descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaField {
    name: String,
    field_type: FieldType,
    nested_path: Option<String>,
    searchable: bool,
    used_in_spellcheck: bool,
    sortable: bool,
    search_weight: f64,
    default_search_analyzer: Analyzer,
}

impl SchemaField {
    /// Create a non-searchable field
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            nested_path: None,
            searchable: false,
            used_in_spellcheck: false,
            sortable: false,
            search_weight: 1.0,
            default_search_analyzer: Analyzer::Standard,
        }
    }

    /// Store the field inside the nested sub-document at `path`
    pub fn nested(mut self, path: impl Into<String>) -> Self {
        self.nested_path = Some(path.into());
        self
    }

    /// Take part in full-text search with the given weight (negative weights count as 0)
    pub fn searchable(mut self, weight: f64) -> Self {
        self.searchable = true;
        self.search_weight = weight.max(0.0);
        self
    }

    /// Feed the spelling cross-field
    pub fn spellcheck(mut self) -> Self {
        self.used_in_spellcheck = true;
        self
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn default_search_analyzer(mut self, analyzer: Analyzer) -> Self {
        self.default_search_analyzer = analyzer;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn nested_path(&self) -> Option<&str> {
        self.nested_path.as_deref()
    }

    pub fn is_searchable(&self) -> bool {
        self.searchable
    }

    pub fn is_used_in_spellcheck(&self) -> bool {
        self.used_in_spellcheck
    }

    pub fn is_sortable(&self) -> bool {
        self.sortable
    }

    pub fn search_weight(&self) -> f64 {
        self.search_weight
    }

    pub fn search_analyzer(&self) -> Analyzer {
        self.default_search_analyzer
    }

    pub fn is_text(&self) -> bool {
        self.field_type == FieldType::Text
    }

    /// Analyzers this field is indexed with. The first one is the main property.
    pub fn analyzers(&self) -> Vec<Analyzer> {
        if !self.is_text() {
            return vec![Analyzer::Untouched];
        }
        let mut analyzers = vec![self.default_search_analyzer, Analyzer::Untouched];
        if self.searchable {
            analyzers.push(Analyzer::Whitespace);
        }
        if self.used_in_spellcheck {
            analyzers.push(Analyzer::Shingle);
        }
        if self.sortable {
            analyzers.push(Analyzer::Sortable);
        }
        let mut seen = Vec::with_capacity(analyzers.len());
        analyzers.retain(|a| {
            if seen.contains(a) {
                false
            } else {
                seen.push(*a);
                true
            }
        });
        analyzers
    }

    /// Property path holding this field analyzed with `analyzer`, if indexed that way.
    pub fn mapping_property(&self, analyzer: Analyzer) -> Option<String> {
        let analyzers = self.analyzers();
        match analyzers.iter().position(|a| *a == analyzer) {
            Some(0) => Some(self.name.clone()),
            Some(_) => Some(format!("{}.{}", self.name, analyzer)),
            None => None,
        }
    }

    /// Property used for exact-value filtering
    pub fn filter_property(&self) -> String {
        self.mapping_property(Analyzer::Untouched)
            .unwrap_or_else(|| self.name.clone())
    }
}
