// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Schema Compiler
//!
//! Turns flat, dotted field descriptors into the nested mapping tree handed
//! to the indexing collaborator at install time.
//!
//! # Compilation
//!
//! ```text
//! fields (static + providers, declaration order)
//!       │
//!       ├─→ nested path P?   → ensure nested node P, insert name minus "P."
//!       ├─→ dotted name a.b? → ensure object node a, insert b
//!       └─→ plain name       → insert at root
//!
//! searchable  → copy_to: search
//! spellcheck  → copy_to: spelling
//! ```
//!
//! The composite cross-fields (`search`, `spelling`, `autocomplete`) are
//! seeded first so per-field `copy_to` directives always have a target.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::field::{Analyzer, FieldType, SchemaField};
use crate::error::{Result, SearchError};
use crate::metrics;

/// Cross-field receiving every searchable field
pub const SEARCH_FIELD: &str = "search";
/// Cross-field receiving every spellcheck-eligible field
pub const SPELLING_FIELD: &str = "spelling";
/// Cross-field used by autocomplete
pub const AUTOCOMPLETE_FIELD: &str = "autocomplete";

/// Mapping tree: property name → property
pub type SchemaTree = BTreeMap<String, MappingProperty>;

/// One node of the mapping tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappingProperty {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<Analyzer>,
    /// Analyzer-specific sub-properties
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: SchemaTree,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub copy_to: Vec<String>,
    /// Children of object and nested nodes
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: SchemaTree,
}

impl MappingProperty {
    fn container(field_type: FieldType) -> Self {
        Self {
            field_type,
            analyzer: None,
            fields: SchemaTree::new(),
            copy_to: Vec::new(),
            properties: SchemaTree::new(),
        }
    }

    fn analyzed(analyzers: &[Analyzer]) -> Self {
        let mut fields = SchemaTree::new();
        for analyzer in analyzers.iter().skip(1) {
            fields.insert(analyzer.to_string(), Self::sub_property(*analyzer));
        }
        Self {
            field_type: FieldType::Text,
            analyzer: analyzers.first().copied(),
            fields,
            copy_to: Vec::new(),
            properties: SchemaTree::new(),
        }
    }

    fn sub_property(analyzer: Analyzer) -> Self {
        match analyzer {
            Analyzer::Untouched => Self::container(FieldType::Keyword),
            other => Self {
                analyzer: Some(other),
                ..Self::container(FieldType::Text)
            },
        }
    }

    fn for_field(field: &SchemaField) -> Self {
        if field.is_text() {
            Self::analyzed(&field.analyzers())
        } else {
            Self::container(field.field_type())
        }
    }
}

/// A cross-field other fields copy into
#[derive(Debug, Clone)]
pub struct CompositeField {
    pub name: String,
    /// First analyzer is the main property
    pub analyzers: Vec<Analyzer>,
}

impl CompositeField {
    pub fn new(name: impl Into<String>, analyzers: Vec<Analyzer>) -> Self {
        Self {
            name: name.into(),
            analyzers,
        }
    }

    fn mapping_property(&self, analyzer: Analyzer) -> Option<String> {
        match self.analyzers.iter().position(|a| *a == analyzer) {
            Some(0) => Some(self.name.clone()),
            Some(_) => Some(format!("{}.{}", self.name, analyzer)),
            None => None,
        }
    }
}

/// Source of fields discovered at install time (attribute metadata, plugins, ...)
pub trait DynamicFieldProvider {
    fn fields(&self) -> Vec<SchemaField>;
}

/// Predicate narrowing the fields considered for weighted search
pub type FieldFilter<'a> = &'a dyn Fn(&SchemaField) -> bool;

/// Builds [`CompiledSchema`]s
#[derive(Debug, Clone)]
pub struct SchemaCompiler {
    composite_fields: Vec<CompositeField>,
}

impl SchemaCompiler {
    /// Compiler seeded with the `search`, `spelling` and `autocomplete` cross-fields
    pub fn new() -> Self {
        Self {
            composite_fields: vec![
                CompositeField::new(
                    SEARCH_FIELD,
                    vec![Analyzer::Standard, Analyzer::Whitespace, Analyzer::Reference],
                ),
                CompositeField::new(
                    SPELLING_FIELD,
                    vec![
                        Analyzer::Standard,
                        Analyzer::Whitespace,
                        Analyzer::Shingle,
                        Analyzer::Phonetic,
                    ],
                ),
                CompositeField::new(
                    AUTOCOMPLETE_FIELD,
                    vec![Analyzer::Standard, Analyzer::Shingle],
                ),
            ],
        }
    }

    /// Compiler with custom cross-fields
    pub fn with_composite_fields(composite_fields: Vec<CompositeField>) -> Self {
        Self { composite_fields }
    }

    /// Assemble fields from all sources and build the mapping tree.
    ///
    /// Later declarations of a name replace earlier ones in place. Fails if
    /// `id_field` is not among the assembled fields.
    pub fn compile(
        &self,
        id_field: &str,
        static_fields: Vec<SchemaField>,
        providers: &[&dyn DynamicFieldProvider],
    ) -> Result<CompiledSchema> {
        let mut fields: Vec<SchemaField> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        let dynamic = providers.iter().flat_map(|p| p.fields());
        for field in static_fields.into_iter().chain(dynamic) {
            match index.get(field.name()) {
                Some(&pos) => {
                    debug!(field = %field.name(), "Field redeclared, replacing");
                    fields[pos] = field;
                }
                None => {
                    index.insert(field.name().to_string(), fields.len());
                    fields.push(field);
                }
            }
        }

        if !index.contains_key(id_field) {
            return Err(SearchError::UnknownIdField(id_field.to_string()));
        }

        let mut tree = SchemaTree::new();
        for composite in &self.composite_fields {
            tree.insert(
                composite.name.clone(),
                MappingProperty::analyzed(&composite.analyzers),
            );
        }

        for field in &fields {
            let mut node = MappingProperty::for_field(field);
            if field.is_searchable() && self.composite(SEARCH_FIELD).is_some() {
                node.copy_to.push(SEARCH_FIELD.to_string());
            }
            if field.is_used_in_spellcheck() && self.composite(SPELLING_FIELD).is_some() {
                node.copy_to.push(SPELLING_FIELD.to_string());
            }

            match field.nested_path() {
                Some(path) => {
                    let container = ensure_path(&mut tree, path, FieldType::Nested);
                    let relative = field
                        .name()
                        .strip_prefix(path)
                        .and_then(|rest| rest.strip_prefix('.'))
                        .unwrap_or(field.name());
                    insert_at(&mut container.properties, relative, node);
                }
                None => insert_at(&mut tree, field.name(), node),
            }
        }

        metrics::set_schema_fields(fields.len());
        info!(fields = fields.len(), id_field = %id_field, "Schema compiled");

        Ok(CompiledSchema {
            id_field: id_field.to_string(),
            tree,
            fields,
            index,
            composite_fields: self.composite_fields.clone(),
        })
    }

    fn composite(&self, name: &str) -> Option<&CompositeField> {
        self.composite_fields.iter().find(|c| c.name == name)
    }
}

impl Default for SchemaCompiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Walk `path` segment by segment, creating object nodes for intermediate
/// segments and a `kind` node for the last one.
fn ensure_path<'a>(tree: &'a mut SchemaTree, path: &str, kind: FieldType) -> &'a mut MappingProperty {
    match path.split_once('.') {
        Some((head, rest)) => {
            let parent = ensure_container(tree, head, FieldType::Object);
            ensure_path(&mut parent.properties, rest, kind)
        }
        None => ensure_container(tree, path, kind),
    }
}

fn ensure_container<'a>(tree: &'a mut SchemaTree, name: &str, kind: FieldType) -> &'a mut MappingProperty {
    let node = tree
        .entry(name.to_string())
        .or_insert_with(|| MappingProperty::container(kind));

    if !node.field_type.is_container() {
        warn!(property = %name, field_type = %node.field_type, "Value property shadowed by child fields");
        *node = MappingProperty::container(kind);
    } else if kind == FieldType::Nested && node.field_type == FieldType::Object {
        debug!(property = %name, "Promoting object node to nested");
        node.field_type = FieldType::Nested;
    }
    node
}

fn insert_at(tree: &mut SchemaTree, name: &str, node: MappingProperty) {
    if let Some((head, rest)) = name.split_once('.') {
        let parent = ensure_container(tree, head, FieldType::Object);
        insert_at(&mut parent.properties, rest, node);
        return;
    }

    let has_container = tree
        .get(name)
        .map_or(false, |existing| existing.field_type.is_container());
    if !has_container {
        tree.insert(name.to_string(), node);
        return;
    }
    let Some(existing) = tree.get_mut(name) else {
        return;
    };

    if node.field_type.is_container() {
        // Declared container over a synthetic one: nested wins over object.
        if existing.field_type != FieldType::Nested {
            existing.field_type = node.field_type;
        }
    } else {
        warn!(property = %name, "Value field collides with a container node, keeping children");
    }
}

/// Result of [`SchemaCompiler::compile`]
#[derive(Debug, Clone)]
pub struct CompiledSchema {
    id_field: String,
    tree: SchemaTree,
    fields: Vec<SchemaField>,
    index: HashMap<String, usize>,
    composite_fields: Vec<CompositeField>,
}

impl CompiledSchema {
    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    pub fn tree(&self) -> &SchemaTree {
        &self.tree
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.index.get(name).map(|&pos| &self.fields[pos])
    }

    /// Mapping document for the indexing collaborator
    pub fn to_mapping_json(&self) -> Value {
        json!({ "properties": self.tree })
    }

    /// Property path → weight map for multi-field relevance.
    ///
    /// Each field contributes the property analyzed with `analyzer` (or its own
    /// default analyzer) at `search_weight * boost`. With a `default_field`,
    /// that cross-field is included at `boost`, and weight-1 fields are assumed
    /// covered by it unless their own default analyzer is not `standard`.
    pub fn weighted_search_properties(
        &self,
        analyzer: Option<&str>,
        default_field: Option<&str>,
        boost: f64,
        filter: Option<FieldFilter<'_>>,
    ) -> Result<BTreeMap<String, f64>> {
        let analyzer = analyzer.map(str::parse::<Analyzer>).transpose()?;
        let mut weighted = BTreeMap::new();

        if let Some(name) = default_field {
            let composite = self
                .composite_fields
                .iter()
                .find(|c| c.name == name)
                .ok_or_else(|| SearchError::UnknownDefaultField(name.to_string()))?;
            let wanted = analyzer.unwrap_or(Analyzer::Standard);
            let property = composite
                .mapping_property(wanted)
                .ok_or_else(|| SearchError::UnknownAnalyzer(format!("{}.{}", name, wanted)))?;
            weighted.insert(property, boost);
        }

        for field in &self.fields {
            if let Some(filter) = filter {
                if !filter(field) {
                    continue;
                }
            }

            let mut can_add = default_field.is_none() || field.search_weight() != 1.0;
            let current = match analyzer {
                Some(a) => a,
                None => {
                    let own = field.search_analyzer();
                    can_add = can_add || own != Analyzer::Standard;
                    own
                }
            };

            if !can_add {
                continue;
            }
            if let Some(property) = field.mapping_property(current) {
                weighted.insert(property, field.search_weight() * boost);
            }
        }

        Ok(weighted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_fields() -> Vec<SchemaField> {
        vec![
            SchemaField::new("entity_id", FieldType::Integer),
            SchemaField::new("name", FieldType::Text).searchable(2.0).spellcheck(),
            SchemaField::new("sku", FieldType::Text)
                .searchable(1.0)
                .default_search_analyzer(Analyzer::Reference),
            SchemaField::new("description", FieldType::Text).searchable(1.0),
            SchemaField::new("price.is_discount", FieldType::Boolean).nested("price"),
            SchemaField::new("price.customer_group_id", FieldType::Integer).nested("price"),
            SchemaField::new("stock.is_in_stock", FieldType::Boolean),
        ]
    }

    fn compile() -> CompiledSchema {
        SchemaCompiler::new()
            .compile("entity_id", catalog_fields(), &[])
            .unwrap()
    }

    #[test]
    fn test_missing_id_field() {
        let err = SchemaCompiler::new()
            .compile("id", catalog_fields(), &[])
            .unwrap_err();
        assert_eq!(err, SearchError::UnknownIdField("id".to_string()));
    }

    #[test]
    fn test_composite_fields_seeded() {
        let schema = compile();
        let search = &schema.tree()[SEARCH_FIELD];
        assert_eq!(search.field_type, FieldType::Text);
        assert_eq!(search.analyzer, Some(Analyzer::Standard));
        assert!(search.fields.contains_key("whitespace"));
        assert!(schema.tree()[SPELLING_FIELD].fields.contains_key("phonetic"));
        assert!(schema.tree().contains_key(AUTOCOMPLETE_FIELD));
    }

    #[test]
    fn test_nested_field_grouped() {
        let schema = compile();
        let price = &schema.tree()["price"];
        assert_eq!(price.field_type, FieldType::Nested);
        assert_eq!(price.properties.len(), 2);
        assert_eq!(price.properties["is_discount"].field_type, FieldType::Boolean);
        assert!(!schema.tree().contains_key("price.is_discount"));
    }

    #[test]
    fn test_dotted_field_becomes_object() {
        let schema = compile();
        let stock = &schema.tree()["stock"];
        assert_eq!(stock.field_type, FieldType::Object);
        assert_eq!(stock.properties["is_in_stock"].field_type, FieldType::Boolean);
    }

    #[test]
    fn test_object_promoted_to_nested() {
        let fields = vec![
            SchemaField::new("id", FieldType::Integer),
            SchemaField::new("option.label", FieldType::Keyword),
            SchemaField::new("option.value", FieldType::Integer).nested("option"),
        ];
        let schema = SchemaCompiler::new().compile("id", fields, &[]).unwrap();
        let option = &schema.tree()["option"];
        assert_eq!(option.field_type, FieldType::Nested);
        assert_eq!(option.properties.len(), 2);
    }

    #[test]
    fn test_copy_to_directives() {
        let schema = compile();
        assert_eq!(
            schema.tree()["name"].copy_to,
            vec![SEARCH_FIELD.to_string(), SPELLING_FIELD.to_string()]
        );
        assert_eq!(schema.tree()["description"].copy_to, vec![SEARCH_FIELD.to_string()]);
        assert!(schema.tree()["entity_id"].copy_to.is_empty());
    }

    #[test]
    fn test_text_subfields() {
        let schema = compile();
        let name = &schema.tree()["name"];
        assert_eq!(name.fields["untouched"].field_type, FieldType::Keyword);
        assert_eq!(name.fields["shingle"].analyzer, Some(Analyzer::Shingle));
    }

    #[test]
    fn test_dynamic_provider_overrides_static() {
        struct Attributes;
        impl DynamicFieldProvider for Attributes {
            fn fields(&self) -> Vec<SchemaField> {
                vec![
                    SchemaField::new("name", FieldType::Text).searchable(10.0),
                    SchemaField::new("color", FieldType::Keyword),
                ]
            }
        }

        let schema = SchemaCompiler::new()
            .compile("entity_id", catalog_fields(), &[&Attributes])
            .unwrap();
        assert_eq!(schema.field("name").unwrap().search_weight(), 10.0);
        assert_eq!(schema.fields()[1].name(), "name");
        assert!(schema.field("color").is_some());
    }

    #[test]
    fn test_weighted_properties_multiply_boost() {
        let schema = compile();
        let searchable = |f: &SchemaField| f.is_searchable();
        let weighted = schema
            .weighted_search_properties(None, None, 3.0, Some(&searchable))
            .unwrap();

        assert_eq!(weighted["name"], 6.0);
        assert_eq!(weighted["sku"], 3.0);
        assert_eq!(weighted["description"], 3.0);
        assert!(!weighted.contains_key("entity_id"));
    }

    #[test]
    fn test_weighted_properties_with_default_field() {
        let schema = compile();
        let searchable = |f: &SchemaField| f.is_searchable();
        let weighted = schema
            .weighted_search_properties(None, Some(SEARCH_FIELD), 2.0, Some(&searchable))
            .unwrap();

        assert_eq!(weighted[SEARCH_FIELD], 2.0);
        assert_eq!(weighted["name"], 4.0);
        // weight 1 with a non-standard default analyzer stays
        assert_eq!(weighted["sku"], 2.0);
        // weight 1, standard analyzer: covered by the default field
        assert!(!weighted.contains_key("description"));
    }

    #[test]
    fn test_weighted_properties_explicit_analyzer() {
        let schema = compile();
        let weighted = schema
            .weighted_search_properties(Some("whitespace"), Some(SEARCH_FIELD), 1.0, None)
            .unwrap();

        assert_eq!(weighted["search.whitespace"], 1.0);
        assert_eq!(weighted["name.whitespace"], 2.0);
        assert!(!weighted.contains_key("description.whitespace"));
        assert!(!weighted.contains_key("entity_id"));
    }

    #[test]
    fn test_weighted_properties_errors() {
        let schema = compile();
        assert_eq!(
            schema.weighted_search_properties(Some("nope"), None, 1.0, None),
            Err(SearchError::UnknownAnalyzer("nope".to_string()))
        );
        assert_eq!(
            schema.weighted_search_properties(None, Some("everything"), 1.0, None),
            Err(SearchError::UnknownDefaultField("everything".to_string()))
        );
    }

    #[test]
    fn test_mapping_json() {
        let schema = compile();
        let json = schema.to_mapping_json();
        assert_eq!(json["properties"]["price"]["type"], "nested");
        assert_eq!(
            json["properties"]["price"]["properties"]["is_discount"]["type"],
            "boolean"
        );
        assert_eq!(json["properties"]["name"]["copy_to"][0], "search");
        assert!(json["properties"]["entity_id"].get("copy_to").is_none());
    }
}
