// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Special attribute registry
//!
//! Pseudo-attributes whose translation needs more than a plain term or range
//! lookup. Each code maps to one closed policy variant; the translator
//! matches on the variant.
//!
//! ```text
//! stock.is_in_stock   → Boolean(stock.is_in_stock)
//! is_saleable         → Boolean(stock.is_in_stock)
//! type_id             → Terms(type_id)
//! price.is_discount   → CustomerGroupScoped(price / price.customer_group_id / price.is_discount)
//! price.final_price   → CustomerGroupScoped(price / price.customer_group_id / price.final_price)
//! created_at          → RelativeDate(created_at)
//! search              → Fulltext
//! ```

use std::collections::HashMap;

/// Translation policy of one special attribute
#[derive(Debug, Clone, PartialEq)]
pub enum SpecialAttribute {
    /// Truthiness test against a pre-indexed boolean field
    Boolean { field: String },
    /// Term/terms test against a pre-indexed categorical field
    Terms { field: String },
    /// Condition on a per-customer-group sub-document
    CustomerGroupScoped {
        path: String,
        scope_field: String,
        field: String,
        /// Coerce the operand to a boolean
        boolean: bool,
    },
    /// "Age in days" compared against a date field
    RelativeDate { field: String },
    /// Delegated to the fulltext query builder
    Fulltext,
}

/// Attribute code → policy
#[derive(Debug, Clone, Default)]
pub struct SpecialAttributeRegistry {
    policies: HashMap<String, SpecialAttribute>,
}

impl SpecialAttributeRegistry {
    /// Empty registry: every attribute is translated as a standard one
    pub fn new() -> Self {
        Self {
            policies: HashMap::new(),
        }
    }

    /// Registry with the catalog's stock, price, date and fulltext attributes
    pub fn catalog_defaults() -> Self {
        Self::new()
            .with(
                "stock.is_in_stock",
                SpecialAttribute::Boolean {
                    field: "stock.is_in_stock".to_string(),
                },
            )
            .with(
                "is_saleable",
                SpecialAttribute::Boolean {
                    field: "stock.is_in_stock".to_string(),
                },
            )
            .with(
                "type_id",
                SpecialAttribute::Terms {
                    field: "type_id".to_string(),
                },
            )
            .with(
                "price.is_discount",
                SpecialAttribute::CustomerGroupScoped {
                    path: "price".to_string(),
                    scope_field: "price.customer_group_id".to_string(),
                    field: "price.is_discount".to_string(),
                    boolean: true,
                },
            )
            .with(
                "price.final_price",
                SpecialAttribute::CustomerGroupScoped {
                    path: "price".to_string(),
                    scope_field: "price.customer_group_id".to_string(),
                    field: "price.final_price".to_string(),
                    boolean: false,
                },
            )
            .with(
                "created_at",
                SpecialAttribute::RelativeDate {
                    field: "created_at".to_string(),
                },
            )
            .with("search", SpecialAttribute::Fulltext)
    }

    pub fn with(mut self, code: impl Into<String>, policy: SpecialAttribute) -> Self {
        self.register(code, policy);
        self
    }

    /// Register or replace the policy for `code`
    pub fn register(&mut self, code: impl Into<String>, policy: SpecialAttribute) {
        self.policies.insert(code.into(), policy);
    }

    pub fn get(&self, code: &str) -> Option<&SpecialAttribute> {
        self.policies.get(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.policies.contains_key(code)
    }

    /// Registered codes, sorted
    pub fn codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.policies.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saleable_redefined_on_stock() {
        let registry = SpecialAttributeRegistry::catalog_defaults();
        assert_eq!(
            registry.get("is_saleable"),
            Some(&SpecialAttribute::Boolean {
                field: "stock.is_in_stock".to_string()
            })
        );
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = SpecialAttributeRegistry::catalog_defaults();
        registry.register("type_id", SpecialAttribute::Fulltext);
        assert_eq!(registry.get("type_id"), Some(&SpecialAttribute::Fulltext));
        assert!(!registry.contains("color"));
    }

    #[test]
    fn test_codes_sorted() {
        let registry = SpecialAttributeRegistry::new()
            .with("b", SpecialAttribute::Fulltext)
            .with("a", SpecialAttribute::Fulltext);
        assert_eq!(registry.codes(), vec!["a", "b"]);
    }
}
