// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Category entity as read from the catalog platform.
//!
//! # Example
//!
//! ```
//! use catalog_search::catalog::Category;
//! use catalog_search::rule::{Condition, ConditionTree, Operator};
//!
//! let root = Category::root(1, "Root");
//! let shoes = Category::child_of(&root, 2, "Shoes");
//! let red = Category::child_of(&root, 3, "Red shoes")
//!     .virtual_rule(ConditionTree::all(vec![Condition::new("color", Operator::Eq, "red")]))
//!     .virtual_root(2);
//!
//! assert_eq!(shoes.path, vec![1, 2]);
//! assert_eq!(red.level(), 1);
//! assert_eq!(red.path_string(), "1/3");
//! ```

use serde::{Deserialize, Serialize};

use crate::rule::ConditionTree;

/// A catalog category; read-only to this crate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// `None` while the category has never been saved
    pub id: Option<u64>,
    pub name: String,
    /// Ancestor chain from the tree root, including the category itself once saved
    pub path: Vec<u64>,
    pub is_active: bool,
    /// Membership defined by `conditions` instead of explicit assignment
    pub is_virtual: bool,
    /// Ancestor whose query is ANDed into this category's rule
    #[serde(default)]
    pub virtual_root_id: Option<u64>,
    #[serde(default)]
    pub conditions: ConditionTree,
    pub store_id: u32,
    /// Unsaved edit being previewed; never cached
    #[serde(default)]
    pub is_draft: bool,
}

impl Category {
    pub fn new(id: u64, name: impl Into<String>, path: Vec<u64>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
            path,
            is_active: true,
            is_virtual: false,
            virtual_root_id: None,
            conditions: ConditionTree::default(),
            store_id: 0,
            is_draft: false,
        }
    }

    /// Top-of-tree category
    pub fn root(id: u64, name: impl Into<String>) -> Self {
        Self::new(id, name, vec![id])
    }

    /// Saved child of `parent`, in the parent's store
    pub fn child_of(parent: &Category, id: u64, name: impl Into<String>) -> Self {
        let mut path = parent.path.clone();
        path.push(id);
        Self {
            store_id: parent.store_id,
            ..Self::new(id, name, path)
        }
    }

    /// Make this a virtual category driven by `conditions`
    pub fn virtual_rule(mut self, conditions: ConditionTree) -> Self {
        self.is_virtual = true;
        self.conditions = conditions;
        self
    }

    pub fn virtual_root(mut self, root_id: u64) -> Self {
        self.virtual_root_id = Some(root_id);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn draft(mut self) -> Self {
        self.is_draft = true;
        self
    }

    pub fn in_store(mut self, store_id: u32) -> Self {
        self.store_id = store_id;
        self
    }

    /// Depth in the tree; the root is level 0
    pub fn level(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    /// Level-1 ancestor (the store root), or the category itself at level 1
    pub fn store_root_id(&self) -> Option<u64> {
        self.path.get(1).copied()
    }

    pub fn path_string(&self) -> String {
        self.path
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Whether `other` sits strictly below this category
    pub fn is_ancestor_of(&self, other: &Category) -> bool {
        other.path.len() > self.path.len() && other.path.starts_with(&self.path)
    }

    /// Label attached to fragments compiled for this category
    pub fn debug_label(&self) -> String {
        match self.id {
            Some(id) => format!("Category [{}] {} #{}", self.path_string(), self.name, id),
            None => format!("Category [{}] {} (new)", self.path_string(), self.name),
        }
    }
}
