// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use sha2::{Digest, Sha256};

/// Composite identity of a compiled category query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub function: String,
    pub store_id: u32,
    pub category_id: u64,
    pub customer_group_id: u32,
    pub disabled_policy: bool,
}

impl CacheKey {
    /// Opaque key for the shared store: `<function>:<sha256 hex of all parts>`
    pub fn storage_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(
            format!(
                "{}|{}|{}|{}|{}",
                self.function,
                self.store_id,
                self.category_id,
                self.customer_group_id,
                u8::from(self.disabled_policy)
            )
            .as_bytes(),
        );
        format!("{}:{}", self.function, hex::encode(hasher.finalize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(category_id: u64, customer_group_id: u32) -> CacheKey {
        CacheKey {
            function: "category_search_query".to_string(),
            store_id: 1,
            category_id,
            customer_group_id,
            disabled_policy: false,
        }
    }

    #[test]
    fn test_storage_key_is_stable() {
        assert_eq!(key(3, 0).storage_key(), key(3, 0).storage_key());
        assert!(key(3, 0).storage_key().starts_with("category_search_query:"));
        // prefix + 64 hex chars
        assert_eq!(key(3, 0).storage_key().len(), "category_search_query:".len() + 64);
    }

    #[test]
    fn test_every_part_matters() {
        let base = key(3, 0);
        assert_ne!(base.storage_key(), key(4, 0).storage_key());
        assert_ne!(base.storage_key(), key(3, 1).storage_key());
        let flagged = CacheKey {
            disabled_policy: true,
            ..base.clone()
        };
        assert_ne!(base.storage_key(), flagged.storage_key());
    }
}
