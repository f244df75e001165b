// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use std::collections::BTreeSet;

/// Category ids already being resolved on the current call path.
///
/// Immutable: descending into a category produces an extended copy with
/// [`Exclusions::with`], so sibling branches never see each other's ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exclusions(BTreeSet<u64>);

impl Exclusions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of this set extended with `id`
    #[must_use]
    pub fn with(&self, id: u64) -> Self {
        let mut ids = self.0.clone();
        ids.insert(id);
        Self(ids)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.0.contains(&id)
    }

    /// Whether any of `ids` is excluded
    pub fn intersects<'a>(&self, ids: impl IntoIterator<Item = &'a u64>) -> bool {
        ids.into_iter().any(|id| self.0.contains(id))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<u64> for Exclusions {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_leaves_original_untouched() {
        let base = Exclusions::new();
        let extended = base.with(3).with(1);

        assert!(base.is_empty());
        assert_eq!(extended.len(), 2);
        assert!(extended.contains(3));
        assert_eq!(extended.iter().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn test_intersects() {
        let ids: Exclusions = [2, 7].into_iter().collect();
        assert!(ids.intersects(&[1, 2]));
        assert!(!ids.intersects(&[1, 3]));
        assert!(!ids.intersects(&[]));
        assert!(ids.intersects(&BTreeSet::from([7, 9])));
    }
}
