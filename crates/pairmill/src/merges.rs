//! # Merge Rules
//!
//! The ordered list of `(left, right) -> result` replacements learned
//! during training. Append order is the canonical application order for
//! encoding.

use crate::errors::{PairmillError, PmResult};
use crate::types::TokenId;

/// A single learned replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeRule {
    /// The left-hand token of the merged pair.
    pub left: TokenId,
    /// The right-hand token of the merged pair.
    pub right: TokenId,
    /// The token the pair was replaced with.
    pub result: TokenId,
}

/// An append-only, capacity-bounded list of [`MergeRule`]s.
///
/// Invariant: the rule at position `i` has `result == 256 + i`, and both
/// of its source ids are strictly less than `result`.
#[derive(Debug, Clone, Default)]
pub struct MergeRules {
    rules: Vec<MergeRule>,
    capacity: usize,
}

impl MergeRules {
    /// Create an empty rule list bounded by `capacity` rules.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rules: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a rule.
    ///
    /// ## Errors
    /// [`PairmillError::CapacityExceeded`] if the list is full.
    pub fn push(
        &mut self,
        left: TokenId,
        right: TokenId,
        result: TokenId,
    ) -> PmResult<()> {
        if self.rules.len() >= self.capacity {
            return Err(PairmillError::CapacityExceeded {
                what: "merge rules",
                capacity: self.capacity,
            });
        }
        debug_assert!(left < result && right < result);
        self.rules.push(MergeRule {
            left,
            right,
            result,
        });
        Ok(())
    }

    /// The number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Is the rule list empty?
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate over rules in application order.
    pub fn iter(&self) -> impl Iterator<Item = &MergeRule> {
        self.rules.iter()
    }

    /// View the rules as a slice.
    pub fn as_slice(&self) -> &[MergeRule] {
        &self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_preserves_order() {
        let mut rules = MergeRules::with_capacity(2);
        rules.push(97, 98, 256).unwrap();
        rules.push(256, 99, 257).unwrap();

        let collected: Vec<_> = rules.iter().copied().collect();
        assert_eq!(
            collected,
            vec![
                MergeRule {
                    left: 97,
                    right: 98,
                    result: 256
                },
                MergeRule {
                    left: 256,
                    right: 99,
                    result: 257
                },
            ]
        );
    }

    #[test]
    fn test_push_over_capacity() {
        let mut rules = MergeRules::with_capacity(1);
        rules.push(97, 98, 256).unwrap();
        let err = rules.push(256, 99, 257).unwrap_err();
        assert!(matches!(
            err,
            PairmillError::CapacityExceeded { capacity: 1, .. }
        ));
    }
}
