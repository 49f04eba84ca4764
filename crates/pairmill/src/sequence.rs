//! # Dense Token Sequence
//!
//! The flat token buffer used as trainer input and as the encode/decode
//! working form. Merges rewrite it in place with a two-cursor scan, so the
//! length only ever shrinks.

use crate::merges::MergeRule;
use crate::types::TokenId;

/// A dense, mutable sequence of token ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSequence {
    tokens: Vec<TokenId>,
}

impl TokenSequence {
    /// Base tokenization: one token per input byte.
    pub fn from_bytes<B: AsRef<[u8]>>(bytes: B) -> Self {
        Self {
            tokens: bytes.as_ref().iter().map(|&b| TokenId::from(b)).collect(),
        }
    }

    /// Wrap an existing id buffer.
    pub fn from_tokens(tokens: Vec<TokenId>) -> Self {
        Self { tokens }
    }

    /// The number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Is the sequence empty?
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// View the tokens as a slice.
    pub fn tokens(&self) -> &[TokenId] {
        &self.tokens
    }

    /// Replace the contents with `tokens`.
    pub(crate) fn replace(
        &mut self,
        tokens: Vec<TokenId>,
    ) {
        self.tokens = tokens;
    }

    /// Rewrite every non-overlapping occurrence of `rule.left, rule.right`
    /// (scanning left to right) with `rule.result`.
    pub fn apply_merge(
        &mut self,
        rule: &MergeRule,
    ) {
        let n = self.tokens.len();
        let mut write = 0;
        let mut read = 0;

        while read < n {
            if read + 1 < n
                && self.tokens[read] == rule.left
                && self.tokens[read + 1] == rule.right
            {
                self.tokens[write] = rule.result;
                read += 2;
            } else {
                self.tokens[write] = self.tokens[read];
                read += 1;
            }
            write += 1;
        }

        self.tokens.truncate(write);
    }
}
