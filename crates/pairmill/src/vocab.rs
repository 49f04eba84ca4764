//! # Token Vocabulary
//!
//! Owned byte-string entries indexed by insertion order. The first 256
//! entries are always the single-byte tokens, in byte order; every later
//! entry is the concatenation of two earlier ones.

use core::fmt;

use crate::errors::{PairmillError, PmResult};
use crate::types::TokenId;

/// The number of single-byte base tokens.
pub const BASE_TOKENS: usize = 256;

/// An append-only, capacity-bounded token vocabulary.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    tokens: Vec<Box<[u8]>>,
    capacity: usize,
}

impl Vocabulary {
    /// Create an empty vocabulary bounded by `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tokens: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Create a vocabulary holding the 256 single-byte tokens, bounded by
    /// `capacity` entries.
    ///
    /// Base token `i` decodes to the single byte `i`.
    pub fn base(capacity: usize) -> Self {
        let mut vocab = Self::with_capacity(capacity.max(BASE_TOKENS));
        for byte in 0..=u8::MAX {
            vocab
                .add(vec![byte])
                .expect("base tokens fit any valid capacity");
        }
        vocab
    }

    /// Append a token, returning its id.
    ///
    /// ## Errors
    /// [`PairmillError::CapacityExceeded`] if the vocabulary is full.
    pub fn add(
        &mut self,
        bytes: Vec<u8>,
    ) -> PmResult<TokenId> {
        if self.tokens.len() >= self.capacity {
            return Err(PairmillError::CapacityExceeded {
                what: "vocabulary",
                capacity: self.capacity,
            });
        }
        self.tokens.push(bytes.into_boxed_slice());
        Ok((self.tokens.len() - 1) as TokenId)
    }

    /// Look up the bytes of a token.
    pub fn token(
        &self,
        id: TokenId,
    ) -> Option<&[u8]> {
        self.tokens.get(id as usize).map(AsRef::as_ref)
    }

    /// The number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Is the vocabulary empty?
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The maximum number of tokens this vocabulary can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate over token byte strings in id order.
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.tokens.iter().map(AsRef::as_ref)
    }

    /// A printable rendering of a token, for logs and the REPL.
    ///
    /// Unknown ids render as `[?]`.
    pub fn display(
        &self,
        id: TokenId,
    ) -> TokenDisplay<'_> {
        TokenDisplay(self.token(id))
    }
}

/// Renders a token as `[...]` with printable ASCII shown directly and all
/// other bytes as `\xNN`.
pub struct TokenDisplay<'a>(Option<&'a [u8]>);

impl fmt::Display for TokenDisplay<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let Some(bytes) = self.0 else {
            return write!(f, "[?]");
        };
        write!(f, "[")?;
        for &byte in bytes {
            if (32..127).contains(&byte) {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "\\x{byte:02x}")?;
            }
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_vocab() {
        let vocab = Vocabulary::base(512);
        assert_eq!(vocab.len(), BASE_TOKENS);
        assert_eq!(vocab.capacity(), 512);
        for i in 0..BASE_TOKENS {
            assert_eq!(vocab.token(i as TokenId), Some(&[i as u8][..]));
        }
        assert_eq!(vocab.token(256), None);
    }

    #[test]
    fn test_base_vocab_undersized_capacity() {
        // A capacity below 256 still admits the base tokens.
        let vocab = Vocabulary::base(0);
        assert_eq!(vocab.len(), BASE_TOKENS);
    }

    #[test]
    fn test_add_assigns_sequential_ids() {
        let mut vocab = Vocabulary::base(258);
        assert_eq!(vocab.add(b"ab".to_vec()).unwrap(), 256);
        assert_eq!(vocab.add(b"cd".to_vec()).unwrap(), 257);
        assert_eq!(vocab.token(256), Some(&b"ab"[..]));
    }

    #[test]
    fn test_add_over_capacity() {
        let mut vocab = Vocabulary::base(256);
        let err = vocab.add(b"ab".to_vec()).unwrap_err();
        assert!(matches!(
            err,
            PairmillError::CapacityExceeded { capacity: 256, .. }
        ));
    }

    #[test]
    fn test_token_display() {
        let mut vocab = Vocabulary::base(257);
        vocab.add(vec![b'h', b'i', 0x0a]).unwrap();
        assert_eq!(vocab.display(256).to_string(), "[hi\\x0a]");
        assert_eq!(vocab.display(104).to_string(), "[h]");
        assert_eq!(vocab.display(9999).to_string(), "[?]");
    }
}
