//! # Tokenizer
//!
//! The user-facing bundle of a vocabulary and its merge rules: train it
//! from a corpus (or load a saved one), then encode and decode freely.

use std::path::Path;

use crate::codec;
use crate::errors::{PairmillError, PmResult};
use crate::io;
use crate::merges::MergeRules;
use crate::sequence::TokenSequence;
use crate::training::{self, TrainReport};
use crate::types::TokenId;
use crate::vocab::{BASE_TOKENS, Vocabulary};

/// Largest accepted target vocabulary size; keeps ids comfortably inside
/// the packed 64-bit pair keys and the file format's `u32` fields.
pub const MAX_VOCAB_SIZE: usize = 1 << 24;

/// A trained byte-pair tokenizer.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    vocab: Vocabulary,
    rules: MergeRules,
}

impl Tokenizer {
    /// Train a tokenizer on `corpus` up to `vocab_size` tokens.
    ///
    /// Training may stop short of `vocab_size` when the corpus runs out of
    /// mergeable pairs; the report says how far it got.
    ///
    /// ## Errors
    /// [`PairmillError::InvalidArgument`] unless
    /// `256 <= vocab_size <= 2^24`.
    pub fn train<B: AsRef<[u8]>>(
        corpus: B,
        vocab_size: usize,
    ) -> PmResult<(Self, TrainReport)> {
        if !(BASE_TOKENS..=MAX_VOCAB_SIZE).contains(&vocab_size) {
            return Err(PairmillError::InvalidArgument(format!(
                "vocab size {vocab_size} outside {BASE_TOKENS}..={MAX_VOCAB_SIZE}"
            )));
        }

        let mut vocab = Vocabulary::base(vocab_size);
        let mut rules = MergeRules::with_capacity(vocab_size - BASE_TOKENS);
        let mut seq = TokenSequence::from_bytes(corpus);
        let report = training::train(&mut vocab, &mut rules, &mut seq, vocab_size)?;

        Ok((Self { vocab, rules }, report))
    }

    /// Assemble a tokenizer from already-validated parts.
    pub fn from_parts(
        vocab: Vocabulary,
        rules: MergeRules,
    ) -> Self {
        Self { vocab, rules }
    }

    /// Tokenize `bytes` by replaying the learned rules in order.
    pub fn encode<B: AsRef<[u8]>>(
        &self,
        bytes: B,
    ) -> TokenSequence {
        codec::encode(bytes, &self.rules)
    }

    /// Expand a token sequence back into bytes.
    ///
    /// ## Errors
    /// [`PairmillError::TokenOutOfRange`] for ids this tokenizer never
    /// produced.
    pub fn decode(
        &self,
        seq: &TokenSequence,
    ) -> PmResult<Vec<u8>> {
        codec::decode(seq, &self.vocab)
    }

    /// The vocabulary.
    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    /// The merge rules, in application order.
    pub fn rules(&self) -> &MergeRules {
        &self.rules
    }

    /// The number of tokens this tokenizer can produce.
    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    /// A printable rendering of one token.
    pub fn display(
        &self,
        id: TokenId,
    ) -> crate::vocab::TokenDisplay<'_> {
        self.vocab.display(id)
    }

    /// Persist to `path` in the binary tokenizer format.
    pub fn save_to_path<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> PmResult<()> {
        io::save_tokenizer_to_path(path, &self.vocab, &self.rules)
    }

    /// Load a tokenizer previously written by [`Tokenizer::save_to_path`].
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> PmResult<Self> {
        let (vocab, rules) = io::load_tokenizer_from_path(path)?;
        Ok(Self { vocab, rules })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_train_validates_vocab_size() {
        for bad in [0, 1, 255, MAX_VOCAB_SIZE + 1] {
            let err = Tokenizer::train(b"abc", bad).unwrap_err();
            assert!(matches!(err, PairmillError::InvalidArgument(_)));
        }
    }

    #[test]
    fn test_train_encode_decode() {
        let corpus = b"low lower lowest low low";
        let (tokenizer, report) = Tokenizer::train(corpus, 300).unwrap();

        assert_eq!(tokenizer.vocab_size(), 256 + tokenizer.rules().len());
        assert_eq!(report.merges, tokenizer.rules().len());

        let seq = tokenizer.encode(b"lower and lower");
        assert!(seq.len() <= 15);
        assert_eq!(tokenizer.decode(&seq).unwrap(), b"lower and lower");
    }

    #[test]
    fn test_encoding_unseen_bytes_falls_back_to_base() {
        let (tokenizer, _) = Tokenizer::train(b"aaaa", 258).unwrap();
        let seq = tokenizer.encode(b"zq");
        assert_eq!(seq.tokens(), &[122, 113]);
        assert_eq!(tokenizer.decode(&seq).unwrap(), b"zq");
    }
}
