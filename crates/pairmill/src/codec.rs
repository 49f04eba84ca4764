//! # Encode / Decode
//!
//! Applying learned merges to new bytes, and expanding token ids back to
//! bytes. Encoding replays the rules in their stored order; reordering
//! them changes the output, so the order is part of the tokenizer's
//! contract.

use crate::errors::{PairmillError, PmResult};
use crate::merges::MergeRules;
use crate::sequence::TokenSequence;
use crate::vocab::Vocabulary;

/// Tokenize `bytes`: base byte tokens, then every rule in order.
///
/// Each rule pass is a left-to-right in-place rewrite, so the sequence
/// length never grows.
pub fn encode<B: AsRef<[u8]>>(
    bytes: B,
    rules: &MergeRules,
) -> TokenSequence {
    let mut seq = TokenSequence::from_bytes(bytes);
    for rule in rules.iter() {
        seq.apply_merge(rule);
    }
    seq
}

/// Expand a token sequence back into bytes.
///
/// ## Errors
/// [`PairmillError::TokenOutOfRange`] if the sequence holds an id the
/// vocabulary does not define.
pub fn decode(
    seq: &TokenSequence,
    vocab: &Vocabulary,
) -> PmResult<Vec<u8>> {
    let mut out = Vec::with_capacity(seq.len());
    for &id in seq.tokens() {
        let bytes = vocab.token(id).ok_or(PairmillError::TokenOutOfRange {
            id,
            vocab_size: vocab.len(),
        })?;
        out.extend_from_slice(bytes);
    }
    Ok(out)
}
