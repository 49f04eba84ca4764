#![warn(missing_docs)]
//! # `pairmill` Byte-Pair Tokenizer
//!
//! A byte-pair-encoding tokenizer built around an incremental trainer.
//!
//! Input is raw bytes: the base vocabulary is the 256 single-byte tokens,
//! and training greedily replaces the most frequent adjacent token pair
//! with a new token until the vocabulary reaches its target size. There is
//! no pre-tokenization layer; what goes in is what gets merged.
//!
//! ## Client Summary
//!
//! * [`Tokenizer`] - a trained vocabulary + merge-rule bundle; encode,
//!   decode, save, load.
//! * [`Vocabulary`] / [`MergeRules`] / [`TokenSequence`] - the underlying
//!   parts, for callers that need them individually.
//! * [`training::train`] - the trainer entry point over those parts.
//! * [`io`] - the binary tokenizer file format.
//!
//! ## Example
//!
//! ```rust
//! use pairmill::Tokenizer;
//!
//! fn example() -> pairmill::PmResult<()> {
//!     let corpus = std::fs::read("input.txt").unwrap_or_default();
//!     let (tokenizer, report) = Tokenizer::train(&corpus, 512)?;
//!     println!("learned {} merges", report.merges);
//!
//!     let tokens = tokenizer.encode("To be or not to be");
//!     assert_eq!(tokenizer.decode(&tokens)?, b"To be or not to be");
//!     Ok(())
//! }
//! ```
//!
//! ## Training Cost
//!
//! The trainer keeps the token stream in an intrusive linked list indexed
//! by a pair-occurrence table and an indexed max-heap, so each merge costs
//! time proportional to the occurrences it rewrites rather than to the
//! whole corpus. See [`training`] for the cost model.

pub mod io;
pub mod training;

mod codec;
mod errors;
mod merges;
mod sequence;
mod tokenizer;
mod types;
mod vocab;

#[doc(inline)]
pub use codec::{decode, encode};
#[doc(inline)]
pub use errors::*;
#[doc(inline)]
pub use merges::{MergeRule, MergeRules};
#[doc(inline)]
pub use sequence::TokenSequence;
#[doc(inline)]
pub use tokenizer::{MAX_VOCAB_SIZE, Tokenizer};
#[doc(inline)]
pub use training::TrainReport;
#[doc(inline)]
pub use types::{Pair, TokenId};
#[doc(inline)]
pub use vocab::{BASE_TOKENS, TokenDisplay, Vocabulary};
