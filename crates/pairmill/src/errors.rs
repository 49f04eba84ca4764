//! # Error Types

/// Errors from pairmill operations.
#[derive(Debug, thiserror::Error)]
pub enum PairmillError {
    /// A bounded structure (vocabulary, merge rules) is full.
    #[error("{what} capacity ({capacity}) exceeded")]
    CapacityExceeded {
        /// The structure that ran out of room.
        what: &'static str,
        /// Its fixed capacity.
        capacity: usize,
    },

    /// A token id fell outside the vocabulary.
    #[error("token id {id} out of range (vocab size {vocab_size})")]
    TokenOutOfRange {
        /// The offending id.
        id: u32,
        /// The vocabulary size it was checked against.
        vocab_size: usize,
    },

    /// A tokenizer file failed validation on load.
    #[error("corrupt tokenizer file: {0}")]
    Corrupt(String),

    /// A caller-supplied parameter was rejected.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for pairmill operations.
pub type PmResult<T> = std::result::Result<T, PairmillError>;
