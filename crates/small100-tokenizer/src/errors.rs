//! Tokenizer error types.
//!
//! Encoding and decoding themselves never fail; errors only arise while
//! loading vocabulary data.

use thiserror::Error;

/// Errors that can occur when building a vocabulary or language table.
#[derive(Debug, Error)]
pub enum TokenizerError {
    /// Failed to read a vocabulary file from disk.
    #[error("failed to read vocabulary file: {0}")]
    Io(#[from] std::io::Error),
    /// The vocabulary file is not a JSON object of `token -> id`.
    #[error("failed to parse vocabulary JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Two distinct tokens map to the same id.
    #[error("duplicate token id {id}: {first:?} and {second:?}")]
    DuplicateId {
        /// The id claimed twice.
        id: u32,
        /// The token seen first (in sorted order).
        first: String,
        /// The token that collided with it.
        second: String,
    },
    /// A language code has no `__<code>__` control token.
    #[error("unknown language: {0}")]
    UnknownLanguage(String),
}

/// Result type for tokenizer operations.
pub type Result<T> = std::result::Result<T, TokenizerError>;
