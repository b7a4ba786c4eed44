//! Engine error types.

use small100_decoder::DecodeError;
use small100_tokenizer::TokenizerError;
use thiserror::Error;

/// Errors that can occur while loading a model or translating.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// Model files are missing or failed to load.
    #[error("model not available: {0}")]
    ModelNotAvailable(String),

    /// Encoder or decoder inference failed.
    #[error("inference error: {0}")]
    Inference(String),

    /// The target language has no control token.
    #[error("unsupported target language: {0}")]
    UnknownLanguage(String),

    /// The input text is empty or whitespace.
    #[error("input text is empty")]
    EmptyInput,

    /// Decoding ran past the configured deadline.
    #[error("translation timed out after {timeout_ms}ms")]
    Timeout {
        /// Deadline that elapsed.
        timeout_ms: u64,
    },

    /// Vocabulary or language table could not be loaded.
    #[error("tokenizer error: {0}")]
    Tokenizer(#[from] TokenizerError),

    /// Beam search failed.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Settings are invalid for this engine.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, TranslateError>;

/// Extension trait to reduce `.map_err()` boilerplate when wrapping errors into [`TranslateError`].
pub trait ResultExt<T> {
    /// Wrap the error as [`TranslateError::Inference`] with `context` prefix.
    fn inference(self, context: &str) -> Result<T>;
    /// Wrap the error as [`TranslateError::ModelNotAvailable`] with `context` prefix.
    fn model(self, context: &str) -> Result<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for std::result::Result<T, E> {
    fn inference(self, context: &str) -> Result<T> {
        self.map_err(|e| TranslateError::Inference(format!("{context}: {e}")))
    }
    fn model(self, context: &str) -> Result<T> {
        self.map_err(|e| TranslateError::ModelNotAvailable(format!("{context}: {e}")))
    }
}
