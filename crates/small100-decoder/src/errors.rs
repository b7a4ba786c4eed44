//! Decoder error types.
//!
//! Only configuration and the logits source can fail. The numeric routines
//! in [`crate::logits`] are total.

use thiserror::Error;

/// Boxed error returned by a [`crate::LogitsSource`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors from beam-search decoding.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The decoder configuration is unusable.
    #[error("Invalid decoder config: {0}")]
    InvalidConfig(String),

    /// `decode` was called with no start tokens.
    #[error("Start token sequence is empty")]
    EmptyStart,

    /// The logits source failed (preserves source chain).
    #[error("Logits source failed: {0}")]
    Logits(#[source] BoxError),

    /// A batched logits call returned the wrong number of rows.
    #[error("Logits batch size mismatch: expected {expected}, got {actual}")]
    BatchSize {
        /// Number of beams submitted.
        expected: usize,
        /// Number of logit vectors returned.
        actual: usize,
    },

    /// The cancellation token fired before decoding finished.
    #[error("Decoding cancelled after {steps} steps")]
    Cancelled {
        /// Generation steps completed before cancellation.
        steps: usize,
    },
}

/// Result alias for decoder operations.
pub type Result<T> = std::result::Result<T, DecodeError>;
