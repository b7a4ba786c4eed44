//! # small100-decoder
//!
//! Autoregressive beam search over a next-token logits source.
//!
//! Each generation step expands every active beam:
//! - Repetition penalty on already-seen tokens
//! - Numerically stable log-softmax
//! - EOS suppression while only the seed token is present
//! - Hard n-gram blocking
//! - Top `2 × num_beams` candidates per beam, merged and pruned globally
//!
//! Beams are ranked by `score / len^length_penalty`. The logits source is an
//! injected async trait, so the search knows nothing about the model behind it.
//!
//! ## Crate Position
//!
//! Standalone (no small100 crate dependencies).
//! Depended on by: small100-engine.

#![deny(unsafe_code)]

pub mod beam;
pub mod config;
pub mod errors;
pub mod logits;
pub mod search;
pub mod source;

pub use beam::Beam;
pub use config::{DecoderConfig, MAX_BEAMS};
pub use errors::{BoxError, DecodeError, Result};
pub use logits::{
    apply_repetition_penalty, banned_ngram_tokens, log_softmax, normalized_score,
    would_repeat_ngram,
};
pub use search::{BeamSearchDecoder, SearchOutcome, StopReason};
pub use source::{FnSource, LogitsSource, from_fn};
pub use tokio_util::sync::CancellationToken;
