//! # small100-tokenizer
//!
//! Text ↔ token-id conversion for SMALL100-style `SentencePiece` vocabularies.
//!
//! Tokenization is a greedy longest-match over a fixed vocabulary:
//! - Normalize: prepend `▁` (U+2581) and replace every space with `▁`
//! - Scan left to right, consuming the longest vocabulary piece (≤ 20 chars)
//! - Unmatched characters become `<unk>` (or are dropped if the vocabulary has none)
//!
//! Decoding concatenates pieces, maps `▁` back to spaces and trims.
//!
//! ## Crate Position
//!
//! Standalone (no small100 crate dependencies).
//! Depended on by: small100-engine.

#![deny(unsafe_code)]

pub mod errors;
pub mod languages;
pub mod tokenizer;
pub mod vocab;

pub use errors::{Result, TokenizerError};
pub use languages::LanguageTokens;
pub use tokenizer::{MAX_PIECE_CHARS, SPECIAL_TOKENS, Tokenizer, UNKNOWN_PIECE, WORD_BOUNDARY};
pub use vocab::{BOS_ID, EOS_ID, LANGUAGE_TOKEN_THRESHOLD, PAD_ID, UNK_ID, Vocabulary};
