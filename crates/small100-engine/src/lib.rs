//! # small100-engine
//!
//! SMALL100 translation pipeline: tokenize, run the encoder once, beam-search
//! the decoder, detokenize.
//!
//! The model sits behind the blocking [`Seq2SeqModel`] trait. The ONNX
//! Runtime implementation is behind the `ort` feature; without it the crate
//! still builds and tests against any other model.
//!
//! ## Crate Position
//!
//! Depends on: small100-tokenizer, small100-decoder, small100-settings.
//! Depended on by: small100.

#![deny(unsafe_code)]

pub mod config;
pub mod context;
pub mod errors;
pub mod logits;
pub mod model;
#[cfg(feature = "ort")]
pub mod onnx;
pub mod seq2seq;
pub mod translator;

pub use config::decoder_config;
pub use context::EncoderContext;
pub use errors::{Result, ResultExt, TranslateError};
pub use logits::ModelLogits;
pub use model::{ModelPaths, load_tokenizer};
#[cfg(feature = "ort")]
pub use onnx::OnnxSeq2Seq;
pub use seq2seq::Seq2SeqModel;
pub use translator::{AUTO_LANGUAGE, Translation, Translator, strip_generated};
