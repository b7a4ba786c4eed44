//! Decoder and translation settings.

use serde::{Deserialize, Serialize};

/// Largest accepted `decoder.numBeams`.
pub const MAX_NUM_BEAMS: usize = 64;

/// Beam-search parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DecoderSettings {
    /// Beams kept between generation steps.
    pub num_beams: usize,
    /// Exponent applied to sequence length when ranking beams.
    pub length_penalty: f32,
    /// Dampening factor for already-generated tokens.
    pub repetition_penalty: f32,
    /// Size of n-grams that may not repeat (0 disables).
    pub no_repeat_ngram_size: usize,
}

impl Default for DecoderSettings {
    fn default() -> Self {
        Self {
            num_beams: 5,
            length_penalty: 1.0,
            repetition_penalty: 1.2,
            no_repeat_ngram_size: 3,
        }
    }
}

/// Per-request translation behaviour.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranslationSettings {
    /// Upper bound on generated tokens per translation.
    pub max_new_tokens: usize,
    /// Source language used when the caller passes `auto` or nothing.
    pub default_source_language: String,
    /// Target language used when the caller passes nothing.
    pub default_target_language: String,
    /// Decode deadline in milliseconds (0 = none).
    pub timeout_ms: u64,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            max_new_tokens: 256,
            default_source_language: "en".to_string(),
            default_target_language: "en".to_string(),
            timeout_ms: 0,
        }
    }
}
