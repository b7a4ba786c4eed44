//! Decoder configuration.

use serde::{Deserialize, Serialize};

use crate::errors::{DecodeError, Result};

/// Largest beam count the search accepts.
pub const MAX_BEAMS: usize = 64;

/// Immutable per-session beam-search parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DecoderConfig {
    /// End-of-sequence token id.
    pub eos_token_id: u32,
    /// Beams kept between generation steps.
    pub num_beams: usize,
    /// Exponent applied to sequence length when normalizing scores.
    pub length_penalty: f32,
    /// Dampening factor (≥ 1) for logits of already-seen tokens.
    pub repetition_penalty: f32,
    /// Size of n-grams that may not repeat; 0 disables blocking.
    pub no_repeat_ngram_size: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            eos_token_id: 2,
            num_beams: 5,
            length_penalty: 1.0,
            repetition_penalty: 1.2,
            no_repeat_ngram_size: 3,
        }
    }
}

impl DecoderConfig {
    /// Candidates kept per beam before the global merge.
    pub fn candidates_per_beam(&self) -> usize {
        self.num_beams.saturating_mul(2)
    }

    /// Reject parameters the search cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.num_beams == 0 || self.num_beams > MAX_BEAMS {
            return Err(DecodeError::InvalidConfig(format!(
                "numBeams must be between 1 and {MAX_BEAMS}, got {}",
                self.num_beams
            )));
        }
        if !self.repetition_penalty.is_finite() || self.repetition_penalty < 1.0 {
            return Err(DecodeError::InvalidConfig(format!(
                "repetitionPenalty must be a finite value >= 1.0, got {}",
                self.repetition_penalty
            )));
        }
        if !self.length_penalty.is_finite() {
            return Err(DecodeError::InvalidConfig(format!(
                "lengthPenalty must be finite, got {}",
                self.length_penalty
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn defaults() {
        let config = DecoderConfig::default();
        assert_eq!(config.eos_token_id, 2);
        assert_eq!(config.num_beams, 5);
        assert!((config.length_penalty - 1.0).abs() < f32::EPSILON);
        assert!((config.repetition_penalty - 1.2).abs() < f32::EPSILON);
        assert_eq!(config.no_repeat_ngram_size, 3);
        assert_eq!(config.candidates_per_beam(), 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn oversized_beam_count_rejected() {
        for bad in [MAX_BEAMS + 1, 100_000_000, usize::MAX] {
            let config = DecoderConfig {
                num_beams: bad,
                ..DecoderConfig::default()
            };
            assert_matches!(config.validate(), Err(DecodeError::InvalidConfig(msg)) if msg.contains("numBeams"));
        }
    }

    #[test]
    fn max_beam_count_allowed() {
        let config = DecoderConfig {
            num_beams: MAX_BEAMS,
            ..DecoderConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_beams_rejected() {
        let config = DecoderConfig {
            num_beams: 0,
            ..DecoderConfig::default()
        };
        assert_matches!(config.validate(), Err(DecodeError::InvalidConfig(msg)) if msg.contains("numBeams"));
    }

    #[test]
    fn repetition_penalty_below_one_rejected() {
        for bad in [0.0, 0.5, f32::NAN, f32::INFINITY] {
            let config = DecoderConfig {
                repetition_penalty: bad,
                ..DecoderConfig::default()
            };
            assert_matches!(config.validate(), Err(DecodeError::InvalidConfig(_)));
        }
    }

    #[test]
    fn repetition_penalty_of_one_allowed() {
        let config = DecoderConfig {
            repetition_penalty: 1.0,
            ..DecoderConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn non_finite_length_penalty_rejected() {
        let config = DecoderConfig {
            length_penalty: f32::NEG_INFINITY,
            ..DecoderConfig::default()
        };
        assert_matches!(config.validate(), Err(DecodeError::InvalidConfig(msg)) if msg.contains("lengthPenalty"));
    }

    #[test]
    fn zero_length_penalty_allowed() {
        let config = DecoderConfig {
            length_penalty: 0.0,
            no_repeat_ngram_size: 0,
            ..DecoderConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn serde_camel_case_with_defaults() {
        let config: DecoderConfig =
            serde_json::from_str(r#"{"numBeams": 2, "noRepeatNgramSize": 0}"#).unwrap();
        assert_eq!(config.num_beams, 2);
        assert_eq!(config.no_repeat_ngram_size, 0);
        assert_eq!(config.eos_token_id, 2);
        let json = serde_json::to_value(&config).unwrap();
        assert!(json.get("repetitionPenalty").is_some());
        assert!(json.get("repetition_penalty").is_none());
    }
}
