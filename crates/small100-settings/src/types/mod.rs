//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]`, so a partial
//! JSON file only needs the keys it changes.

mod model;
mod translation;

pub use model::*;
pub use translation::*;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings type.
///
/// Loaded from `~/.small100/settings.json` with defaults applied for
/// missing fields. Environment variables can override specific values.
///
/// ```json
/// {
///   "decoder": { "numBeams": 3 },
///   "translation": { "defaultTargetLanguage": "vi" }
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Small100Settings {
    /// Beam-search parameters.
    pub decoder: DecoderSettings,
    /// Per-request translation behaviour.
    pub translation: TranslationSettings,
    /// Model file locations and runtime options.
    pub model: ModelSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl Small100Settings {
    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.decoder.num_beams == 0 || self.decoder.num_beams > MAX_NUM_BEAMS {
            return Err(SettingsError::InvalidValue(format!(
                "decoder.numBeams must be between 1 and {MAX_NUM_BEAMS}, got {}",
                self.decoder.num_beams
            )));
        }
        if !self.decoder.repetition_penalty.is_finite() || self.decoder.repetition_penalty < 1.0 {
            return Err(invalid("decoder.repetitionPenalty must be >= 1.0"));
        }
        if !self.decoder.length_penalty.is_finite() {
            return Err(invalid("decoder.lengthPenalty must be finite"));
        }
        if self.translation.max_new_tokens == 0 {
            return Err(invalid("translation.maxNewTokens must be at least 1"));
        }
        if self.model.intra_threads == 0 {
            return Err(invalid("model.intraThreads must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> SettingsError {
    SettingsError::InvalidValue(msg.to_string())
}

/// Logging configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}
