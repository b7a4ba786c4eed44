//! # small100-settings
//!
//! Configuration for the SMALL100 translation engine.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** ([`Small100Settings::default()`])
//! 2. **User file** `~/.small100/settings.json` (deep-merged over defaults)
//! 3. **Environment variables** `SMALL100_*` overrides (highest priority)
//!
//! ## Crate Position
//!
//! Standalone (no small100 crate dependencies).
//! Depended on by: small100-engine, small100.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, deep_merge, load_settings, load_settings_from_path, load_with_env,
    settings_path,
};
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_exports_work() {
        let _settings = Small100Settings::default();
        let _path = settings_path();
    }

    #[test]
    fn default_settings_match_engine_constants() {
        let settings = Small100Settings::default();
        assert_eq!(settings.decoder.num_beams, 5);
        assert_eq!(settings.translation.max_new_tokens, 256);
        assert_eq!(settings.model.encoder_file, "encoder_int8.onnx");
        assert_eq!(settings.model.decoder_file, "decoder_int8.onnx");
    }
}
