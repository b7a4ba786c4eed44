//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`Small100Settings::default()`]
//! 2. If `~/.small100/settings.json` exists, deep-merge user values over defaults
//! 3. Apply `SMALL100_*` environment variable overrides (highest priority)
//! 4. Validate the result
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::{MAX_NUM_BEAMS, Small100Settings};

/// Model directory override.
pub const ENV_MODEL_DIR: &str = "SMALL100_MODEL_DIR";
/// Beam count override (1..=64).
pub const ENV_NUM_BEAMS: &str = "SMALL100_NUM_BEAMS";
/// Generation cap override (1..=4096).
pub const ENV_MAX_NEW_TOKENS: &str = "SMALL100_MAX_NEW_TOKENS";
/// Decode deadline override in milliseconds (0..=3600000).
pub const ENV_TIMEOUT_MS: &str = "SMALL100_TIMEOUT_MS";
/// Log filter override.
pub const ENV_LOG_LEVEL: &str = "SMALL100_LOG_LEVEL";
/// Intra-op thread override (1..=64).
pub const ENV_INTRA_THREADS: &str = "SMALL100_INTRA_THREADS";

/// Resolve the path to the settings file (`~/.small100/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".small100").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<Small100Settings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON or the merged values are out of range, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<Small100Settings> {
    load_with_env(path, |name| std::env::var(name).ok())
}

/// Load settings reading overrides through `env` instead of the process environment.
pub fn load_with_env<F>(path: &Path, env: F) -> Result<Small100Settings>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = serde_json::to_value(Small100Settings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let user: Value =
            serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: Small100Settings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings, env);
    settings.validate()?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Integers must parse and fall within range; invalid values are ignored
/// with a warning and the file/default value stays in effect.
pub fn apply_env_overrides<F>(settings: &mut Small100Settings, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    let env = EnvReader(env);

    if let Some(v) = env.string(ENV_MODEL_DIR) {
        settings.model.dir = v;
    }
    if let Some(v) = env.usize(ENV_INTRA_THREADS, 1, 64) {
        settings.model.intra_threads = v;
    }
    if let Some(v) = env.usize(ENV_NUM_BEAMS, 1, MAX_NUM_BEAMS) {
        settings.decoder.num_beams = v;
    }
    if let Some(v) = env.usize(ENV_MAX_NEW_TOKENS, 1, 4096) {
        settings.translation.max_new_tokens = v;
    }
    if let Some(v) = env.u64(ENV_TIMEOUT_MS, 0, 3_600_000) {
        settings.translation.timeout_ms = v;
    }
    if let Some(v) = env.string(ENV_LOG_LEVEL) {
        settings.logging.level = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

struct EnvReader<F>(F);

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, name: &str) -> Option<String> {
        (self.0)(name).filter(|v| !v.is_empty())
    }

    fn u64(&self, name: &str, min: u64, max: u64) -> Option<u64> {
        let val = (self.0)(name)?;
        let result = parse_u64_range(&val, min, max);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid u64 env var, ignoring");
        }
        result
    }

    fn usize(&self, name: &str, min: usize, max: usize) -> Option<usize> {
        let val = (self.0)(name)?;
        let result = parse_usize_range(&val, min, max);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid usize env var, ignoring");
        }
        result
    }
}
