//! Language-control tokens (`__<code>__`) loaded from `added_tokens.json`.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::errors::{Result, TokenizerError};

/// Mapping from `__<code>__` control tokens to their ids.
///
/// Keys are not validated: anything that is not wrapped in double
/// underscores is kept but never returned by [`LanguageTokens::codes`].
#[derive(Clone, Debug, Default)]
pub struct LanguageTokens {
    tokens: HashMap<String, u32>,
}

impl LanguageTokens {
    /// Wrap an already-parsed token map.
    pub fn from_map(tokens: HashMap<String, u32>) -> Self {
        Self { tokens }
    }

    /// Parse an `added_tokens.json` document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let tokens: HashMap<String, u32> = serde_json::from_str(json)?;
        Ok(Self::from_map(tokens))
    }

    /// Load `added_tokens.json` from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let langs = Self::from_json_str(&content)?;
        debug!(path = %path.display(), count = langs.len(), "language tokens loaded");
        Ok(langs)
    }

    /// Id of the control token for `code` (e.g. `"vi"` → `__vi__`).
    pub fn id_for(&self, code: &str) -> Result<u32> {
        self.tokens
            .get(&control_token(code))
            .copied()
            .ok_or_else(|| TokenizerError::UnknownLanguage(code.to_string()))
    }

    /// Whether `code` has a control token.
    pub fn supports(&self, code: &str) -> bool {
        self.tokens.contains_key(&control_token(code))
    }

    /// Supported language codes, underscores stripped, sorted.
    pub fn codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self
            .tokens
            .keys()
            .filter_map(|key| {
                key.strip_prefix("__")
                    .and_then(|rest| rest.strip_suffix("__"))
                    .filter(|code| !code.is_empty())
                    .map(str::to_string)
            })
            .collect();
        codes.sort_unstable();
        codes
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

fn control_token(code: &str) -> String {
    format!("__{code}__")
}
