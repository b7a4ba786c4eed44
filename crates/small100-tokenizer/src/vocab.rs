//! Bidirectional token ↔ id vocabulary.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::Path;

use tracing::debug;

use crate::errors::{Result, TokenizerError};

/// Begin-of-sequence id (`<s>`).
pub const BOS_ID: u32 = 0;
/// Padding id (`<pad>`).
pub const PAD_ID: u32 = 1;
/// End-of-sequence id (`</s>`). Also used as the decoder start token.
pub const EOS_ID: u32 = 2;
/// Unknown-piece id (`<unk>`).
pub const UNK_ID: u32 = 3;
/// Ids at or above this value are language-control tokens (`__xx__`).
pub const LANGUAGE_TOKEN_THRESHOLD: u32 = 128_000;

/// Immutable bidirectional mapping between token strings and ids.
///
/// Built once from a fully materialized dictionary (usually `vocab.json`).
/// Both directions are unique: constructing from a map where two tokens share
/// an id fails with [`TokenizerError::DuplicateId`].
#[derive(Clone, Debug, Default)]
pub struct Vocabulary {
    token_to_id: HashMap<String, u32>,
    id_to_token: HashMap<u32, String>,
}

impl Vocabulary {
    /// Build a vocabulary, deriving the reverse mapping eagerly.
    pub fn new(token_to_id: HashMap<String, u32>) -> Result<Self> {
        let mut id_to_token: HashMap<u32, String> = HashMap::with_capacity(token_to_id.len());
        for (token, &id) in &token_to_id {
            match id_to_token.entry(id) {
                Entry::Vacant(slot) => {
                    let _ = slot.insert(token.clone());
                }
                Entry::Occupied(slot) => {
                    let (first, second) = if slot.get() <= token {
                        (slot.get().clone(), token.clone())
                    } else {
                        (token.clone(), slot.get().clone())
                    };
                    return Err(TokenizerError::DuplicateId { id, first, second });
                }
            }
        }
        Ok(Self {
            token_to_id,
            id_to_token,
        })
    }

    /// Parse a `vocab.json` document (`{"token": id, ...}`).
    pub fn from_json_str(json: &str) -> Result<Self> {
        let map: HashMap<String, u32> = serde_json::from_str(json)?;
        Self::new(map)
    }

    /// Load a `vocab.json` file from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let vocab = Self::from_json_str(&content)?;
        debug!(path = %path.display(), size = vocab.len(), "vocabulary loaded");
        Ok(vocab)
    }

    /// Id of `token`, if present.
    pub fn id(&self, token: &str) -> Option<u32> {
        self.token_to_id.get(token).copied()
    }

    /// Token string for `id`, if present.
    pub fn token(&self, id: u32) -> Option<&str> {
        self.id_to_token.get(&id).map(String::as_str)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.token_to_id.len()
    }

    /// Whether the vocabulary has no entries.
    pub fn is_empty(&self) -> bool {
        self.token_to_id.is_empty()
    }
}

impl TryFrom<HashMap<String, u32>> for Vocabulary {
    type Error = TokenizerError;

    fn try_from(map: HashMap<String, u32>) -> Result<Self> {
        Self::new(map)
    }
}
