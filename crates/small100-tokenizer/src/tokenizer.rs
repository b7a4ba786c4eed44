//! Greedy longest-match encoder and piece-concatenating decoder.

use crate::vocab::{BOS_ID, EOS_ID, PAD_ID, Vocabulary};

/// `SentencePiece` word-boundary marker (U+2581).
pub const WORD_BOUNDARY: char = '\u{2581}';

/// Longest piece (in characters) tried at each scan position.
///
/// Vocabulary entries longer than this can never be matched.
pub const MAX_PIECE_CHARS: usize = 20;

/// Piece strings dropped by [`Tokenizer::decode`] when skipping special tokens.
pub const SPECIAL_TOKENS: [&str; 4] = ["<s>", "</s>", "<pad>", "<unk>"];

/// Placeholder returned by [`Tokenizer::decode_token`] for unmapped ids.
pub const UNKNOWN_PIECE: &str = "<unknown>";

const UNK_TOKEN: &str = "<unk>";

/// Text ↔ id converter over a fixed [`Vocabulary`].
///
/// Read-only after construction; share it behind an `Arc` across threads.
#[derive(Clone, Debug)]
pub struct Tokenizer {
    vocab: Vocabulary,
    unk_id: Option<u32>,
}

impl Tokenizer {
    /// Create a tokenizer over `vocab`.
    pub fn new(vocab: Vocabulary) -> Self {
        let unk_id = vocab.id(UNK_TOKEN);
        Self { vocab, unk_id }
    }

    /// Number of vocabulary entries.
    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    /// Encode `text` into token ids.
    ///
    /// Empty input normalizes to a lone `▁`, which yields that piece's id if
    /// the vocabulary has one, `<unk>` if not, or nothing when `<unk>` is absent.
    pub fn encode(&self, text: &str) -> Vec<u32> {
        let normalized = normalize(text);

        // Byte offset of every char boundary, so slices never split a codepoint.
        let bounds: Vec<usize> = normalized
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(normalized.len()))
            .collect();
        let char_count = bounds.len() - 1;

        let mut ids = Vec::with_capacity(char_count);
        let mut pos = 0;
        while pos < char_count {
            let max_len = MAX_PIECE_CHARS.min(char_count - pos);
            let matched = (1..=max_len).rev().find_map(|len| {
                self.vocab
                    .id(&normalized[bounds[pos]..bounds[pos + len]])
                    .map(|id| (id, len))
            });

            match matched {
                Some((id, len)) => {
                    ids.push(id);
                    pos += len;
                }
                None => {
                    if let Some(unk) = self.unk_id {
                        ids.push(unk);
                    }
                    pos += 1;
                }
            }
        }
        ids
    }

    /// Decode ids back into text.
    ///
    /// Unmapped ids are skipped. With `skip_special_tokens`, the pieces in
    /// [`SPECIAL_TOKENS`] are dropped as well.
    pub fn decode(&self, ids: &[u32], skip_special_tokens: bool) -> String {
        let joined: String = ids
            .iter()
            .filter_map(|&id| self.vocab.token(id))
            .filter(|piece| !(skip_special_tokens && SPECIAL_TOKENS.contains(piece)))
            .collect();

        joined.replace(WORD_BOUNDARY, " ").trim().to_string()
    }

    /// Piece string for a single id, or [`UNKNOWN_PIECE`].
    pub fn decode_token(&self, id: u32) -> &str {
        self.vocab.token(id).unwrap_or(UNKNOWN_PIECE)
    }

    /// Begin-of-sequence id.
    pub fn bos_id(&self) -> u32 {
        BOS_ID
    }

    /// Padding id.
    pub fn pad_id(&self) -> u32 {
        PAD_ID
    }

    /// End-of-sequence id.
    pub fn eos_id(&self) -> u32 {
        EOS_ID
    }

    /// Id of `<unk>` in this vocabulary, the id `encode` emits for
    /// unmatched characters. `None` when the vocabulary has no `<unk>`.
    pub fn unk_id(&self) -> Option<u32> {
        self.unk_id
    }
}

/// Prepend the boundary marker and replace literal spaces with it.
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + WORD_BOUNDARY.len_utf8());
    out.push(WORD_BOUNDARY);
    for c in text.chars() {
        out.push(if c == ' ' { WORD_BOUNDARY } else { c });
    }
    out
}
