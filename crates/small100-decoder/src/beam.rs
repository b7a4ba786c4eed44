//! Immutable beam value.

use crate::logits::normalized_score;

/// A candidate output sequence with its cumulative log-probability.
///
/// Beams are never mutated: [`Beam::extend`] returns a new beam. The token
/// sequence is never empty and includes the seed tokens at the front.
#[derive(Clone, Debug, PartialEq)]
pub struct Beam {
    tokens: Vec<u32>,
    score: f32,
    finished: bool,
}

impl Beam {
    /// The initial beam: seed tokens, score 0, not finished.
    pub fn seed(tokens: Vec<u32>) -> Self {
        Self {
            tokens,
            score: 0.0,
            finished: false,
        }
    }

    /// Append `id` with its log-probability, producing a new beam.
    pub fn extend(&self, id: u32, log_prob: f32, eos_token_id: u32) -> Self {
        let mut tokens = Vec::with_capacity(self.tokens.len() + 1);
        tokens.extend_from_slice(&self.tokens);
        tokens.push(id);
        Self {
            tokens,
            score: self.score + log_prob,
            finished: id == eos_token_id,
        }
    }

    /// Token ids, seed included.
    pub fn tokens(&self) -> &[u32] {
        &self.tokens
    }

    /// Consume the beam, returning its tokens.
    pub fn into_tokens(self) -> Vec<u32> {
        self.tokens
    }

    /// Cumulative (unnormalized) log-probability.
    pub fn score(&self) -> f32 {
        self.score
    }

    /// Whether the last token is EOS.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Sequence length, seed included.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the beam holds no tokens (only possible for an empty seed).
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// `score / len^length_penalty`.
    pub fn normalized_score(&self, length_penalty: f32) -> f32 {
        normalized_score(self.score, self.tokens.len(), length_penalty)
    }
}
