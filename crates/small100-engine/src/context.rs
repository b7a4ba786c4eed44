//! Encoder output shared by every decoder step of one translation.

use ndarray::Array2;

use crate::errors::{Result, TranslateError};

/// Encoder hidden states plus the mask they were computed under.
///
/// Built once per translation and never mutated; decoder steps borrow it
/// through an `Arc`.
#[derive(Clone, Debug, PartialEq)]
pub struct EncoderContext {
    hidden_states: Array2<f32>,
    attention_mask: Vec<i64>,
}

impl EncoderContext {
    /// Pair `[S, H]` hidden states with an `S`-long mask.
    pub fn new(hidden_states: Array2<f32>, attention_mask: Vec<i64>) -> Result<Self> {
        if hidden_states.nrows() != attention_mask.len() {
            return Err(TranslateError::Inference(format!(
                "encoder output has {} positions but mask has {}",
                hidden_states.nrows(),
                attention_mask.len()
            )));
        }
        Ok(Self {
            hidden_states,
            attention_mask,
        })
    }

    /// Source sequence length `S`.
    pub fn seq_len(&self) -> usize {
        self.hidden_states.nrows()
    }

    /// Hidden size `H`.
    pub fn hidden_size(&self) -> usize {
        self.hidden_states.ncols()
    }

    /// Hidden states repeated for `batch` rows, flattened as `[batch, S, H]`.
    pub fn batched_hidden_states(&self, batch: usize) -> Vec<f32> {
        let (seq_len, hidden) = self.hidden_states.dim();
        self.hidden_states
            .broadcast((batch, seq_len, hidden))
            .map(|view| view.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Attention mask repeated for `batch` rows, flattened as `[batch, S]`.
    pub fn batched_attention_mask(&self, batch: usize) -> Vec<i64> {
        self.attention_mask.repeat(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions() {
        let ctx = EncoderContext::new(Array2::zeros((3, 8)), vec![1; 3]).unwrap();
        assert_eq!(ctx.seq_len(), 3);
        assert_eq!(ctx.hidden_size(), 8);
        assert_eq!(ctx.batched_attention_mask(1), vec![1, 1, 1]);
    }

    #[test]
    fn batched_buffers_repeat_per_row() {
        let hidden = Array2::from_shape_vec((2, 3), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let ctx = EncoderContext::new(hidden, vec![1, 1]).unwrap();

        let batched = ctx.batched_hidden_states(2);
        assert_eq!(
            batched,
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
        );
        assert_eq!(ctx.batched_attention_mask(3), vec![1; 6]);
    }

    #[test]
    fn batched_buffers_follow_logical_order() {
        let hidden = Array2::from_shape_vec((3, 2), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
            .unwrap()
            .reversed_axes();
        let ctx = EncoderContext::new(hidden, vec![1, 1]).unwrap();
        assert_eq!(ctx.batched_hidden_states(1), vec![1.0, 3.0, 5.0, 2.0, 4.0, 6.0]);
        assert!(ctx.batched_hidden_states(0).is_empty());
    }

    #[test]
    fn rejects_mask_length_mismatch() {
        let err = EncoderContext::new(Array2::zeros((3, 8)), vec![1; 2]).unwrap_err();
        assert!(err.to_string().contains("3 positions"));
    }
}
