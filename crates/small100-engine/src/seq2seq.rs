//! The blocking encoder/decoder seam the translator drives.

use crate::context::EncoderContext;
use crate::errors::Result;

/// A sequence-to-sequence model split into an encoder pass and decoder steps.
///
/// Methods are synchronous and may block; the translator calls them from
/// `spawn_blocking`.
pub trait Seq2SeqModel: Send + Sync + 'static {
    /// Run the encoder over `input_ids`.
    fn encode(&self, input_ids: &[i64]) -> Result<EncoderContext>;

    /// Vocabulary-length logits for the token after `tokens`.
    fn decode_step(&self, context: &EncoderContext, tokens: &[u32]) -> Result<Vec<f32>>;

    /// Logits for several sequences, one row per input, in order.
    ///
    /// Default: one [`Seq2SeqModel::decode_step`] per sequence.
    fn decode_batch(&self, context: &EncoderContext, sequences: &[Vec<u32>]) -> Result<Vec<Vec<f32>>> {
        sequences
            .iter()
            .map(|tokens| self.decode_step(context, tokens))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    struct LastToken;

    impl Seq2SeqModel for LastToken {
        fn encode(&self, input_ids: &[i64]) -> Result<EncoderContext> {
            EncoderContext::new(Array2::zeros((input_ids.len(), 2)), vec![1; input_ids.len()])
        }

        fn decode_step(&self, _context: &EncoderContext, tokens: &[u32]) -> Result<Vec<f32>> {
            Ok(vec![tokens.last().copied().unwrap_or_default() as f32])
        }
    }

    #[test]
    fn default_batch_preserves_order() {
        let model = LastToken;
        let ctx = model.encode(&[5, 6]).unwrap();
        let rows = model
            .decode_batch(&ctx, &[vec![2, 9], vec![2, 4], vec![2]])
            .unwrap();
        assert_eq!(rows, vec![vec![9.0], vec![4.0], vec![2.0]]);
    }
}
