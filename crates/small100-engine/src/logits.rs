//! Adapter from a [`Seq2SeqModel`] to the decoder's [`LogitsSource`].

use std::sync::Arc;

use async_trait::async_trait;
use small100_decoder::{BoxError, LogitsSource};

use crate::context::EncoderContext;
use crate::errors::ResultExt;
use crate::seq2seq::Seq2SeqModel;

/// Logits for one translation: a model plus the encoder output it decodes against.
pub struct ModelLogits<M> {
    model: Arc<M>,
    context: Arc<EncoderContext>,
}

impl<M: Seq2SeqModel> ModelLogits<M> {
    /// Bind `model` to one encoder pass.
    pub fn new(model: Arc<M>, context: Arc<EncoderContext>) -> Self {
        Self { model, context }
    }
}

#[async_trait]
impl<M: Seq2SeqModel> LogitsSource for ModelLogits<M> {
    async fn next_logits(&self, tokens: &[u32]) -> Result<Vec<f32>, BoxError> {
        let model = Arc::clone(&self.model);
        let context = Arc::clone(&self.context);
        let tokens = tokens.to_vec();
        let logits = tokio::task::spawn_blocking(move || model.decode_step(&context, &tokens))
            .await
            .inference("decoder task join")??;
        Ok(logits)
    }

    async fn next_logits_batch(&self, sequences: &[&[u32]]) -> Result<Vec<Vec<f32>>, BoxError> {
        let model = Arc::clone(&self.model);
        let context = Arc::clone(&self.context);
        let sequences: Vec<Vec<u32>> = sequences.iter().map(|s| s.to_vec()).collect();
        let rows = tokio::task::spawn_blocking(move || model.decode_batch(&context, &sequences))
            .await
            .inference("decoder task join")??;
        Ok(rows)
    }
}
