//! ONNX Runtime backend (feature-gated behind `ort`).
//!
//! ONNX tensor shapes use `i64` dimensions while Rust indexing needs `usize`.

use std::path::Path;
use std::sync::Arc;

use ndarray::Array2;
use ort::session::Session;
use ort::value::Tensor;
use small100_settings::Small100Settings;
use tracing::{debug, info};

use crate::context::EncoderContext;
use crate::errors::{Result, ResultExt, TranslateError};
use crate::model::{ModelPaths, load_tokenizer};
use crate::seq2seq::Seq2SeqModel;
use crate::translator::Translator;

/// SMALL100 encoder and decoder sessions.
///
/// Sessions are behind a mutex since `Session::run` requires `&mut self`.
pub struct OnnxSeq2Seq {
    encoder: parking_lot::Mutex<Session>,
    decoder: parking_lot::Mutex<Session>,
}

impl OnnxSeq2Seq {
    /// Load both sessions. Blocking; call from `spawn_blocking`.
    pub fn load(paths: &ModelPaths, intra_threads: usize) -> Result<Self> {
        let missing = paths.missing();
        if !missing.is_empty() {
            let names: Vec<String> = missing.iter().map(|p| p.display().to_string()).collect();
            return Err(TranslateError::ModelNotAvailable(format!(
                "missing model files: {}",
                names.join(", ")
            )));
        }

        let encoder = build_session(&paths.encoder, intra_threads, "load encoder")?;
        debug!(path = %paths.encoder.display(), "loaded encoder");
        let decoder = build_session(&paths.decoder, intra_threads, "load decoder")?;
        debug!(path = %paths.decoder.display(), "loaded decoder");

        info!(intra_threads, "onnx sessions ready");
        Ok(Self {
            encoder: parking_lot::Mutex::new(encoder),
            decoder: parking_lot::Mutex::new(decoder),
        })
    }

    fn run_decoder(
        &self,
        context: &EncoderContext,
        sequences: &[Vec<u32>],
        seq_len: usize,
    ) -> Result<Vec<Vec<f32>>> {
        if seq_len == 0 {
            return Err(TranslateError::Inference("decoder input is empty".into()));
        }
        let batch = sequences.len();
        let src_len = context.seq_len();
        let hidden = context.hidden_size();

        let input_ids: Vec<i64> = sequences
            .iter()
            .flat_map(|s| s.iter().map(|&id| i64::from(id)))
            .collect();
        let hidden_states = context.batched_hidden_states(batch);
        let mask = context.batched_attention_mask(batch);

        let ids_tensor = Tensor::from_array(([batch as i64, seq_len as i64], input_ids))
            .inference("decoder input_ids tensor")?;
        let hidden_tensor = Tensor::from_array((
            [batch as i64, src_len as i64, hidden as i64],
            hidden_states,
        ))
        .inference("encoder_hidden_states tensor")?;
        let mask_tensor = Tensor::from_array(([batch as i64, src_len as i64], mask))
            .inference("encoder_attention_mask tensor")?;

        let mut decoder = self.decoder.lock();
        let outputs = decoder
            .run(ort::inputs![
                "input_ids" => ids_tensor,
                "encoder_hidden_states" => hidden_tensor,
                "encoder_attention_mask" => mask_tensor,
            ])
            .inference("decoder run")?;

        let (shape, logits) = outputs[0]
            .try_extract_tensor::<f32>()
            .inference("extract logits")?;
        let dims: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
        if dims.len() != 3 || dims[0] != batch || dims[1] != seq_len {
            return Err(TranslateError::Inference(format!(
                "unexpected logits shape: {shape:?}"
            )));
        }
        let vocab = dims[2];

        Ok((0..batch)
            .map(|b| {
                let start = (b * seq_len + seq_len - 1) * vocab;
                logits[start..start + vocab].to_vec()
            })
            .collect())
    }
}

fn build_session(path: &Path, intra_threads: usize, context: &str) -> Result<Session> {
    Session::builder()
        .model("session builder")?
        .with_intra_threads(intra_threads)
        .model("set threads")?
        .commit_from_file(path)
        .model(context)
}

impl Seq2SeqModel for OnnxSeq2Seq {
    fn encode(&self, input_ids: &[i64]) -> Result<EncoderContext> {
        let len = input_ids.len();
        let mask = vec![1i64; len];

        let ids_tensor = Tensor::from_array(([1i64, len as i64], input_ids.to_vec()))
            .inference("encoder input_ids tensor")?;
        let mask_tensor = Tensor::from_array(([1i64, len as i64], mask.clone()))
            .inference("encoder attention_mask tensor")?;

        let mut encoder = self.encoder.lock();
        let outputs = encoder
            .run(ort::inputs![
                "input_ids" => ids_tensor,
                "attention_mask" => mask_tensor,
            ])
            .inference("encoder run")?;

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .inference("extract hidden states")?;
        let dims: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
        if dims.len() != 3 || dims[0] != 1 || dims[1] != len {
            return Err(TranslateError::Inference(format!(
                "unexpected encoder output shape: {shape:?}"
            )));
        }
        let hidden = Array2::from_shape_vec((dims[1], dims[2]), data.to_vec())
            .inference("reshape hidden states")?;

        EncoderContext::new(hidden, mask)
    }

    fn decode_step(&self, context: &EncoderContext, tokens: &[u32]) -> Result<Vec<f32>> {
        let mut rows = self.run_decoder(context, &[tokens.to_vec()], tokens.len())?;
        rows.pop()
            .ok_or_else(|| TranslateError::Inference("decoder returned no logits".into()))
    }

    fn decode_batch(
        &self,
        context: &EncoderContext,
        sequences: &[Vec<u32>],
    ) -> Result<Vec<Vec<f32>>> {
        let Some(first) = sequences.first() else {
            return Ok(Vec::new());
        };
        let seq_len = first.len();
        if seq_len > 0 && sequences.iter().all(|s| s.len() == seq_len) {
            return self.run_decoder(context, sequences, seq_len);
        }
        sequences
            .iter()
            .map(|tokens| self.decode_step(context, tokens))
            .collect()
    }
}

impl Translator<OnnxSeq2Seq> {
    /// Load the model named by `settings` and build a translator over it.
    ///
    /// Loads ~300MB of weights; sessions are built on a blocking thread.
    pub async fn load(settings: &Small100Settings) -> Result<Self> {
        let paths = ModelPaths::from_settings(&settings.model);
        info!(dir = %settings.model.resolved_dir().display(), "loading small100 model");
        let (tokenizer, languages) = load_tokenizer(&paths)?;

        let threads = settings.model.intra_threads;
        let model = tokio::task::spawn_blocking(move || OnnxSeq2Seq::load(&paths, threads))
            .await
            .model("task join")??;

        Self::new(Arc::new(model), tokenizer, languages, settings)
    }
}
