//! Model location and runtime settings.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where the model files live and how inference sessions are built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelSettings {
    /// Model directory (may start with `~/`).
    pub dir: String,
    /// Encoder ONNX file name inside `dir`.
    pub encoder_file: String,
    /// Decoder ONNX file name inside `dir`.
    pub decoder_file: String,
    /// Intra-op threads per inference session.
    pub intra_threads: usize,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            dir: "~/.small100/models".to_string(),
            encoder_file: "encoder_int8.onnx".to_string(),
            decoder_file: "decoder_int8.onnx".to_string(),
            intra_threads: 2,
        }
    }
}

impl ModelSettings {
    /// Resolve the model directory, expanding `~/` to the home directory.
    pub fn resolved_dir(&self) -> PathBuf {
        if let Some(rest) = self.dir.strip_prefix("~/") {
            if let Ok(home) = std::env::var("HOME") {
                return PathBuf::from(home).join(rest);
            }
        }
        PathBuf::from(&self.dir)
    }
}
