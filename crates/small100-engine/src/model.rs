//! Model file layout and path resolution.

use std::path::{Path, PathBuf};

use small100_settings::ModelSettings;
use small100_tokenizer::{LanguageTokens, Tokenizer, Vocabulary};
use tracing::debug;

use crate::errors::{Result, TranslateError};

/// Typed paths for the four files a SMALL100 model directory holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelPaths {
    /// Quantized encoder (`encoder_int8.onnx`).
    pub encoder: PathBuf,
    /// Quantized decoder (`decoder_int8.onnx`).
    pub decoder: PathBuf,
    /// Token vocabulary (`vocab.json`).
    pub vocab: PathBuf,
    /// Language control tokens (`added_tokens.json`).
    pub added_tokens: PathBuf,
}

impl ModelPaths {
    /// All required model filenames.
    pub const NAMES: &[&str] = &[
        "encoder_int8.onnx",
        "decoder_int8.onnx",
        "vocab.json",
        "added_tokens.json",
    ];

    /// Construct paths for all model files under `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            encoder: dir.join("encoder_int8.onnx"),
            decoder: dir.join("decoder_int8.onnx"),
            vocab: dir.join("vocab.json"),
            added_tokens: dir.join("added_tokens.json"),
        }
    }

    /// Paths from settings, honouring custom encoder/decoder file names.
    pub fn from_settings(settings: &ModelSettings) -> Self {
        let dir = settings.resolved_dir();
        Self {
            encoder: dir.join(&settings.encoder_file),
            decoder: dir.join(&settings.decoder_file),
            ..Self::from_dir(&dir)
        }
    }

    /// Check if all four files exist.
    pub fn all_exist(&self) -> bool {
        self.missing().is_empty()
    }

    /// Files that do not exist, in load order.
    pub fn missing(&self) -> Vec<&Path> {
        [
            &self.encoder,
            &self.decoder,
            &self.vocab,
            &self.added_tokens,
        ]
        .into_iter()
        .filter(|p| !p.exists())
        .map(PathBuf::as_path)
        .collect()
    }
}

/// Load the vocabulary and language table, without touching the ONNX files.
pub fn load_tokenizer(paths: &ModelPaths) -> Result<(Tokenizer, LanguageTokens)> {
    for path in [&paths.vocab, &paths.added_tokens] {
        if !path.exists() {
            return Err(TranslateError::ModelNotAvailable(format!(
                "missing {}",
                path.display()
            )));
        }
    }
    let tokenizer = Tokenizer::new(Vocabulary::from_file(&paths.vocab)?);
    let languages = LanguageTokens::from_file(&paths.added_tokens)?;
    debug!(
        vocab_size = tokenizer.vocab_size(),
        unk_id = ?tokenizer.unk_id(),
        languages = languages.len(),
        "tokenizer loaded"
    );
    Ok((tokenizer, languages))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_dir_joins_names() {
        let paths = ModelPaths::from_dir("/models");
        assert_eq!(paths.encoder, PathBuf::from("/models/encoder_int8.onnx"));
        assert_eq!(paths.decoder, PathBuf::from("/models/decoder_int8.onnx"));
        assert_eq!(paths.vocab, PathBuf::from("/models/vocab.json"));
        assert_eq!(paths.added_tokens, PathBuf::from("/models/added_tokens.json"));
    }

    #[test]
    fn names_match_from_dir() {
        let paths = ModelPaths::from_dir("/m");
        let built = [
            &paths.encoder,
            &paths.decoder,
            &paths.vocab,
            &paths.added_tokens,
        ];
        for (name, path) in ModelPaths::NAMES.iter().zip(built) {
            assert!(path.ends_with(name));
        }
    }

    #[test]
    fn from_settings_uses_custom_files() {
        let settings = ModelSettings {
            dir: "/opt/small100".into(),
            encoder_file: "enc.onnx".into(),
            decoder_file: "dec.onnx".into(),
            ..ModelSettings::default()
        };
        let paths = ModelPaths::from_settings(&settings);
        assert_eq!(paths.encoder, PathBuf::from("/opt/small100/enc.onnx"));
        assert_eq!(paths.decoder, PathBuf::from("/opt/small100/dec.onnx"));
        assert_eq!(paths.vocab, PathBuf::from("/opt/small100/vocab.json"));
    }

    #[test]
    fn empty_dir_reports_everything_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = ModelPaths::from_dir(tmp.path());
        assert!(!paths.all_exist());
        assert_eq!(paths.missing().len(), 4);
    }

    #[test]
    fn missing_shrinks_as_files_appear() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ModelPaths::NAMES {
            std::fs::write(tmp.path().join(name), b"x").unwrap();
        }
        let paths = ModelPaths::from_dir(tmp.path());
        assert!(paths.all_exist());

        std::fs::remove_file(&paths.vocab).unwrap();
        assert_eq!(paths.missing(), vec![paths.vocab.as_path()]);
    }

    #[test]
    fn load_tokenizer_reads_both_tables() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = ModelPaths::from_dir(tmp.path());
        std::fs::write(
            &paths.vocab,
            r#"{"<s>": 0, "<pad>": 1, "</s>": 2, "<unk>": 3, "\u2581hi": 4}"#,
        )
        .unwrap();
        std::fs::write(&paths.added_tokens, r#"{"__fr__": 128028}"#).unwrap();

        let (tokenizer, languages) = load_tokenizer(&paths).unwrap();
        assert_eq!(tokenizer.vocab_size(), 5);
        assert_eq!(tokenizer.encode("hi"), vec![4]);
        assert_eq!(languages.id_for("fr").unwrap(), 128_028);
    }

    #[test]
    fn load_tokenizer_reports_missing_vocab() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = ModelPaths::from_dir(tmp.path());
        let err = load_tokenizer(&paths).unwrap_err();
        assert!(matches!(err, TranslateError::ModelNotAvailable(msg) if msg.contains("vocab.json")));
    }
}
