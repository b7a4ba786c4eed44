//! Text-to-text translation: tokenize, encode, beam-search, detokenize.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use small100_decoder::{BeamSearchDecoder, CancellationToken, DecodeError, SearchOutcome};
use small100_settings::{Small100Settings, TranslationSettings};
use small100_tokenizer::{LANGUAGE_TOKEN_THRESHOLD, LanguageTokens, Tokenizer, TokenizerError};
use tracing::{debug, info};

use crate::config::decoder_config;
use crate::errors::{Result, ResultExt, TranslateError};
use crate::logits::ModelLogits;
use crate::seq2seq::Seq2SeqModel;

/// Source code that asks for the configured default source language.
pub const AUTO_LANGUAGE: &str = "auto";

/// A finished translation with its timing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    /// Translated text.
    pub text: String,
    /// Source language after `auto` resolution.
    pub source_language: String,
    /// Target language.
    pub target_language: String,
    /// Encoder input length, language token and EOS included.
    pub input_tokens: usize,
    /// Tokens left after stripping control ids.
    pub output_tokens: usize,
    /// Encoder wall time.
    pub encode_ms: u64,
    /// Beam-search wall time.
    pub decode_ms: u64,
}

/// Translator over any [`Seq2SeqModel`].
///
/// Immutable after construction; concurrent `translate` calls each get their
/// own encoder output and beam pools.
pub struct Translator<M> {
    model: Arc<M>,
    tokenizer: Tokenizer,
    languages: LanguageTokens,
    decoder: BeamSearchDecoder,
    settings: TranslationSettings,
}

impl<M: Seq2SeqModel> Translator<M> {
    /// Assemble a translator, validating `settings`.
    pub fn new(
        model: Arc<M>,
        tokenizer: Tokenizer,
        languages: LanguageTokens,
        settings: &Small100Settings,
    ) -> Result<Self> {
        settings
            .validate()
            .map_err(|e| TranslateError::Config(e.to_string()))?;
        let decoder = BeamSearchDecoder::new(decoder_config(&settings.decoder))?;
        Ok(Self {
            model,
            tokenizer,
            languages,
            decoder,
            settings: settings.translation.clone(),
        })
    }

    /// Sorted target language codes.
    pub fn supported_languages(&self) -> Vec<String> {
        self.languages.codes()
    }

    /// Translate `text` from `source_lang` (or `auto`) into `target_lang`.
    pub async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Translation> {
        self.translate_with_cancel(text, source_lang, target_lang, &CancellationToken::new())
            .await
    }

    /// Like [`Translator::translate`], abandoning the decode when `cancel` fires.
    pub async fn translate_with_cancel(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
        cancel: &CancellationToken,
    ) -> Result<Translation> {
        if text.trim().is_empty() {
            return Err(TranslateError::EmptyInput);
        }
        let source_language = self.resolve_source(source_lang);
        let target_language = self.resolve_target(target_lang);
        let lang_id = self
            .languages
            .id_for(&target_language)
            .map_err(|e| match e {
                TokenizerError::UnknownLanguage(code) => TranslateError::UnknownLanguage(code),
                other => TranslateError::Tokenizer(other),
            })?;

        let input_ids = self.encoder_input(lang_id, text);
        let input_tokens = input_ids.len();

        let started = Instant::now();
        let model = Arc::clone(&self.model);
        let context = tokio::task::spawn_blocking(move || model.encode(&input_ids))
            .await
            .inference("encoder task join")??;
        let encode_ms = started.elapsed().as_millis() as u64;
        debug!(
            input_tokens,
            seq_len = context.seq_len(),
            hidden_size = context.hidden_size(),
            encode_ms,
            "encoder done"
        );

        let started = Instant::now();
        let source = ModelLogits::new(Arc::clone(&self.model), Arc::new(context));
        let outcome = self.search(&source, cancel).await?;
        let decode_ms = started.elapsed().as_millis() as u64;

        let ids = strip_generated(&self.tokenizer, &outcome.tokens);
        let text = self.tokenizer.decode(&ids, true);

        info!(
            source = %source_language,
            target = %target_language,
            input_tokens,
            output_tokens = ids.len(),
            beams = self.decoder.config().num_beams,
            steps = outcome.steps,
            stop = %outcome.stop,
            encode_ms,
            decode_ms,
            "translation complete"
        );

        Ok(Translation {
            text,
            source_language,
            target_language,
            input_tokens,
            output_tokens: ids.len(),
            encode_ms,
            decode_ms,
        })
    }

    async fn search(
        &self,
        source: &ModelLogits<M>,
        cancel: &CancellationToken,
    ) -> Result<SearchOutcome> {
        let timeout_ms = self.settings.timeout_ms;
        let token = cancel.child_token();
        let timer = (timeout_ms > 0).then(|| {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(timeout_ms)).await;
                token.cancel();
            })
        });

        let result = self
            .decoder
            .search(
                &[self.tokenizer.eos_id()],
                self.settings.max_new_tokens,
                source,
                &token,
            )
            .await;
        if let Some(timer) = timer {
            timer.abort();
        }

        match result {
            Err(DecodeError::Cancelled { steps }) if !cancel.is_cancelled() => {
                debug!(steps, timeout_ms, "decode deadline elapsed");
                Err(TranslateError::Timeout { timeout_ms })
            }
            other => other.map_err(TranslateError::from),
        }
    }

    fn resolve_source(&self, code: &str) -> String {
        let code = code.trim();
        if code.is_empty() || code.eq_ignore_ascii_case(AUTO_LANGUAGE) {
            self.settings.default_source_language.clone()
        } else {
            code.to_string()
        }
    }

    fn resolve_target(&self, code: &str) -> String {
        let code = code.trim();
        if code.is_empty() {
            self.settings.default_target_language.clone()
        } else {
            code.to_string()
        }
    }

    fn encoder_input(&self, lang_id: u32, text: &str) -> Vec<i64> {
        let tokens = self.tokenizer.encode(text);
        let mut ids = Vec::with_capacity(tokens.len() + 2);
        ids.push(i64::from(lang_id));
        ids.extend(tokens.into_iter().map(i64::from));
        ids.push(i64::from(self.tokenizer.eos_id()));
        ids
    }
}

/// Generated ids with the seed token, a trailing EOS, control ids and
/// language tokens removed.
pub fn strip_generated(tokenizer: &Tokenizer, tokens: &[u32]) -> Vec<u32> {
    let control = [tokenizer.bos_id(), tokenizer.pad_id(), tokenizer.eos_id()];
    let body = tokens.get(1..).unwrap_or_default();
    let body = body.strip_suffix(&[tokenizer.eos_id()]).unwrap_or(body);
    body.iter()
        .copied()
        .filter(|id| !control.contains(id))
        .filter(|&id| id < LANGUAGE_TOKEN_THRESHOLD)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use small100_tokenizer::Vocabulary;

    fn tokenizer() -> Tokenizer {
        Tokenizer::new(
            Vocabulary::from_json_str(r#"{"<s>": 0, "<pad>": 1, "</s>": 2, "<unk>": 3}"#)
                .unwrap(),
        )
    }

    #[test]
    fn strip_drops_seed_and_trailing_eos() {
        assert_eq!(strip_generated(&tokenizer(), &[2, 10, 11, 2]), vec![10, 11]);
    }

    #[test]
    fn strip_without_eos_keeps_body() {
        assert_eq!(strip_generated(&tokenizer(), &[2, 10, 11]), vec![10, 11]);
    }

    #[test]
    fn strip_filters_control_and_language_ids() {
        assert_eq!(
            strip_generated(&tokenizer(), &[2, 0, 10, 1, 128_005, 11, 2, 12, 2]),
            vec![10, 11, 12]
        );
    }

    #[test]
    fn strip_handles_degenerate_input() {
        let tok = tokenizer();
        assert!(strip_generated(&tok, &[]).is_empty());
        assert!(strip_generated(&tok, &[2]).is_empty());
        assert!(strip_generated(&tok, &[2, 2]).is_empty());
    }
}
