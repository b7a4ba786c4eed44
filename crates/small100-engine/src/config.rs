//! Settings to decoder configuration.

use small100_decoder::DecoderConfig;
use small100_settings::DecoderSettings;
use small100_tokenizer::EOS_ID;

/// Build a [`DecoderConfig`] that stops on the model's EOS id.
pub fn decoder_config(settings: &DecoderSettings) -> DecoderConfig {
    DecoderConfig {
        eos_token_id: EOS_ID,
        num_beams: settings.num_beams,
        length_penalty: settings.length_penalty,
        repetition_penalty: settings.repetition_penalty,
        no_repeat_ngram_size: settings.no_repeat_ngram_size,
    }
}
