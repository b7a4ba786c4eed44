//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use small100_settings::Small100Settings;

use crate::logging::LogFormat;

#[derive(Debug, Parser)]
#[command(name = "small100", version, about = "On-device SMALL100 translation")]
pub struct Cli {
    /// Settings file (default `~/.small100/settings.json`).
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log line format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Translate text into another language.
    Translate {
        /// Target language code, e.g. `fr`.
        #[arg(long)]
        to: String,
        /// Source language code, or `auto`.
        #[arg(long, default_value = "auto")]
        from: String,
        #[command(flatten)]
        model: ModelArgs,
        /// Beam count override.
        #[arg(long)]
        beams: Option<usize>,
        /// Generated token limit override.
        #[arg(long)]
        max_new_tokens: Option<usize>,
        /// Print the full result as JSON.
        #[arg(long)]
        json: bool,
        /// Text to translate.
        text: String,
    },
    /// Show the token ids and pieces for text.
    Tokenize {
        #[command(flatten)]
        model: ModelArgs,
        /// Text to tokenize.
        text: String,
    },
    /// List supported target languages, or check a single code.
    Languages {
        #[command(flatten)]
        model: ModelArgs,
        /// Exit non-zero unless this code is supported.
        code: Option<String>,
    },
    /// Report missing model files.
    Check {
        #[command(flatten)]
        model: ModelArgs,
    },
}

#[derive(Debug, Args)]
pub struct ModelArgs {
    /// Model directory override.
    #[arg(long)]
    pub model_dir: Option<PathBuf>,
}

impl ModelArgs {
    /// Point `settings` at the overridden model directory, if any.
    pub fn apply(&self, settings: &mut Small100Settings) {
        if let Some(dir) = &self.model_dir {
            settings.model.dir = dir.display().to_string();
        }
    }
}
