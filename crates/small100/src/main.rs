//! `small100` command-line translator.
//!
//! ```text
//! small100 translate --to fr "Hello world"
//! small100 tokenize "Hello world"
//! small100 languages
//! small100 check
//! ```

#![deny(unsafe_code)]

mod cli;
mod logging;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use small100_engine::{ModelPaths, load_tokenizer};
use small100_settings::{Small100Settings, load_settings, load_settings_from_path};
use tracing::debug;

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let mut settings = match &cli.settings {
        Some(path) => load_settings_from_path(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => load_settings().context("failed to load settings")?,
    };

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| settings.logging.level.clone());
    logging::init_subscriber(&level, cli.log_format);
    debug!(settings = ?cli.settings, level = %level, "small100 starting");

    match cli.command {
        Command::Translate {
            to,
            from,
            model,
            beams,
            max_new_tokens,
            json,
            text,
        } => {
            model.apply(&mut settings);
            if let Some(beams) = beams {
                settings.decoder.num_beams = beams;
            }
            if let Some(max) = max_new_tokens {
                settings.translation.max_new_tokens = max;
            }
            translate(&settings, &text, &from, &to, json).await
        }
        Command::Tokenize { model, text } => {
            model.apply(&mut settings);
            let (tokenizer, _) = load_tokenizer(&ModelPaths::from_settings(&settings.model))?;
            for id in tokenizer.encode(&text) {
                println!("{id}\t{}", tokenizer.decode_token(id));
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Languages { model, code } => {
            model.apply(&mut settings);
            let (_, languages) = load_tokenizer(&ModelPaths::from_settings(&settings.model))?;
            if let Some(code) = code {
                let supported = languages.supports(&code);
                println!("{code}: {}", if supported { "supported" } else { "unsupported" });
                return Ok(if supported {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::FAILURE
                });
            }
            for code in languages.codes() {
                println!("{code}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Check { model } => {
            model.apply(&mut settings);
            Ok(check(&settings))
        }
    }
}

#[cfg(feature = "ort")]
async fn translate(
    settings: &Small100Settings,
    text: &str,
    from: &str,
    to: &str,
    json: bool,
) -> Result<ExitCode> {
    use small100_engine::{OnnxSeq2Seq, Translator};

    let translator = Translator::<OnnxSeq2Seq>::load(settings)
        .await
        .context("failed to load translator")?;
    let translation = translator.translate(text, from, to).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&translation)?);
    } else {
        println!("{}", translation.text);
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(not(feature = "ort"))]
async fn translate(
    _settings: &Small100Settings,
    _text: &str,
    _from: &str,
    _to: &str,
    _json: bool,
) -> Result<ExitCode> {
    anyhow::bail!("translation needs the `ort` feature")
}

fn check(settings: &Small100Settings) -> ExitCode {
    let dir = settings.model.resolved_dir();
    let paths = ModelPaths::from_settings(&settings.model);
    if paths.all_exist() {
        println!("model ready at {}", dir.display());
        return ExitCode::SUCCESS;
    }
    for path in paths.missing() {
        eprintln!("missing: {}", path.display());
    }
    ExitCode::FAILURE
}
