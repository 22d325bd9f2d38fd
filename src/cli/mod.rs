use clap::{Parser, Subcommand};

use anyhow::{bail, Context, Result};

use crate::config::Config;
use crate::detector;
use crate::fitter::{self, output_filename, FitRequest};

#[derive(Parser)]
#[command(
    name = "formfit",
    version,
    about = "Companion service for the FormFit smart-upload extension"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    Serve(ServeOpts),
    Detect(DetectOpts),
    Fit(FitOpts),
    Config(ConfigOpts),
    Version,
}

#[derive(clap::Args)]
pub struct ServeOpts {
    #[arg(short, long)]
    pub config: Option<String>,
    #[arg(short, long)]
    pub port: Option<u16>,
    #[arg(short, long)]
    pub bind: Option<String>,
}

#[derive(clap::Args)]
pub struct DetectOpts {
    #[arg(short, long)]
    pub config: Option<String>,
    /// Text to scan; use --file to read it from disk instead.
    pub text: Option<String>,
    #[arg(short, long)]
    pub file: Option<String>,
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args)]
pub struct FitOpts {
    #[arg(short, long)]
    pub config: Option<String>,
    pub input: String,
    pub output: Option<String>,
    #[arg(long)]
    pub width: Option<u32>,
    #[arg(long)]
    pub height: Option<u32>,
    #[arg(long = "max-size-kb")]
    pub max_size_kb: Option<u32>,
    #[arg(short, long)]
    pub encoding: Option<String>,
    /// Derive missing constraints by running detection over this text.
    #[arg(short, long)]
    pub text: Option<String>,
}

#[derive(clap::Args)]
pub struct ConfigOpts {
    #[arg(short, long)]
    pub config: Option<String>,
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    Show,
    Validate,
    Init,
}

/// Run the `detect` subcommand.
pub fn run_detect(opts: &DetectOpts) -> Result<()> {
    let text = match (&opts.text, &opts.file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => {
            std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?
        }
        (None, None) => bail!("provide TEXT or --file"),
    };

    let detected = detector::detect(&detector::normalize_text(&text));

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&detected)?);
        return Ok(());
    }

    match detected {
        Some(requirement) => {
            match (requirement.width, requirement.height) {
                (Some(w), Some(h)) => println!("dimensions: {w}x{h} px"),
                _ => println!("dimensions: not detected"),
            }
            match requirement.max_size_kb {
                Some(kb) => println!("max size:   {kb} KB"),
                None => println!("max size:   not detected"),
            }
        }
        None => println!("no requirements detected"),
    }
    Ok(())
}

/// Run the `fit` subcommand.
pub fn run_fit(config: &Config, opts: &FitOpts) -> Result<()> {
    let image =
        std::fs::read(&opts.input).with_context(|| format!("failed to read {}", opts.input))?;

    let detected = opts
        .text
        .as_deref()
        .and_then(|text| detector::detect(&detector::normalize_text(text)));

    let width = opts.width.or(detected.and_then(|d| d.width));
    let height = opts.height.or(detected.and_then(|d| d.height));
    let (Some(width), Some(height)) = (width, height) else {
        bail!("no target dimensions: pass --width/--height or --text containing them");
    };
    let max_size_kb = opts.max_size_kb.or(detected.and_then(|d| d.max_size_kb));

    let encoding = match &opts.encoding {
        Some(s) => s.parse().map_err(anyhow::Error::msg)?,
        None => config.fitter.default_encoding,
    };

    let request = FitRequest {
        image,
        width,
        height,
        max_size_kb,
        encoding,
    };
    let result = fitter::fit(&request)?;

    let output = opts
        .output
        .clone()
        .unwrap_or_else(|| output_filename(&opts.input, encoding));
    std::fs::write(&output, &result.bytes)
        .with_context(|| format!("failed to write {output}"))?;

    println!(
        "{output}: {width}x{height} px, {:.1} KB at quality {:.2} ({} compression steps)",
        result.size_bytes() as f64 / 1024.0,
        result.quality,
        result.iterations
    );
    Ok(())
}
