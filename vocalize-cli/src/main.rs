use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use vocalize_core::{EdgeTts, EdgeTtsConfig, TextToSpeech};

#[derive(Parser, Debug)]
#[command(name = "vocalize")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Convert a text file to synthesized speech audio")]
struct Args {
    /// Path of the UTF-8 text file to read
    input: PathBuf,

    /// Path the synthesized audio is written to
    output: PathBuf,
}

fn main() -> Result<()> {
    setup_tracing();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

async fn async_main() -> Result<()> {
    let args = Args::parse();

    let text = tokio::fs::read_to_string(&args.input)
        .await
        .with_context(|| format!("Failed to read input file {}", args.input.display()))?;
    info!(bytes = text.len(), input = %args.input.display(), "read input text");

    let tts = EdgeTts::new(EdgeTtsConfig::default());
    let audio = tts
        .synthesize(&text, None)
        .await
        .context("Failed to synthesize speech")?;

    tokio::fs::write(&args.output, &audio.data)
        .await
        .with_context(|| format!("Failed to write output file {}", args.output.display()))?;
    info!(
        bytes = audio.data.len(),
        format = %audio.format,
        output = %args.output.display(),
        "wrote synthesized audio"
    );

    Ok(())
}

fn setup_tracing() {
    use tracing_subscriber::fmt;

    // Keep stdout clean; progress goes to stderr.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_ansi(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}
