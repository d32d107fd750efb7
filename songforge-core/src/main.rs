//! songforge command-line entry point
//!
//! Reads lyrics, runs the full assembly pipeline with the builtin
//! offline providers, and prints the resulting artifact location.

use anyhow::{bail, Context};
use clap::Parser;
use songforge_common::{EventBus, PipelineConfig};
use songforge_core::orchestrator::{PipelineOrchestrator, SongRequest};
use songforge_core::providers::ProviderSet;
use std::io::Read;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "songforge", version, about = "Assemble a song from lyrics")]
struct Args {
    /// Lyrics file to read ('-' for stdin)
    #[arg(long, conflicts_with = "lyrics")]
    lyrics_file: Option<PathBuf>,

    /// Inline lyric text
    #[arg(long)]
    lyrics: Option<String>,

    /// Genre name or "auto" to infer from mood
    #[arg(long, default_value = "auto")]
    genre: String,

    /// Voice profile passed to the voice provider
    #[arg(long, default_value = "default")]
    voice_profile: String,

    /// Configuration file (TOML); defaults resolve via
    /// SONGFORGE_CONFIG and the platform config directory
    #[arg(long, short)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let lyrics = match (&args.lyrics, &args.lyrics_file) {
        (Some(text), None) => text.clone(),
        (None, Some(path)) if path.as_os_str() == "-" => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Reading lyrics from stdin")?;
            buf
        }
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Reading lyrics from {}", path.display()))?,
        // clap rejects the conflicting-flags case before we get here
        _ => bail!("Provide lyrics with --lyrics or --lyrics-file"),
    };

    let config = PipelineConfig::load(args.config.as_deref())?;
    let providers = ProviderSet::builtin(&config.audio);
    let bus = EventBus::new(64);
    let orchestrator = PipelineOrchestrator::new(config, providers, bus)?;

    let request = SongRequest {
        lyrics,
        voice_profile_id: args.voice_profile,
        genre: args.genre.parse()?,
    };

    // Ctrl-C cancels the run cooperatively
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, cancelling run");
            signal_token.cancel();
        }
    });

    let artifact = orchestrator.run(request, cancel).await?;

    println!("Artifact: {}", artifact.path.display());
    println!("  mood: {}", artifact.mood);
    println!("  genre: {}", artifact.genre);
    println!("  duration: {:.1}s", artifact.duration_seconds);
    if artifact.degraded {
        println!("  degraded: {:?}", artifact.degraded_reasons);
    }
    Ok(())
}
