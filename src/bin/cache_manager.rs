use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use yt_dualsub::cache::{FileStore, TranscriptCache};
use yt_dualsub::config::{Config, DurableBackend};
use yt_dualsub::orchestrator::TranscriptOrchestrator;

#[derive(Parser)]
#[command(name = "cache-manager")]
#[command(about = "Transcript cache management utility")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to the standard search paths)
    #[arg(long)]
    config: Option<String>,

    /// Transcript directory for file store commands, overriding configuration
    #[arg(long)]
    cache_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the cached transcript for a video
    Show {
        video_id: String,
        /// Print the full transcript as JSON
        #[arg(long)]
        json: bool,
    },
    /// Resolve a transcript through the full pipeline, caching it
    Resolve {
        video_id: String,
        /// Target language (defaults to configuration)
        #[arg(long)]
        lang: Option<String>,
    },
    /// File store statistics
    Stats,
    /// List file store entries
    List,
    /// Remove expired file store entries
    Cleanup,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("yt_dualsub=info,cache_manager=info,warn")
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    info!("📄 Configuration: {}", config.source_description());
    if let Some(dir) = cli.cache_dir {
        config.cache.backend = DurableBackend::File;
        config.cache.cache_dir = dir;
    }

    let file_store = || -> Result<FileStore> {
        if config.cache.backend != DurableBackend::File {
            return Err(anyhow!(
                "this command needs the file backend; set cache.backend = \"File\" or pass --cache-dir"
            ));
        }
        Ok(FileStore::new(config.cache.cache_dir.clone()))
    };

    match &cli.command {
        Commands::Show { video_id, json } => {
            let cache = TranscriptCache::from_config(&config.cache);
            match cache.get(video_id).await {
                Some(transcript) if *json => println!("{}", serde_json::to_string_pretty(&transcript)?),
                Some(transcript) => {
                    info!(
                        "📚 {} ({}): {} segments, {} translated, origin {}, generated {}",
                        transcript.video_id,
                        transcript.target_language,
                        transcript.len(),
                        transcript.translated_count(),
                        transcript.origin,
                        transcript.generated_at.to_rfc3339()
                    );
                    for segment in &transcript.segments {
                        info!(
                            "  [{:>7.1} - {:>7.1}] {} | {}",
                            segment.start, segment.end, segment.source_text, segment.translated_text
                        );
                    }
                }
                None => warn!("📭 No cached transcript for {}", video_id),
            }
        }

        Commands::Resolve { video_id, lang } => {
            let cache = Arc::new(TranscriptCache::from_config(&config.cache));
            let orchestrator = TranscriptOrchestrator::from_config(&config, cache);
            let transcript = orchestrator
                .resolve(video_id, lang.as_deref().unwrap_or_default())
                .await?;
            info!(
                "✅ {} transcript for {}: {} segments in {}",
                transcript.source_label,
                transcript.video_id,
                transcript.len(),
                transcript.target_language
            );
        }

        Commands::Stats => {
            let store = file_store()?;
            let stats = store.stats().await?;
            info!("📊 Cache Statistics ({}):", store.cache_dir().display());
            info!("  Total files: {}", stats.total_files);
            info!("  Valid files: {}", stats.valid_files);
            info!("  Expired files: {}", stats.expired_files);
            info!("  Unreadable files: {}", stats.unreadable_files);
        }

        Commands::List => {
            let entries = file_store()?.list_entries().await?;
            if entries.is_empty() {
                info!("📭 No cached transcripts found");
                return Ok(());
            }

            info!("📚 Found {} cached transcripts:", entries.len());
            for entry in entries {
                let status = if entry.is_valid { "✅ Valid" } else { "❌ Expired" };
                info!(
                    "  {} - {} bytes, {} hours old, {}",
                    entry.key,
                    entry.size_bytes,
                    entry.age_seconds / 3600,
                    status
                );
            }
        }

        Commands::Cleanup => {
            let count = file_store()?.cleanup_expired().await?;
            info!("🗑️ Cleaned up {} expired cache files", count);
        }
    }

    Ok(())
}
