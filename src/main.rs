use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use workout_player::catalog::Catalog;
use workout_player::config::PlayerConfig;
use workout_player::controller::PlaybackController;
use workout_player::playlist::{Playlist, PlaylistMode, SequenceDriver, SequenceStep};
use workout_player::simulator::{SimulatedHost, SimulatedVideo};
use workout_player::video::{embed_url, extract_id, thumbnail_url, VideoDescriptor};

#[derive(Parser)]
#[command(name = "workout-player")]
#[command(version, author = "TigreRoll")]
#[command(about = "Embedded exercise video playback with superset and circuit sequencing")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to the standard search paths)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Catalog JSON file, overriding the configured path
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List catalog categories
    Categories,
    /// List the videos of a category
    Videos {
        /// Category id
        category: String,
        /// Sub-category id, for hierarchical categories
        #[arg(long)]
        sub: Option<String>,
    },
    /// Show the identifier, embed URL and thumbnail for a video URL
    Resolve {
        url: String,
    },
    /// Play a selection from a category against the simulated embed
    Play {
        /// Category id
        category: String,
        /// Sub-category id, for hierarchical categories
        #[arg(long)]
        sub: Option<String>,
        /// single, superset or circuit
        #[arg(long, default_value = "single")]
        mode: PlaylistMode,
        /// Comma-separated listing positions, e.g. 0,2,3
        #[arg(long, value_delimiter = ',', required = true)]
        pick: Vec<usize>,
        /// Simulated video length in seconds
        #[arg(long, default_value_t = 30.0)]
        duration: f64,
        /// Simulated videos never report the ended state
        #[arg(long)]
        silent_end: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "workout_player=debug,info"
    } else {
        "workout_player=info,warn"
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => PlayerConfig::load_from(path)?,
        None => PlayerConfig::load().unwrap_or_else(|e| {
            warn!("Failed to load config, using environment/defaults: {}", e);
            PlayerConfig::from_env().unwrap_or_default()
        }),
    };
    if let Some(catalog) = cli.catalog {
        config.catalog.path = catalog;
    }
    config.validate()?;

    if cli.verbose {
        info!("Verbose logging enabled");
        info!("{}", config.summary());
    }

    match cli.command {
        Commands::Categories => {
            let catalog = Catalog::load(&config.catalog.path).await?;
            info!("📚 {} categories, {} videos", catalog.categories.len(), catalog.video_count());
            for category in &catalog.categories {
                match category.description.as_deref() {
                    Some(description) => println!("{:<16} {} - {}", category.id, category.label, description),
                    None => println!("{:<16} {}", category.id, category.label),
                }
                for sub in &category.sub_categories {
                    println!("  {:<14} {} ({} videos)", sub.id, sub.label, sub.videos.len());
                }
            }
        }

        Commands::Videos { category, sub } => {
            let catalog = Catalog::load(&config.catalog.path).await?;
            let category = catalog
                .category(&category)
                .ok_or_else(|| anyhow!("Category {} not found", category))?;
            let listing = category.listing(sub.as_deref())?;

            if listing.is_empty() {
                info!("📭 No videos in {}", category.label);
                return Ok(());
            }

            for (position, video) in listing.iter().enumerate() {
                match video.video_id() {
                    Some(id) => println!(
                        "{:>3}. {:<32} {:<14} {}",
                        position,
                        video.title,
                        id,
                        thumbnail_url(&config.embed.thumbnail_base, &id)
                    ),
                    None => println!("{:>3}. {:<32} (no video id in {})", position, video.title, video.url),
                }
            }
        }

        Commands::Resolve { url } => {
            let id = extract_id(&url).ok_or_else(|| anyhow!("No video identifier in {}", url))?;
            let video = VideoDescriptor::new(url, "");
            let resolved = video.resolve(&config.offsets)?;
            let src = embed_url(&config.embed.embed_base, &id, resolved.start_offset, resolved.mute)?;

            println!("id:        {}", id);
            println!("embed:     {}", src);
            println!("thumbnail: {}", thumbnail_url(&config.embed.thumbnail_base, &id));
        }

        Commands::Play {
            category,
            sub,
            mode,
            pick,
            duration,
            silent_end,
        } => {
            let catalog = Catalog::load(&config.catalog.path).await?;
            let category = catalog
                .category(&category)
                .ok_or_else(|| anyhow!("Category {} not found", category))?;
            let listing = category.listing(sub.as_deref())?;

            let picked = pick
                .iter()
                .map(|&position| {
                    listing
                        .get(position)
                        .cloned()
                        .ok_or_else(|| anyhow!("No video at position {} ({} listed)", position, listing.len()))
                })
                .collect::<Result<Vec<_>>>()?;

            let playlist = match mode {
                PlaylistMode::Single => {
                    let selected = picked.first().context("Pick a video to play")?;
                    Playlist::single(listing.to_vec(), selected)?
                }
                _ => Playlist::new(mode, picked)?,
            };

            let host = SimulatedHost::new(SimulatedVideo {
                duration,
                reports_end: !silent_end,
            })
            .with_viewer_play(mode == PlaylistMode::Single);
            let controller = PlaybackController::new(config, Arc::new(host));

            run_playlist(SequenceDriver::new(controller, playlist)).await?;
        }
    }

    Ok(())
}

async fn run_playlist(mut driver: SequenceDriver) -> Result<()> {
    let start_time = std::time::Instant::now();
    let session = driver.start().await?;
    info!("▶️ {}: {}", driver.position(), session.video().title);

    loop {
        let step = tokio::select! {
            step = driver.wait_for_completion() => step?,
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted, closing the player");
                driver.dismiss().await;
                return Ok(());
            }
        };

        match step {
            SequenceStep::Advanced { reason, session, .. } => {
                info!("↪️ Previous exercise ended ({:?})", reason);
                info!("▶️ {}: {}", driver.position(), session.video().title);
            }
            SequenceStep::Finished { reason } => {
                info!(
                    "🎉 {} finished in {:.2}s ({:?})",
                    driver.playlist().mode(),
                    start_time.elapsed().as_secs_f64(),
                    reason
                );
                break;
            }
            SequenceStep::Closed => {
                warn!("Session closed before completion");
                break;
            }
        }
    }

    driver.dismiss().await;
    Ok(())
}
