// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use filmcam::{AppError, Config, FacingMode};
use std::path::PathBuf;
use tracing::{error, info};
use uuid::Uuid;

mod cli;

#[derive(Parser)]
#[command(name = "filmcam")]
#[command(about = "Capture photos and develop them with film filters")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    /// Config file (default: <config dir>/filmcam/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture a photo and store it
    Capture {
        /// Use an image file as the camera
        #[arg(long, conflicts_with = "pattern")]
        image: Option<PathBuf>,

        /// Use a synthetic test pattern of this native size, e.g. 3840x2160
        #[arg(long, value_parser = cli::parse_dimensions)]
        pattern: Option<(u32, u32)>,

        /// Exposure bias from -2.0 to 2.0
        #[arg(short, long, default_value_t = 0.0, allow_hyphen_values = true)]
        exposure: f64,

        /// Camera to use (user or environment)
        #[arg(short, long)]
        facing: Option<FacingMode>,
    },

    /// Apply a film filter to a stored photo
    Edit {
        /// Photo id (from 'filmcam list')
        photo_id: Uuid,

        /// Filter id (from 'filmcam filters')
        #[arg(short, long)]
        filter: String,
    },

    /// Show the RGB histogram of an image file or stored photo URL
    Histogram {
        /// Local path or storage URL
        source: String,

        /// Print raw bin counts as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the film filter catalog
    Filters,

    /// Render every filter onto a thumbnail of an image
    Previews {
        /// Source image
        path: PathBuf,

        /// Directory for the rendered thumbnails
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List stored photos
    List,

    /// Show the effective configuration
    Config {
        /// Write it back to the config file
        #[arg(long)]
        write: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=filmcam=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    info!(version = env!("GIT_VERSION"), "Starting filmcam");

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!(error = %e, "Command failed");
        if let AppError::Photo(photo) = &e {
            eprintln!("{}", photo.user_message());
        }
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Capture {
            image,
            pattern,
            exposure,
            facing,
        } => {
            let facing = facing.unwrap_or(config.facing);
            cli::capture(&config, image, pattern, exposure, facing).await
        }
        Commands::Edit { photo_id, filter } => cli::edit(&config, photo_id, &filter).await,
        Commands::Histogram { source, json } => cli::histogram(&config, &source, json).await,
        Commands::Filters => {
            cli::list_filters();
            Ok(())
        }
        Commands::Previews { path, output } => cli::previews(&path, &output).await,
        Commands::List => cli::list_photos(&config).await,
        Commands::Config { write } => cli::show_config(&config, cli.config.as_deref(), write),
    }
}
