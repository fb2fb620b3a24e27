use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tempest_forecast::export::{track_geojson, uncertainty_cone};
use tempest_forecast::{
    ForecastEngine, ForecastError, ForecastService, JsonTrackStore, PersistentCache,
    TempestConfig, logging,
};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "tempest")]
#[command(about = "Storm trajectory and intensity forecasting", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to <config dir>/tempest/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory of <storm_id>.json track files
    #[arg(long, global = true)]
    tracks: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast position and intensity
    Forecast {
        /// Storm identifier, e.g. AL092024
        #[arg(short, long)]
        storm: String,

        /// Hours ahead to forecast (6-120)
        #[arg(long, default_value = "48")]
        hours: u32,

        /// Method (auto, hybrid, extrapolation, persistence)
        #[arg(short, long, default_value = "auto")]
        method: String,

        /// Hours between forecast points
        #[arg(short, long)]
        interval: Option<u32>,

        /// Print the track as a GeoJSON Feature
        #[arg(long)]
        geojson: bool,
    },

    /// Forecast intensity only, holding the current position
    Intensity {
        #[arg(short, long)]
        storm: String,

        #[arg(long, default_value = "48")]
        hours: u32,

        #[arg(short, long)]
        interval: Option<u32>,
    },

    /// Uncertainty cone around the forecast track
    Cone {
        #[arg(short, long)]
        storm: String,

        #[arg(short, long, default_value = "auto")]
        method: String,

        #[arg(long, default_value = "48")]
        hours: u32,
    },

    /// Compare every available method
    Compare {
        #[arg(short, long)]
        storm: String,

        #[arg(long, default_value = "48")]
        hours: u32,
    },

    /// Formation risk at a location
    Formation {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Look-ahead window (24-120)
        #[arg(long)]
        hours: Option<u32>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        match e.downcast_ref::<ForecastError>() {
            Some(forecast_error) => eprintln!("Error: {}", forecast_error.user_message()),
            None => eprintln!("Error: {e:#}"),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = TempestConfig::load_from_path(cli.config.clone())?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    if let Some(tracks) = &cli.tracks {
        config.service.tracks_dir = tracks.display().to_string();
    }
    logging::init(&config.logging);

    let threads = config.service.resolved_worker_threads();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(threads)
        .max_blocking_threads(threads)
        .enable_all()
        .build()
        .context("Failed to start runtime")?;

    runtime.block_on(execute(cli.command, config))
}

async fn execute(command: Commands, config: TempestConfig) -> Result<()> {
    let cache = if config.cache.enabled {
        let location = config.cache.resolved_location();
        match PersistentCache::open(&location) {
            Ok(cache) => Some(cache),
            Err(e) => {
                warn!("Continuing without cache: {:#}", e);
                None
            }
        }
    } else {
        None
    };

    let service = ForecastService::new(
        &config,
        ForecastEngine::new(&config),
        JsonTrackStore::new(&config.service.tracks_dir),
        cache,
    );

    match command {
        Commands::Forecast {
            storm,
            hours,
            method,
            interval,
            geojson,
        } => {
            let result = service.forecast(&storm, hours, interval, &method).await?;
            info!(
                "Forecast for {} used {:?} ({} points)",
                storm,
                result.methods_used,
                result.total_points()
            );
            if geojson {
                let current = service.current_position(&storm).await?;
                print_json(&track_geojson(&current, &result))
            } else {
                print_json(&result)
            }
        }
        Commands::Intensity {
            storm,
            hours,
            interval,
        } => print_json(&service.intensity_forecast(&storm, hours, interval).await?),
        Commands::Cone {
            storm,
            method,
            hours,
        } => {
            let result = service.forecast(&storm, hours, None, &method).await?;
            print_json(&uncertainty_cone(&result))
        }
        Commands::Compare { storm, hours } => print_json(&service.compare(&storm, hours).await?),
        Commands::Formation { lat, lon, hours } => {
            print_json(&service.predict_formation(lat, lon, hours)?)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
