//! Configuration management for the Tempest forecasting engine
//!
//! Handles loading configuration from files and environment variables,
//! and provides validation for all configuration settings. The loaded
//! value is built once at startup and handed to every component.

use crate::ForecastError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TempestConfig {
    /// Forecast method thresholds
    #[serde(default)]
    pub forecast: ForecastSettings,
    /// Trajectory trend model settings
    #[serde(default)]
    pub trend: TrendSettings,
    /// Request execution settings
    #[serde(default)]
    pub service: ServiceConfig,
    /// Forecast cache settings
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// How per-segment bearings are averaged by the extrapolator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BearingMean {
    /// Plain arithmetic mean; wrong across north (350° and 10° give 180°)
    Arithmetic,
    /// Mean of unit vectors; 350° and 10° give 0°
    #[default]
    Circular,
}

/// Forecast method thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastSettings {
    /// Hours between forecast points when the caller does not specify
    #[serde(default = "default_interval_hours")]
    pub default_interval_hours: u32,
    /// Smallest accepted horizon
    #[serde(default = "default_min_horizon")]
    pub min_horizon_hours: u32,
    /// Largest accepted horizon
    #[serde(default = "default_max_horizon")]
    pub max_horizon_hours: u32,
    /// History length at which `auto` picks the hybrid model
    #[serde(default = "default_auto_hybrid_min")]
    pub auto_hybrid_min_points: usize,
    /// History length the hybrid model needs at all
    #[serde(default = "default_hybrid_min")]
    pub hybrid_min_points: usize,
    /// History length the intensity-only forecast needs
    #[serde(default = "default_intensity_min")]
    pub intensity_min_points: usize,
    /// Trailing points used to estimate motion
    #[serde(default = "default_extrapolation_window")]
    pub extrapolation_window: usize,
    /// Bearing averaging mode
    #[serde(default)]
    pub bearing_mean: BearingMean,
}

/// Trajectory trend model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendSettings {
    /// Width of the prediction interval (0-1)
    #[serde(default = "default_interval_width")]
    pub interval_width: f64,
    /// Prior scale on slope changes; larger is more flexible
    #[serde(default = "default_changepoint_prior_scale")]
    pub changepoint_prior_scale: f64,
    /// Upper bound on candidate changepoints
    #[serde(default = "default_max_changepoints")]
    pub max_changepoints: usize,
    /// Fraction of the history eligible for changepoints
    #[serde(default = "default_changepoint_range")]
    pub changepoint_range: f64,
}

/// Request execution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Per-request computation timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Worker threads; 0 means one per CPU core
    #[serde(default)]
    pub worker_threads: usize,
    /// How far back history is read for a storm
    #[serde(default = "default_lookback")]
    pub lookback_hours: u32,
    /// Directory holding `<storm_id>.json` track files
    #[serde(default = "default_tracks_dir")]
    pub tracks_dir: String,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether forecasts are cached at all
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    /// Cache TTL in seconds
    #[serde(default = "default_cache_ttl")]
    pub ttl_seconds: u64,
    /// Cache directory location
    #[serde(default = "default_cache_location")]
    pub location: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_interval_hours() -> u32 {
    6
}

fn default_min_horizon() -> u32 {
    6
}

fn default_max_horizon() -> u32 {
    120
}

fn default_auto_hybrid_min() -> usize {
    10
}

fn default_hybrid_min() -> usize {
    5
}

fn default_intensity_min() -> usize {
    10
}

fn default_extrapolation_window() -> usize {
    5
}

fn default_interval_width() -> f64 {
    0.8
}

fn default_changepoint_prior_scale() -> f64 {
    0.05
}

fn default_max_changepoints() -> usize {
    25
}

fn default_changepoint_range() -> f64 {
    0.8
}

fn default_timeout() -> u64 {
    30
}

fn default_lookback() -> u32 {
    72
}

fn default_tracks_dir() -> String {
    "tracks".to_string()
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_ttl() -> u64 {
    3600
}

fn default_cache_location() -> String {
    "~/.cache/tempest".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            default_interval_hours: default_interval_hours(),
            min_horizon_hours: default_min_horizon(),
            max_horizon_hours: default_max_horizon(),
            auto_hybrid_min_points: default_auto_hybrid_min(),
            hybrid_min_points: default_hybrid_min(),
            intensity_min_points: default_intensity_min(),
            extrapolation_window: default_extrapolation_window(),
            bearing_mean: BearingMean::default(),
        }
    }
}

impl Default for TrendSettings {
    fn default() -> Self {
        Self {
            interval_width: default_interval_width(),
            changepoint_prior_scale: default_changepoint_prior_scale(),
            max_changepoints: default_max_changepoints(),
            changepoint_range: default_changepoint_range(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            worker_threads: 0,
            lookback_hours: default_lookback(),
            tracks_dir: default_tracks_dir(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            ttl_seconds: default_cache_ttl(),
            location: default_cache_location(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl ServiceConfig {
    /// Computation timeout as a `Duration`
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Resolved worker thread count
    #[must_use]
    pub fn resolved_worker_threads(&self) -> usize {
        if self.worker_threads > 0 {
            self.worker_threads
        } else {
            std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
        }
    }
}

impl CacheConfig {
    /// Cache directory with a leading `~` expanded
    #[must_use]
    pub fn resolved_location(&self) -> PathBuf {
        match self.location.strip_prefix("~/") {
            Some(rest) => {
                dirs::home_dir().map_or_else(|| PathBuf::from(rest), |home| home.join(rest))
            }
            None => PathBuf::from(&self.location),
        }
    }
}

impl TempestConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // TEMPEST_CACHE__TTL_SECONDS=600 style overrides
        builder = builder.add_source(
            Environment::with_prefix("TEMPEST")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: TempestConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tempest").join("config.toml"))
    }

    /// Apply default values to zeroed or empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.forecast.default_interval_hours == 0 {
            self.forecast.default_interval_hours = default_interval_hours();
        }
        if self.forecast.extrapolation_window < 2 {
            self.forecast.extrapolation_window = default_extrapolation_window();
        }
        if self.trend.max_changepoints == 0 {
            self.trend.max_changepoints = default_max_changepoints();
        }
        if self.service.timeout_seconds == 0 {
            self.service.timeout_seconds = default_timeout();
        }
        if self.service.lookback_hours == 0 {
            self.service.lookback_hours = default_lookback();
        }
        if self.service.tracks_dir.is_empty() {
            self.service.tracks_dir = default_tracks_dir();
        }
        if self.cache.ttl_seconds == 0 {
            self.cache.ttl_seconds = default_cache_ttl();
        }
        if self.cache.location.is_empty() {
            self.cache.location = default_cache_location();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_forecast_ranges()?;
        self.validate_trend_settings()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate method thresholds and horizon bounds
    fn validate_forecast_ranges(&self) -> Result<()> {
        let forecast = &self.forecast;

        if forecast.min_horizon_hours == 0
            || forecast.min_horizon_hours > forecast.max_horizon_hours
        {
            return Err(ForecastError::config(format!(
                "Horizon bounds must satisfy 0 < min <= max, got {}..{}",
                forecast.min_horizon_hours, forecast.max_horizon_hours
            ))
            .into());
        }

        if forecast.hybrid_min_points < 5 {
            return Err(ForecastError::config(
                "Hybrid model needs at least 5 history points",
            )
            .into());
        }

        if forecast.auto_hybrid_min_points < forecast.hybrid_min_points {
            return Err(ForecastError::config(
                "Auto hybrid threshold cannot be below the hybrid minimum",
            )
            .into());
        }

        if self.service.timeout_seconds > 600 {
            return Err(ForecastError::config(
                "Forecast timeout cannot exceed 600 seconds",
            )
            .into());
        }

        if self.cache.ttl_seconds > 7 * 24 * 3600 {
            return Err(ForecastError::config(
                "Cache TTL cannot exceed 604800 seconds (1 week)",
            )
            .into());
        }

        Ok(())
    }

    /// Validate trend model parameters
    fn validate_trend_settings(&self) -> Result<()> {
        let trend = &self.trend;

        if !(trend.interval_width > 0.0 && trend.interval_width < 1.0) {
            return Err(ForecastError::config(format!(
                "Trend interval width must be between 0 and 1, got {}",
                trend.interval_width
            ))
            .into());
        }

        if trend.changepoint_prior_scale <= 0.0 {
            return Err(ForecastError::config(
                "Changepoint prior scale must be positive",
            )
            .into());
        }

        if !(trend.changepoint_range > 0.0 && trend.changepoint_range <= 1.0) {
            return Err(ForecastError::config(
                "Changepoint range must be in (0, 1]",
            )
            .into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(ForecastError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(ForecastError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        Ok(())
    }
}
