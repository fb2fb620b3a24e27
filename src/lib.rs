//! Tempest - storm trajectory and intensity forecasting
//!
//! This library provides the forecasting engine (geodesic math, motion
//! extrapolation, trend and regression models, method fallback) and the
//! service layer that feeds it stored track history and caches its output.

pub mod cache;
pub mod config;
pub mod error;
pub mod export;
pub mod forecast;
pub mod geo;
pub mod logging;
pub mod models;
pub mod service;
pub mod store;

// Re-export core types for public API
pub use cache::{ForecastCache, PersistentCache};
pub use config::TempestConfig;
pub use error::ForecastError;
pub use forecast::{ForecastEngine, ForecastMethod, ForecastRequest};
pub use models::{ForecastPoint, ForecastResult, FormationPrediction, TrackPoint};
pub use service::ForecastService;
pub use store::{JsonTrackStore, TrackStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, ForecastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
