//! Forecasting engine
//!
//! This module provides the forecasting strategies and the policy that picks
//! among them:
//! - Persistence and linear-motion extrapolation baselines
//! - Changepoint trend fitting for the trajectory, polynomial regression
//!   for intensity, and the combiner that merges both
//! - Climatological formation risk
//! - The orchestrator that validates requests and chains fallbacks

pub mod blend;
pub mod extrapolation;
pub mod formation;
pub mod hybrid;
pub mod intensity;
pub mod orchestrator;
pub mod persistence;
pub mod regression;
pub mod trend;

// Re-export commonly used types from submodules
pub use blend::blend_with_official;
pub use extrapolation::TrackExtrapolator;
pub use formation::{FormationRiskEstimator, FormationZone};
pub use hybrid::HybridForecastCombiner;
pub use intensity::{IntensityEstimate, IntensityModel, IntensityRegressor};
pub use orchestrator::{ForecastEngine, ForecastMethod, ForecastRequest, MethodComparison};
pub use persistence::PersistenceForecaster;
pub use regression::Polynomial;
pub use trend::{ChangepointTrendFitter, FittedTrend, TrendEstimate, TrendFitter, TrendSample};

use chrono::{DateTime, Duration, Utc};

/// Forecast hours for a horizon: `interval, 2·interval, …` up to `hours_ahead`.
pub(crate) fn forecast_hours(hours_ahead: u32, interval_hours: u32) -> Vec<u32> {
    if interval_hours == 0 {
        return Vec::new();
    }
    (1..=hours_ahead / interval_hours)
        .map(|step| step * interval_hours)
        .collect()
}

/// Absolute time of a forecast hour
pub(crate) fn forecast_time(issued_at: DateTime<Utc>, forecast_hour: u32) -> DateTime<Utc> {
    issued_at + Duration::hours(i64::from(forecast_hour))
}
