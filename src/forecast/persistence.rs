//! Zero-movement baseline forecast

use super::{forecast_hours, forecast_time};
use crate::models::{Confidence, ForecastPoint, ForecastType, TrackPoint};

/// Assumes the storm stays where it is with unchanged intensity
pub struct PersistenceForecaster;

impl PersistenceForecaster {
    /// One point per interval, each a copy of the current observation
    #[must_use]
    pub fn forecast(
        current: &TrackPoint,
        hours_ahead: u32,
        interval_hours: u32,
    ) -> Vec<ForecastPoint> {
        forecast_hours(hours_ahead, interval_hours)
            .into_iter()
            .map(|hour| ForecastPoint {
                storm_id: current.id.clone(),
                storm_name: current.name.clone(),
                forecast_hour: hour,
                forecast_timestamp: forecast_time(current.timestamp, hour),
                latitude: current.latitude,
                longitude: current.longitude,
                max_wind: current.max_sustained_wind,
                min_pressure: current.central_pressure,
                forecast_type: ForecastType::Persistence,
                confidence: Confidence::VeryLow,
                uncertainty: None,
                motion: None,
            })
            .collect()
    }
}
