//! Linear-motion extrapolation from recent track history
//!
//! Average speed and heading over the trailing window are projected forward
//! along a great circle from the last observed position.

use super::{forecast_hours, forecast_time};
use crate::config::{BearingMean, ForecastSettings};
use crate::geo;
use crate::models::{Confidence, ForecastPoint, ForecastType, MotionVector, TrackPoint};
use tracing::{debug, info, warn};

/// Wind retained per 24 hours of extrapolation
const WIND_DECAY_PER_DAY: f64 = 0.95;

/// Projects the recent average motion forward
#[derive(Debug, Clone)]
pub struct TrackExtrapolator {
    window: usize,
    bearing_mean: BearingMean,
}

impl TrackExtrapolator {
    #[must_use]
    pub fn new(window: usize, bearing_mean: BearingMean) -> Self {
        Self {
            window: window.max(2),
            bearing_mean,
        }
    }

    #[must_use]
    pub fn from_settings(settings: &ForecastSettings) -> Self {
        Self::new(settings.extrapolation_window, settings.bearing_mean)
    }

    /// Average speed (km/h) and heading over the trailing window.
    ///
    /// Segments with no elapsed time are skipped. Returns `None` with fewer
    /// than two points.
    #[must_use]
    pub fn estimate_motion(&self, history: &[TrackPoint]) -> Option<MotionVector> {
        if history.len() < 2 {
            return None;
        }

        let recent = &history[history.len().saturating_sub(self.window)..];

        let mut total_km = 0.0;
        let mut total_hours = 0.0;
        let mut bearings = Vec::with_capacity(recent.len() - 1);

        for pair in recent.windows(2) {
            let elapsed_hours =
                (pair[1].timestamp - pair[0].timestamp).num_seconds() as f64 / 3600.0;
            if elapsed_hours <= 0.0 {
                debug!(
                    "Skipping segment with no elapsed time at {}",
                    pair[1].timestamp
                );
                continue;
            }

            let from = pair[0].coordinates();
            let to = pair[1].coordinates();
            total_km += geo::distance(from, to);
            total_hours += elapsed_hours;
            bearings.push(geo::bearing(from, to));
        }

        let speed_kph = if total_hours > 0.0 {
            total_km / total_hours
        } else {
            0.0
        };

        let bearing_deg = match self.bearing_mean {
            BearingMean::Arithmetic => geo::arithmetic_mean_bearing(&bearings),
            BearingMean::Circular => geo::circular_mean_bearing(&bearings),
        };

        Some(MotionVector {
            speed_kph,
            bearing_deg,
        })
    }

    /// Extrapolated track; empty when fewer than two history points exist
    #[must_use]
    pub fn forecast(
        &self,
        history: &[TrackPoint],
        hours_ahead: u32,
        interval_hours: u32,
    ) -> Vec<ForecastPoint> {
        let (Some(motion), Some(last)) = (self.estimate_motion(history), history.last()) else {
            warn!("Insufficient data for extrapolation (need at least 2 points)");
            return Vec::new();
        };

        let origin = last.coordinates();
        let last_wind = last.max_sustained_wind.filter(|w| *w > 0.0);

        let forecast: Vec<ForecastPoint> = forecast_hours(hours_ahead, interval_hours)
            .into_iter()
            .map(|hour| {
                let hours = f64::from(hour);
                let position =
                    geo::destination(origin, motion.bearing_deg, motion.speed_kph * hours);

                ForecastPoint {
                    storm_id: last.id.clone(),
                    storm_name: last.name.clone(),
                    forecast_hour: hour,
                    forecast_timestamp: forecast_time(last.timestamp, hour),
                    latitude: position.latitude,
                    longitude: position.longitude,
                    max_wind: last_wind.map(|w| w * WIND_DECAY_PER_DAY.powf(hours / 24.0)),
                    min_pressure: None,
                    forecast_type: ForecastType::Extrapolation,
                    confidence: Confidence::Low,
                    uncertainty: None,
                    motion: Some(motion),
                }
            })
            .collect();

        info!(
            "Generated {} extrapolation points ({:.1} km/h toward {:.0}°)",
            forecast.len(),
            motion.speed_kph,
            motion.bearing_deg
        );
        forecast
    }
}
