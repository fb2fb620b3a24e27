//! Merges trajectory and intensity predictions into forecast points

use super::{forecast_time, intensity::IntensityEstimate, trend::TrendEstimate};
use crate::geo::{KM_PER_DEGREE, normalize_longitude};
use crate::models::{Confidence, ForecastPoint, ForecastType, TrackPoint, UncertaintyBounds};

/// Radius below which a point is high confidence
pub const HIGH_CONFIDENCE_RADIUS_KM: f64 = 100.0;
/// Radius below which a point is medium confidence
pub const MEDIUM_CONFIDENCE_RADIUS_KM: f64 = 200.0;

/// One step of the trajectory model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryEstimate {
    pub forecast_hour: u32,
    pub latitude: TrendEstimate,
    pub longitude: TrendEstimate,
}

pub struct HybridForecastCombiner;

impl HybridForecastCombiner {
    /// Radius in km of the half-width box spanned by the lat/lon bands
    #[must_use]
    pub fn uncertainty_radius_km(
        lat_lower: f64,
        lat_upper: f64,
        lon_lower: f64,
        lon_upper: f64,
    ) -> f64 {
        let lat_half = (lat_upper - lat_lower) / 2.0;
        let lon_half = (lon_upper - lon_lower) / 2.0;
        KM_PER_DEGREE * (lat_half.powi(2) + lon_half.powi(2)).sqrt()
    }

    /// Confidence tier for an uncertainty radius
    #[must_use]
    pub fn confidence_for_radius(radius_km: f64) -> Confidence {
        if radius_km < HIGH_CONFIDENCE_RADIUS_KM {
            Confidence::High
        } else if radius_km < MEDIUM_CONFIDENCE_RADIUS_KM {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }

    /// Zip trajectory and intensity steps into forecast points.
    ///
    /// Longitudes are wrapped back into (-180, 180]; the band is shifted by
    /// the same amount so it stays centred on the point.
    #[must_use]
    pub fn combine(
        last: &TrackPoint,
        trajectory: &[TrajectoryEstimate],
        intensity: &[IntensityEstimate],
    ) -> Vec<ForecastPoint> {
        trajectory
            .iter()
            .zip(intensity)
            .map(|(step, strength)| {
                let latitude = step.latitude.value.clamp(-90.0, 90.0);
                let longitude = normalize_longitude(step.longitude.value);
                let shift = longitude - step.longitude.value;

                let radius_km = Self::uncertainty_radius_km(
                    step.latitude.lower,
                    step.latitude.upper,
                    step.longitude.lower,
                    step.longitude.upper,
                );

                ForecastPoint {
                    storm_id: last.id.clone(),
                    storm_name: last.name.clone(),
                    forecast_hour: step.forecast_hour,
                    forecast_timestamp: forecast_time(last.timestamp, step.forecast_hour),
                    latitude,
                    longitude,
                    max_wind: Some(strength.wind),
                    min_pressure: Some(strength.pressure),
                    forecast_type: ForecastType::HybridTrendRegression,
                    confidence: Self::confidence_for_radius(radius_km),
                    uncertainty: Some(UncertaintyBounds {
                        lat_lower: step.latitude.lower,
                        lat_upper: step.latitude.upper,
                        lon_lower: step.longitude.lower + shift,
                        lon_upper: step.longitude.upper + shift,
                        radius_km,
                    }),
                    motion: None,
                }
            })
            .collect()
    }
}
