//! Forecast output model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which strategy produced a forecast point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastType {
    Persistence,
    Extrapolation,
    ExtrapolationFallback,
    HybridTrendRegression,
    StatisticalIntensity,
}

/// Coarse reliability label
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    VeryLow,
    Low,
    Medium,
    High,
}

/// Method actually applied to answer a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodTag {
    HybridTrendRegression,
    Extrapolation,
    ExtrapolationFallback,
    Persistence,
    PersistenceFallback,
    StatisticalIntensity,
    Cached,
}

/// Per-axis prediction band and its km summary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UncertaintyBounds {
    pub lat_lower: f64,
    pub lat_upper: f64,
    pub lon_lower: f64,
    pub lon_upper: f64,
    pub radius_km: f64,
}

/// Motion estimate the extrapolator projected with
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionVector {
    /// Average translation speed in km/h
    pub speed_kph: f64,
    /// Average heading in degrees from north
    pub bearing_deg: f64,
}

/// A single predicted position and intensity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub storm_id: String,
    pub storm_name: String,
    /// Hours after the latest observation
    pub forecast_hour: u32,
    pub forecast_timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    /// Predicted maximum sustained wind in knots
    pub max_wind: Option<f64>,
    /// Predicted central pressure in mb
    pub min_pressure: Option<f64>,
    pub forecast_type: ForecastType,
    pub confidence: Confidence,
    #[serde(default)]
    pub uncertainty: Option<UncertaintyBounds>,
    #[serde(default)]
    pub motion: Option<MotionVector>,
}

/// Metadata describing the fitted models behind a forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Trajectory model, absent for intensity-only forecasts
    pub trajectory_model: Option<String>,
    pub intensity_model: String,
    /// History points the models were fitted on
    pub training_samples: usize,
    pub confidence: Confidence,
}

/// Complete answer to a forecast request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub storm_id: String,
    pub storm_name: String,
    /// Timestamp of the latest observation the forecast starts from
    pub issued_at: DateTime<Utc>,
    pub hours_ahead: u32,
    pub interval_hours: u32,
    pub points: Vec<ForecastPoint>,
    pub methods_used: Vec<MethodTag>,
    pub model_info: Option<ModelInfo>,
}

impl ForecastResult {
    /// Number of forecast points
    #[must_use]
    pub fn total_points(&self) -> usize {
        self.points.len()
    }

    /// Point at a given forecast hour, if present
    #[must_use]
    pub fn point_at(&self, forecast_hour: u32) -> Option<&ForecastPoint> {
        self.points.iter().find(|p| p.forecast_hour == forecast_hour)
    }
}

impl ForecastType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ForecastType::Persistence => "persistence",
            ForecastType::Extrapolation => "extrapolation",
            ForecastType::ExtrapolationFallback => "extrapolation_fallback",
            ForecastType::HybridTrendRegression => "hybrid_trend_regression",
            ForecastType::StatisticalIntensity => "statistical_intensity",
        }
    }
}

impl Confidence {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::VeryLow => "very_low",
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

impl MethodTag {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MethodTag::HybridTrendRegression => "hybrid_trend_regression",
            MethodTag::Extrapolation => "extrapolation",
            MethodTag::ExtrapolationFallback => "extrapolation_fallback",
            MethodTag::Persistence => "persistence",
            MethodTag::PersistenceFallback => "persistence_fallback",
            MethodTag::StatisticalIntensity => "statistical_intensity",
            MethodTag::Cached => "cached",
        }
    }
}

impl fmt::Display for ForecastType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for MethodTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&ForecastType::HybridTrendRegression).unwrap(),
            "\"hybrid_trend_regression\""
        );
        assert_eq!(serde_json::to_string(&Confidence::VeryLow).unwrap(), "\"very_low\"");
        assert_eq!(
            serde_json::to_string(&MethodTag::PersistenceFallback).unwrap(),
            "\"persistence_fallback\""
        );
    }

    #[test]
    fn test_display_matches_serde() {
        for tag in [
            ForecastType::Persistence,
            ForecastType::Extrapolation,
            ForecastType::ExtrapolationFallback,
            ForecastType::HybridTrendRegression,
            ForecastType::StatisticalIntensity,
        ] {
            assert_eq!(serde_json::to_string(&tag).unwrap(), format!("\"{tag}\""));
        }
    }

    #[test]
    fn test_confidence_ordering() {
        assert!(Confidence::VeryLow < Confidence::Low);
        assert!(Confidence::Medium < Confidence::High);
    }
}
