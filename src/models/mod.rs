//! Data models for the forecasting engine
//!
//! This module contains the value records exchanged with callers:
//! - Track: observed positions and intensities of one storm
//! - Forecast: predicted points, method tags and model metadata
//! - Formation: new-formation risk for an arbitrary location

pub mod forecast;
pub mod formation;
pub mod track;

// Re-export all public types for convenient access
pub use forecast::{
    Confidence, ForecastPoint, ForecastResult, ForecastType, MethodTag, ModelInfo, MotionVector,
    UncertaintyBounds,
};
pub use formation::{FormationFactors, FormationLocation, FormationPrediction, RiskLevel};
pub use track::{TrackPoint, validate_track};
