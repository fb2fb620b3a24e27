//! Observed track model

use crate::geo::Coordinates;
use crate::{ForecastError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One observed position and intensity sample of a storm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    /// Storm identifier (e.g. "AL092024")
    pub id: String,
    /// Storm name
    pub name: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Maximum sustained wind in knots
    #[serde(default)]
    pub max_sustained_wind: Option<f64>,
    /// Central pressure in mb
    #[serde(default)]
    pub central_pressure: Option<f64>,
    /// Observation time
    pub timestamp: DateTime<Utc>,
}

impl TrackPoint {
    /// Create a point without intensity data
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            latitude,
            longitude,
            max_sustained_wind: None,
            central_pressure: None,
            timestamp,
        }
    }

    /// Attach wind and pressure readings
    #[must_use]
    pub fn with_intensity(mut self, wind: Option<f64>, pressure: Option<f64>) -> Self {
        self.max_sustained_wind = wind;
        self.central_pressure = pressure;
        self
    }

    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// Check the track invariants: non-empty, one storm, coordinates in range,
/// strictly ascending timestamps.
pub fn validate_track(points: &[TrackPoint]) -> Result<()> {
    let Some(first) = points.first() else {
        return Err(ForecastError::insufficient_data("any", 1, 0));
    };

    for (index, point) in points.iter().enumerate() {
        if point.id != first.id {
            return Err(ForecastError::invalid_track(format!(
                "point {index} belongs to '{}', expected '{}'",
                point.id, first.id
            )));
        }

        if !point.coordinates().is_valid() {
            return Err(ForecastError::invalid_track(format!(
                "point {index} has out-of-range coordinates ({}, {})",
                point.latitude, point.longitude
            )));
        }
    }

    if let Some(index) = points
        .windows(2)
        .position(|pair| pair[1].timestamp <= pair[0].timestamp)
    {
        return Err(ForecastError::invalid_track(format!(
            "timestamps must strictly increase (points {index} and {})",
            index + 1
        )));
    }

    Ok(())
}
