//! Statistical intensity regression
//!
//! Wind and pressure are each fitted with a quadratic against the sample
//! index after forward-filling gaps. Series too sparse to fit fall back to a
//! damped persistence value. All outputs are clipped to physical bounds.

use super::regression::Polynomial;
use crate::models::TrackPoint;
use crate::Result;
use tracing::debug;

/// Polynomial degree used for both series
pub const POLYNOMIAL_DEGREE: usize = 2;
/// Valid samples needed before a series is fitted
pub const MIN_FIT_SAMPLES: usize = 3;

/// Wind bounds in knots
pub const WIND_BOUNDS: (f64, f64) = (25.0, 200.0);
/// Pressure bounds in mb
pub const PRESSURE_BOUNDS: (f64, f64) = (900.0, 1013.0);

const DEFAULT_WIND: f64 = 50.0;
const DEFAULT_PRESSURE: f64 = 1000.0;
const WIND_FALLBACK_DECAY: f64 = 0.95;

/// Clip a wind value to [`WIND_BOUNDS`]
#[must_use]
pub fn clip_wind(value: f64) -> f64 {
    value.clamp(WIND_BOUNDS.0, WIND_BOUNDS.1)
}

/// Clip a pressure value to [`PRESSURE_BOUNDS`]
#[must_use]
pub fn clip_pressure(value: f64) -> f64 {
    value.clamp(PRESSURE_BOUNDS.0, PRESSURE_BOUNDS.1)
}

/// Treat non-positive values as missing, then carry the last valid value
/// forward. Leading gaps stay missing.
fn forward_fill(values: impl IntoIterator<Item = Option<f64>>) -> Vec<Option<f64>> {
    let mut last = None;
    values
        .into_iter()
        .map(|value| {
            if let Some(v) = value.filter(|v| *v > 0.0 && v.is_finite()) {
                last = Some(v);
            }
            last
        })
        .collect()
}

/// How one series is projected
#[derive(Debug, Clone)]
enum SeriesModel {
    Fitted(Polynomial),
    Constant(f64),
}

impl SeriesModel {
    fn build(filled: &[Option<f64>], fallback: f64) -> Result<Self> {
        let (xs, ys): (Vec<f64>, Vec<f64>) = filled
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| (i as f64, v)))
            .unzip();

        if xs.len() < MIN_FIT_SAMPLES {
            return Ok(SeriesModel::Constant(fallback));
        }
        Ok(SeriesModel::Fitted(Polynomial::fit(
            &xs,
            &ys,
            POLYNOMIAL_DEGREE,
        )?))
    }

    fn predict(&self, index: f64) -> f64 {
        match self {
            SeriesModel::Fitted(poly) => poly.predict(index),
            SeriesModel::Constant(value) => *value,
        }
    }

    fn is_fitted(&self) -> bool {
        matches!(self, SeriesModel::Fitted(_))
    }
}

/// Predicted intensity for one forecast step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntensityEstimate {
    /// Knots, within [`WIND_BOUNDS`]
    pub wind: f64,
    /// Millibars, within [`PRESSURE_BOUNDS`]
    pub pressure: f64,
}

/// Fitted wind and pressure models for one storm
#[derive(Debug, Clone)]
pub struct IntensityModel {
    wind: SeriesModel,
    pressure: SeriesModel,
    samples: usize,
}

impl IntensityModel {
    /// Estimate for the `step`-th point after the history (0-based)
    #[must_use]
    pub fn predict(&self, step: usize) -> IntensityEstimate {
        let index = (self.samples + step) as f64;
        IntensityEstimate {
            wind: clip_wind(self.wind.predict(index)),
            pressure: clip_pressure(self.pressure.predict(index)),
        }
    }

    /// Estimates for the next `steps` points
    #[must_use]
    pub fn forecast(&self, steps: usize) -> Vec<IntensityEstimate> {
        (0..steps).map(|step| self.predict(step)).collect()
    }

    #[must_use]
    pub fn wind_fitted(&self) -> bool {
        self.wind.is_fitted()
    }

    #[must_use]
    pub fn pressure_fitted(&self) -> bool {
        self.pressure.is_fitted()
    }
}

/// Builds [`IntensityModel`]s from track history
pub struct IntensityRegressor;

impl IntensityRegressor {
    /// Model name reported in forecast metadata
    pub const MODEL_NAME: &'static str = "polynomial_regression_deg2";

    pub fn fit(history: &[TrackPoint]) -> Result<IntensityModel> {
        let winds = forward_fill(history.iter().map(|p| p.max_sustained_wind));
        let pressures = forward_fill(history.iter().map(|p| p.central_pressure));

        let wind_fallback = winds
            .last()
            .copied()
            .flatten()
            .map_or(DEFAULT_WIND, |w| w * WIND_FALLBACK_DECAY);
        let pressure_fallback = pressures.last().copied().flatten().unwrap_or(DEFAULT_PRESSURE);

        let model = IntensityModel {
            wind: SeriesModel::build(&winds, wind_fallback)?,
            pressure: SeriesModel::build(&pressures, pressure_fallback)?,
            samples: history.len(),
        };

        debug!(
            "Intensity model over {} samples (wind fitted: {}, pressure fitted: {})",
            history.len(),
            model.wind_fitted(),
            model.pressure_fitted()
        );
        Ok(model)
    }

    /// Fit and project the next `steps` points in one call
    pub fn forecast(history: &[TrackPoint], steps: usize) -> Result<Vec<IntensityEstimate>> {
        Ok(Self::fit(history)?.forecast(steps))
    }
}
