//! Piecewise-linear trend with automatic changepoints
//!
//! The fitter models a series as a line whose slope may change at a grid of
//! candidate changepoints spread over the early part of the history. Slope
//! changes are shrunk toward zero with a ridge penalty, so the fit stays a
//! straight line unless the data insists otherwise. Forecasts continue the
//! final slope; the prediction band combines residual noise with the drift
//! expected from future slope changes.

use crate::config::TrendSettings;
use crate::{ForecastError, Result};
use nalgebra::{DMatrix, DVector};
use statrs::distribution::{ContinuousCDF, Normal};
use std::fmt;
use tracing::debug;

/// Fewest samples a trend can be fitted on
pub const MIN_TREND_SAMPLES: usize = 5;

/// One observation: `x` in hours, `y` in the series' own units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendSample {
    pub x: f64,
    pub y: f64,
}

impl TrendSample {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Point estimate and prediction band
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendEstimate {
    pub value: f64,
    pub lower: f64,
    pub upper: f64,
}

/// A fitted series model that can be queried at arbitrary `x`
pub trait FittedTrend: Send + Sync + fmt::Debug {
    fn predict(&self, x: f64) -> TrendEstimate;
}

/// Fits trend models to a univariate series
pub trait TrendFitter: Send + Sync {
    /// Model name reported in forecast metadata
    fn name(&self) -> &'static str;

    fn fit(&self, samples: &[TrendSample]) -> Result<Box<dyn FittedTrend>>;
}

/// Ridge-penalized changepoint trend fitter
#[derive(Debug, Clone)]
pub struct ChangepointTrendFitter {
    settings: TrendSettings,
}

impl ChangepointTrendFitter {
    #[must_use]
    pub fn new(settings: TrendSettings) -> Self {
        Self { settings }
    }

    /// Changepoint locations in scaled time, taken from the sample grid
    fn changepoints(&self, t: &[f64]) -> Vec<f64> {
        let n = t.len();
        if n < 2 {
            return Vec::new();
        }
        // last sample index eligible as a changepoint
        let last = ((n - 1) as f64 * self.settings.changepoint_range).floor() as usize;
        let count = self.settings.max_changepoints.min(last);
        if count == 0 {
            return Vec::new();
        }

        let mut points: Vec<f64> = (1..=count)
            .map(|k| {
                let index = (k as f64 * last as f64 / count as f64).round() as usize;
                t[index.min(n - 1)]
            })
            .filter(|c| *c > 0.0 && *c < 1.0)
            .collect();
        points.dedup_by(|a, b| (*a - *b).abs() < f64::EPSILON);
        points
    }
}

impl Default for ChangepointTrendFitter {
    fn default() -> Self {
        Self::new(TrendSettings::default())
    }
}

impl TrendFitter for ChangepointTrendFitter {
    fn name(&self) -> &'static str {
        "changepoint_trend"
    }

    fn fit(&self, samples: &[TrendSample]) -> Result<Box<dyn FittedTrend>> {
        let n = samples.len();
        if n < MIN_TREND_SAMPLES {
            return Err(ForecastError::insufficient_data("trend", MIN_TREND_SAMPLES, n));
        }
        if samples.iter().any(|s| !s.x.is_finite() || !s.y.is_finite()) {
            return Err(ForecastError::model_fit("Non-finite sample in trend fit"));
        }

        let x_origin = samples[0].x;
        let x_span = samples[n - 1].x - x_origin;
        if x_span <= 0.0 {
            return Err(ForecastError::model_fit("Trend samples span no time"));
        }

        let t: Vec<f64> = samples.iter().map(|s| (s.x - x_origin) / x_span).collect();
        let y_mean = samples.iter().map(|s| s.y).sum::<f64>() / n as f64;
        let y_scale = samples
            .iter()
            .map(|s| (s.y - y_mean).abs())
            .fold(0.0, f64::max);
        let y_scale = if y_scale > 1e-12 { y_scale } else { 1.0 };
        let y: Vec<f64> = samples.iter().map(|s| (s.y - y_mean) / y_scale).collect();

        let changepoints = self.changepoints(&t);
        let columns = 2 + changepoints.len();

        let design = DMatrix::from_fn(n, columns, |row, col| match col {
            0 => 1.0,
            1 => t[row],
            _ => (t[row] - changepoints[col - 2]).max(0.0),
        });
        let target = DVector::from_vec(y.clone());

        let penalty = 1.0 / (self.settings.changepoint_prior_scale.powi(2) * n as f64);
        let mut gram = design.tr_mul(&design);
        for col in 2..columns {
            gram[(col, col)] += penalty;
        }
        let rhs = design.tr_mul(&target);

        let beta = gram
            .cholesky()
            .ok_or_else(|| ForecastError::model_fit("Trend normal equations are singular"))?
            .solve(&rhs);
        if beta.iter().any(|b| !b.is_finite()) {
            return Err(ForecastError::model_fit("Trend fit produced non-finite coefficients"));
        }

        let fitted = &design * &beta;
        let sse: f64 = fitted
            .iter()
            .zip(&y)
            .map(|(f, y)| (y - f).powi(2))
            .sum();
        let dof = n.saturating_sub(2).max(1) as f64;
        let sigma = (sse / dof).sqrt();

        let deltas: Vec<f64> = beta.iter().skip(2).copied().collect();
        let laplace_scale = if deltas.is_empty() {
            self.settings.changepoint_prior_scale
        } else {
            deltas.iter().map(|d| d.abs()).sum::<f64>() / deltas.len() as f64
        };
        let changepoint_rate = changepoints.len() as f64;

        let z = Normal::new(0.0, 1.0)
            .map_err(|e| ForecastError::model_fit(e.to_string()))?
            .inverse_cdf((1.0 + self.settings.interval_width) / 2.0);

        debug!(
            "Fitted changepoint trend: {} samples, {} changepoints, sigma {:.4}",
            n,
            changepoints.len(),
            sigma * y_scale
        );

        Ok(Box::new(ChangepointTrend {
            x_origin,
            x_span,
            y_mean,
            y_scale,
            intercept: beta[0],
            slope: beta[1],
            changepoints,
            deltas,
            sigma,
            samples: n,
            drift_coefficient: changepoint_rate * 2.0 * laplace_scale.powi(2) / 3.0,
            z,
        }))
    }
}

/// Trend fitted by [`ChangepointTrendFitter`]. All internal quantities are in
/// scaled units: time in history spans, values in max-deviation units.
#[derive(Debug, Clone)]
struct ChangepointTrend {
    x_origin: f64,
    x_span: f64,
    y_mean: f64,
    y_scale: f64,
    intercept: f64,
    slope: f64,
    changepoints: Vec<f64>,
    deltas: Vec<f64>,
    sigma: f64,
    samples: usize,
    /// Variance growth per cubed span beyond the history
    drift_coefficient: f64,
    z: f64,
}

impl ChangepointTrend {
    fn scaled_trend(&self, t: f64) -> f64 {
        self.changepoints
            .iter()
            .zip(&self.deltas)
            .fold(self.intercept + self.slope * t, |acc, (c, d)| {
                acc + d * (t - c).max(0.0)
            })
    }
}

impl FittedTrend for ChangepointTrend {
    fn predict(&self, x: f64) -> TrendEstimate {
        let t = (x - self.x_origin) / self.x_span;
        let value = self.y_mean + self.y_scale * self.scaled_trend(t);

        let beyond = (t - 1.0).max(0.0);
        let variance = self.sigma.powi(2) * (1.0 + 1.0 / self.samples as f64)
            + self.drift_coefficient * beyond.powi(3);
        let half_width = self.z * variance.sqrt() * self.y_scale;

        TrendEstimate {
            value,
            lower: value - half_width,
            upper: value + half_width,
        }
    }
}
