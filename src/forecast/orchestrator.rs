//! Method selection and fallback chaining
//!
//! A request is validated, mapped to an ordered list of strategies, and the
//! strategies are tried in turn. Recoverable failures (too little data, a
//! failed fit) move on to the next strategy; anything else is surfaced.

use super::hybrid::{HybridForecastCombiner, TrajectoryEstimate};
use super::intensity::IntensityRegressor;
use super::trend::{ChangepointTrendFitter, TrendFitter, TrendSample};
use super::{
    FormationRiskEstimator, PersistenceForecaster, TrackExtrapolator, forecast_hours,
    forecast_time,
};
use crate::config::{ForecastSettings, TempestConfig};
use crate::geo;
use crate::models::{
    Confidence, ForecastPoint, ForecastResult, ForecastType, FormationPrediction, MethodTag,
    ModelInfo, TrackPoint, validate_track,
};
use crate::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Training samples at which hybrid metadata reports high confidence
const HIGH_CONFIDENCE_SAMPLES: usize = 20;
/// Points kept per method in a comparison
const COMPARISON_PREVIEW: usize = 5;

/// Forecast method requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastMethod {
    /// Let the engine choose from the history length
    #[default]
    Auto,
    Hybrid,
    Extrapolation,
    Persistence,
}

impl ForecastMethod {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ForecastMethod::Auto => "auto",
            ForecastMethod::Hybrid => "hybrid",
            ForecastMethod::Extrapolation => "extrapolation",
            ForecastMethod::Persistence => "persistence",
        }
    }
}

impl FromStr for ForecastMethod {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(ForecastMethod::Auto),
            "hybrid" | "ml" => Ok(ForecastMethod::Hybrid),
            "extrapolation" => Ok(ForecastMethod::Extrapolation),
            "persistence" => Ok(ForecastMethod::Persistence),
            _ => Err(ForecastError::unknown_method(s)),
        }
    }
}

impl fmt::Display for ForecastMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Horizon, spacing and method of a forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastRequest {
    pub hours_ahead: u32,
    pub interval_hours: u32,
    pub method: ForecastMethod,
}

impl ForecastRequest {
    #[must_use]
    pub fn new(hours_ahead: u32, interval_hours: u32, method: ForecastMethod) -> Self {
        Self {
            hours_ahead,
            interval_hours,
            method,
        }
    }

    /// Number of points a successful forecast contains
    #[must_use]
    pub fn expected_points(&self) -> usize {
        forecast_hours(self.hours_ahead, self.interval_hours).len()
    }
}

/// One entry of a method comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodPreview {
    pub method: MethodTag,
    pub description: String,
    pub total_points: usize,
    /// First few forecast points
    pub points: Vec<ForecastPoint>,
}

/// Side-by-side output of the available methods
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodComparison {
    pub storm_id: String,
    pub storm_name: String,
    pub hours_ahead: u32,
    pub methods: Vec<MethodPreview>,
}

/// A single attempt in the fallback chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    Hybrid,
    Extrapolation,
    ExtrapolationFallback,
    Persistence,
    PersistenceFallback,
}

impl Strategy {
    fn tag(self) -> MethodTag {
        match self {
            Strategy::Hybrid => MethodTag::HybridTrendRegression,
            Strategy::Extrapolation => MethodTag::Extrapolation,
            Strategy::ExtrapolationFallback => MethodTag::ExtrapolationFallback,
            Strategy::Persistence => MethodTag::Persistence,
            Strategy::PersistenceFallback => MethodTag::PersistenceFallback,
        }
    }
}

/// Points and metadata produced by one strategy
struct StrategyOutput {
    points: Vec<ForecastPoint>,
    model_info: Option<ModelInfo>,
}

/// Entry point of the forecasting engine
#[derive(Clone)]
pub struct ForecastEngine {
    settings: ForecastSettings,
    fitter: Arc<dyn TrendFitter>,
    extrapolator: TrackExtrapolator,
    formation: FormationRiskEstimator,
}

impl ForecastEngine {
    #[must_use]
    pub fn new(config: &TempestConfig) -> Self {
        Self {
            settings: config.forecast.clone(),
            fitter: Arc::new(ChangepointTrendFitter::new(config.trend.clone())),
            extrapolator: TrackExtrapolator::from_settings(&config.forecast),
            formation: FormationRiskEstimator::default(),
        }
    }

    /// Replace the trajectory trend fitter
    #[must_use]
    pub fn with_trend_fitter(mut self, fitter: Arc<dyn TrendFitter>) -> Self {
        self.fitter = fitter;
        self
    }

    /// Replace the formation zone table
    #[must_use]
    pub fn with_formation_estimator(mut self, formation: FormationRiskEstimator) -> Self {
        self.formation = formation;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &ForecastSettings {
        &self.settings
    }

    /// Check horizon and interval against the configured limits
    pub fn validate_request(&self, request: &ForecastRequest) -> Result<()> {
        let (min, max) = (
            self.settings.min_horizon_hours,
            self.settings.max_horizon_hours,
        );
        if !(min..=max).contains(&request.hours_ahead) {
            return Err(ForecastError::invalid_horizon(format!(
                "hours_ahead must be between {min} and {max}, got {}",
                request.hours_ahead
            )));
        }
        if request.interval_hours == 0 || request.interval_hours > request.hours_ahead {
            return Err(ForecastError::invalid_horizon(format!(
                "interval_hours must be between 1 and {}, got {}",
                request.hours_ahead, request.interval_hours
            )));
        }
        Ok(())
    }

    /// Forecast without an external cancellation signal
    pub fn forecast(
        &self,
        history: &[TrackPoint],
        request: &ForecastRequest,
    ) -> Result<ForecastResult> {
        self.forecast_with_cancel(history, request, &AtomicBool::new(false))
    }

    /// Forecast, aborting the hybrid fit once `cancel` is raised
    pub fn forecast_with_cancel(
        &self,
        history: &[TrackPoint],
        request: &ForecastRequest,
        cancel: &AtomicBool,
    ) -> Result<ForecastResult> {
        self.validate_request(request)?;
        validate_track(history)?;

        let plan = self.plan(history.len(), request.method)?;
        debug!(
            "Forecast plan for {} points ({}): {:?}",
            history.len(),
            request.method,
            plan
        );

        let mut last_error = None;
        for strategy in plan {
            match self.run_strategy(strategy, history, request, cancel) {
                Ok(output) => return self.assemble(history, request, strategy, output),
                Err(e) if e.is_recoverable() => {
                    warn!("{:?} forecast failed, trying next method: {}", strategy, e);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ForecastError::insufficient_data(request.method.as_str(), 1, history.len())
        }))
    }

    /// Cheapest forecast available for the history, used when the full
    /// computation ran out of time
    pub fn degraded_forecast(
        &self,
        history: &[TrackPoint],
        request: &ForecastRequest,
    ) -> Result<ForecastResult> {
        self.validate_request(request)?;
        validate_track(history)?;

        let strategy = if history.len() >= 2 {
            Strategy::ExtrapolationFallback
        } else {
            Strategy::PersistenceFallback
        };
        let output = self.run_strategy(strategy, history, request, &AtomicBool::new(false))?;
        self.assemble(history, request, strategy, output)
    }

    /// Ordered strategies to try for a method and history length
    fn plan(&self, len: usize, method: ForecastMethod) -> Result<Vec<Strategy>> {
        let plan = match method {
            ForecastMethod::Hybrid => {
                if len < self.settings.hybrid_min_points {
                    return Err(ForecastError::insufficient_data(
                        "hybrid",
                        self.settings.hybrid_min_points,
                        len,
                    ));
                }
                vec![Strategy::Hybrid, Strategy::ExtrapolationFallback]
            }
            ForecastMethod::Auto if len >= self.settings.auto_hybrid_min_points => {
                vec![Strategy::Hybrid, Strategy::ExtrapolationFallback]
            }
            ForecastMethod::Persistence => vec![Strategy::Persistence],
            ForecastMethod::Extrapolation => {
                if len < 2 {
                    return Err(ForecastError::insufficient_data("extrapolation", 2, len));
                }
                vec![Strategy::Extrapolation]
            }
            ForecastMethod::Auto if len >= 2 => vec![Strategy::Extrapolation],
            ForecastMethod::Auto => vec![Strategy::PersistenceFallback],
        };
        Ok(plan)
    }

    fn run_strategy(
        &self,
        strategy: Strategy,
        history: &[TrackPoint],
        request: &ForecastRequest,
        cancel: &AtomicBool,
    ) -> Result<StrategyOutput> {
        let last = history
            .last()
            .ok_or_else(|| ForecastError::insufficient_data("forecast", 1, 0))?;

        match strategy {
            Strategy::Hybrid => self.hybrid(history, request, cancel),
            Strategy::Extrapolation | Strategy::ExtrapolationFallback => {
                let mut points =
                    self.extrapolator
                        .forecast(history, request.hours_ahead, request.interval_hours);
                if points.is_empty() {
                    return Err(ForecastError::insufficient_data("extrapolation", 2, history.len()));
                }
                if strategy == Strategy::ExtrapolationFallback {
                    for point in &mut points {
                        point.forecast_type = ForecastType::ExtrapolationFallback;
                    }
                }
                Ok(StrategyOutput {
                    points,
                    model_info: None,
                })
            }
            Strategy::Persistence | Strategy::PersistenceFallback => Ok(StrategyOutput {
                points: PersistenceForecaster::forecast(
                    last,
                    request.hours_ahead,
                    request.interval_hours,
                ),
                model_info: None,
            }),
        }
    }

    /// Trend-fitted trajectory with regressed intensity
    fn hybrid(
        &self,
        history: &[TrackPoint],
        request: &ForecastRequest,
        cancel: &AtomicBool,
    ) -> Result<StrategyOutput> {
        let (Some(first), Some(last)) = (history.first(), history.last()) else {
            return Err(ForecastError::insufficient_data("hybrid", 1, 0));
        };

        let hours_since_start =
            |p: &TrackPoint| (p.timestamp - first.timestamp).num_seconds() as f64 / 3600.0;
        let xs: Vec<f64> = history.iter().map(hours_since_start).collect();
        let longitudes =
            geo::unwrap_longitudes(&history.iter().map(|p| p.longitude).collect::<Vec<_>>());

        let lat_samples: Vec<TrendSample> = xs
            .iter()
            .zip(history)
            .map(|(x, p)| TrendSample::new(*x, p.latitude))
            .collect();
        let lon_samples: Vec<TrendSample> = xs
            .iter()
            .zip(&longitudes)
            .map(|(x, lon)| TrendSample::new(*x, *lon))
            .collect();

        check_cancelled(cancel)?;
        let lat_model = self.fitter.fit(&lat_samples)?;
        check_cancelled(cancel)?;
        let lon_model = self.fitter.fit(&lon_samples)?;
        check_cancelled(cancel)?;
        let intensity_model = IntensityRegressor::fit(history)?;
        check_cancelled(cancel)?;

        let last_x = hours_since_start(last);
        let trajectory: Vec<TrajectoryEstimate> =
            forecast_hours(request.hours_ahead, request.interval_hours)
                .into_iter()
                .map(|hour| {
                    let x = last_x + f64::from(hour);
                    TrajectoryEstimate {
                        forecast_hour: hour,
                        latitude: lat_model.predict(x),
                        longitude: lon_model.predict(x),
                    }
                })
                .collect();
        let intensity = intensity_model.forecast(trajectory.len());

        let points = HybridForecastCombiner::combine(last, &trajectory, &intensity);
        if points
            .iter()
            .any(|p| !p.latitude.is_finite() || !p.longitude.is_finite())
        {
            return Err(ForecastError::model_fit("Trend model produced non-finite positions"));
        }

        info!(
            "Hybrid forecast for {}: {} points from {} samples",
            last.id,
            points.len(),
            history.len()
        );

        Ok(StrategyOutput {
            points,
            model_info: Some(ModelInfo {
                trajectory_model: Some(self.fitter.name().to_string()),
                intensity_model: IntensityRegressor::MODEL_NAME.to_string(),
                training_samples: history.len(),
                confidence: if history.len() >= HIGH_CONFIDENCE_SAMPLES {
                    Confidence::High
                } else {
                    Confidence::Medium
                },
            }),
        })
    }

    fn assemble(
        &self,
        history: &[TrackPoint],
        request: &ForecastRequest,
        strategy: Strategy,
        output: StrategyOutput,
    ) -> Result<ForecastResult> {
        let last = history
            .last()
            .ok_or_else(|| ForecastError::insufficient_data("forecast", 1, 0))?;

        let mut points = output.points;
        points.sort_by_key(|p| p.forecast_hour);

        info!(
            "Forecast for {} via {}: {} points over {}h",
            last.id,
            strategy.tag(),
            points.len(),
            request.hours_ahead
        );

        Ok(ForecastResult {
            storm_id: last.id.clone(),
            storm_name: last.name.clone(),
            issued_at: last.timestamp,
            hours_ahead: request.hours_ahead,
            interval_hours: request.interval_hours,
            points,
            methods_used: vec![strategy.tag()],
            model_info: output.model_info,
        })
    }

    /// Intensity-only forecast: position held at the latest observation
    pub fn intensity_forecast(
        &self,
        history: &[TrackPoint],
        hours_ahead: u32,
        interval_hours: u32,
    ) -> Result<ForecastResult> {
        let request = ForecastRequest::new(hours_ahead, interval_hours, ForecastMethod::Auto);
        self.validate_request(&request)?;
        validate_track(history)?;

        if history.len() < self.settings.intensity_min_points {
            return Err(ForecastError::insufficient_data(
                "intensity",
                self.settings.intensity_min_points,
                history.len(),
            ));
        }
        let last = history
            .last()
            .ok_or_else(|| ForecastError::insufficient_data("intensity", 1, 0))?;

        let hours = forecast_hours(hours_ahead, interval_hours);
        let intensity = IntensityRegressor::fit(history)?.forecast(hours.len());

        let points = hours
            .into_iter()
            .zip(intensity)
            .map(|(hour, estimate)| ForecastPoint {
                storm_id: last.id.clone(),
                storm_name: last.name.clone(),
                forecast_hour: hour,
                forecast_timestamp: forecast_time(last.timestamp, hour),
                latitude: last.latitude,
                longitude: last.longitude,
                max_wind: Some(estimate.wind),
                min_pressure: Some(estimate.pressure),
                forecast_type: ForecastType::StatisticalIntensity,
                confidence: Confidence::High,
                uncertainty: None,
                motion: None,
            })
            .collect();

        Ok(ForecastResult {
            storm_id: last.id.clone(),
            storm_name: last.name.clone(),
            issued_at: last.timestamp,
            hours_ahead,
            interval_hours,
            points,
            methods_used: vec![MethodTag::StatisticalIntensity],
            model_info: Some(ModelInfo {
                trajectory_model: None,
                intensity_model: IntensityRegressor::MODEL_NAME.to_string(),
                training_samples: history.len(),
                confidence: Confidence::High,
            }),
        })
    }

    /// Formation risk at a location
    pub fn predict_formation(
        &self,
        latitude: f64,
        longitude: f64,
        hours_ahead: Option<u32>,
    ) -> Result<FormationPrediction> {
        self.formation.predict(latitude, longitude, hours_ahead)
    }

    /// Run every applicable method and keep the first few points of each
    pub fn compare(&self, history: &[TrackPoint], hours_ahead: u32) -> Result<MethodComparison> {
        validate_track(history)?;
        let last = history
            .last()
            .ok_or_else(|| ForecastError::insufficient_data("compare", 1, 0))?;

        let request = ForecastRequest::new(
            hours_ahead,
            self.settings.default_interval_hours,
            ForecastMethod::Auto,
        );
        self.validate_request(&request)?;

        let mut candidates = vec![(
            Strategy::Extrapolation,
            "Linear extrapolation of recent motion",
        )];
        if history.len() >= self.settings.auto_hybrid_min_points {
            candidates.push((
                Strategy::Hybrid,
                "Changepoint trend trajectory with polynomial intensity",
            ));
        }
        candidates.push((Strategy::Persistence, "No movement, intensity unchanged"));

        let cancel = AtomicBool::new(false);
        let mut methods = Vec::new();
        for (strategy, description) in candidates {
            let output = match self.run_strategy(strategy, history, &request, &cancel) {
                Ok(output) => output,
                Err(e) => {
                    warn!("{:?} skipped in comparison: {}", strategy, e);
                    continue;
                }
            };
            let result = self.assemble(history, &request, strategy, output)?;
            methods.push(MethodPreview {
                method: strategy.tag(),
                description: description.to_string(),
                total_points: result.total_points(),
                points: result.points.into_iter().take(COMPARISON_PREVIEW).collect(),
            });
        }

        Ok(MethodComparison {
            storm_id: last.id.clone(),
            storm_name: last.name.clone(),
            hours_ahead,
            methods,
        })
    }
}

fn check_cancelled(cancel: &AtomicBool) -> Result<()> {
    if cancel.load(Ordering::Relaxed) {
        return Err(ForecastError::model_fit("Hybrid fit cancelled"));
    }
    Ok(())
}
