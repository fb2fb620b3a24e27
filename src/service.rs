//! Request-level forecasting: cache, history lookup, bounded computation

use crate::cache::{ForecastCache, forecast_key};
use crate::config::TempestConfig;
use crate::forecast::{ForecastEngine, ForecastMethod, ForecastRequest, MethodComparison};
use crate::models::{ForecastResult, FormationPrediction, MethodTag, TrackPoint};
use crate::store::TrackStore;
use anyhow::{Context, Result};
use rand::RngExt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task;
use tracing::{debug, info, instrument, warn};

/// Answers forecast requests for stored storms
pub struct ForecastService<S, C> {
    engine: Arc<ForecastEngine>,
    store: S,
    cache: Option<C>,
    timeout: Duration,
    lookback_hours: u32,
    cache_ttl: Duration,
    default_interval_hours: u32,
}

impl<S: TrackStore, C: ForecastCache> ForecastService<S, C> {
    pub fn new(config: &TempestConfig, engine: ForecastEngine, store: S, cache: Option<C>) -> Self {
        Self {
            engine: Arc::new(engine),
            store,
            cache: cache.filter(|_| config.cache.enabled),
            timeout: config.service.timeout(),
            lookback_hours: config.service.lookback_hours,
            cache_ttl: Duration::from_secs(config.cache.ttl_seconds),
            default_interval_hours: config.forecast.default_interval_hours,
        }
    }

    /// Override the computation timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn engine(&self) -> &ForecastEngine {
        &self.engine
    }

    async fn history(&self, storm_id: &str) -> Result<Vec<TrackPoint>> {
        self.store
            .history(storm_id, self.lookback_hours)
            .await
            .with_context(|| format!("Failed to load history for {storm_id}"))
    }

    /// Latest stored observation of a storm
    pub async fn current_position(&self, storm_id: &str) -> Result<TrackPoint> {
        self.history(storm_id)
            .await?
            .pop()
            .with_context(|| format!("No observations stored for {storm_id}"))
    }

    /// Forecast a stored storm.
    ///
    /// Cached results are only consulted for `auto`. A computation that
    /// outlives the timeout is cancelled and replaced by the extrapolation
    /// fallback.
    #[instrument(skip(self))]
    pub async fn forecast(
        &self,
        storm_id: &str,
        hours_ahead: u32,
        interval_hours: Option<u32>,
        method: &str,
    ) -> Result<ForecastResult> {
        let method: ForecastMethod = method.parse()?;
        let request = ForecastRequest::new(
            hours_ahead,
            interval_hours.unwrap_or(self.default_interval_hours),
            method,
        );
        self.engine.validate_request(&request)?;

        let key = forecast_key(storm_id, method.as_str(), hours_ahead);

        if method == ForecastMethod::Auto
            && let Some(cache) = &self.cache
        {
            match cache.get(&key).await {
                Ok(Some(mut cached)) if cached.interval_hours == request.interval_hours => {
                    info!("Serving cached forecast for {}", storm_id);
                    cached.methods_used = vec![MethodTag::Cached];
                    return Ok(cached);
                }
                Ok(_) => debug!("Cache miss for {}", key),
                Err(e) => warn!("Cache read failed for {}: {:#}", key, e),
            }
        }

        let history = Arc::new(self.history(storm_id).await?);

        let cancel = Arc::new(AtomicBool::new(false));
        let handle = {
            let engine = Arc::clone(&self.engine);
            let history = Arc::clone(&history);
            let cancel = Arc::clone(&cancel);
            task::spawn_blocking(move || engine.forecast_with_cancel(&history, &request, &cancel))
        };

        let (result, degraded) = match tokio::time::timeout(self.timeout, handle).await {
            Ok(joined) => (joined.context("Forecast task failed")??, false),
            Err(_) => {
                cancel.store(true, Ordering::Relaxed);
                warn!(
                    "Forecast for {} exceeded {:?}, falling back to extrapolation",
                    storm_id, self.timeout
                );
                (self.engine.degraded_forecast(&history, &request)?, true)
            }
        };

        if !degraded && let Some(cache) = &self.cache {
            let jitter: f64 = rand::rng().random_range(0.9..1.1);
            let ttl = self.cache_ttl.mul_f64(jitter);
            if let Err(e) = cache.put(&key, &result, ttl).await {
                warn!("Cache write failed for {}: {:#}", key, e);
            }
        }

        Ok(result)
    }

    /// Intensity-only forecast of a stored storm
    #[instrument(skip(self))]
    pub async fn intensity_forecast(
        &self,
        storm_id: &str,
        hours_ahead: u32,
        interval_hours: Option<u32>,
    ) -> Result<ForecastResult> {
        let history = self.history(storm_id).await?;
        let interval = interval_hours.unwrap_or(self.default_interval_hours);
        Ok(self
            .engine
            .intensity_forecast(&history, hours_ahead, interval)?)
    }

    /// Side-by-side method comparison for a stored storm
    #[instrument(skip(self))]
    pub async fn compare(&self, storm_id: &str, hours_ahead: u32) -> Result<MethodComparison> {
        let history = self.history(storm_id).await?;
        Ok(self.engine.compare(&history, hours_ahead)?)
    }

    /// Formation risk at a location
    #[instrument(skip(self))]
    pub fn predict_formation(
        &self,
        latitude: f64,
        longitude: f64,
        hours_ahead: Option<u32>,
    ) -> Result<FormationPrediction> {
        Ok(self
            .engine
            .predict_formation(latitude, longitude, hours_ahead)?)
    }
}
