//! End-to-end properties of the forecasting engine

use approx::assert_abs_diff_eq;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rstest::rstest;
use std::sync::Arc;
use tempest_forecast::forecast::hybrid::HybridForecastCombiner;
use tempest_forecast::forecast::intensity::{clip_pressure, clip_wind};
use tempest_forecast::forecast::{
    FittedTrend, FormationRiskEstimator, FormationZone, PersistenceForecaster,
    TrackExtrapolator, TrendFitter, TrendSample,
};
use tempest_forecast::geo::{self, Coordinates};
use tempest_forecast::models::{Confidence, ForecastType, MethodTag};
use tempest_forecast::{
    ForecastEngine, ForecastError, ForecastMethod, ForecastRequest, TempestConfig, TrackPoint,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 10, 7, 0, 0, 0).unwrap()
}

/// A storm curving north-east while strengthening
fn curving_track(n: usize) -> Vec<TrackPoint> {
    (0..n)
        .map(|i| {
            let f = i as f64;
            TrackPoint::new(
                "AL142024",
                "MILTON",
                21.5 + 0.15 * f + 0.004 * f * f,
                -94.0 + 0.35 * f,
                t0() + Duration::hours(6 * i as i64),
            )
            .with_intensity(Some(45.0 + 4.0 * f), Some(1000.0 - 3.5 * f))
        })
        .collect()
}

fn engine() -> ForecastEngine {
    ForecastEngine::new(&TempestConfig::default())
}

struct BrokenFitter;

impl TrendFitter for BrokenFitter {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn fit(&self, _samples: &[TrendSample]) -> tempest_forecast::Result<Box<dyn FittedTrend>> {
        Err(ForecastError::model_fit("matrix not positive definite"))
    }
}

#[rstest]
#[case(25.0, -80.0, 45.0, 500.0)]
#[case(-15.0, 120.0, 300.0, 250.0)]
#[case(60.0, 10.0, 10.0, 900.0)]
fn test_destination_round_trip(
    #[case] lat: f64,
    #[case] lon: f64,
    #[case] bearing: f64,
    #[case] km: f64,
) {
    let start = Coordinates::new(lat, lon);
    let out = geo::destination(start, bearing, km);
    let back = geo::destination(out, geo::bearing(out, start), km);
    assert!(geo::distance(start, back) < 1.0);
}

#[test]
fn test_persistence_scenario() {
    let current = TrackPoint::new("AL012024", "ALBERTO", 25.0, -80.0, t0())
        .with_intensity(Some(85.0), None);
    let points = PersistenceForecaster::forecast(&current, 12, 6);

    assert_eq!(points.len(), 2);
    assert_eq!(
        points.iter().map(|p| p.forecast_hour).collect::<Vec<_>>(),
        vec![6, 12]
    );
    assert_eq!(points[0].forecast_timestamp, t0() + Duration::hours(6));
    assert_eq!(points[1].forecast_timestamp, t0() + Duration::hours(12));
    assert!(points.iter().all(|p| p.latitude == 25.0 && p.longitude == -80.0));
    assert!(points.iter().all(|p| p.max_wind == Some(85.0)));
}

#[test]
fn test_extrapolation_needs_two_points() {
    let extrapolator = TrackExtrapolator::from_settings(&TempestConfig::default().forecast);
    assert!(extrapolator.forecast(&curving_track(1), 24, 6).is_empty());
}

#[rstest]
#[case(3, MethodTag::Extrapolation, ForecastType::Extrapolation)]
#[case(15, MethodTag::HybridTrendRegression, ForecastType::HybridTrendRegression)]
fn test_auto_selection(
    #[case] len: usize,
    #[case] tag: MethodTag,
    #[case] point_type: ForecastType,
) {
    let request = ForecastRequest::new(48, 6, ForecastMethod::Auto);
    let result = engine().forecast(&curving_track(len), &request).unwrap();
    assert_eq!(result.methods_used, vec![tag]);
    assert!(result.points.iter().all(|p| p.forecast_type == point_type));
}

#[test]
fn test_forced_fit_failure_falls_back() {
    let engine = engine().with_trend_fitter(Arc::new(BrokenFitter));
    let request = ForecastRequest::new(48, 6, ForecastMethod::Auto);
    let result = engine.forecast(&curving_track(15), &request).unwrap();
    assert_eq!(result.methods_used, vec![MethodTag::ExtrapolationFallback]);
    assert_eq!(result.total_points(), 8);
    assert!(result.model_info.is_none());
}

#[test]
fn test_hybrid_forecast_shape() {
    let history = curving_track(24);
    let request = ForecastRequest::new(72, 12, ForecastMethod::Hybrid);
    let result = engine().forecast(&history, &request).unwrap();

    assert_eq!(result.total_points(), 6);
    assert_eq!(result.issued_at, history.last().unwrap().timestamp);
    let info = result.model_info.as_ref().unwrap();
    assert_eq!(info.training_samples, 24);
    assert_eq!(info.confidence, Confidence::High);

    let last = history.last().unwrap();
    let first = &result.points[0];
    // still heading north-east from the last fix
    assert!(first.latitude > last.latitude);
    assert!(first.longitude > last.longitude);

    for point in &result.points {
        let bounds = point.uncertainty.unwrap();
        assert!(bounds.lat_lower <= point.latitude && point.latitude <= bounds.lat_upper);
        assert!(bounds.lon_lower <= point.longitude && point.longitude <= bounds.lon_upper);
        assert_eq!(
            point.confidence,
            HybridForecastCombiner::confidence_for_radius(bounds.radius_km)
        );
        let wind = point.max_wind.unwrap();
        let pressure = point.min_pressure.unwrap();
        assert!((25.0..=200.0).contains(&wind));
        assert!((900.0..=1013.0).contains(&pressure));
    }
}

#[rstest]
#[case(99.0, Confidence::High)]
#[case(150.0, Confidence::Medium)]
#[case(250.0, Confidence::Low)]
fn test_confidence_boundaries(#[case] radius: f64, #[case] expected: Confidence) {
    assert_eq!(HybridForecastCombiner::confidence_for_radius(radius), expected);
}

#[test]
fn test_intensity_clipping() {
    assert_eq!(clip_wind(250.0), 200.0);
    assert_eq!(clip_pressure(50.0), 900.0);
}

#[test]
fn test_formation_decreases_away_from_centre() {
    let zone = FormationZone::new("Synthetic", (-30.0, 30.0), (-60.0, 60.0), &[3], 0.30);
    let estimator = FormationRiskEstimator::new(vec![zone]);

    let centre = estimator.predict_for_month(0.0, 0.0, None, 3).unwrap();
    let away = estimator.predict_for_month(0.0, 40.0, None, 3).unwrap();

    assert!(centre.probability >= away.probability);
    for p in [centre.probability, away.probability] {
        assert!((0.01..=0.95).contains(&p));
    }
    assert_abs_diff_eq!(centre.probability, 0.55, epsilon = 1e-9);
}

#[rstest]
fn test_hours_strictly_increase(
    #[values(
        ForecastMethod::Auto,
        ForecastMethod::Hybrid,
        ForecastMethod::Extrapolation,
        ForecastMethod::Persistence
    )]
    method: ForecastMethod,
    #[values(6, 12, 24)] interval: u32,
    #[values(6, 50, 120)] hours: u32,
) {
    let request = ForecastRequest::new(hours, interval, method);
    let result = engine().forecast(&curving_track(12), &request);

    if interval > hours {
        assert!(matches!(result, Err(ForecastError::InvalidHorizon { .. })));
        return;
    }
    let result = result.unwrap();
    assert_eq!(result.total_points(), (hours / interval) as usize);
    assert!(
        result
            .points
            .windows(2)
            .all(|w| w[0].forecast_hour < w[1].forecast_hour)
    );
    assert!(result.points.iter().all(|p| p.forecast_hour % interval == 0));
}

#[test]
fn test_invalid_track_is_rejected() {
    let mut history = curving_track(6);
    history.swap(2, 3);
    let request = ForecastRequest::new(24, 6, ForecastMethod::Auto);
    let err = engine().forecast(&history, &request).unwrap_err();
    assert!(matches!(err, ForecastError::InvalidTrack { .. }));
}
