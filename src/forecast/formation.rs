//! Climatological formation risk

use crate::models::{
    Confidence, FormationFactors, FormationLocation, FormationPrediction, RiskLevel,
};
use crate::{ForecastError, Result};
use chrono::{Datelike, Utc};
use tracing::debug;

/// Probability assigned outside every known zone
const BACKGROUND_PROBABILITY: f64 = 0.05;
/// Bonus while the zone's season is active
const SEASON_BONUS: f64 = 0.25;
/// Combined degree offset from the zone centre at which proximity reaches zero
const PROXIMITY_SCALE_DEG: f64 = 50.0;
const PROBABILITY_BOUNDS: (f64, f64) = (0.01, 0.95);

/// Accepted look-ahead window in hours
pub const WINDOW_HOURS: (u32, u32) = (24, 120);
pub const DEFAULT_WINDOW_HOURS: u32 = 48;

/// A basin where storms form, with its active months
#[derive(Debug, Clone, PartialEq)]
pub struct FormationZone {
    pub name: String,
    pub lat_range: (f64, f64),
    pub lon_range: (f64, f64),
    /// Calendar months (1-12) of the active season
    pub season_months: Vec<u32>,
    pub base_probability: f64,
}

impl FormationZone {
    pub fn new(
        name: impl Into<String>,
        lat_range: (f64, f64),
        lon_range: (f64, f64),
        season_months: &[u32],
        base_probability: f64,
    ) -> Self {
        Self {
            name: name.into(),
            lat_range,
            lon_range,
            season_months: season_months.to_vec(),
            base_probability,
        }
    }

    /// Containment in both ranges, edges included
    #[must_use]
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        (self.lat_range.0..=self.lat_range.1).contains(&latitude)
            && (self.lon_range.0..=self.lon_range.1).contains(&longitude)
    }

    #[must_use]
    pub fn in_season(&self, month: u32) -> bool {
        self.season_months.contains(&month)
    }

    /// 1.0 at the zone centre, falling linearly to 0 at 50 combined degrees
    #[must_use]
    pub fn proximity(&self, latitude: f64, longitude: f64) -> f64 {
        let center_lat = (self.lat_range.0 + self.lat_range.1) / 2.0;
        let center_lon = (self.lon_range.0 + self.lon_range.1) / 2.0;
        let offset = (latitude - center_lat).abs() + (longitude - center_lon).abs();
        (1.0 - offset / PROXIMITY_SCALE_DEG).clamp(0.0, 1.0)
    }
}

/// Climatological zones, checked in this order
#[must_use]
pub fn default_zones() -> Vec<FormationZone> {
    vec![
        FormationZone::new(
            "Atlantic",
            (5.0, 30.0),
            (-80.0, -20.0),
            &[6, 7, 8, 9, 10, 11],
            0.35,
        ),
        FormationZone::new(
            "Eastern Pacific",
            (5.0, 20.0),
            (-120.0, -80.0),
            &[5, 6, 7, 8, 9, 10, 11],
            0.40,
        ),
        FormationZone::new(
            "Western Pacific",
            (5.0, 25.0),
            (120.0, 180.0),
            &[5, 6, 7, 8, 9, 10, 11],
            0.45,
        ),
        FormationZone::new(
            "Indian Ocean",
            (5.0, 20.0),
            (40.0, 100.0),
            &[4, 5, 10, 11, 12],
            0.30,
        ),
    ]
}

/// Scores formation likelihood from location and season
#[derive(Debug, Clone)]
pub struct FormationRiskEstimator {
    zones: Vec<FormationZone>,
}

impl Default for FormationRiskEstimator {
    fn default() -> Self {
        Self::new(default_zones())
    }
}

impl FormationRiskEstimator {
    #[must_use]
    pub fn new(zones: Vec<FormationZone>) -> Self {
        Self { zones }
    }

    #[must_use]
    pub fn zones(&self) -> &[FormationZone] {
        &self.zones
    }

    /// Predict using the current UTC month
    pub fn predict(
        &self,
        latitude: f64,
        longitude: f64,
        hours_ahead: Option<u32>,
    ) -> Result<FormationPrediction> {
        self.predict_for_month(latitude, longitude, hours_ahead, Utc::now().month())
    }

    /// Predict for an explicit calendar month (1-12)
    pub fn predict_for_month(
        &self,
        latitude: f64,
        longitude: f64,
        hours_ahead: Option<u32>,
        month: u32,
    ) -> Result<FormationPrediction> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ForecastError::validation(format!(
                "Latitude {latitude} outside [-90, 90]"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ForecastError::validation(format!(
                "Longitude {longitude} outside [-180, 180]"
            )));
        }
        if !(1..=12).contains(&month) {
            return Err(ForecastError::validation(format!(
                "Month {month} outside 1-12"
            )));
        }
        let window_hours = hours_ahead.unwrap_or(DEFAULT_WINDOW_HOURS);
        if !(WINDOW_HOURS.0..=WINDOW_HOURS.1).contains(&window_hours) {
            return Err(ForecastError::invalid_horizon(format!(
                "Formation window must be between {} and {} hours, got {}",
                WINDOW_HOURS.0, WINDOW_HOURS.1, window_hours
            )));
        }

        let zone = self.zones.iter().find(|z| z.contains(latitude, longitude));

        let (zone_name, favorable_season, zone_probability, raw) = match zone {
            Some(zone) => {
                let in_season = zone.in_season(month);
                let seasonal = zone.base_probability + if in_season { SEASON_BONUS } else { 0.0 };
                let scaled = seasonal * (0.7 + 0.3 * zone.proximity(latitude, longitude));
                (zone.name.clone(), in_season, zone.base_probability, scaled)
            }
            None => (
                "Unknown".to_string(),
                false,
                BACKGROUND_PROBABILITY,
                BACKGROUND_PROBABILITY,
            ),
        };

        let probability = raw.clamp(PROBABILITY_BOUNDS.0, PROBABILITY_BOUNDS.1);
        let risk_level = RiskLevel::from_probability(probability);

        debug!(
            "Formation risk at ({latitude:.2}, {longitude:.2}) in {zone_name}: {probability:.3}"
        );

        Ok(FormationPrediction {
            probability,
            risk_level,
            estimated_time_hours: risk_level.estimated_time_hours(),
            confidence: if zone.is_some() {
                Confidence::High
            } else {
                Confidence::Low
            },
            location: FormationLocation {
                latitude,
                longitude,
                zone: zone_name,
            },
            factors: FormationFactors {
                in_formation_zone: zone.is_some(),
                favorable_season,
                zone_probability,
            },
            window_hours,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    #[test]
    fn test_atlantic_in_season() {
        let estimator = FormationRiskEstimator::default();
        // offset from the (17.5, -50) centre is 2.5 + 5 = 7.5 degrees
        let prediction = estimator.predict_for_month(15.0, -45.0, None, 9).unwrap();

        assert_eq!(prediction.location.zone, "Atlantic");
        assert!(prediction.factors.in_formation_zone);
        assert!(prediction.factors.favorable_season);
        assert_abs_diff_eq!(prediction.probability, 0.6 * (0.7 + 0.3 * 0.85), epsilon = 1e-9);
        assert_eq!(prediction.risk_level, RiskLevel::Medium);
        assert_eq!(prediction.estimated_time_hours, 48);
        assert_eq!(prediction.confidence, Confidence::High);
        assert_eq!(prediction.window_hours, 48);
    }

    #[test]
    fn test_out_of_season_is_lower() {
        let estimator = FormationRiskEstimator::default();
        let summer = estimator.predict_for_month(15.0, 140.0, None, 8).unwrap();
        let winter = estimator.predict_for_month(15.0, 140.0, None, 2).unwrap();
        assert_eq!(summer.location.zone, "Western Pacific");
        assert!(!winter.factors.favorable_season);
        assert!(winter.probability < summer.probability);
    }

    #[test]
    fn test_outside_all_zones() {
        let prediction = FormationRiskEstimator::default()
            .predict_for_month(50.0, 0.0, Some(72), 9)
            .unwrap();
        assert_eq!(prediction.location.zone, "Unknown");
        assert_eq!(prediction.probability, 0.05);
        assert_eq!(prediction.risk_level, RiskLevel::Low);
        assert_eq!(prediction.confidence, Confidence::Low);
        assert!(!prediction.factors.in_formation_zone);
    }

    #[test]
    fn test_closer_to_centre_is_not_less_likely() {
        let zone = FormationZone::new("Test", (-30.0, 30.0), (-60.0, 60.0), &[1], 0.30);
        let estimator = FormationRiskEstimator::new(vec![zone]);
        let centre = estimator.predict_for_month(0.0, 0.0, None, 1).unwrap();
        let edge = estimator.predict_for_month(0.0, 40.0, None, 1).unwrap();
        assert_abs_diff_eq!(centre.probability, 0.55, epsilon = 1e-9);
        assert_abs_diff_eq!(edge.probability, 0.55 * (0.7 + 0.3 * 0.2), epsilon = 1e-9);
        assert!(centre.probability >= edge.probability);
    }

    #[test]
    fn test_probability_is_clamped() {
        let zone = FormationZone::new("Hot", (0.0, 10.0), (0.0, 10.0), &[7], 0.9);
        let prediction = FormationRiskEstimator::new(vec![zone])
            .predict_for_month(5.0, 5.0, None, 7)
            .unwrap();
        assert_eq!(prediction.probability, 0.95);
        assert_eq!(prediction.risk_level, RiskLevel::High);
    }

    #[rstest]
    #[case(5.0, -50.0, "Atlantic")]
    #[case(30.0, -50.0, "Atlantic")]
    #[case(15.0, -80.0, "Atlantic")]
    #[case(15.0, 180.0, "Western Pacific")]
    #[case(5.0, 100.0, "Indian Ocean")]
    fn test_zone_edges_are_inside(#[case] lat: f64, #[case] lon: f64, #[case] zone: &str) {
        let prediction = FormationRiskEstimator::default()
            .predict_for_month(lat, lon, None, 10)
            .unwrap();
        assert_eq!(prediction.location.zone, zone);
        assert!(prediction.factors.in_formation_zone);
        assert!(prediction.factors.favorable_season);
        assert_eq!(prediction.confidence, Confidence::High);
        assert!(prediction.probability > BACKGROUND_PROBABILITY);
    }

    #[test]
    fn test_eastern_pacific_match() {
        let prediction = FormationRiskEstimator::default()
            .predict_for_month(10.0, -85.0, None, 7)
            .unwrap();
        assert_eq!(prediction.location.zone, "Eastern Pacific");
    }

    #[rstest]
    #[case(95.0, 0.0)]
    #[case(-91.0, 0.0)]
    #[case(0.0, 181.0)]
    fn test_rejects_bad_coordinates(#[case] lat: f64, #[case] lon: f64) {
        let err = FormationRiskEstimator::default()
            .predict_for_month(lat, lon, None, 6)
            .unwrap_err();
        assert!(matches!(err, ForecastError::Validation { .. }));
    }

    #[rstest]
    #[case(12)]
    #[case(121)]
    fn test_rejects_bad_window(#[case] hours: u32) {
        let err = FormationRiskEstimator::default()
            .predict_for_month(15.0, -45.0, Some(hours), 6)
            .unwrap_err();
        assert!(matches!(err, ForecastError::InvalidHorizon { .. }));
    }

    #[test]
    fn test_predict_uses_current_month() {
        let prediction = FormationRiskEstimator::default()
            .predict(15.0, -45.0, Some(24))
            .unwrap();
        assert_eq!(prediction.location.zone, "Atlantic");
        assert!((0.01..=0.95).contains(&prediction.probability));
    }
}
