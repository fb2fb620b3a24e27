//! Map-friendly renderings of a forecast

use crate::models::{Confidence, ForecastResult, TrackPoint, UncertaintyBounds};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cone radius at the first point when a forecast carries no bounds
const BASE_CONE_RADIUS_KM: f64 = 50.0;
/// Cone growth per point when a forecast carries no bounds
const CONE_GROWTH_KM: f64 = 20.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineString {
    #[serde(rename = "type")]
    pub kind: String,
    /// `[longitude, latitude]` pairs
    pub coordinates: Vec<[f64; 2]>,
}

/// Per-vertex properties of the track line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackVertex {
    pub hour: u32,
    pub timestamp: DateTime<Utc>,
    pub wind_speed: Option<f64>,
    pub pressure: Option<f64>,
    /// `current` for the observed position, otherwise the forecast type
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uncertainty: Option<UncertaintyBounds>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackProperties {
    pub storm_id: String,
    pub storm_name: String,
    pub forecast_hours: u32,
    pub total_points: usize,
    pub issued_at: DateTime<Utc>,
    pub forecast_method: String,
    pub points: Vec<TrackVertex>,
}

/// GeoJSON Feature holding the forecast track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackFeature {
    #[serde(rename = "type")]
    pub kind: String,
    pub geometry: LineString,
    pub properties: TrackProperties,
}

/// Line from the current position through every forecast point
#[must_use]
pub fn track_geojson(current: &TrackPoint, result: &ForecastResult) -> TrackFeature {
    let mut coordinates = Vec::with_capacity(result.points.len() + 1);
    coordinates.push([current.longitude, current.latitude]);
    coordinates.extend(result.points.iter().map(|p| [p.longitude, p.latitude]));

    let mut points = Vec::with_capacity(result.points.len() + 1);
    points.push(TrackVertex {
        hour: 0,
        timestamp: current.timestamp,
        wind_speed: current.max_sustained_wind,
        pressure: current.central_pressure,
        kind: "current".to_string(),
        uncertainty: None,
    });
    points.extend(result.points.iter().map(|p| TrackVertex {
        hour: p.forecast_hour,
        timestamp: p.forecast_timestamp,
        wind_speed: p.max_wind,
        pressure: p.min_pressure,
        kind: p.forecast_type.to_string(),
        uncertainty: p.uncertainty,
    }));

    TrackFeature {
        kind: "Feature".to_string(),
        geometry: LineString {
            kind: "LineString".to_string(),
            coordinates,
        },
        properties: TrackProperties {
            storm_id: result.storm_id.clone(),
            storm_name: result.storm_name.clone(),
            forecast_hours: result.hours_ahead,
            total_points: result.total_points(),
            issued_at: result.issued_at,
            forecast_method: method_label(result),
            points,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConeCenter {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConePoint {
    pub hour: u32,
    pub center: ConeCenter,
    pub uncertainty_radius_km: f64,
    pub confidence_level: Confidence,
}

/// Probable area of movement around each forecast point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UncertaintyCone {
    pub storm_id: String,
    pub storm_name: String,
    pub forecast_method: String,
    /// Whether radii come from model bounds or the growth heuristic
    pub uncertainty_method: String,
    pub cone: Vec<ConePoint>,
}

/// Radius per point from the model bounds, or a heuristic that grows 20 km
/// per step from 50 km
#[must_use]
pub fn uncertainty_cone(result: &ForecastResult) -> UncertaintyCone {
    let modelled = result.points.iter().any(|p| p.uncertainty.is_some());

    let cone = result
        .points
        .iter()
        .enumerate()
        .map(|(i, p)| ConePoint {
            hour: p.forecast_hour,
            center: ConeCenter {
                latitude: p.latitude,
                longitude: p.longitude,
            },
            uncertainty_radius_km: p.uncertainty.map_or_else(
                || BASE_CONE_RADIUS_KM + CONE_GROWTH_KM * i as f64,
                |bounds| bounds.radius_km,
            ),
            confidence_level: p.confidence,
        })
        .collect();

    UncertaintyCone {
        storm_id: result.storm_id.clone(),
        storm_name: result.storm_name.clone(),
        forecast_method: method_label(result),
        uncertainty_method: if modelled {
            "trend model prediction interval".to_string()
        } else {
            "linear growth approximation".to_string()
        },
        cone,
    }
}

fn method_label(result: &ForecastResult) -> String {
    result
        .methods_used
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ForecastPoint, ForecastType, MethodTag};
    use chrono::{Duration, TimeZone};

    fn result(with_bounds: bool) -> (TrackPoint, ForecastResult) {
        let t0 = Utc.with_ymd_and_hms(2024, 8, 5, 12, 0, 0).unwrap();
        let current = TrackPoint::new("AL042024", "DEBBY", 29.0, -83.5, t0)
            .with_intensity(Some(70.0), Some(980.0));
        let points = (1..=3)
            .map(|i| ForecastPoint {
                storm_id: "AL042024".into(),
                storm_name: "DEBBY".into(),
                forecast_hour: 6 * i,
                forecast_timestamp: t0 + Duration::hours(6 * i64::from(i)),
                latitude: 29.0 + 0.5 * f64::from(i),
                longitude: -83.5 + 0.3 * f64::from(i),
                max_wind: Some(65.0),
                min_pressure: None,
                forecast_type: ForecastType::HybridTrendRegression,
                confidence: Confidence::Medium,
                uncertainty: with_bounds.then_some(UncertaintyBounds {
                    lat_lower: 28.0,
                    lat_upper: 30.0,
                    lon_lower: -84.0,
                    lon_upper: -82.0,
                    radius_km: 157.0,
                }),
                motion: None,
            })
            .collect();
        let result = ForecastResult {
            storm_id: "AL042024".into(),
            storm_name: "DEBBY".into(),
            issued_at: t0,
            hours_ahead: 18,
            interval_hours: 6,
            points,
            methods_used: vec![MethodTag::HybridTrendRegression],
            model_info: None,
        };
        (current, result)
    }

    #[test]
    fn test_track_starts_at_current_position() {
        let (current, result) = result(true);
        let feature = track_geojson(&current, &result);

        assert_eq!(feature.geometry.coordinates.len(), 4);
        assert_eq!(feature.geometry.coordinates[0], [-83.5, 29.0]);
        assert_eq!(feature.properties.points[0].kind, "current");
        assert_eq!(feature.properties.points[0].wind_speed, Some(70.0));
        assert_eq!(feature.properties.points[3].hour, 18);
        assert_eq!(feature.properties.forecast_method, "hybrid_trend_regression");

        let json = serde_json::to_value(&feature).unwrap();
        assert_eq!(json["type"], "Feature");
        assert_eq!(json["geometry"]["type"], "LineString");
        assert_eq!(json["properties"]["points"][1]["type"], "hybrid_trend_regression");
        assert!(json["properties"]["points"][0].get("uncertainty").is_none());
    }

    #[test]
    fn test_cone_uses_model_bounds() {
        let (_, result) = result(true);
        let cone = uncertainty_cone(&result);
        assert!(cone.cone.iter().all(|p| p.uncertainty_radius_km == 157.0));
        assert_eq!(cone.cone[0].confidence_level, Confidence::Medium);
    }

    #[test]
    fn test_cone_heuristic_growth() {
        let (_, result) = result(false);
        let radii: Vec<f64> = uncertainty_cone(&result)
            .cone
            .iter()
            .map(|p| p.uncertainty_radius_km)
            .collect();
        assert_eq!(radii, vec![50.0, 70.0, 90.0]);
    }
}
