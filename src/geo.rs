//! Spherical-earth geodesy: distance, initial bearing and destination point
//!
//! All functions take degrees and kilometres. Earth is a sphere of radius
//! [`EARTH_RADIUS_KM`].

use serde::{Deserialize, Serialize};

/// Mean Earth radius in km
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometres per degree of latitude, used to turn degree bands into distances
pub const KM_PER_DEGREE: f64 = 111.0;

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both components lie in their valid ranges
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Great-circle (haversine) distance in km
#[must_use]
pub fn distance(from: Coordinates, to: Coordinates) -> f64 {
    haversine::distance(
        haversine::Location {
            latitude: from.latitude,
            longitude: from.longitude,
        },
        haversine::Location {
            latitude: to.latitude,
            longitude: to.longitude,
        },
        haversine::Units::Kilometers,
    )
}

/// Initial compass bearing from `from` to `to`, in [0, 360).
///
/// Coincident points have no direction and yield 0°.
#[must_use]
pub fn bearing(from: Coordinates, to: Coordinates) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let dlon = (to.longitude - from.longitude).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();

    if !y.is_finite() || !x.is_finite() || (y.abs() < 1e-15 && x.abs() < 1e-15) {
        return 0.0;
    }

    normalize_bearing(y.atan2(x).to_degrees())
}

/// Point reached by travelling `distance_km` from `start` on initial `bearing_deg`.
///
/// Longitude of the result is normalised to (-180, 180].
#[must_use]
pub fn destination(start: Coordinates, bearing_deg: f64, distance_km: f64) -> Coordinates {
    if !bearing_deg.is_finite() || !distance_km.is_finite() {
        return start;
    }

    let angular = distance_km / EARTH_RADIUS_KM;
    let theta = bearing_deg.to_radians();
    let lat1 = start.latitude.to_radians();
    let lon1 = start.longitude.to_radians();

    let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * theta.cos())
        .clamp(-1.0, 1.0)
        .asin();
    let lon2 = lon1
        + (theta.sin() * angular.sin() * lat1.cos())
            .atan2(angular.cos() - lat1.sin() * lat2.sin());

    Coordinates {
        latitude: lat2.to_degrees(),
        longitude: normalize_longitude(lon2.to_degrees()),
    }
}

/// Wrap a bearing into [0, 360)
#[must_use]
pub fn normalize_bearing(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Wrap a longitude into (-180, 180]
#[must_use]
pub fn normalize_longitude(degrees: f64) -> f64 {
    let wrapped = (degrees + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped <= -180.0 { wrapped + 360.0 } else { wrapped }
}

/// Arithmetic mean of bearings. Kept for compatibility with older output;
/// it is wrong near north, where 350° and 10° average to 180°.
#[must_use]
pub fn arithmetic_mean_bearing(bearings: &[f64]) -> f64 {
    if bearings.is_empty() {
        return 0.0;
    }
    bearings.iter().sum::<f64>() / bearings.len() as f64
}

/// Circular mean of bearings (atan2 of summed unit vectors).
///
/// Opposing bearings that cancel out yield 0°.
#[must_use]
pub fn circular_mean_bearing(bearings: &[f64]) -> f64 {
    let (sin_sum, cos_sum) = bearings.iter().fold((0.0, 0.0), |(s, c), b| {
        let r = b.to_radians();
        (s + r.sin(), c + r.cos())
    });

    if sin_sum.abs() < 1e-12 && cos_sum.abs() < 1e-12 {
        return 0.0;
    }

    normalize_bearing(sin_sum.atan2(cos_sum).to_degrees())
}

/// Remove ±360° jumps so a track crossing the antimeridian is continuous
#[must_use]
pub fn unwrap_longitudes(longitudes: &[f64]) -> Vec<f64> {
    let mut unwrapped = Vec::with_capacity(longitudes.len());
    let mut offset = 0.0;
    let mut previous: Option<f64> = None;
    for &lon in longitudes {
        if let Some(prev) = previous {
            let step = lon - prev;
            if step > 180.0 {
                offset -= 360.0;
            } else if step < -180.0 {
                offset += 360.0;
            }
        }
        previous = Some(lon);
        unwrapped.push(lon + offset);
    }
    unwrapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    #[rstest]
    #[case(Coordinates::new(25.0, -80.0))]
    #[case(Coordinates::new(-33.9, 151.2))]
    #[case(Coordinates::new(0.0, 180.0))]
    #[case(Coordinates::new(89.9, 0.0))]
    fn test_distance_to_self_is_zero(#[case] p: Coordinates) {
        assert_abs_diff_eq!(distance(p, p), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let miami = Coordinates::new(25.76, -80.19);
        let havana = Coordinates::new(23.11, -82.37);
        assert_abs_diff_eq!(distance(miami, havana), distance(havana, miami), epsilon = 1e-9);
        // roughly 370 km apart
        let d = distance(miami, havana);
        assert!(d > 340.0 && d < 400.0, "got {d}");
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let d = distance(Coordinates::new(0.0, 0.0), Coordinates::new(1.0, 0.0));
        assert_abs_diff_eq!(d, EARTH_RADIUS_KM.to_radians(), epsilon = 1e-6);
    }

    #[rstest]
    #[case(Coordinates::new(1.0, 0.0), 0.0)]
    #[case(Coordinates::new(0.0, 1.0), 90.0)]
    #[case(Coordinates::new(-1.0, 0.0), 180.0)]
    #[case(Coordinates::new(0.0, -1.0), 270.0)]
    fn test_bearing_cardinal_directions(#[case] to: Coordinates, #[case] expected: f64) {
        let b = bearing(Coordinates::new(0.0, 0.0), to);
        assert_abs_diff_eq!(b, expected, epsilon = 1e-9);
        assert!((0.0..360.0).contains(&b));
    }

    #[test]
    fn test_bearing_coincident_points_is_zero() {
        let p = Coordinates::new(12.5, 130.0);
        let b = bearing(p, p);
        assert_eq!(b, 0.0);
        assert!(!b.is_nan());
    }

    #[rstest]
    #[case(Coordinates::new(25.0, -80.0), 45.0, 500.0)]
    #[case(Coordinates::new(15.0, 140.0), 290.0, 800.0)]
    #[case(Coordinates::new(-20.0, 60.0), 180.0, 250.0)]
    #[case(Coordinates::new(10.0, 179.5), 90.0, 300.0)]
    #[case(Coordinates::new(30.0, -40.0), 0.0, 900.0)]
    #[case(Coordinates::new(12.0, -60.0), 315.0, 50.0)]
    fn test_destination_round_trip(
        #[case] start: Coordinates,
        #[case] heading: f64,
        #[case] km: f64,
    ) {
        let out = destination(start, heading, km);
        let back_bearing = (heading + 180.0) % 360.0;
        let back = destination(out, back_bearing, km);
        // initial and final bearings differ on a sphere, so the tolerance
        // grows with distance travelled
        let drift = distance(start, back);
        assert!(drift < km * 0.05, "drift {drift} km over {km} km");
    }

    #[test]
    fn test_destination_then_reverse_initial_bearing_is_exact() {
        let start = Coordinates::new(25.0, -80.0);
        let out = destination(start, 60.0, 700.0);
        let reverse = bearing(out, start);
        let back = destination(out, reverse, 700.0);
        assert_abs_diff_eq!(back.latitude, start.latitude, epsilon = 1e-6);
        assert_abs_diff_eq!(back.longitude, start.longitude, epsilon = 1e-6);
    }

    #[test]
    fn test_destination_wraps_antimeridian() {
        let out = destination(Coordinates::new(0.0, 179.0), 90.0, 333.0);
        assert!(out.longitude < 0.0 && out.longitude > -180.0);
        assert_abs_diff_eq!(out.longitude, -178.0, epsilon = 0.01);
    }

    #[test]
    fn test_destination_zero_distance() {
        let start = Coordinates::new(18.0, -65.0);
        let out = destination(start, 123.0, 0.0);
        assert_abs_diff_eq!(out.latitude, start.latitude, epsilon = 1e-12);
        assert_abs_diff_eq!(out.longitude, start.longitude, epsilon = 1e-12);
    }

    #[rstest]
    #[case(180.0, 180.0)]
    #[case(-180.0, 180.0)]
    #[case(190.0, -170.0)]
    #[case(-190.0, 170.0)]
    #[case(540.0, 180.0)]
    fn test_normalize_longitude(#[case] input: f64, #[case] expected: f64) {
        assert_abs_diff_eq!(normalize_longitude(input), expected, epsilon = 1e-9);
    }

    #[test]
    fn test_mean_bearing_wraparound() {
        let bearings = [350.0, 10.0];
        // the arithmetic mean points the wrong way
        assert_abs_diff_eq!(arithmetic_mean_bearing(&bearings), 180.0, epsilon = 1e-9);
        let circular = circular_mean_bearing(&bearings);
        assert!(circular < 1e-6 || circular > 360.0 - 1e-6, "got {circular}");
    }

    #[test]
    fn test_mean_bearing_agrees_away_from_north() {
        let bearings = [80.0, 100.0, 90.0];
        assert_abs_diff_eq!(arithmetic_mean_bearing(&bearings), 90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(circular_mean_bearing(&bearings), 90.0, epsilon = 1e-9);
        assert_eq!(circular_mean_bearing(&[]), 0.0);
        assert_eq!(arithmetic_mean_bearing(&[]), 0.0);
    }

    #[test]
    fn test_unwrap_longitudes_across_antimeridian() {
        let unwrapped = unwrap_longitudes(&[178.0, 179.5, -179.0, -177.5]);
        assert_eq!(unwrapped, vec![178.0, 179.5, 181.0, 182.5]);

        let westward = unwrap_longitudes(&[-179.0, 179.0, 177.0]);
        assert_eq!(westward, vec![-179.0, -181.0, -183.0]);

        assert_eq!(unwrap_longitudes(&[-80.0, -81.0]), vec![-80.0, -81.0]);
    }
}
