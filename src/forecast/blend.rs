//! Merging externally issued forecasts with computed ones

use crate::models::ForecastPoint;
use std::collections::HashSet;

/// Keep every official point and fill hours it does not cover from the
/// extrapolation. The result is ordered by forecast hour.
///
/// Official points come from the caller, typically an advisory feed; the
/// engine and service never fetch them.
#[must_use]
pub fn blend_with_official(
    official: Vec<ForecastPoint>,
    extrapolated: Vec<ForecastPoint>,
) -> Vec<ForecastPoint> {
    let covered: HashSet<u32> = official.iter().map(|p| p.forecast_hour).collect();

    let mut blended = official;
    blended.extend(
        extrapolated
            .into_iter()
            .filter(|p| !covered.contains(&p.forecast_hour)),
    );
    blended.sort_by_key(|p| p.forecast_hour);
    blended
}
