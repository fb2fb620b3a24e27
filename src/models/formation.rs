//! Formation risk model

use super::Confidence;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Formation risk tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// probability < 0.4
    Low,
    /// 0.4 <= probability < 0.7
    Medium,
    /// probability >= 0.7
    High,
}

/// Queried location and the climatological zone it fell in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormationLocation {
    pub latitude: f64,
    pub longitude: f64,
    /// Matched zone name, "Unknown" outside every zone
    pub zone: String,
}

/// Inputs that drove the probability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormationFactors {
    pub in_formation_zone: bool,
    /// Current month falls in the zone's active season
    pub favorable_season: bool,
    pub zone_probability: f64,
}

/// Likelihood of a new storm forming near a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormationPrediction {
    /// Probability in [0.01, 0.95]
    pub probability: f64,
    pub risk_level: RiskLevel,
    /// Rough time until formation for this risk tier
    pub estimated_time_hours: u32,
    pub confidence: Confidence,
    pub location: FormationLocation,
    pub factors: FormationFactors,
    /// Look-ahead window the caller asked about
    pub window_hours: u32,
}

impl RiskLevel {
    /// Tier for a probability
    #[must_use]
    pub fn from_probability(probability: f64) -> Self {
        match probability {
            p if p >= 0.7 => RiskLevel::High,
            p if p >= 0.4 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }

    /// Estimated hours until formation
    #[must_use]
    pub fn estimated_time_hours(&self) -> u32 {
        match self {
            RiskLevel::High => 24,
            RiskLevel::Medium => 48,
            RiskLevel::Low => 72,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.95, RiskLevel::High, 24)]
    #[case(0.7, RiskLevel::High, 24)]
    #[case(0.69, RiskLevel::Medium, 48)]
    #[case(0.4, RiskLevel::Medium, 48)]
    #[case(0.39, RiskLevel::Low, 72)]
    #[case(0.01, RiskLevel::Low, 72)]
    fn test_risk_tiers(#[case] probability: f64, #[case] level: RiskLevel, #[case] eta: u32) {
        let tier = RiskLevel::from_probability(probability);
        assert_eq!(tier, level);
        assert_eq!(tier.estimated_time_hours(), eta);
    }
}
