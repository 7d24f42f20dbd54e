//! Reverse decay and IV spike scoring.
//!
//! - RDS: fractional deviation of the actual premium from its theoretical
//!   value, clamped to [-1, 1]
//! - IV score: fractional IV change vs a reference, clamped to [0, 1]
//! - Risk factor: 0.7 * RDS + 0.3 * IV score, both clamped to [0, 1],
//!   scaled to [0, 100]

use serde::{Deserialize, Serialize};

use crate::data::PricePoint;
use crate::error::{ensure_finite, ensure_positive, CoreResult};

/// Clamp into [0, 1], counting NaN as 0.
fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Reverse Decay Score for one sample.
pub fn score_point(actual_premium: f64, expected_premium: f64) -> CoreResult<f64> {
    ensure_finite("actual premium", actual_premium)?;
    ensure_positive("expected premium", expected_premium)?;

    let rds = (actual_premium - expected_premium) / expected_premium;
    Ok(rds.clamp(-1.0, 1.0))
}

/// Normalized IV spike score.
///
/// Only IV expansion scores; a falling IV maps to 0.
pub fn score_iv(current_iv: f64, historical_iv: f64) -> CoreResult<f64> {
    ensure_finite("current IV", current_iv)?;
    ensure_positive("historical IV", historical_iv)?;

    let iv_change = (current_iv - historical_iv) / historical_iv;
    Ok(clamp_unit(iv_change))
}

/// Risk factor of a point with the default weights.
pub fn risk_factor(point: &PricePoint) -> f64 {
    ScorerConfig::default().risk_factor(point)
}

/// Scorer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    /// Weight of the RDS component.
    pub rds_weight: f64,
    /// Weight of the IV score component.
    pub iv_weight: f64,
    /// RDS at or above which a reverse decay is Mild.
    pub mild_rds_threshold: f64,
    /// RDS at or above which a reverse decay is Strong.
    pub strong_rds_threshold: f64,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            rds_weight: 0.7,
            iv_weight: 0.3,
            mild_rds_threshold: 0.05,
            strong_rds_threshold: 0.10,
        }
    }
}

impl ScorerConfig {
    /// Weighted RDS/IV score in [0, 1].
    pub fn combined_score(&self, rds: f64, iv_score: f64) -> f64 {
        clamp_unit(self.rds_weight * clamp_unit(rds) + self.iv_weight * clamp_unit(iv_score))
    }

    /// Risk factor in [0, 100].
    pub fn risk_factor(&self, point: &PricePoint) -> f64 {
        (self.combined_score(point.rds, point.iv_score) * 100.0).clamp(0.0, 100.0)
    }

    /// Display band for an RDS value.
    pub fn rds_band(&self, rds: f64) -> RdsBand {
        if rds >= self.strong_rds_threshold {
            RdsBand::Strong
        } else if rds >= self.mild_rds_threshold {
            RdsBand::Mild
        } else {
            RdsBand::Normal
        }
    }
}

/// Risk classification of a risk factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskBand {
    /// Below 30.
    Low,
    /// 30 up to 60.
    Moderate,
    /// 60 and above.
    High,
}

impl RiskBand {
    pub fn from_risk_factor(risk_factor: f64) -> Self {
        if risk_factor >= 60.0 {
            Self::High
        } else if risk_factor >= 30.0 {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
        }
    }

    /// Recommended action text.
    pub fn action(&self) -> &'static str {
        match self {
            Self::Low => "Standby",
            Self::Moderate => "Possible Entry – Watch Direction",
            Self::High => "Trade Opportunity – Volatility Incoming",
        }
    }

    /// Whether the band calls for doing anything at all.
    pub fn is_actionable(&self) -> bool {
        !matches!(self, Self::Low)
    }
}

/// Action derived from a risk factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecommendation {
    pub risk_factor: f64,
    pub band: RiskBand,
    pub action: String,
    pub actionable: bool,
}

impl ActionRecommendation {
    pub fn from_risk_factor(risk_factor: f64) -> Self {
        let band = RiskBand::from_risk_factor(risk_factor);
        Self {
            risk_factor,
            band,
            action: band.action().to_string(),
            actionable: band.is_actionable(),
        }
    }
}

/// Display band for an RDS value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RdsBand {
    Normal,
    /// Potential reverse decay.
    Mild,
    /// High conviction reverse decay.
    Strong,
}

impl RdsBand {
    pub fn description(&self) -> &'static str {
        match self {
            Self::Normal => "Normal decay",
            Self::Mild => "Potential reverse decay",
            Self::Strong => "High conviction reverse decay",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use crate::error::CoreError;

    fn point(rds: f64, iv_score: f64) -> PricePoint {
        PricePoint {
            time: "10:00".into(),
            actual_premium: 100.0,
            expected_premium: 100.0,
            rds,
            iv_score,
        }
    }

    #[test]
    fn test_score_point() {
        assert_relative_eq!(score_point(120.0, 100.0).unwrap(), 0.2, epsilon = 1e-12);
        assert_relative_eq!(score_point(95.0, 100.0).unwrap(), -0.05, epsilon = 1e-12);
        assert_eq!(score_point(100.0, 100.0).unwrap(), 0.0);
        assert_eq!(score_point(500.0, 100.0).unwrap(), 1.0);
    }

    #[test]
    fn test_score_point_rejects_non_positive_expected() {
        assert!(matches!(score_point(100.0, 0.0), Err(CoreError::InvalidInput(_))));
        assert!(score_point(100.0, -3.0).is_err());
        assert!(score_point(f64::NAN, 100.0).is_err());
    }

    #[test]
    fn test_rds_bounded() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..1_000 {
            let actual = rng.gen_range(1e-6..1e6);
            let expected = rng.gen_range(1e-6..1e6);
            let rds = score_point(actual, expected).unwrap();
            assert!((-1.0..=1.0).contains(&rds));
        }
    }

    #[test]
    fn test_score_iv() {
        assert_relative_eq!(score_iv(0.18, 0.15).unwrap(), 0.2, epsilon = 1e-12);
        assert_eq!(score_iv(0.12, 0.15).unwrap(), 0.0);
        assert_eq!(score_iv(0.60, 0.15).unwrap(), 1.0);
        assert!(score_iv(0.2, 0.0).is_err());
    }

    #[test]
    fn test_risk_factor_weights() {
        assert_relative_eq!(risk_factor(&point(0.5, 0.5)), 50.0, epsilon = 1e-9);
        assert_relative_eq!(risk_factor(&point(0.2, 0.0)), 14.0, epsilon = 1e-9);
        assert_relative_eq!(risk_factor(&point(0.0, 1.0)), 30.0, epsilon = 1e-9);
        assert_eq!(risk_factor(&point(-0.4, 0.0)), 0.0);
        assert_relative_eq!(risk_factor(&point(3.0, 3.0)), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_risk_factor_bounded() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..1_000 {
            let rf = risk_factor(&point(rng.gen_range(-1e3..1e3), rng.gen_range(-1e3..1e3)));
            assert!((0.0..=100.0).contains(&rf));
        }
        assert_relative_eq!(risk_factor(&point(f64::NAN, 0.5)), 15.0, epsilon = 1e-9);
    }

    #[test]
    fn test_risk_bands() {
        assert_eq!(RiskBand::from_risk_factor(0.0), RiskBand::Low);
        assert_eq!(RiskBand::from_risk_factor(29.99), RiskBand::Low);
        assert_eq!(RiskBand::from_risk_factor(30.0), RiskBand::Moderate);
        assert_eq!(RiskBand::from_risk_factor(59.99), RiskBand::Moderate);
        assert_eq!(RiskBand::from_risk_factor(60.0), RiskBand::High);
        assert_eq!(RiskBand::Low.action(), "Standby");
        assert!(!ActionRecommendation::from_risk_factor(10.0).actionable);
        assert!(ActionRecommendation::from_risk_factor(75.0).actionable);
    }

    #[test]
    fn test_rds_bands() {
        let config = ScorerConfig::default();
        assert_eq!(config.rds_band(0.049), RdsBand::Normal);
        assert_eq!(config.rds_band(0.05), RdsBand::Mild);
        assert_eq!(config.rds_band(0.0999), RdsBand::Mild);
        assert_eq!(config.rds_band(0.10), RdsBand::Strong);
        assert_eq!(config.rds_band(-0.3), RdsBand::Normal);

        let strict = ScorerConfig {
            strong_rds_threshold: 0.15,
            ..Default::default()
        };
        assert_eq!(strict.rds_band(0.12), RdsBand::Mild);
    }
}
