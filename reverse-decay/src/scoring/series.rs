//! Decay series construction and risk assessment.
//!
//! Turns already-parsed straddle ticks into scored [`PricePoint`]s:
//! the expected premium is the Black-Scholes straddle at an anchor
//! volatility with the tick's remaining time, so it decays with theta
//! alone. The actual premium is inverted to an IV and scored against the
//! tick's reference IV.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::{DecaySeries, PricePoint, TickSample};
use crate::error::{ensure_positive, CoreError, CoreResult};
use crate::pricing::{BlackScholes, IvSolver};

use super::scorer::{score_iv, score_point, ActionRecommendation, RdsBand, RiskBand, ScorerConfig};
use super::signals::{trading_signals, TradingSignal};

/// Volatility used to price the theoretical decay path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AnchorVol {
    /// Fixed volatility for the whole series.
    Fixed(f64),
    /// Implied volatility of the first tick's premium.
    FirstTick,
}

/// Builds a [`DecaySeries`] from tick samples.
#[derive(Debug, Clone)]
pub struct DecaySeriesBuilder {
    bs: BlackScholes,
    solver: IvSolver,
    anchor: AnchorVol,
}

impl DecaySeriesBuilder {
    pub fn new(bs: BlackScholes, solver: IvSolver, anchor: AnchorVol) -> Self {
        Self { bs, solver, anchor }
    }

    /// Score every tick. An empty tick slice yields an empty series.
    pub fn build(&self, ticks: &[TickSample]) -> CoreResult<DecaySeries> {
        let Some(first) = ticks.first() else {
            return Ok(DecaySeries::default());
        };

        let anchor_vol = self.anchor_vol(first)?;
        debug!(anchor_vol, ticks = ticks.len(), "building decay series");

        ticks
            .iter()
            .map(|tick| self.score_tick(tick, anchor_vol))
            .collect::<CoreResult<Vec<_>>>()
            .map(DecaySeries::from)
    }

    fn anchor_vol(&self, first: &TickSample) -> CoreResult<f64> {
        match self.anchor {
            AnchorVol::Fixed(vol) => {
                ensure_positive("anchor volatility", vol)?;
                Ok(vol)
            }
            AnchorVol::FirstTick => {
                let solution = self.solver.solve(
                    first.actual_premium,
                    first.spot,
                    first.strike,
                    first.time_to_expiry,
                )?;
                if !solution.converged {
                    return Err(CoreError::invalid_input(format!(
                        "no implied volatility for first tick premium {}",
                        first.actual_premium
                    )));
                }
                Ok(solution.volatility)
            }
        }
    }

    fn score_tick(&self, tick: &TickSample, anchor_vol: f64) -> CoreResult<PricePoint> {
        let expected_premium =
            self.bs
                .straddle_price(tick.spot, tick.strike, tick.time_to_expiry, anchor_vol)?;
        let rds = score_point(tick.actual_premium, expected_premium)?;

        let iv_score = if tick.time_to_expiry > 0.0 {
            let solution = self.solver.solve(
                tick.actual_premium,
                tick.spot,
                tick.strike,
                tick.time_to_expiry,
            )?;
            if solution.converged {
                score_iv(solution.volatility, tick.reference_iv)?
            } else {
                debug!(time = %tick.time, "IV unavailable, scoring as 0");
                0.0
            }
        } else {
            0.0
        };

        Ok(PricePoint {
            time: tick.time.clone(),
            actual_premium: tick.actual_premium,
            expected_premium,
            rds,
            iv_score,
        })
    }
}

/// Everything the dashboard shows about the latest point of a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub time: String,
    pub rds: f64,
    pub rds_band: RdsBand,
    pub iv_score: f64,
    pub risk_factor: f64,
    pub band: RiskBand,
    pub recommendation: ActionRecommendation,
    pub signals: Vec<TradingSignal>,
}

impl RiskAssessment {
    /// Assess one point.
    pub fn from_point(point: &PricePoint, config: &ScorerConfig) -> Self {
        let risk_factor = config.risk_factor(point);
        let recommendation = ActionRecommendation::from_risk_factor(risk_factor);
        Self {
            time: point.time.clone(),
            rds: point.rds,
            rds_band: config.rds_band(point.rds),
            iv_score: point.iv_score,
            risk_factor,
            band: recommendation.band,
            recommendation,
            signals: trading_signals(risk_factor),
        }
    }

    /// Assess the latest point of a series; `None` when it is empty.
    pub fn from_series(series: &DecaySeries, config: &ScorerConfig) -> Option<Self> {
        series.latest().map(|p| Self::from_point(p, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    use crate::pricing::IvSolverConfig;
    use crate::scoring::SignalKind;

    fn builder(anchor: AnchorVol) -> DecaySeriesBuilder {
        let bs = BlackScholes::new(0.065);
        DecaySeriesBuilder::new(bs, IvSolver::new(bs, IvSolverConfig::default()), anchor)
    }

    /// Ticks whose premium follows the theoretical path at `vol`, scaled.
    fn ticks(vol: f64, scale: &[f64]) -> Vec<TickSample> {
        let bs = BlackScholes::new(0.065);
        scale
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let t = (7.0 - i as f64 * 0.5) / 365.0;
                let fair = bs.straddle_price(22_000.0, 22_000.0, t, vol).unwrap();
                TickSample {
                    time: format!("T{i}"),
                    spot: 22_000.0,
                    strike: 22_000.0,
                    time_to_expiry: t,
                    actual_premium: fair * s,
                    reference_iv: vol,
                }
            })
            .collect()
    }

    #[test]
    fn test_flat_market_scores_zero() {
        let series = builder(AnchorVol::Fixed(0.14))
            .build(&ticks(0.14, &[1.0, 1.0, 1.0, 1.0]))
            .unwrap();

        assert_eq!(series.len(), 4);
        for point in &series {
            assert!(point.rds.abs() < 1e-9);
            assert!(point.iv_score < 1e-6);
        }

        let assessment = RiskAssessment::from_series(&series, &ScorerConfig::default()).unwrap();
        assert!(assessment.risk_factor < 1e-4);
        assert_eq!(assessment.band, RiskBand::Low);
        assert_eq!(assessment.recommendation.action, "Standby");
        assert_eq!(assessment.rds_band, RdsBand::Normal);
    }

    #[test]
    fn test_premium_spike_raises_risk() {
        let series = builder(AnchorVol::Fixed(0.14))
            .build(&ticks(0.14, &[1.0, 1.0, 1.3]))
            .unwrap();

        let latest = series.latest().unwrap();
        assert_relative_eq!(latest.rds, 0.3, epsilon = 1e-9);
        // A 30% richer ATM straddle implies roughly 30% more volatility
        assert!(latest.iv_score > 0.25 && latest.iv_score < 0.35);

        let assessment = RiskAssessment::from_series(&series, &ScorerConfig::default()).unwrap();
        assert!(assessment.risk_factor > 29.0);
        assert_eq!(assessment.rds_band, RdsBand::Strong);
        let reverse = assessment
            .signals
            .iter()
            .find(|s| s.kind == SignalKind::ReverseDecay)
            .unwrap();
        assert_eq!(reverse.active, assessment.risk_factor > 30.0);
    }

    #[test]
    fn test_first_tick_anchor() {
        let series = builder(AnchorVol::FirstTick)
            .build(&ticks(0.2, &[1.0, 1.0, 1.0]))
            .unwrap();
        for point in &series {
            assert!(point.rds.abs() < 1e-6);
        }
    }

    #[test]
    fn test_empty_ticks() {
        let series = builder(AnchorVol::FirstTick).build(&[]).unwrap();
        assert!(series.is_empty());
        assert!(RiskAssessment::from_series(&series, &ScorerConfig::default()).is_none());
    }

    #[test]
    fn test_invalid_anchor_rejected() {
        let result = builder(AnchorVol::Fixed(0.0)).build(&ticks(0.14, &[1.0]));
        assert!(matches!(result, Err(CoreError::InvalidInput(_))));
    }
}
