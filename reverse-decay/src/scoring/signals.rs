//! Trading signals keyed off the risk factor.
//!
//! Each signal has its own activation boundary:
//! - Reverse Decay: risk factor > 30
//! - IV Expansion: risk factor > 40
//! - Breakout Potential: risk factor > 50
//! - Theta Decay: risk factor < 40

use serde::{Deserialize, Serialize};

/// Kind of trading signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    ReverseDecay,
    IvExpansion,
    BreakoutPotential,
    ThetaDecay,
}

impl SignalKind {
    pub const ALL: [SignalKind; 4] = [
        Self::ReverseDecay,
        Self::IvExpansion,
        Self::BreakoutPotential,
        Self::ThetaDecay,
    ];

    /// Risk factor boundary for this signal.
    pub fn threshold(&self) -> f64 {
        match self {
            Self::ReverseDecay => 30.0,
            Self::IvExpansion => 40.0,
            Self::BreakoutPotential => 50.0,
            Self::ThetaDecay => 40.0,
        }
    }

    pub fn is_active(&self, risk_factor: f64) -> bool {
        match self {
            Self::ThetaDecay => risk_factor < self.threshold(),
            _ => risk_factor > self.threshold(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ReverseDecay => "Reverse Decay",
            Self::IvExpansion => "IV Expansion",
            Self::BreakoutPotential => "Breakout Potential",
            Self::ThetaDecay => "Theta Decay",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::ReverseDecay => "Premium holding above its theoretical decay path",
            Self::IvExpansion => "Implied volatility expanding against its baseline",
            Self::BreakoutPotential => "Directional move likely to follow",
            Self::ThetaDecay => "Normal time decay dominates, premium sellers favored",
        }
    }
}

/// A signal evaluated against one risk factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradingSignal {
    pub kind: SignalKind,
    pub active: bool,
}

/// Evaluate every signal for a risk factor.
pub fn trading_signals(risk_factor: f64) -> Vec<TradingSignal> {
    SignalKind::ALL
        .iter()
        .map(|&kind| TradingSignal {
            kind,
            active: kind.is_active(risk_factor),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_kinds(risk_factor: f64) -> Vec<SignalKind> {
        trading_signals(risk_factor)
            .into_iter()
            .filter(|s| s.active)
            .map(|s| s.kind)
            .collect()
    }

    #[test]
    fn test_quiet_market_only_theta() {
        assert_eq!(active_kinds(0.0), vec![SignalKind::ThetaDecay]);
        assert_eq!(active_kinds(30.0), vec![SignalKind::ThetaDecay]);
    }

    #[test]
    fn test_boundaries_are_strict() {
        assert_eq!(
            active_kinds(30.5),
            vec![SignalKind::ReverseDecay, SignalKind::ThetaDecay]
        );
        assert_eq!(active_kinds(40.0), vec![SignalKind::ReverseDecay]);
        assert_eq!(
            active_kinds(45.0),
            vec![SignalKind::ReverseDecay, SignalKind::IvExpansion]
        );
        assert_eq!(
            active_kinds(50.0),
            vec![SignalKind::ReverseDecay, SignalKind::IvExpansion]
        );
    }

    #[test]
    fn test_hot_market_all_but_theta() {
        assert_eq!(
            active_kinds(80.0),
            vec![
                SignalKind::ReverseDecay,
                SignalKind::IvExpansion,
                SignalKind::BreakoutPotential
            ]
        );
    }
}
