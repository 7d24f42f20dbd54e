//! Entry/exit signal evaluators, one per strategy.

use serde::{Deserialize, Serialize};

use crate::data::HistoricalBar;
use crate::error::CoreResult;
use crate::scoring::{score_iv, score_point, ScorerConfig};

/// Scores of one historical bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarScores {
    pub rds: f64,
    pub iv_score: f64,
}

impl BarScores {
    pub fn from_bar(bar: &HistoricalBar) -> CoreResult<Self> {
        Ok(Self {
            rds: score_point(bar.premium, bar.expected_premium)?,
            iv_score: score_iv(bar.iv, bar.reference_iv)?,
        })
    }
}

/// Backtest strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Strategy {
    /// Trade on the Reverse Decay Score.
    #[default]
    ReverseDecay,
    /// Trade on the IV spike score.
    IvSpike,
    /// Trade on the weighted RDS/IV score.
    Combined,
}

impl Strategy {
    /// Signal compared against the entry and exit thresholds.
    pub fn signal(&self, scores: &BarScores, scorer: &ScorerConfig) -> f64 {
        match self {
            Self::ReverseDecay => reverse_decay_signal(scores),
            Self::IvSpike => iv_spike_signal(scores),
            Self::Combined => combined_signal(scores, scorer),
        }
    }

    /// Whether a flat book opens a position on this bar.
    ///
    /// Combined enters when either the RDS or the IV score clears the
    /// threshold, or when their weighted score does.
    pub fn enters(&self, scores: &BarScores, scorer: &ScorerConfig, threshold: f64) -> bool {
        match self {
            Self::Combined => {
                reverse_decay_signal(scores) > threshold
                    || iv_spike_signal(scores) > threshold
                    || combined_signal(scores, scorer) > threshold
            }
            _ => self.signal(scores, scorer) > threshold,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ReverseDecay => "reverseDecay",
            Self::IvSpike => "ivSpike",
            Self::Combined => "combined",
        }
    }
}

fn reverse_decay_signal(scores: &BarScores) -> f64 {
    scores.rds
}

fn iv_spike_signal(scores: &BarScores) -> f64 {
    scores.iv_score
}

fn combined_signal(scores: &BarScores, scorer: &ScorerConfig) -> f64 {
    scorer.combined_score(scores.rds, scores.iv_score)
}
