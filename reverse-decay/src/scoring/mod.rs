//! Decay and signal scoring module.
//!
//! Provides:
//! - Reverse Decay Score (RDS) and IV spike score per sample
//! - Bounded risk factor with Low/Moderate/High bands and actions
//! - Trading signals keyed off the risk factor
//! - Decay series construction from live ticks

pub mod scorer;
pub mod series;
pub mod signals;

pub use scorer::{
    risk_factor, score_iv, score_point, ActionRecommendation, RdsBand, RiskBand, ScorerConfig,
};
pub use series::{AnchorVol, DecaySeriesBuilder, RiskAssessment};
pub use signals::{trading_signals, SignalKind, TradingSignal};
