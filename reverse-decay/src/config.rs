//! Application settings loaded from TOML.
//!
//! Every section and field is optional; anything missing falls back to the
//! defaults of the corresponding type.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::backtest::BacktestConfig;
use crate::data::SyntheticConfig;
use crate::error::CoreResult;
use crate::pricing::{BlackScholes, IvSolver, IvSolverConfig};
use crate::scoring::{AnchorVol, DecaySeriesBuilder, ScorerConfig};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Black-Scholes settings (risk-free rate).
    pub pricing: BlackScholes,
    pub solver: IvSolverConfig,
    pub scorer: ScorerConfig,
    pub backtest: BacktestConfig,
    pub synthetic: SyntheticConfig,
}

impl AppConfig {
    pub fn from_toml_str(contents: &str) -> CoreResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> CoreResult<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn iv_solver(&self) -> IvSolver {
        IvSolver::new(self.pricing, self.solver.clone())
    }

    /// Series builder pricing the expected premium at `anchor`.
    pub fn series_builder(&self, anchor: AnchorVol) -> DecaySeriesBuilder {
        DecaySeriesBuilder::new(self.pricing, self.iv_solver(), anchor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use crate::backtest::TradeDirection;
    use crate::error::CoreError;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.pricing.rate, 0.065);
        assert_eq!(config.solver.max_iterations, 100);
        assert_eq!(config.scorer.strong_rds_threshold, 0.10);
        assert_eq!(config.backtest.initial_capital, dec!(100_000));
        assert_eq!(config.backtest.metrics.annualization_days, 252.0);
        assert_eq!(config.synthetic.spot, 22_000.0);
    }

    #[test]
    fn test_partial_sections() {
        let config = AppConfig::from_toml_str(
            r#"
            [pricing]
            rate = 0.07

            [scorer]
            strong_rds_threshold = 0.15

            [backtest]
            initial_capital = 50000
            direction = "short"

            [backtest.metrics]
            profit_factor_cap = 999.0
            "#,
        )
        .unwrap();

        assert_eq!(config.pricing.rate, 0.07);
        assert_eq!(config.scorer.strong_rds_threshold, 0.15);
        assert_eq!(config.scorer.mild_rds_threshold, 0.05);
        assert_eq!(config.backtest.initial_capital, dec!(50000));
        assert_eq!(config.backtest.direction, TradeDirection::Short);
        assert_eq!(config.backtest.metrics.profit_factor_cap, Some(999.0));
        assert_eq!(config.solver.tolerance, 1e-6);
    }

    #[test]
    fn test_malformed_config() {
        let err = AppConfig::from_toml_str("[pricing]\nrate = \"high\"").unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::from_toml_file("does/not/exist.toml").unwrap_err();
        assert!(matches!(err, CoreError::Io(_)));
    }

    #[test]
    fn test_series_builder_uses_configured_rate() {
        let config = AppConfig::from_toml_str("[pricing]\nrate = 0.0").unwrap();
        assert_eq!(config.iv_solver().config().max_iterations, 100);
        let builder = config.series_builder(AnchorVol::Fixed(0.2));
        assert!(builder.build(&[]).unwrap().is_empty());
    }
}
