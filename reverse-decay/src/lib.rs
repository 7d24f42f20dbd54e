pub mod backtest;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod pricing;
pub mod scoring;

// Re-export commonly used types
pub use backtest::{
    run_backtest, BacktestConfig, BacktestEngine, BacktestParams, BacktestResult, Strategy, Trade,
};
pub use config::AppConfig;
pub use data::{DecaySeries, HistoricalBar, OptionChain, OptionQuote, PricePoint, TickSample};
pub use error::{CoreError, CoreResult};
pub use metrics::{BacktestSummary, MetricsCalculator};
pub use pricing::{implied_volatility, straddle_premium, BlackScholes, IvSolver};
pub use scoring::{risk_factor, score_iv, score_point, RiskAssessment, RiskBand, ScorerConfig};
