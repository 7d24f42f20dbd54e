//! Backtest performance statistics.
//!
//! - Win rate, profit factor
//! - Average and largest win/loss
//! - Maximum drawdown
//! - Sharpe ratio

pub mod calculator;

pub use calculator::{
    BacktestSummary, DrawdownAnalysis, ExitBreakdown, MetricsCalculator, MetricsConfig,
};
