//! Threshold backtester for straddle premium signals.
//!
//! - Strategy signals per bar (RDS, IV spike, weighted combination)
//! - Single-position lifecycle (entry, mark-to-market, exits)
//! - Stop loss and target fills at their trigger levels
//! - Equity curve and summary statistics

pub mod engine;
pub mod strategy;
pub mod trade;

pub use engine::{
    run_backtest, BacktestConfig, BacktestEngine, BacktestParams, BacktestResult, EquityPoint,
    TimeFrame,
};
pub use strategy::{BarScores, Strategy};
pub use trade::{ExitReason, Position, PositionStatus, Trade, TradeDirection};
