//! Performance metrics calculator.
//!
//! Derives trade statistics from a closed trade list and an equity curve.
//! Everything is recomputed from scratch on every call.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::backtest::trade::to_f64;
use crate::backtest::{EquityPoint, ExitReason, Trade};

/// Metric conventions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Periods per year used to annualize the Sharpe ratio.
    pub annualization_days: f64,
    /// Profit factor reported when there are profits but no losses.
    /// `None` reports `f64::INFINITY`.
    pub profit_factor_cap: Option<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            annualization_days: 252.0,
            profit_factor_cap: None,
        }
    }
}

/// Count of trades per exit reason.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitBreakdown {
    pub target: usize,
    pub stop_loss: usize,
    pub threshold: usize,
    pub end_of_period: usize,
}

impl ExitBreakdown {
    fn record(&mut self, reason: ExitReason) {
        match reason {
            ExitReason::Target => self.target += 1,
            ExitReason::StopLoss => self.stop_loss += 1,
            ExitReason::Threshold => self.threshold += 1,
            ExitReason::EndOfPeriod => self.end_of_period += 1,
        }
    }
}

/// Aggregate statistics of a completed backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestSummary {
    // Basic statistics
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,

    // P&L metrics
    pub net_pnl: Decimal,
    pub net_pnl_percent: f64,
    pub gross_profit: Decimal,
    /// Positive magnitude.
    pub gross_loss: Decimal,
    pub profit_factor: f64,
    pub average_win: Decimal,
    /// Positive magnitude.
    pub average_loss: Decimal,
    pub largest_win: Decimal,
    /// Positive magnitude.
    pub largest_loss: Decimal,

    // Risk metrics
    pub max_drawdown: Decimal,
    pub max_drawdown_percent: f64,
    pub sharpe_ratio: f64,

    pub average_duration_days: f64,
    pub final_equity: Decimal,
    pub exits: ExitBreakdown,
}

impl BacktestSummary {
    /// Profit factor for display; the no-loss sentinel renders as `∞`.
    pub fn profit_factor_display(&self) -> String {
        if self.profit_factor.is_infinite() {
            "∞".to_string()
        } else {
            format!("{:.2}", self.profit_factor)
        }
    }

    /// Generate a summary report.
    pub fn report(&self) -> String {
        format!(
            "Performance Summary\n\
             ====================\n\
             \n\
             Trades: {} (W: {}, L: {})\n\
             Win Rate: {:.1}%\n\
             Profit Factor: {}\n\
             \n\
             Net P&L: {:.2} ({:.2}%)\n\
             Avg Winner: {:.2}\n\
             Avg Loser: {:.2}\n\
             Largest Win: {:.2}\n\
             Largest Loss: {:.2}\n\
             \n\
             Max Drawdown: {:.2} ({:.2}%)\n\
             Sharpe Ratio: {:.2}\n\
             \n\
             Avg Days in Trade: {:.1}\n\
             Exits: target={} stopLoss={} threshold={} endOfPeriod={}\n\
             Final Equity: {:.2}",
            self.total_trades,
            self.winning_trades,
            self.losing_trades,
            self.win_rate * 100.0,
            self.profit_factor_display(),
            self.net_pnl,
            self.net_pnl_percent,
            self.average_win,
            self.average_loss,
            self.largest_win,
            self.largest_loss,
            self.max_drawdown,
            self.max_drawdown_percent,
            self.sharpe_ratio,
            self.average_duration_days,
            self.exits.target,
            self.exits.stop_loss,
            self.exits.threshold,
            self.exits.end_of_period,
            self.final_equity,
        )
    }
}

/// Drawdown analysis details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownAnalysis {
    pub max_drawdown: Decimal,
    pub max_drawdown_pct: f64,
    pub peak_date: Option<NaiveDate>,
    pub trough_date: Option<NaiveDate>,
}

/// Metrics calculator.
pub struct MetricsCalculator;

impl MetricsCalculator {
    /// Summarize a trade list and its equity curve.
    pub fn summarize(
        trades: &[Trade],
        equity_curve: &[EquityPoint],
        initial_capital: Decimal,
        config: &MetricsConfig,
    ) -> BacktestSummary {
        // Basic counts
        let total_trades = trades.len();
        let winning_trades = trades.iter().filter(|t| t.is_winner()).count();
        let losing_trades = total_trades - winning_trades;
        let win_rate = if total_trades > 0 {
            winning_trades as f64 / total_trades as f64
        } else {
            0.0
        };

        // P&L calculations
        let net_pnl: Decimal = trades.iter().map(|t| t.pnl).sum();
        let gross_profit: Decimal = trades
            .iter()
            .filter(|t| t.is_winner())
            .map(|t| t.pnl)
            .sum();
        let gross_loss: Decimal = trades
            .iter()
            .filter(|t| !t.is_winner())
            .map(|t| t.pnl.abs())
            .sum();
        let profit_factor = Self::calculate_profit_factor(gross_profit, gross_loss, config);

        let net_pnl_percent = if initial_capital > Decimal::ZERO {
            to_f64(net_pnl / initial_capital * Decimal::ONE_HUNDRED)
        } else {
            0.0
        };

        let average_win = if winning_trades > 0 {
            gross_profit / Decimal::from(winning_trades as i64)
        } else {
            Decimal::ZERO
        };

        let average_loss = if losing_trades > 0 {
            gross_loss / Decimal::from(losing_trades as i64)
        } else {
            Decimal::ZERO
        };

        let largest_win = trades
            .iter()
            .filter(|t| t.is_winner())
            .map(|t| t.pnl)
            .max()
            .unwrap_or(Decimal::ZERO);

        let largest_loss = trades
            .iter()
            .filter(|t| !t.is_winner())
            .map(|t| t.pnl.abs())
            .max()
            .unwrap_or(Decimal::ZERO);

        let drawdown = Self::analyze_drawdown(equity_curve);
        let sharpe_ratio = Self::calculate_sharpe(equity_curve, config.annualization_days);

        let average_duration_days = if total_trades > 0 {
            trades.iter().map(|t| t.duration as f64).sum::<f64>() / total_trades as f64
        } else {
            0.0
        };

        let mut exits = ExitBreakdown::default();
        for trade in trades {
            exits.record(trade.exit_reason);
        }

        let final_equity = equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_capital);

        BacktestSummary {
            total_trades,
            winning_trades,
            losing_trades,
            win_rate,
            net_pnl,
            net_pnl_percent,
            gross_profit,
            gross_loss,
            profit_factor,
            average_win,
            average_loss,
            largest_win,
            largest_loss,
            max_drawdown: drawdown.max_drawdown,
            max_drawdown_percent: drawdown.max_drawdown_pct,
            sharpe_ratio,
            average_duration_days,
            final_equity,
            exits,
        }
    }

    /// Calculate profit factor from gross profit and loss magnitude.
    fn calculate_profit_factor(
        gross_profit: Decimal,
        gross_loss: Decimal,
        config: &MetricsConfig,
    ) -> f64 {
        let loss = to_f64(gross_loss.abs());
        let profit = to_f64(gross_profit);
        if loss == 0.0 {
            if profit > 0.0 {
                return config.profit_factor_cap.unwrap_or(f64::INFINITY);
            }
            return 0.0;
        }
        profit / loss
    }

    /// Largest peak-to-trough decline of the equity curve.
    pub fn analyze_drawdown(equity_curve: &[EquityPoint]) -> DrawdownAnalysis {
        let Some(first) = equity_curve.first() else {
            return DrawdownAnalysis {
                max_drawdown: Decimal::ZERO,
                max_drawdown_pct: 0.0,
                peak_date: None,
                trough_date: None,
            };
        };

        let mut peak = first.equity;
        let mut peak_date = first.date;
        let mut max_drawdown = Decimal::ZERO;
        let mut max_drawdown_pct = 0.0;
        let mut worst: Option<(NaiveDate, NaiveDate)> = None;

        for point in equity_curve {
            if point.equity > peak {
                peak = point.equity;
                peak_date = point.date;
                continue;
            }

            let drawdown = peak - point.equity;
            if drawdown > max_drawdown {
                max_drawdown = drawdown;
                max_drawdown_pct = if peak > Decimal::ZERO {
                    to_f64(drawdown / peak * Decimal::ONE_HUNDRED)
                } else {
                    0.0
                };
                worst = Some((peak_date, point.date));
            }
        }

        DrawdownAnalysis {
            max_drawdown,
            max_drawdown_pct,
            peak_date: worst.map(|(p, _)| p),
            trough_date: worst.map(|(_, t)| t),
        }
    }

    /// Annualized Sharpe ratio of day-over-day equity returns (risk-free rate 0).
    pub fn calculate_sharpe(equity_curve: &[EquityPoint], annualization_days: f64) -> f64 {
        if equity_curve.len() < 2 {
            return 0.0;
        }

        let returns: Vec<f64> = equity_curve
            .windows(2)
            .filter_map(|w| {
                let prev = to_f64(w[0].equity);
                let curr = to_f64(w[1].equity);
                (prev != 0.0).then(|| (curr - prev) / prev)
            })
            .collect();

        if returns.is_empty() {
            return 0.0;
        }

        let mean = returns.iter().sum::<f64>() / returns.len() as f64;
        let variance =
            returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / returns.len() as f64;
        let std_dev = variance.sqrt();

        if std_dev == 0.0 {
            return 0.0;
        }

        mean / std_dev * annualization_days.sqrt()
    }
}
