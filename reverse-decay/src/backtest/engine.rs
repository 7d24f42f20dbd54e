//! Core backtesting engine.
//!
//! Runs the simulation loop over historical straddle bars:
//! 1. Score the bar (RDS, IV score) and derive the strategy signal
//! 2. Mark the open position to market
//! 3. Check exits: stop loss, then target, then signal threshold
//! 4. Otherwise enter when flat and the signal clears the entry threshold
//! 5. Force-close on the last bar
//! 6. Record daily equity
//!
//! At most one position is open at a time.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::data::HistoricalBar;
use crate::error::{ensure_finite, ensure_positive, CoreError, CoreResult};
use crate::metrics::{BacktestSummary, MetricsCalculator, MetricsConfig};
use crate::scoring::ScorerConfig;

use super::strategy::{BarScores, Strategy};
use super::trade::{to_decimal, ExitReason, Position, Trade, TradeDirection};

/// Bar interval of the historical series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeFrame {
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[default]
    #[serde(rename = "1d")]
    OneDay,
}

/// User-supplied parameters of one backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestParams {
    pub symbol: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    #[serde(default)]
    pub time_frame: TimeFrame,
    pub strategy: Strategy,
    /// Signal above which a position opens (fraction, e.g. 0.05).
    pub entry_threshold: f64,
    /// Signal below which an open position closes (fraction).
    pub exit_threshold: f64,
    /// Stop loss in percent of the entry premium.
    pub stop_loss: f64,
    /// Profit target in percent of the entry premium.
    pub target_profit: f64,
}

impl BacktestParams {
    /// Reject malformed parameters before any simulation.
    pub fn validate(&self) -> CoreResult<()> {
        if self.from_date > self.to_date {
            return Err(CoreError::invalid_input(format!(
                "from date {} is after to date {}",
                self.from_date, self.to_date
            )));
        }
        ensure_finite("entry threshold", self.entry_threshold)?;
        ensure_finite("exit threshold", self.exit_threshold)?;
        ensure_positive("stop loss", self.stop_loss)?;
        ensure_positive("target profit", self.target_profit)
    }
}

/// Engine-wide settings that are not part of a single run's parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Starting equity.
    pub initial_capital: Decimal,

    /// Side taken on entry.
    pub direction: TradeDirection,

    /// Metric conventions for the summary.
    pub metrics: MetricsConfig,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: Decimal::from(100_000),
            direction: TradeDirection::Long,
            metrics: MetricsConfig::default(),
        }
    }
}

/// Equity snapshot after one simulated bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: Decimal,
    pub open_position: bool,
}

/// Result of a completed backtest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestResult {
    /// Parameters used.
    pub params: BacktestParams,

    pub initial_capital: Decimal,

    /// All completed trades, in chronological order.
    pub trades: Vec<Trade>,

    pub summary: BacktestSummary,

    /// Baseline point followed by one point per bar.
    pub equity_curve: Vec<EquityPoint>,
}

impl BacktestResult {
    pub fn final_equity(&self) -> Decimal {
        self.equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(self.initial_capital)
    }
}

/// The backtesting engine.
pub struct BacktestEngine {
    config: BacktestConfig,
    scorer: ScorerConfig,
    cash: Decimal,
    position: Option<Position>,
    closed_trades: Vec<Trade>,
    equity_curve: Vec<EquityPoint>,
}

impl BacktestEngine {
    /// Create a new backtest engine.
    pub fn new(config: BacktestConfig, scorer: ScorerConfig) -> Self {
        let cash = config.initial_capital;
        Self {
            config,
            scorer,
            cash,
            position: None,
            closed_trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Run a backtest over `bars`.
    ///
    /// Bars must be in chronological order; those outside the parameter
    /// date range are ignored.
    pub fn run(
        &mut self,
        params: &BacktestParams,
        bars: &[HistoricalBar],
    ) -> CoreResult<BacktestResult> {
        params.validate()?;
        ensure_chronological(bars)?;

        // Reset state
        self.cash = self.config.initial_capital;
        self.position = None;
        self.closed_trades.clear();
        self.equity_curve.clear();
        self.equity_curve.push(EquityPoint {
            date: params.from_date,
            equity: self.config.initial_capital,
            open_position: false,
        });

        let in_range: Vec<&HistoricalBar> = bars
            .iter()
            .filter(|b| b.date >= params.from_date && b.date <= params.to_date)
            .collect();

        info!(
            symbol = %params.symbol,
            strategy = params.strategy.name(),
            bars = in_range.len(),
            "starting backtest"
        );

        for (i, bar) in in_range.iter().enumerate() {
            let is_last = i + 1 == in_range.len();
            self.process_bar(params, bar, is_last)?;
        }

        let result = self.build_result(params);
        info!(
            symbol = %params.symbol,
            trades = result.trades.len(),
            final_equity = %result.final_equity(),
            "backtest finished"
        );
        Ok(result)
    }

    /// Process a single bar.
    fn process_bar(
        &mut self,
        params: &BacktestParams,
        bar: &HistoricalBar,
        is_last: bool,
    ) -> CoreResult<()> {
        ensure_positive("bar premium", bar.premium)?;
        let scores = BarScores::from_bar(bar)?;
        let signal = params.strategy.signal(&scores, &self.scorer);
        let premium = to_decimal("bar premium", bar.premium)?;

        match self.position.as_mut() {
            Some(position) => {
                position.update_mtm(premium);
                if let Some((reason, price)) = Self::exit_signal(position, params, bar, signal)? {
                    self.close_position(bar.date, price, reason);
                }
            }
            None if params
                .strategy
                .enters(&scores, &self.scorer, params.entry_threshold) =>
            {
                debug!(date = %bar.date, %premium, signal, "opening position");
                self.position = Some(Position::open(bar.date, premium, self.config.direction));
            }
            None => {}
        }

        if is_last && self.position.is_some() {
            self.close_position(bar.date, premium, ExitReason::EndOfPeriod);
        }

        let unrealized = self
            .position
            .as_ref()
            .map(|p| p.unrealized_pnl())
            .unwrap_or(Decimal::ZERO);

        self.equity_curve.push(EquityPoint {
            date: bar.date,
            equity: self.cash + unrealized,
            open_position: self.position.is_some(),
        });
        Ok(())
    }

    /// First exit condition that holds on this bar, with its fill price.
    fn exit_signal(
        position: &Position,
        params: &BacktestParams,
        bar: &HistoricalBar,
        signal: f64,
    ) -> CoreResult<Option<(ExitReason, Decimal)>> {
        let high = to_decimal("bar high", bar.high())?;
        let low = to_decimal("bar low", bar.low())?;

        if position.is_stop_loss_hit(position.adverse_price(high, low), params.stop_loss) {
            let stop = to_decimal("stop loss", params.stop_loss)?;
            let fill = position.stop_fill(stop, position.current_price);
            return Ok(Some((ExitReason::StopLoss, fill)));
        }

        if position.is_profit_target_hit(position.favorable_price(high, low), params.target_profit) {
            let target = to_decimal("target profit", params.target_profit)?;
            return Ok(Some((ExitReason::Target, position.target_price(target))));
        }

        if signal < params.exit_threshold {
            return Ok(Some((ExitReason::Threshold, position.current_price)));
        }

        Ok(None)
    }

    /// Realize the open position and record the trade.
    fn close_position(&mut self, date: NaiveDate, price: Decimal, reason: ExitReason) {
        let Some(mut position) = self.position.take() else {
            return;
        };

        position.close(date, price, reason);
        if let Some(trade) = Trade::from_position(&position) {
            debug!(
                date = %date,
                reason = reason.as_str(),
                pnl = %trade.pnl,
                "closed position"
            );
            self.cash += trade.pnl;
            self.closed_trades.push(trade);
        }
    }

    /// Build the final backtest result.
    fn build_result(&self, params: &BacktestParams) -> BacktestResult {
        // The baseline always equals the first bar's equity (entries fill at
        // the close), so only bar points feed the statistics.
        let bar_points = self.equity_curve.get(1..).unwrap_or_default();
        let summary = MetricsCalculator::summarize(
            &self.closed_trades,
            bar_points,
            self.config.initial_capital,
            &self.config.metrics,
        );

        BacktestResult {
            params: params.clone(),
            initial_capital: self.config.initial_capital,
            trades: self.closed_trades.clone(),
            summary,
            equity_curve: self.equity_curve.clone(),
        }
    }

    /// Get current open position.
    pub fn open_position(&self) -> Option<&Position> {
        self.position.as_ref()
    }
}

fn ensure_chronological(bars: &[HistoricalBar]) -> CoreResult<()> {
    match bars.windows(2).find(|w| w[1].date < w[0].date) {
        Some(w) => Err(CoreError::invalid_input(format!(
            "bars out of order: {} follows {}",
            w[1].date, w[0].date
        ))),
        None => Ok(()),
    }
}

/// Run a backtest with default engine settings.
pub fn run_backtest(params: &BacktestParams, bars: &[HistoricalBar]) -> CoreResult<BacktestResult> {
    BacktestEngine::new(BacktestConfig::default(), ScorerConfig::default()).run(params, bars)
}
