//! Trade and position management for backtesting.
//!
//! Handles the straddle position lifecycle:
//! - Entry at the bar premium
//! - Mark-to-market against later bars
//! - Exit conditions (stop loss, profit target, signal threshold, end of data)
//! - P&L calculation

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Convert a market value into money, rejecting NaN and infinities.
pub(crate) fn to_decimal(name: &str, value: f64) -> CoreResult<Decimal> {
    Decimal::try_from(value)
        .map_err(|_| CoreError::invalid_input(format!("{name} is not representable: {value}")))
}

/// Money as a float for ratios; out-of-range values map to 0.
pub(crate) fn to_f64(value: Decimal) -> f64 {
    value.try_into().unwrap_or(0.0)
}

/// Direction of the trade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TradeDirection {
    /// Buy the straddle (profit when premium expands).
    #[default]
    Long,
    /// Sell the straddle (profit when premium decays).
    Short,
}

impl TradeDirection {
    pub fn sign(&self) -> Decimal {
        match self {
            Self::Long => Decimal::ONE,
            Self::Short => Decimal::NEGATIVE_ONE,
        }
    }
}

/// Reason for exiting a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExitReason {
    /// Hit profit target.
    Target,
    /// Hit stop loss.
    StopLoss,
    /// Signal fell below the exit threshold.
    Threshold,
    /// End of backtest period.
    EndOfPeriod,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Target => "target",
            Self::StopLoss => "stopLoss",
            Self::Threshold => "threshold",
            Self::EndOfPeriod => "endOfPeriod",
        }
    }
}

/// Status of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionStatus {
    /// Position is open.
    Open,
    /// Position has been closed.
    Closed,
}

/// A straddle position held by the backtester.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// Date position was opened.
    pub entry_date: NaiveDate,
    /// Premium paid (long) or received (short).
    pub entry_price: Decimal,
    pub direction: TradeDirection,
    /// Latest marked premium.
    pub current_price: Decimal,
    pub status: PositionStatus,
    /// Date position was closed (if closed).
    pub exit_date: Option<NaiveDate>,
    /// Fill price at exit (if closed).
    pub exit_price: Option<Decimal>,
    /// Exit reason (if closed).
    pub exit_reason: Option<ExitReason>,
}

impl Position {
    pub fn open(entry_date: NaiveDate, entry_price: Decimal, direction: TradeDirection) -> Self {
        Self {
            entry_date,
            entry_price,
            direction,
            current_price: entry_price,
            status: PositionStatus::Open,
            exit_date: None,
            exit_price: None,
            exit_reason: None,
        }
    }

    /// Check if position is open.
    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }

    /// P&L if the position were closed at `price`.
    pub fn pnl_at(&self, price: Decimal) -> Decimal {
        (price - self.entry_price) * self.direction.sign()
    }

    /// P&L at `price` as a percentage of the entry premium.
    pub fn pnl_pct_at(&self, price: Decimal) -> f64 {
        if self.entry_price.is_zero() {
            return 0.0;
        }
        to_f64(self.pnl_at(price) / self.entry_price * Decimal::ONE_HUNDRED)
    }

    /// Current unrealized P&L.
    pub fn unrealized_pnl(&self) -> Decimal {
        self.pnl_at(self.current_price)
    }

    pub fn update_mtm(&mut self, price: Decimal) {
        self.current_price = price;
    }

    /// Premium at which the position has lost `pct` percent.
    pub fn stop_price(&self, pct: Decimal) -> Decimal {
        self.entry_price * (Decimal::ONE - self.direction.sign() * pct / Decimal::ONE_HUNDRED)
    }

    /// Premium at which the position has gained `pct` percent.
    pub fn target_price(&self, pct: Decimal) -> Decimal {
        self.entry_price * (Decimal::ONE + self.direction.sign() * pct / Decimal::ONE_HUNDRED)
    }

    /// Fill for a stop at `pct`: the stop level, or the bar close when the
    /// bar gapped through the level.
    pub fn stop_fill(&self, pct: Decimal, close: Decimal) -> Decimal {
        let level = self.stop_price(pct);
        match self.direction {
            TradeDirection::Long => level.min(close),
            TradeDirection::Short => level.max(close),
        }
    }

    /// Worst premium within a bar for this direction.
    pub fn adverse_price(&self, high: Decimal, low: Decimal) -> Decimal {
        match self.direction {
            TradeDirection::Long => low,
            TradeDirection::Short => high,
        }
    }

    /// Best premium within a bar for this direction.
    pub fn favorable_price(&self, high: Decimal, low: Decimal) -> Decimal {
        match self.direction {
            TradeDirection::Long => high,
            TradeDirection::Short => low,
        }
    }

    /// Check if stop loss is hit at `price`.
    pub fn is_stop_loss_hit(&self, price: Decimal, stop_pct: f64) -> bool {
        self.pnl_pct_at(price) <= -stop_pct
    }

    /// Check if profit target is hit at `price`.
    pub fn is_profit_target_hit(&self, price: Decimal, target_pct: f64) -> bool {
        self.pnl_pct_at(price) >= target_pct
    }

    /// Close the position.
    pub fn close(&mut self, exit_date: NaiveDate, exit_price: Decimal, exit_reason: ExitReason) {
        self.status = PositionStatus::Closed;
        self.current_price = exit_price;
        self.exit_date = Some(exit_date);
        self.exit_price = Some(exit_price);
        self.exit_reason = Some(exit_reason);
    }
}

/// A completed trade (closed position) for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub direction: TradeDirection,
    pub pnl: Decimal,
    pub pnl_percent: f64,
    /// Whole days between entry and exit.
    pub duration: i64,
    pub exit_reason: ExitReason,
}

impl Trade {
    /// Create a trade from a closed position.
    pub fn from_position(position: &Position) -> Option<Self> {
        if position.status != PositionStatus::Closed {
            return None;
        }

        let exit_date = position.exit_date?;
        let exit_price = position.exit_price?;

        Some(Self {
            entry_date: position.entry_date,
            exit_date,
            entry_price: position.entry_price,
            exit_price,
            direction: position.direction,
            pnl: position.pnl_at(exit_price),
            pnl_percent: position.pnl_pct_at(exit_price),
            duration: (exit_date - position.entry_date).num_days(),
            exit_reason: position.exit_reason?,
        })
    }

    /// Check if trade was profitable.
    pub fn is_winner(&self) -> bool {
        self.pnl > Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_long_pnl() {
        let mut position = Position::open(date(1), dec!(200), TradeDirection::Long);
        position.update_mtm(dec!(230));
        assert_eq!(position.unrealized_pnl(), dec!(30));
        assert_eq!(position.pnl_pct_at(dec!(230)), 15.0);
        assert_eq!(position.pnl_pct_at(dec!(170)), -15.0);
    }

    #[test]
    fn test_short_pnl() {
        let position = Position::open(date(1), dec!(200), TradeDirection::Short);
        assert_eq!(position.pnl_at(dec!(150)), dec!(50));
        assert_eq!(position.pnl_pct_at(dec!(250)), -25.0);
    }

    #[test]
    fn test_stop_and_target_levels() {
        let long = Position::open(date(1), dec!(120), TradeDirection::Long);
        assert_eq!(long.stop_price(dec!(20)), dec!(96));
        assert_eq!(long.target_price(dec!(50)), dec!(180));
        assert!(long.is_stop_loss_hit(dec!(96), 20.0));
        assert!(!long.is_stop_loss_hit(dec!(97), 20.0));
        assert!(long.is_profit_target_hit(dec!(180), 50.0));

        let short = Position::open(date(1), dec!(120), TradeDirection::Short);
        assert_eq!(short.stop_price(dec!(20)), dec!(144));
        assert_eq!(short.target_price(dec!(50)), dec!(60));
        assert_eq!(short.adverse_price(dec!(150), dec!(90)), dec!(150));
        assert_eq!(short.favorable_price(dec!(150), dec!(90)), dec!(90));
    }

    #[test]
    fn test_stop_fill_never_better_than_close() {
        let long = Position::open(date(1), dec!(120), TradeDirection::Long);
        assert_eq!(long.stop_fill(dec!(20), dec!(110)), dec!(96));
        assert_eq!(long.stop_fill(dec!(20), dec!(50)), dec!(50));

        let short = Position::open(date(1), dec!(120), TradeDirection::Short);
        assert_eq!(short.stop_fill(dec!(20), dec!(130)), dec!(144));
        assert_eq!(short.stop_fill(dec!(20), dec!(200)), dec!(200));
    }

    #[test]
    fn test_trade_from_position() {
        let mut position = Position::open(date(4), dec!(100), TradeDirection::Long);
        assert!(Trade::from_position(&position).is_none());

        position.close(date(8), dec!(90), ExitReason::StopLoss);
        let trade = Trade::from_position(&position).unwrap();
        assert_eq!(trade.pnl, dec!(-10));
        assert_eq!(trade.pnl_percent, -10.0);
        assert_eq!(trade.duration, 4);
        assert_eq!(trade.exit_reason, ExitReason::StopLoss);
        assert!(!trade.is_winner());
    }

    #[test]
    fn test_exit_reason_wire_names() {
        assert_eq!(
            serde_json::to_string(&ExitReason::EndOfPeriod).unwrap(),
            "\"endOfPeriod\""
        );
        assert_eq!(ExitReason::StopLoss.as_str(), "stopLoss");
    }

    #[test]
    fn test_non_finite_price_rejected() {
        assert!(to_decimal("premium", f64::NAN).is_err());
        assert_eq!(to_decimal("premium", 120.5).unwrap(), dec!(120.5));
        assert_eq!(to_f64(dec!(-58.25)), -58.25);
    }
}
