//! Core data types for straddle scoring and backtesting.
//!
//! These are plain value records: produced once by an adapter (live ticks,
//! mock generators, files) and never mutated by the core.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One sampled instant of straddle premium behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    /// Display label for the sample time (e.g. "09:15").
    pub time: String,

    /// Observed straddle premium.
    pub actual_premium: f64,

    /// Time-decay-adjusted theoretical premium. Always > 0.
    pub expected_premium: f64,

    /// Reverse Decay Score in [-1, 1].
    pub rds: f64,

    /// Normalized IV spike score in [0, 1].
    pub iv_score: f64,
}

/// Ordered sequence of price points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecaySeries(Vec<PricePoint>);

impl DecaySeries {
    pub fn new(points: Vec<PricePoint>) -> Self {
        Self(points)
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.0
    }

    /// Most recent point; risk is always judged from this one.
    pub fn latest(&self) -> Option<&PricePoint> {
        self.0.last()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PricePoint> {
        self.0.iter()
    }
}

impl From<Vec<PricePoint>> for DecaySeries {
    fn from(points: Vec<PricePoint>) -> Self {
        Self(points)
    }
}

impl<'a> IntoIterator for &'a DecaySeries {
    type Item = &'a PricePoint;
    type IntoIter = std::slice::Iter<'a, PricePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// An already-parsed live tick for the ATM straddle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickSample {
    pub time: String,

    /// Underlying price.
    pub spot: f64,

    /// Straddle strike.
    pub strike: f64,

    /// Remaining time to expiry in years.
    pub time_to_expiry: f64,

    /// Observed straddle premium (call LTP + put LTP).
    pub actual_premium: f64,

    /// Baseline IV the current IV is compared against.
    pub reference_iv: f64,
}

/// Call and put last traded prices at one strike.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionQuote {
    pub strike: f64,
    pub call_ltp: f64,
    pub put_ltp: f64,
}

impl OptionQuote {
    /// Straddle premium at this strike.
    pub fn straddle_premium(&self) -> f64 {
        self.call_ltp + self.put_ltp
    }
}

/// Option chain for one expiry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionChain {
    /// Underlying price
    pub spot: f64,

    pub quotes: Vec<OptionQuote>,
}

impl OptionChain {
    pub fn new(spot: f64, quotes: Vec<OptionQuote>) -> Self {
        Self { spot, quotes }
    }

    /// Quote whose strike is nearest the spot. Ties go to the lower strike.
    pub fn atm_quote(&self) -> Option<&OptionQuote> {
        self.quotes
            .iter()
            .filter(|q| q.strike.is_finite())
            .min_by(|a, b| {
                let da = (a.strike - self.spot).abs();
                let db = (b.strike - self.spot).abs();
                da.total_cmp(&db).then(a.strike.total_cmp(&b.strike))
            })
    }

    /// Find the quote at a specific strike.
    pub fn quote_at_strike(&self, strike: f64) -> Option<&OptionQuote> {
        self.quotes.iter().find(|q| q.strike == strike)
    }

    /// All strikes in ascending order.
    pub fn strikes(&self) -> Vec<f64> {
        let mut strikes: Vec<_> = self.quotes.iter().map(|q| q.strike).collect();
        strikes.sort_by(f64::total_cmp);
        strikes.dedup();
        strikes
    }
}

/// One bar of the historical straddle series fed to the backtester.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalBar {
    pub date: NaiveDate,

    /// Straddle premium at bar close; entries and exits fill here.
    pub premium: f64,

    /// Theoretical premium for the same instant.
    pub expected_premium: f64,

    /// Implied volatility at bar close.
    pub iv: f64,

    /// Baseline IV for the spike score.
    pub reference_iv: f64,

    /// Intrabar premium high, defaults to `premium`.
    #[serde(default)]
    pub high: Option<f64>,

    /// Intrabar premium low, defaults to `premium`.
    #[serde(default)]
    pub low: Option<f64>,
}

impl HistoricalBar {
    pub fn new(
        date: NaiveDate,
        premium: f64,
        expected_premium: f64,
        iv: f64,
        reference_iv: f64,
    ) -> Self {
        Self {
            date,
            premium,
            expected_premium,
            iv,
            reference_iv,
            high: None,
            low: None,
        }
    }

    pub fn with_range(mut self, high: f64, low: f64) -> Self {
        self.high = Some(high);
        self.low = Some(low);
        self
    }

    pub fn high(&self) -> f64 {
        self.high.unwrap_or(self.premium).max(self.premium)
    }

    pub fn low(&self) -> f64 {
        self.low.unwrap_or(self.premium).min(self.premium)
    }
}
