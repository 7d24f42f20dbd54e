//! Synthetic straddle market for demos and tests.
//!
//! Every random draw comes from the caller's `rng`, so a seeded generator
//! reproduces the same series exactly.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_positive, CoreResult};
use crate::pricing::BlackScholes;
use crate::scoring::{score_iv, score_point};

use super::types::{DecaySeries, HistoricalBar, PricePoint};

/// Parameters of the simulated market.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    /// Starting underlying price.
    pub spot: f64,
    /// Strike rounding step (ATM strike = spot rounded to this).
    pub strike_step: f64,
    /// Risk-free rate.
    pub rate: f64,
    /// Baseline implied volatility.
    pub base_iv: f64,
    /// Standard deviation of IV noise, as a fraction of `base_iv`.
    pub iv_jitter: f64,
    /// Annualized volatility of the underlying random walk.
    pub spot_vol: f64,
    /// Days to expiry of the straddle being tracked.
    pub days_to_expiry: f64,
    /// Chance per sample of an IV spike.
    pub spike_probability: f64,
    /// IV spike size, as a fraction of `base_iv`.
    pub spike_size: f64,
    /// Intrabar premium range, as a fraction of the close.
    pub intrabar_range: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            spot: 22_000.0,
            strike_step: 50.0,
            rate: 0.065,
            base_iv: 0.14,
            iv_jitter: 0.05,
            spot_vol: 0.12,
            days_to_expiry: 7.0,
            spike_probability: 0.05,
            spike_size: 0.30,
            intrabar_range: 0.04,
        }
    }
}

/// Seedable mock market.
#[derive(Debug, Clone)]
pub struct SyntheticMarket {
    config: SyntheticConfig,
    bs: BlackScholes,
}

impl SyntheticMarket {
    pub fn new(config: SyntheticConfig) -> CoreResult<Self> {
        ensure_positive("spot", config.spot)?;
        ensure_positive("strike step", config.strike_step)?;
        ensure_positive("base IV", config.base_iv)?;
        ensure_positive("days to expiry", config.days_to_expiry)?;
        let bs = BlackScholes::new(config.rate);
        Ok(Self { config, bs })
    }

    pub fn config(&self) -> &SyntheticConfig {
        &self.config
    }

    fn atm_strike(&self, spot: f64) -> f64 {
        (spot / self.config.strike_step).round() * self.config.strike_step
    }

    /// Current IV: baseline plus noise, sometimes a spike. Never below 10% of base.
    fn draw_iv(&self, rng: &mut impl Rng) -> f64 {
        let cfg = &self.config;
        let z: f64 = rng.sample(StandardNormal);
        let mut iv = cfg.base_iv * (1.0 + cfg.iv_jitter * z);
        if rng.gen_bool(cfg.spike_probability.clamp(0.0, 1.0)) {
            iv += cfg.base_iv * cfg.spike_size;
        }
        iv.max(cfg.base_iv * 0.1)
    }

    fn step_spot(&self, spot: f64, dt_years: f64, rng: &mut impl Rng) -> f64 {
        let z: f64 = rng.sample(StandardNormal);
        spot * (self.config.spot_vol * dt_years.sqrt() * z).exp()
    }

    /// Intraday series of `samples` points, five minutes apart from 09:15.
    pub fn decay_series(&self, samples: usize, rng: &mut impl Rng) -> CoreResult<DecaySeries> {
        let cfg = &self.config;
        let step_years = 5.0 / (60.0 * 24.0 * 365.0);
        let strike = self.atm_strike(cfg.spot);
        let mut spot = cfg.spot;
        let mut points = Vec::with_capacity(samples);

        for i in 0..samples {
            let time_to_expiry = (cfg.days_to_expiry / 365.0 - i as f64 * step_years).max(0.0);
            let iv = self.draw_iv(rng);

            let actual_premium = self.bs.straddle_price(spot, strike, time_to_expiry, iv)?;
            let expected_premium =
                self.bs
                    .straddle_price(spot, strike, time_to_expiry, cfg.base_iv)?;

            let minutes = 9 * 60 + 15 + 5 * i;
            points.push(PricePoint {
                time: format!("{:02}:{:02}", (minutes / 60) % 24, minutes % 60),
                actual_premium,
                expected_premium,
                rds: score_point(actual_premium, expected_premium)?,
                iv_score: score_iv(iv, cfg.base_iv)?,
            });

            spot = self.step_spot(spot, step_years, rng);
        }

        Ok(DecaySeries::from(points))
    }

    /// Daily bars over weekdays starting at `start`, tracking a constant
    /// maturity ATM straddle.
    pub fn historical_bars(
        &self,
        start: NaiveDate,
        days: usize,
        rng: &mut impl Rng,
    ) -> CoreResult<Vec<HistoricalBar>> {
        let cfg = &self.config;
        let time_to_expiry = cfg.days_to_expiry / 365.0;
        let mut spot = cfg.spot;
        let mut date = start;
        let mut bars = Vec::with_capacity(days);

        while bars.len() < days {
            if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                let strike = self.atm_strike(spot);
                let iv = self.draw_iv(rng);
                let premium = self.bs.straddle_price(spot, strike, time_to_expiry, iv)?;
                let expected_premium =
                    self.bs
                        .straddle_price(spot, strike, time_to_expiry, cfg.base_iv)?;

                let range = cfg.intrabar_range.max(0.0);
                let high = premium * (1.0 + range * rng.gen::<f64>());
                let low = premium * (1.0 - range * rng.gen::<f64>()).max(0.0);

                bars.push(
                    HistoricalBar::new(date, premium, expected_premium, iv, cfg.base_iv)
                        .with_range(high, low),
                );
                spot = self.step_spot(spot, 1.0 / 252.0, rng);
            }
            date += Duration::days(1);
        }

        Ok(bars)
    }
}
