//! Black-Scholes pricing for ATM straddles.
//!
//! Prices the call and put legs of a straddle, their sum, and the vega
//! used by the implied volatility solver. No dividend yield is modelled.
//!
//! At or past expiry (`time <= 0`) every price collapses to intrinsic value.

use std::f64::consts::{PI, SQRT_2};

use serde::{Deserialize, Serialize};
use statrs::function::erf::erfc;

use crate::error::{ensure_finite, ensure_positive, CoreResult};

/// Standard normal CDF.
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Standard normal PDF.
pub fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

/// Black-Scholes calculator for straddle pricing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct BlackScholes {
    /// Risk-free interest rate (annualized, continuous).
    pub rate: f64,
}

impl Default for BlackScholes {
    fn default() -> Self {
        Self { rate: 0.065 }
    }
}

impl BlackScholes {
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }

    /// Calculate d1 parameter.
    fn d1(&self, spot: f64, strike: f64, time: f64, vol: f64) -> f64 {
        let numerator = (spot / strike).ln() + (self.rate + 0.5 * vol * vol) * time;
        numerator / (vol * time.sqrt())
    }

    /// Calculate d2 parameter.
    fn d2(&self, spot: f64, strike: f64, time: f64, vol: f64) -> f64 {
        self.d1(spot, strike, time, vol) - vol * time.sqrt()
    }

    fn validate(&self, spot: f64, strike: f64, time: f64, vol: f64) -> CoreResult<()> {
        ensure_positive("spot", spot)?;
        ensure_positive("strike", strike)?;
        ensure_finite("time to expiry", time)?;
        ensure_finite("rate", self.rate)?;
        ensure_positive("volatility", vol)
    }

    /// Calculate call option price.
    pub fn call_price(&self, spot: f64, strike: f64, time: f64, vol: f64) -> CoreResult<f64> {
        self.validate(spot, strike, time, vol)?;
        if time <= 0.0 {
            return Ok((spot - strike).max(0.0));
        }

        let d1 = self.d1(spot, strike, time, vol);
        let d2 = self.d2(spot, strike, time, vol);

        Ok(spot * norm_cdf(d1) - strike * (-self.rate * time).exp() * norm_cdf(d2))
    }

    /// Calculate put option price.
    pub fn put_price(&self, spot: f64, strike: f64, time: f64, vol: f64) -> CoreResult<f64> {
        self.validate(spot, strike, time, vol)?;
        if time <= 0.0 {
            return Ok((strike - spot).max(0.0));
        }

        let d1 = self.d1(spot, strike, time, vol);
        let d2 = self.d2(spot, strike, time, vol);

        Ok(strike * (-self.rate * time).exp() * norm_cdf(-d2) - spot * norm_cdf(-d1))
    }

    /// Straddle premium: call + put at the same strike.
    pub fn straddle_price(&self, spot: f64, strike: f64, time: f64, vol: f64) -> CoreResult<f64> {
        self.validate(spot, strike, time, vol)?;
        if time <= 0.0 {
            return Ok((spot - strike).abs());
        }

        let d1 = self.d1(spot, strike, time, vol);
        let d2 = self.d2(spot, strike, time, vol);
        let discounted_strike = strike * (-self.rate * time).exp();

        let call = spot * norm_cdf(d1) - discounted_strike * norm_cdf(d2);
        let put = discounted_strike * norm_cdf(-d2) - spot * norm_cdf(-d1);
        Ok(call + put)
    }

    /// Vega of a single leg (same for calls and puts), per unit of volatility.
    pub fn vega(&self, spot: f64, strike: f64, time: f64, vol: f64) -> CoreResult<f64> {
        self.validate(spot, strike, time, vol)?;
        if time <= 0.0 {
            return Ok(0.0);
        }

        let d1 = self.d1(spot, strike, time, vol);
        Ok(spot * norm_pdf(d1) * time.sqrt())
    }

    /// Vega of the straddle: both legs carry the same vega.
    pub fn straddle_vega(&self, spot: f64, strike: f64, time: f64, vol: f64) -> CoreResult<f64> {
        Ok(2.0 * self.vega(spot, strike, time, vol)?)
    }
}

/// Straddle premium for explicit `(S, K, T, r, sigma)`.
pub fn straddle_premium(spot: f64, strike: f64, time: f64, rate: f64, vol: f64) -> CoreResult<f64> {
    BlackScholes::new(rate).straddle_price(spot, strike, time, vol)
}
