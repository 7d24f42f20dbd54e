//! Implied volatility of a straddle premium.
//!
//! Newton-Raphson on the straddle price, guarded by a bracket that is
//! tightened from price monotonicity in volatility. A step that lands
//! outside the bracket (negative volatility, vega collapse) is replaced by
//! the bracket midpoint, so the iteration always continues from a valid
//! volatility no lower than `vol_floor`.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ensure_positive, CoreError, CoreResult};

use super::black_scholes::BlackScholes;

/// Vega below this is treated as zero.
const VEGA_EPSILON: f64 = 1e-10;

/// Solver settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IvSolverConfig {
    pub initial_guess: f64,
    pub max_iterations: u32,
    /// Absolute premium error accepted as converged.
    pub tolerance: f64,
    pub vol_floor: f64,
    pub vol_ceiling: f64,
}

impl Default for IvSolverConfig {
    fn default() -> Self {
        Self {
            initial_guess: 0.2,
            max_iterations: 100,
            tolerance: 1e-6,
            vol_floor: 1e-4,
            vol_ceiling: 5.0,
        }
    }
}

/// Outcome of an implied volatility search.
///
/// `converged == false` means the iteration budget ran out and
/// `volatility` is only the last iterate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IvSolution {
    pub volatility: f64,
    pub converged: bool,
    pub iterations: u32,
}

/// Straddle implied volatility solver.
#[derive(Debug, Clone, Default)]
pub struct IvSolver {
    bs: BlackScholes,
    config: IvSolverConfig,
}

impl IvSolver {
    pub fn new(bs: BlackScholes, config: IvSolverConfig) -> Self {
        Self { bs, config }
    }

    pub fn config(&self) -> &IvSolverConfig {
        &self.config
    }

    /// Solve for the volatility that reprices `observed_premium`.
    pub fn solve(
        &self,
        observed_premium: f64,
        spot: f64,
        strike: f64,
        time: f64,
    ) -> CoreResult<IvSolution> {
        ensure_positive("observed premium", observed_premium)?;
        ensure_positive("spot", spot)?;
        ensure_positive("strike", strike)?;
        ensure_positive("time to expiry", time)?;

        let cfg = &self.config;
        ensure_positive("vol floor", cfg.vol_floor)?;
        if cfg.vol_ceiling <= cfg.vol_floor {
            return Err(CoreError::invalid_input(format!(
                "vol ceiling {} must exceed vol floor {}",
                cfg.vol_ceiling, cfg.vol_floor
            )));
        }

        let mut lo = cfg.vol_floor;
        let mut hi = cfg.vol_ceiling;
        let mut vol = cfg.initial_guess.clamp(lo, hi);

        for iteration in 1..=cfg.max_iterations {
            let diff = self.bs.straddle_price(spot, strike, time, vol)? - observed_premium;
            if diff.abs() < cfg.tolerance {
                return Ok(IvSolution {
                    volatility: vol,
                    converged: true,
                    iterations: iteration,
                });
            }

            // Premium rises with volatility
            if diff > 0.0 {
                hi = vol;
            } else {
                lo = vol;
            }

            let vega = self.bs.straddle_vega(spot, strike, time, vol)?;
            let newton = if vega > VEGA_EPSILON {
                vol - diff / vega
            } else {
                f64::NAN
            };

            vol = if newton > lo && newton < hi {
                newton
            } else {
                0.5 * (lo + hi)
            };
        }

        warn!(
            observed_premium,
            spot,
            strike,
            time,
            last_vol = vol,
            "implied volatility did not converge"
        );

        Ok(IvSolution {
            volatility: vol,
            converged: false,
            iterations: cfg.max_iterations,
        })
    }
}

/// Implied volatility with the default solver settings.
pub fn implied_volatility(
    observed_premium: f64,
    spot: f64,
    strike: f64,
    time: f64,
    rate: f64,
) -> CoreResult<IvSolution> {
    IvSolver::new(BlackScholes::new(rate), IvSolverConfig::default())
        .solve(observed_premium, spot, strike, time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_implied_vol_recovers_input() {
        let bs = BlackScholes::new(0.05);
        let premium = bs.straddle_price(100.0, 100.0, 0.5, 0.25).unwrap();

        let solution = implied_volatility(premium, 100.0, 100.0, 0.5, 0.05).unwrap();
        assert!(solution.converged);
        assert!(solution.iterations <= 10);
        assert_relative_eq!(solution.volatility, 0.25, epsilon = 1e-6);
    }

    #[test]
    fn test_round_trip_sampled() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut checked = 0;
        for _ in 0..2_000 {
            let spot = rng.gen_range(80.0..120.0);
            let strike = rng.gen_range(90.0..110.0);
            let time = rng.gen_range(0.05..2.0);
            let rate = rng.gen_range(0.0..0.08);
            let vol = rng.gen_range(0.05..2.0);

            let premium = straddle_for(spot, strike, time, rate, vol);
            let solution = implied_volatility(premium, spot, strike, time, rate).unwrap();
            assert!(solution.converged, "no convergence for vol {vol}");

            // Deep in- or out-of-the-money with tiny vega the premium barely
            // moves with vol; only the repriced premium is meaningful there.
            let vega = BlackScholes::new(rate)
                .straddle_vega(spot, strike, time, vol)
                .unwrap();
            if vega < 0.5 {
                let repriced = straddle_for(spot, strike, time, rate, solution.volatility);
                assert!((repriced - premium).abs() < 1e-6);
                continue;
            }

            checked += 1;
            assert!(
                (solution.volatility - vol).abs() < 1e-4,
                "S={spot} K={strike} T={time} vol {vol} recovered as {}",
                solution.volatility
            );
        }
        assert!(checked > 1_800, "only {checked} samples had usable vega");
    }

    fn straddle_for(spot: f64, strike: f64, time: f64, rate: f64, vol: f64) -> f64 {
        BlackScholes::new(rate)
            .straddle_price(spot, strike, time, vol)
            .unwrap()
    }

    #[test]
    fn test_far_initial_guess_still_converges() {
        let bs = BlackScholes::new(0.065);
        let premium = bs.straddle_price(100.0, 100.0, 0.3, 1.6).unwrap();
        let solver = IvSolver::new(
            bs,
            IvSolverConfig {
                initial_guess: 0.01,
                ..Default::default()
            },
        );

        let solution = solver.solve(premium, 100.0, 100.0, 0.3).unwrap();
        assert!(solution.converged);
        assert_relative_eq!(solution.volatility, 1.6, epsilon = 1e-4);
    }

    #[test]
    fn test_premium_below_intrinsic_reports_divergence() {
        // Intrinsic spread alone is ~20, so a premium of 5 has no solution
        let solution = implied_volatility(5.0, 120.0, 100.0, 0.5, 0.0).unwrap();
        assert!(!solution.converged);
        assert_eq!(solution.iterations, 100);
        assert!(solution.volatility >= IvSolverConfig::default().vol_floor);
    }

    #[test]
    fn test_iteration_budget_is_respected() {
        let solver = IvSolver::new(
            BlackScholes::new(0.05),
            IvSolverConfig {
                max_iterations: 1,
                initial_guess: 0.05,
                ..Default::default()
            },
        );
        let solution = solver.solve(30.0, 100.0, 100.0, 1.0).unwrap();
        assert!(!solution.converged);
        assert_eq!(solution.iterations, 1);
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        assert!(implied_volatility(0.0, 100.0, 100.0, 0.5, 0.05).is_err());
        assert!(implied_volatility(5.0, 100.0, 100.0, 0.0, 0.05).is_err());
        assert!(implied_volatility(5.0, -1.0, 100.0, 0.5, 0.05).is_err());
    }
}
