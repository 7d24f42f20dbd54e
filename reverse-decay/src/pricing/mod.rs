//! Option pricing module.
//!
//! Provides:
//! - Black-Scholes call, put and straddle pricing with vega
//! - Straddle implied volatility via guarded Newton-Raphson

pub mod black_scholes;
pub mod implied_vol;

pub use black_scholes::{norm_cdf, norm_pdf, straddle_premium, BlackScholes};
pub use implied_vol::{implied_volatility, IvSolution, IvSolver, IvSolverConfig};
