//! Tolerances and iteration caps for the iterative solvers.
//!
//! Each solver has a default entry point that uses the constructor below and
//! a `_with` variant that takes an explicit [`SolverSettings`].

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Bisection stops once the implied PV is within one cent of the target.
pub const BISECTION_TOLERANCE: Decimal = dec!(0.01);
pub const BISECTION_MAX_ITERATIONS: u32 = 100;

/// Newton-Raphson on the TVM identity stops once |f(i)| drops below this.
pub const NEWTON_RATE_TOLERANCE: Decimal = dec!(0.00001);
pub const NEWTON_RATE_MAX_ITERATIONS: u32 = 20;

/// IRR stops once successive guesses differ by less than this.
pub const IRR_TOLERANCE: Decimal = dec!(0.0000001);
pub const IRR_MAX_ITERATIONS: u32 = 1000;

/// Derivative magnitudes below this are treated as a flat region.
pub const DERIVATIVE_FLOOR: Decimal = dec!(0.0000000001);

/// Payoff simulations stop after this many years even if balance remains.
pub const DEFAULT_PAYOFF_CAP_YEARS: u32 = 40;

/// Configuration for an iterative solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverSettings {
    /// Convergence tolerance. Its meaning depends on the solver: absolute
    /// PV error for bisection, |f| for Newton, |Δrate| for IRR.
    pub tolerance: Decimal,
    /// Hard cap on iterations.
    pub max_iterations: u32,
}

impl SolverSettings {
    pub fn new(tolerance: Decimal, max_iterations: u32) -> Self {
        Self {
            tolerance,
            max_iterations,
        }
    }

    pub fn bisection() -> Self {
        Self::new(BISECTION_TOLERANCE, BISECTION_MAX_ITERATIONS)
    }

    pub fn newton_rate() -> Self {
        Self::new(NEWTON_RATE_TOLERANCE, NEWTON_RATE_MAX_ITERATIONS)
    }

    pub fn irr() -> Self {
        Self::new(IRR_TOLERANCE, IRR_MAX_ITERATIONS)
    }

    #[must_use]
    pub fn with_tolerance(mut self, tolerance: Decimal) -> Self {
        self.tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}
