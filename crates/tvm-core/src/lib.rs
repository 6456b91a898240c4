pub mod amortization;
pub mod config;
pub mod error;
pub mod irr;
pub mod math;
pub mod payoff;
pub mod rate_convert;
pub mod rate_solver;
pub mod time_value;
pub mod types;

#[cfg(feature = "calculators")]
pub mod calculators;

pub use error::TvmError;
pub use types::*;

/// Standard result type for all TVM computations
pub type TvmResult<T> = Result<T, TvmError>;
