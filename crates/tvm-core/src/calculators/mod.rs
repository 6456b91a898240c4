//! Calculator entry points.
//!
//! Each calculator takes a serde `Input`, validates it, runs the engine and
//! wraps the result in a [`ComputationOutput`](crate::types::ComputationOutput)
//! envelope with methodology, echoed assumptions and warnings.

pub mod investment;
pub mod loan;
pub mod payoff;
pub mod savings;
pub mod tvm;

use rust_decimal::Decimal;

use crate::error::TvmError;
use crate::TvmResult;

pub(crate) fn require_positive(field: &str, value: Decimal) -> TvmResult<()> {
    if value <= Decimal::ZERO {
        return Err(TvmError::invalid(field, format!("{field} must be positive")));
    }
    Ok(())
}

pub(crate) fn require_non_negative(field: &str, value: Decimal) -> TvmResult<()> {
    if value < Decimal::ZERO {
        return Err(TvmError::invalid(field, format!("{field} must be >= 0")));
    }
    Ok(())
}
