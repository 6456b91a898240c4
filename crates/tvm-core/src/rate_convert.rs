//! Conversion between quoted annual rates and per-payment-period rates.
//!
//! A nominal rate compounded `c` times a year is first turned into its
//! effective annual equivalent,
//!
//! ```text
//! i_eff = (1 + i_nom / c)^c - 1
//! ```
//!
//! and then into the rate per payment period for `p` payments a year,
//!
//! ```text
//! i_p = (1 + i_eff)^(1/p) - 1
//! ```
//!
//! When `c == p` this collapses to `i_nom / c`, which is returned directly.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::TvmError;
use crate::math::{checked_pow_int, nth_root};
use crate::types::Rate;
use crate::TvmResult;

fn validate_frequency(field: &str, value: u32) -> TvmResult<()> {
    if value == 0 {
        return Err(TvmError::invalid(field, "Periods per year must be >= 1"));
    }
    Ok(())
}

fn validate_nominal(nominal_annual_rate_pct: Decimal) -> TvmResult<()> {
    if nominal_annual_rate_pct < Decimal::ZERO {
        return Err(TvmError::invalid(
            "nominal_annual_rate_pct",
            "Nominal annual rate must be >= 0",
        ));
    }
    Ok(())
}

/// Effective annual rate (as a decimal) of a nominal percent rate
/// compounded `compounding_periods_per_year` times.
pub fn effective_annual_rate(
    nominal_annual_rate_pct: Decimal,
    compounding_periods_per_year: u32,
) -> TvmResult<Rate> {
    validate_nominal(nominal_annual_rate_pct)?;
    validate_frequency("compounding_periods_per_year", compounding_periods_per_year)?;

    let per_period = nominal_annual_rate_pct / dec!(100) / Decimal::from(compounding_periods_per_year);
    let growth = checked_pow_int(Decimal::ONE + per_period, u64::from(compounding_periods_per_year))
        .ok_or_else(|| TvmError::overflow("effective annual rate"))?;
    Ok(growth - Decimal::ONE)
}

/// Rate per payment period equivalent to a nominal percent rate under a
/// (possibly different) compounding frequency.
pub fn periodic_rate(
    nominal_annual_rate_pct: Decimal,
    compounding_periods_per_year: u32,
    payment_periods_per_year: u32,
) -> TvmResult<Rate> {
    validate_nominal(nominal_annual_rate_pct)?;
    validate_frequency("compounding_periods_per_year", compounding_periods_per_year)?;
    validate_frequency("payment_periods_per_year", payment_periods_per_year)?;

    let nominal = nominal_annual_rate_pct / dec!(100);
    if nominal.is_zero() {
        return Ok(Decimal::ZERO);
    }
    if compounding_periods_per_year == payment_periods_per_year {
        return Ok(nominal / Decimal::from(payment_periods_per_year));
    }

    let effective = effective_annual_rate(nominal_annual_rate_pct, compounding_periods_per_year)?;
    Ok(nth_root(Decimal::ONE + effective, payment_periods_per_year) - Decimal::ONE)
}

/// Nominal annual percent rate (APR convention) for a periodic rate paid
/// `payment_periods_per_year` times.
pub fn nominal_annual_rate_pct(periodic: Rate, payment_periods_per_year: u32) -> TvmResult<Decimal> {
    validate_frequency("payment_periods_per_year", payment_periods_per_year)?;
    Ok(periodic * Decimal::from(payment_periods_per_year) * dec!(100))
}

/// Effective annual rate implied by compounding a periodic rate
/// `payment_periods_per_year` times.
pub fn annual_effective_from_periodic(periodic: Rate, payment_periods_per_year: u32) -> TvmResult<Rate> {
    validate_frequency("payment_periods_per_year", payment_periods_per_year)?;
    if periodic < Decimal::ZERO {
        return Err(TvmError::invalid("periodic", "Periodic rate must be >= 0"));
    }
    let growth = checked_pow_int(Decimal::ONE + periodic, u64::from(payment_periods_per_year))
        .ok_or_else(|| TvmError::overflow("annual effective rate"))?;
    Ok(growth - Decimal::ONE)
}
