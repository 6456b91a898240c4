//! Decimal math helpers.
//!
//! Integer powers use checked repeated squaring so that an oversized growth
//! factor surfaces as [`TvmError::Overflow`] instead of a panic. Fractional
//! powers and logarithms go through `MathematicalOps`.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

use crate::error::TvmError;
use crate::types::{Periods, Rate};
use crate::TvmResult;

/// base^n by repeated squaring; `None` on overflow.
pub fn checked_pow_int(base: Decimal, n: u64) -> Option<Decimal> {
    let mut result = Decimal::ONE;
    let mut square = base;
    let mut exp = n;
    while exp > 0 {
        if exp & 1 == 1 {
            result = result.checked_mul(square)?;
        }
        exp >>= 1;
        if exp > 0 {
            square = square.checked_mul(square)?;
        }
    }
    Some(result)
}

/// Turns a `checked_*` result into [`TvmError::Overflow`] tagged with `context`.
pub(crate) fn checked(value: Option<Decimal>, context: &str) -> TvmResult<Decimal> {
    value.ok_or_else(|| TvmError::overflow(context))
}

/// (1 + rate)^periods for a possibly fractional, nonnegative period count.
pub fn growth_factor(rate: Rate, periods: Periods) -> TvmResult<Decimal> {
    if periods < Decimal::ZERO {
        return Err(TvmError::invalid("periods", "Period count must be >= 0"));
    }
    let base = checked(Decimal::ONE.checked_add(rate), "growth base")?;
    if base <= Decimal::ZERO {
        return Err(TvmError::invalid("rate", "Rate must be greater than -100%"));
    }
    if rate.is_zero() {
        return Ok(Decimal::ONE);
    }

    let whole = periods
        .trunc()
        .to_u64()
        .ok_or_else(|| TvmError::overflow("period count"))?;
    let mut factor = checked_pow_int(base, whole)
        .ok_or_else(|| TvmError::overflow(format!("growth factor (1 + {rate})^{whole}")))?;

    let frac = periods.fract();
    if !frac.is_zero() {
        let partial = base
            .checked_ln()
            .and_then(|ln| (ln * frac).checked_exp())
            .ok_or_else(|| TvmError::overflow("fractional growth factor"))?;
        factor = factor
            .checked_mul(partial)
            .ok_or_else(|| TvmError::overflow("growth factor"))?;
    }
    Ok(factor)
}

/// 1 / (1 + rate)^periods.
pub fn discount_factor(rate: Rate, periods: Periods) -> TvmResult<Decimal> {
    let growth = growth_factor(rate, periods)?;
    if growth.is_zero() {
        return Err(TvmError::overflow("discount factor"));
    }
    Ok(Decimal::ONE / growth)
}

/// Natural log of a strictly positive argument, reported against `field`.
pub fn ln_positive(x: Decimal, field: &str) -> TvmResult<Decimal> {
    if x <= Decimal::ZERO {
        return Err(TvmError::invalid(
            field,
            format!("logarithm argument {x} must be > 0"),
        ));
    }
    x.checked_ln()
        .ok_or_else(|| TvmError::overflow(format!("ln({x})")))
}

/// nth root of x via Newton's method, 40 iterations.
pub fn nth_root(x: Decimal, n: u32) -> Decimal {
    if x.is_zero() || x == Decimal::ONE || n == 1 {
        return x;
    }
    if n == 0 {
        return Decimal::ONE;
    }

    let n_dec = Decimal::from(n);
    let mut guess = Decimal::ONE;

    for _ in 0..40 {
        let g_n_minus_1 = match checked_pow_int(guess, u64::from(n - 1)) {
            Some(v) if !v.is_zero() => v,
            _ => break,
        };
        let g_n = g_n_minus_1 * guess;

        let delta = (g_n - x) / (n_dec * g_n_minus_1);
        guess -= delta;

        if delta.abs() < dec!(0.0000000000000000001) {
            break;
        }
    }

    guess
}
