//! Closed-form solutions of the five-variable TVM identity
//!
//! ```text
//! FV + PV(1+i)^N + PMT * k * [(1+i)^N - 1] / i = 0
//! ```
//!
//! with `k = 1 + i` for an annuity-due and `k = 1` otherwise. At `i = 0` the
//! geometric term is replaced by `N`.

use rust_decimal::Decimal;

use crate::error::TvmError;
use crate::math::{checked, growth_factor, ln_positive};
use crate::types::{AnnuityTiming, Money, Periods, Rate};
use crate::TvmResult;

fn validate_rate(rate: Rate) -> TvmResult<()> {
    if rate < Decimal::ZERO {
        return Err(TvmError::invalid("rate", "Periodic rate must be >= 0"));
    }
    Ok(())
}

fn validate_periods(periods: Periods) -> TvmResult<()> {
    if periods < Decimal::ZERO {
        return Err(TvmError::invalid("periods", "Number of periods must be >= 0"));
    }
    Ok(())
}

/// Returns `((1+i)^N, k * [(1+i)^N - 1] / i)`, the growth factor and the
/// payment accumulation factor.
pub(crate) fn annuity_factors(
    periods: Periods,
    rate: Rate,
    timing: AnnuityTiming,
) -> TvmResult<(Decimal, Decimal)> {
    if rate.is_zero() {
        return Ok((Decimal::ONE, periods));
    }
    let growth = growth_factor(rate, periods)?;
    let accumulation = checked(
        timing
            .payment_factor(rate)
            .checked_mul(growth - Decimal::ONE)
            .and_then(|x| x.checked_div(rate)),
        "payment accumulation factor",
    )?;
    Ok((growth, accumulation))
}

/// Future value
pub fn solve_fv(
    periods: Periods,
    rate: Rate,
    present_value: Money,
    payment: Money,
    timing: AnnuityTiming,
) -> TvmResult<Money> {
    validate_rate(rate)?;
    validate_periods(periods)?;

    let (growth, accumulation) = annuity_factors(periods, rate, timing)?;
    let fv = present_value
        .checked_mul(growth)
        .zip(payment.checked_mul(accumulation))
        .and_then(|(grown, accumulated)| grown.checked_add(accumulated));
    Ok(-checked(fv, "future value")?)
}

/// Present value
pub fn solve_pv(
    periods: Periods,
    rate: Rate,
    payment: Money,
    future_value: Money,
    timing: AnnuityTiming,
) -> TvmResult<Money> {
    validate_rate(rate)?;
    validate_periods(periods)?;

    let (growth, accumulation) = annuity_factors(periods, rate, timing)?;
    let pv = payment
        .checked_mul(accumulation)
        .and_then(|accumulated| future_value.checked_add(accumulated))
        .and_then(|total| total.checked_div(growth));
    Ok(-checked(pv, "present value")?)
}

/// Payment (PMT)
pub fn solve_pmt(
    periods: Periods,
    rate: Rate,
    present_value: Money,
    future_value: Money,
    timing: AnnuityTiming,
) -> TvmResult<Money> {
    validate_rate(rate)?;
    if periods <= Decimal::ZERO {
        return Err(TvmError::invalid("periods", "Number of periods must be > 0"));
    }

    let (growth, accumulation) = annuity_factors(periods, rate, timing)?;
    if accumulation.is_zero() {
        return Err(TvmError::invalid("periods", "Annuity factor is zero"));
    }
    let pmt = present_value
        .checked_mul(growth)
        .and_then(|grown| future_value.checked_add(grown))
        .and_then(|total| total.checked_div(accumulation));
    Ok(-checked(pmt, "payment")?)
}

/// Number of periods (N). May be fractional.
///
/// Fails with `InvalidDomain` when the payment cannot carry PV to FV, i.e.
/// the logarithm argument is not positive or the resulting term is negative.
pub fn solve_n(
    rate: Rate,
    present_value: Money,
    payment: Money,
    future_value: Money,
    timing: AnnuityTiming,
) -> TvmResult<Periods> {
    if rate <= Decimal::NEGATIVE_ONE {
        return Err(TvmError::invalid("rate", "Rate must be greater than -100%"));
    }
    validate_rate(rate)?;

    let periods = if rate.is_zero() {
        if payment.is_zero() {
            return Err(TvmError::invalid(
                "payment",
                "Payment must be non-zero when the rate is zero",
            ));
        }
        let total = checked(future_value.checked_add(present_value), "periods")?;
        -checked(total.checked_div(payment), "periods")?
    } else {
        let pk = checked(payment.checked_mul(timing.payment_factor(rate)), "payment")?;
        let numerator = checked(
            future_value.checked_mul(rate).and_then(|x| pk.checked_sub(x)),
            "periods numerator",
        )?;
        let denominator = checked(
            present_value.checked_mul(rate).and_then(|x| pk.checked_add(x)),
            "periods denominator",
        )?;
        if denominator.is_zero() {
            return Err(TvmError::invalid(
                "payment",
                "Payment exactly offsets interest on the present value",
            ));
        }
        let ratio = checked(numerator.checked_div(denominator), "periods ratio")?;
        let ln_ratio = ln_positive(ratio, "payment")?;
        let ln_growth = ln_positive(Decimal::ONE + rate, "rate")?;
        checked(ln_ratio.checked_div(ln_growth), "periods")?
    };

    if periods < Decimal::ZERO {
        return Err(TvmError::invalid(
            "payment",
            format!("Payment direction cannot carry PV to FV (implied N = {periods})"),
        ));
    }
    Ok(periods)
}

/// Net Present Value of a series of cash flows, first flow at t = 0.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> TvmResult<Money> {
    if rate <= Decimal::NEGATIVE_ONE {
        return Err(TvmError::invalid(
            "rate",
            "Discount rate must be greater than -100%",
        ));
    }

    let mut result = Decimal::ZERO;
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount
                .checked_mul(one_plus_r)
                .ok_or_else(|| TvmError::overflow(format!("NPV discount factor at period {t}")))?;
        }
        result = cf
            .checked_div(discount)
            .and_then(|pv| result.checked_add(pv))
            .ok_or_else(|| TvmError::overflow(format!("NPV at period {t}")))?;
    }

    Ok(result)
}
