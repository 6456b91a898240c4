//! Financial-calculator style solver: supply four of N, I/Y, PV, PMT, FV and
//! solve for the fifth. Also hosts the quoted-rate converter.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::TvmError;
use crate::rate_convert::{effective_annual_rate, nominal_annual_rate_pct, periodic_rate};
use crate::rate_solver::{solve_rate_bisection, solve_rate_newton};
use crate::time_value::{solve_fv, solve_n, solve_pmt, solve_pv};
use crate::types::*;
use crate::TvmResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveFor {
    Periods,
    Rate,
    PresentValue,
    Payment,
    FutureValue,
}

/// The known variables. The one named by `solve_for` is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvmInput {
    pub solve_for: SolveFor,
    #[serde(default)]
    pub periods: Option<Periods>,
    /// Periodic rate (decimal)
    #[serde(default)]
    pub rate: Option<Rate>,
    #[serde(default)]
    pub present_value: Option<Money>,
    #[serde(default)]
    pub payment: Option<Money>,
    #[serde(default)]
    pub future_value: Option<Money>,
    #[serde(default)]
    pub timing: AnnuityTiming,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvmOutput {
    pub solved_for: SolveFor,
    /// The value that was solved for
    pub value: Decimal,
    /// All five variables after solving
    pub parameters: TvmParameters,
    /// Rate solves only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_solution: Option<RateSolution>,
}

fn known(field: &str, value: Option<Decimal>) -> TvmResult<Decimal> {
    value.ok_or_else(|| TvmError::InsufficientData(format!("{field} is required")))
}

/// Loan shape: ordinary annuity, no balloon, PV and PMT of opposite sign,
/// whole number of periods.
fn loan_shape(params: &TvmParameters) -> Option<(Money, u32, Money)> {
    if params.timing.is_due() || !params.future_value.is_zero() || !params.periods.fract().is_zero() {
        return None;
    }
    let opposite = (params.present_value > Decimal::ZERO && params.payment < Decimal::ZERO)
        || (params.present_value < Decimal::ZERO && params.payment > Decimal::ZERO);
    if !opposite {
        return None;
    }
    let periods = params.periods.to_u32()?;
    Some((params.present_value.abs(), periods, params.payment.abs()))
}

/// Solve the TVM identity for whichever variable `solve_for` names.
pub fn solve_tvm(input: &TvmInput) -> TvmResult<ComputationOutput<TvmOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let timing = input.timing;

    let mut params = TvmParameters {
        periods: input.periods.unwrap_or_default(),
        rate: input.rate.unwrap_or_default(),
        present_value: input.present_value.unwrap_or_default(),
        payment: input.payment.unwrap_or_default(),
        future_value: input.future_value.unwrap_or_default(),
        timing,
    };
    let mut rate_solution = None;

    let methodology = match input.solve_for {
        SolveFor::FutureValue => {
            let (n, i) = (known("periods", input.periods)?, known("rate", input.rate)?);
            let (pv, pmt) = (known("present_value", input.present_value)?, known("payment", input.payment)?);
            params.future_value = solve_fv(n, i, pv, pmt, timing)?;
            "Closed-form future value"
        }
        SolveFor::PresentValue => {
            let (n, i) = (known("periods", input.periods)?, known("rate", input.rate)?);
            let (pmt, fv) = (known("payment", input.payment)?, known("future_value", input.future_value)?);
            params.present_value = solve_pv(n, i, pmt, fv, timing)?;
            "Closed-form present value"
        }
        SolveFor::Payment => {
            let (n, i) = (known("periods", input.periods)?, known("rate", input.rate)?);
            let (pv, fv) = (known("present_value", input.present_value)?, known("future_value", input.future_value)?);
            params.payment = solve_pmt(n, i, pv, fv, timing)?;
            "Closed-form payment"
        }
        SolveFor::Periods => {
            let i = known("rate", input.rate)?;
            let (pv, pmt) = (known("present_value", input.present_value)?, known("payment", input.payment)?);
            let fv = known("future_value", input.future_value)?;
            params.periods = solve_n(i, pv, pmt, fv, timing)?;
            if !params.periods.fract().is_zero() {
                warnings.push("Term is fractional; the final payment will be a partial one".into());
            }
            "Logarithmic solve for number of periods"
        }
        SolveFor::Rate => {
            known("periods", input.periods)?;
            known("present_value", input.present_value)?;
            known("payment", input.payment)?;
            known("future_value", input.future_value)?;

            let (solution, method) = match loan_shape(&params) {
                Some((pv, n, pmt)) => (solve_rate_bisection(pv, n, pmt)?, "Rate by bisection on [0, 1]"),
                None => (solve_rate_newton(&params)?, "Rate by Newton-Raphson"),
            };
            if !solution.converged {
                warnings.push(format!(
                    "Rate search stopped after {} iterations without meeting tolerance (residual {})",
                    solution.iterations, solution.residual
                ));
            }
            params.rate = solution.rate;
            rate_solution = Some(solution);
            method
        }
    };

    let value = match input.solve_for {
        SolveFor::Periods => params.periods,
        SolveFor::Rate => params.rate,
        SolveFor::PresentValue => params.present_value,
        SolveFor::Payment => params.payment,
        SolveFor::FutureValue => params.future_value,
    };

    let output = TvmOutput {
        solved_for: input.solve_for,
        value,
        parameters: params,
        rate_solution,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(methodology, input, warnings, elapsed, output))
}

// ---------------------------------------------------------------------------
// Rate conversion
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateConversionInput {
    /// Quoted nominal annual rate in percent
    pub nominal_annual_rate_pct: Decimal,
    pub compounding_periods_per_year: u32,
    pub payment_periods_per_year: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateConversionOutput {
    pub periodic_rate: Rate,
    pub effective_annual_rate: Rate,
    /// Nominal rate re-quoted at the payment frequency (percent)
    pub equivalent_nominal_pct: Decimal,
}

/// Re-express a quoted rate at a different payment frequency.
pub fn convert_rate(
    input: &RateConversionInput,
) -> TvmResult<ComputationOutput<RateConversionOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let periodic = periodic_rate(
        input.nominal_annual_rate_pct,
        input.compounding_periods_per_year,
        input.payment_periods_per_year,
    )?;
    let effective = effective_annual_rate(
        input.nominal_annual_rate_pct,
        input.compounding_periods_per_year,
    )?;
    if input.compounding_periods_per_year != input.payment_periods_per_year {
        warnings.push(format!(
            "Compounding ({}x/yr) differs from payment frequency ({}x/yr); periodic rate derived via the effective annual rate",
            input.compounding_periods_per_year, input.payment_periods_per_year
        ));
    }

    let output = RateConversionOutput {
        periodic_rate: periodic,
        effective_annual_rate: effective,
        equivalent_nominal_pct: nominal_annual_rate_pct(periodic, input.payment_periods_per_year)?,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Nominal to periodic rate via effective annual rate",
        input,
        warnings,
        elapsed,
        output,
    ))
}
