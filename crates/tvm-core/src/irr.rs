//! Internal rate of return for periodic and dated cash-flow series.
//!
//! Both solvers run Newton-Raphson on the NPV curve and stop when successive
//! guesses differ by less than the configured tolerance. Every failure mode
//! (no sign change, flat derivative, iterate leaving the domain, iteration
//! cap) is reported as [`TvmError::NonConvergent`]; nothing is clamped.

use log::{debug, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::{SolverSettings, DERIVATIVE_FLOOR};
use crate::error::TvmError;
use crate::math::{checked, growth_factor};
use crate::types::{DatedCashFlow, Money, Rate};
use crate::TvmResult;

pub const DEFAULT_IRR_GUESS: Rate = dec!(0.05);

const DAYS_PER_YEAR: Decimal = dec!(365);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrSolution {
    /// Rate per period (per year for XIRR) as a decimal.
    pub rate: Rate,
    /// Same rate expressed in percent.
    pub rate_pct: Decimal,
    pub iterations: u32,
}

impl IrrSolution {
    fn new(rate: Rate, iterations: u32) -> Self {
        Self {
            rate,
            rate_pct: rate * dec!(100),
            iterations,
        }
    }
}

fn has_sign_change(amounts: impl Iterator<Item = Money>) -> bool {
    let mut positive = false;
    let mut negative = false;
    for a in amounts {
        positive |= a > Decimal::ZERO;
        negative |= a < Decimal::ZERO;
    }
    positive && negative
}

/// NPV and dNPV/dr for flows at t = 0, 1, 2, ...
fn npv_and_slope(rate: Rate, cash_flows: &[Money]) -> TvmResult<(Decimal, Decimal)> {
    let v = checked(Decimal::ONE.checked_div(Decimal::ONE + rate), "IRR discount base")?;
    let mut discount = Decimal::ONE;
    let mut npv = Decimal::ZERO;
    let mut slope = Decimal::ZERO;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount
                .checked_mul(v)
                .ok_or_else(|| TvmError::overflow(format!("IRR discount factor at period {t}")))?;
        }
        let pv = cf
            .checked_mul(discount)
            .ok_or_else(|| TvmError::overflow(format!("IRR present value at period {t}")))?;
        let weighted = Decimal::from(t as u64)
            .checked_mul(pv)
            .and_then(|x| x.checked_mul(v));
        npv = checked(npv.checked_add(pv), "IRR net present value")?;
        slope = checked(weighted.and_then(|w| slope.checked_sub(w)), "IRR slope")?;
    }
    Ok((npv, slope))
}

/// IRR of `cash_flows` (first flow at t = 0) using the default settings.
pub fn irr(cash_flows: &[Money], guess: Rate) -> TvmResult<IrrSolution> {
    irr_with(cash_flows, guess, &SolverSettings::irr())
}

pub fn irr_with(
    cash_flows: &[Money],
    guess: Rate,
    settings: &SolverSettings,
) -> TvmResult<IrrSolution> {
    if cash_flows.len() < 2 {
        return Err(TvmError::non_convergent(
            "IRR",
            0,
            Decimal::ZERO,
            "at least 2 cash flows are required",
        ));
    }
    if !has_sign_change(cash_flows.iter().copied()) {
        return Err(TvmError::non_convergent(
            "IRR",
            0,
            Decimal::ZERO,
            "cash flows contain no sign change",
        ));
    }
    newton("IRR", guess, settings, |rate| npv_and_slope(rate, cash_flows))
}

/// IRR of irregularly dated flows on an actual/365 basis, annualised.
pub fn xirr(flows: &[DatedCashFlow], guess: Rate) -> TvmResult<IrrSolution> {
    xirr_with(flows, guess, &SolverSettings::irr())
}

pub fn xirr_with(
    flows: &[DatedCashFlow],
    guess: Rate,
    settings: &SolverSettings,
) -> TvmResult<IrrSolution> {
    if flows.len() < 2 {
        return Err(TvmError::non_convergent(
            "XIRR",
            0,
            Decimal::ZERO,
            "at least 2 cash flows are required",
        ));
    }
    if !has_sign_change(flows.iter().map(|f| f.amount)) {
        return Err(TvmError::non_convergent(
            "XIRR",
            0,
            Decimal::ZERO,
            "cash flows contain no sign change",
        ));
    }

    let Some(base) = flows.iter().map(|f| f.date).min() else {
        return Err(TvmError::InsufficientData("XIRR requires cash flows".into()));
    };
    let timed: Vec<(Decimal, Money)> = flows
        .iter()
        .map(|f| (Decimal::from((f.date - base).num_days()) / DAYS_PER_YEAR, f.amount))
        .collect();

    newton("XIRR", guess, settings, |rate| {
        let one_plus_r = Decimal::ONE + rate;
        let mut npv = Decimal::ZERO;
        let mut slope = Decimal::ZERO;
        for (years, amount) in &timed {
            let growth = growth_factor(rate, *years)?;
            let pv = checked(amount.checked_div(growth), "XIRR present value")?;
            let weighted = years.checked_mul(pv).and_then(|x| x.checked_div(one_plus_r));
            npv = checked(npv.checked_add(pv), "XIRR net present value")?;
            slope = checked(weighted.and_then(|w| slope.checked_sub(w)), "XIRR slope")?;
        }
        Ok((npv, slope))
    })
}

fn newton<F>(function: &str, guess: Rate, settings: &SolverSettings, objective: F) -> TvmResult<IrrSolution>
where
    F: Fn(Rate) -> TvmResult<(Decimal, Decimal)>,
{
    if guess <= Decimal::NEGATIVE_ONE {
        return Err(TvmError::invalid("guess", "Initial guess must be greater than -100%"));
    }

    let mut rate = guess;
    let mut last_delta = Decimal::ZERO;

    for iteration in 0..settings.max_iterations {
        let (npv, slope) = match objective(rate) {
            Ok(v) => v,
            Err(TvmError::Overflow { context }) => {
                return Err(TvmError::non_convergent(
                    function,
                    iteration,
                    last_delta,
                    format!("iterate {rate} overflowed ({context})"),
                ));
            }
            Err(e) => return Err(e),
        };

        if slope.abs() < DERIVATIVE_FLOOR {
            warn!("{function}: derivative vanished at {rate}");
            return Err(TvmError::non_convergent(
                function,
                iteration,
                npv,
                format!("NPV derivative vanished at rate {rate}"),
            ));
        }

        let Some(next) = npv.checked_div(slope).and_then(|step| rate.checked_sub(step)) else {
            return Err(TvmError::non_convergent(
                function,
                iteration + 1,
                last_delta,
                format!("Newton step from rate {rate} overflowed"),
            ));
        };
        last_delta = next - rate;

        if next <= Decimal::NEGATIVE_ONE {
            return Err(TvmError::non_convergent(
                function,
                iteration + 1,
                last_delta,
                format!("iterate {next} left the domain (rate must exceed -100%)"),
            ));
        }

        if last_delta.abs() < settings.tolerance {
            debug!("{function} converged to {next} after {} iterations", iteration + 1);
            return Ok(IrrSolution::new(next, iteration + 1));
        }
        rate = next;
    }

    warn!(
        "{function} exhausted {} iterations at {rate} (last step {last_delta})",
        settings.max_iterations
    );
    Err(TvmError::non_convergent(
        function,
        settings.max_iterations,
        last_delta,
        "iteration cap exhausted",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn flow(y: i32, m: u32, d: u32, amount: Decimal) -> DatedCashFlow {
        DatedCashFlow {
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            amount,
            label: None,
        }
    }

    #[test]
    fn test_irr_single_period() {
        let sol = irr(&[dec!(-100), dec!(110)], DEFAULT_IRR_GUESS).unwrap();
        assert!((sol.rate - dec!(0.1)).abs() < dec!(0.0001));
        assert!((sol.rate_pct - dec!(10)).abs() < dec!(0.01));
    }

    #[test]
    fn test_irr_uneven_flows() {
        let sol = irr(&[dec!(-1000), dec!(300), dec!(400), dec!(500)], DEFAULT_IRR_GUESS).unwrap();
        assert!((sol.rate - dec!(0.0889634)).abs() < dec!(0.000001), "got {}", sol.rate);
    }

    #[test]
    fn test_irr_zero_npv_at_solution() {
        let flows = [dec!(-10000), dec!(2000), dec!(3000), dec!(4000), dec!(5000)];
        let sol = irr(&flows, DEFAULT_IRR_GUESS).unwrap();
        let npv = crate::time_value::npv(sol.rate, &flows).unwrap();
        assert!(npv.abs() < dec!(0.01));
    }

    #[test]
    fn test_irr_no_sign_change_is_non_convergent() {
        let err = irr(&[dec!(100), dec!(200)], DEFAULT_IRR_GUESS).unwrap_err();
        assert!(matches!(err, TvmError::NonConvergent { .. }));
        let err = irr(&[dec!(-100), dec!(-200)], DEFAULT_IRR_GUESS).unwrap_err();
        assert!(matches!(err, TvmError::NonConvergent { .. }));
    }

    #[test]
    fn test_irr_too_few_flows() {
        assert!(matches!(
            irr(&[dec!(-100)], DEFAULT_IRR_GUESS),
            Err(TvmError::NonConvergent { .. })
        ));
    }

    #[test]
    fn test_irr_cap_reported() {
        let settings = SolverSettings::irr().with_max_iterations(1);
        let err = irr_with(&[dec!(-1000), dec!(300), dec!(400), dec!(500)], DEFAULT_IRR_GUESS, &settings)
            .unwrap_err();
        match err {
            TvmError::NonConvergent { iterations, .. } => assert_eq!(iterations, 1),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_xirr_one_year_leap() {
        // 366 days on an actual/365 basis
        let flows = [flow(2024, 1, 1, dec!(-1000)), flow(2025, 1, 1, dec!(1100))];
        let sol = xirr(&flows, DEFAULT_IRR_GUESS).unwrap();
        assert!((sol.rate - dec!(0.0997136)).abs() < dec!(0.00001), "got {}", sol.rate);
    }

    #[test]
    fn test_xirr_unsorted_input() {
        let flows = [flow(2023, 1, 1, dec!(1100)), flow(2022, 1, 1, dec!(-1000))];
        let sol = xirr(&flows, DEFAULT_IRR_GUESS).unwrap();
        assert!((sol.rate - dec!(0.1)).abs() < dec!(0.00001));
    }
}
