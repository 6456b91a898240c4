use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::{require_non_negative, require_positive};
use crate::amortization::{
    amortization_schedule, annual_summary, AnnualSummary, ScheduleRow, ScheduleTotals,
};
use crate::error::TvmError;
use crate::rate_convert::{
    annual_effective_from_periodic, effective_annual_rate, nominal_annual_rate_pct, periodic_rate,
};
use crate::rate_solver::solve_rate_bisection;
use crate::time_value::solve_pmt;
use crate::types::*;
use crate::TvmResult;

pub(crate) fn default_payments_per_year() -> u32 {
    12
}

fn default_true() -> bool {
    true
}

/// Input for a level-payment loan (mortgage, auto, student, boat)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanInput {
    /// Purchase price or loan amount before any down payment
    pub principal: Money,
    #[serde(default)]
    pub down_payment: Money,
    /// Nominal annual rate in percent (6.5 = 6.5%)
    pub annual_rate_pct: Decimal,
    pub term_years: u32,
    #[serde(default = "default_payments_per_year")]
    pub payments_per_year: u32,
    /// Defaults to `payments_per_year`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compounding_periods_per_year: Option<u32>,
    #[serde(default)]
    pub timing: AnnuityTiming,
    /// Emit the period-by-period schedule
    #[serde(default = "default_true")]
    pub include_schedule: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanOutput {
    pub amount_financed: Money,
    pub periodic_rate: Rate,
    pub effective_annual_rate: Rate,
    /// Level payment per period (positive)
    pub payment: Money,
    pub number_of_payments: u32,
    pub total_paid: Money,
    pub total_interest: Money,
    pub annual_summary: Vec<AnnualSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub schedule: Vec<ScheduleRow>,
}

/// Level payment, schedule and totals for a fully amortising loan.
pub fn analyze_loan(input: &LoanInput) -> TvmResult<ComputationOutput<LoanOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    require_positive("principal", input.principal)?;
    require_non_negative("down_payment", input.down_payment)?;
    if input.down_payment >= input.principal {
        return Err(TvmError::invalid(
            "down_payment",
            "Down payment must be less than the principal",
        ));
    }
    if input.term_years == 0 {
        return Err(TvmError::invalid("term_years", "Term must be at least one year"));
    }

    let compounding = input.compounding_periods_per_year.unwrap_or(input.payments_per_year);
    let rate = periodic_rate(input.annual_rate_pct, compounding, input.payments_per_year)?;
    let effective = effective_annual_rate(input.annual_rate_pct, compounding)?;

    let number_of_payments = input
        .term_years
        .checked_mul(input.payments_per_year)
        .ok_or_else(|| TvmError::overflow("number of payments"))?;
    let amount_financed = input.principal - input.down_payment;

    let payment = -solve_pmt(
        Decimal::from(number_of_payments),
        rate,
        amount_financed,
        Decimal::ZERO,
        input.timing,
    )?;

    let rows = amortization_schedule(amount_financed, rate, payment, number_of_payments, input.timing)?;
    let totals = ScheduleTotals::from_rows(&rows);
    let annual = annual_summary(&rows, input.payments_per_year)?;

    if input.annual_rate_pct.is_zero() {
        warnings.push("Zero interest rate: payment is principal divided by term".into());
    }
    if let Some(last) = rows.last() {
        if last.closing_balance.abs() >= dec!(0.01) {
            warnings.push(format!(
                "Schedule leaves a residual balance of {}",
                last.closing_balance
            ));
        }
    }

    let output = LoanOutput {
        amount_financed,
        periodic_rate: rate,
        effective_annual_rate: effective,
        payment,
        number_of_payments,
        total_paid: totals.total_payment,
        total_interest: totals.total_interest,
        annual_summary: annual,
        schedule: if input.include_schedule { rows } else { Vec::new() },
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Level-payment loan amortization",
        &serde_json::json!({
            "principal": input.principal.to_string(),
            "down_payment": input.down_payment.to_string(),
            "annual_rate_pct": input.annual_rate_pct.to_string(),
            "term_years": input.term_years,
            "payments_per_year": input.payments_per_year,
            "compounding_periods_per_year": compounding,
            "timing": input.timing,
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Input for recovering the rate implied by a loan's payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanRateInput {
    pub principal: Money,
    /// Payment per period (positive)
    pub payment: Money,
    pub number_of_payments: u32,
    #[serde(default = "default_payments_per_year")]
    pub payments_per_year: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanRateOutput {
    pub periodic_rate: Rate,
    /// Nominal annual rate in percent
    pub apr_pct: Decimal,
    pub effective_annual_rate: Rate,
    pub iterations: u32,
    pub converged: bool,
    pub total_interest: Money,
}

/// Implied interest rate of an ordinary, fully amortising loan.
pub fn find_loan_rate(input: &LoanRateInput) -> TvmResult<ComputationOutput<LoanRateOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let solution = solve_rate_bisection(input.principal, input.number_of_payments, input.payment)?;
    if !solution.converged {
        warnings.push(format!(
            "Bisection stopped after {} iterations without meeting tolerance (residual {})",
            solution.iterations, solution.residual
        ));
    }

    let output = LoanRateOutput {
        periodic_rate: solution.rate,
        apr_pct: nominal_annual_rate_pct(solution.rate, input.payments_per_year)?,
        effective_annual_rate: annual_effective_from_periodic(solution.rate, input.payments_per_year)?,
        iterations: solution.iterations,
        converged: solution.converged,
        total_interest: input.payment * Decimal::from(input.number_of_payments) - input.principal,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Loan rate by bisection on [0, 1]",
        &serde_json::json!({
            "principal": input.principal.to_string(),
            "payment": input.payment.to_string(),
            "number_of_payments": input.number_of_payments,
            "payments_per_year": input.payments_per_year,
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mortgage() -> LoanInput {
        LoanInput {
            principal: dec!(250000),
            down_payment: dec!(50000),
            annual_rate_pct: dec!(6),
            term_years: 30,
            payments_per_year: 12,
            compounding_periods_per_year: None,
            timing: AnnuityTiming::Ordinary,
            include_schedule: true,
        }
    }

    #[test]
    fn test_mortgage_payment() {
        let out = analyze_loan(&mortgage()).unwrap();
        let r = &out.result;
        assert_eq!(r.amount_financed, dec!(200000));
        assert_eq!(r.number_of_payments, 360);
        assert!((r.payment - dec!(1199.10)).abs() < dec!(0.01));
        assert_eq!(r.schedule.len(), 360);
        assert_eq!(r.annual_summary.len(), 30);
        assert!((r.total_paid - r.total_interest - dec!(200000)).abs() < dec!(0.0001));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_schedule_can_be_omitted() {
        let input = LoanInput {
            include_schedule: false,
            ..mortgage()
        };
        let out = analyze_loan(&input).unwrap();
        assert!(out.result.schedule.is_empty());
        assert_eq!(out.result.annual_summary.len(), 30);
    }

    #[test]
    fn test_zero_rate_warns() {
        let input = LoanInput {
            annual_rate_pct: Decimal::ZERO,
            ..mortgage()
        };
        let out = analyze_loan(&input).unwrap();
        assert!((out.result.payment - dec!(555.5555555)).abs() < dec!(0.0001));
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_down_payment_validation() {
        let input = LoanInput {
            down_payment: dec!(250000),
            ..mortgage()
        };
        assert!(analyze_loan(&input).is_err());
    }

    #[test]
    fn test_find_loan_rate_recovers_apr() {
        let input = LoanRateInput {
            principal: dec!(200000),
            payment: dec!(1199.10),
            number_of_payments: 360,
            payments_per_year: 12,
        };
        let out = find_loan_rate(&input).unwrap();
        assert!(out.result.converged);
        assert!((out.result.apr_pct - dec!(6)).abs() < dec!(0.001));
    }

    #[test]
    fn test_find_loan_rate_insufficient_payment() {
        let input = LoanRateInput {
            principal: dec!(200000),
            payment: dec!(500),
            number_of_payments: 360,
            payments_per_year: 12,
        };
        assert!(matches!(
            find_loan_rate(&input),
            Err(TvmError::PaymentInsufficient { .. })
        ));
    }
}
