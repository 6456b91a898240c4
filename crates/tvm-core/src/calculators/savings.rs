use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::loan::default_payments_per_year;
use super::{require_non_negative, require_positive};
use crate::amortization::{amortization_schedule, annual_summary, AnnualSummary};
use crate::error::TvmError;
use crate::rate_convert::periodic_rate;
use crate::time_value::{solve_fv, solve_n, solve_pmt};
use crate::types::*;
use crate::TvmResult;

// ---------------------------------------------------------------------------
// Savings goal
// ---------------------------------------------------------------------------

/// Input for a savings goal: either how much to contribute to reach the
/// target in `years`, or (when `contribution` is given) how long it takes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsGoalInput {
    pub target_amount: Money,
    #[serde(default)]
    pub current_savings: Money,
    /// Nominal annual rate in percent
    pub annual_rate_pct: Decimal,
    #[serde(default = "default_payments_per_year")]
    pub payments_per_year: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compounding_periods_per_year: Option<u32>,
    /// Time horizon; required unless `contribution` is given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years: Option<Decimal>,
    /// Fixed contribution per period
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contribution: Option<Money>,
    #[serde(default)]
    pub timing: AnnuityTiming,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SavingsMode {
    RequiredContribution,
    TimeToGoal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsYear {
    pub year: u32,
    pub balance: Money,
    pub total_contributions: Money,
    pub interest_earned: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsGoalOutput {
    pub mode: SavingsMode,
    pub periodic_rate: Rate,
    /// Contribution per period (positive)
    pub contribution: Money,
    /// Periods to reach the target; fractional in time-to-goal mode
    pub periods: Periods,
    pub years: Decimal,
    pub total_contributions: Money,
    pub interest_earned: Money,
    pub projection: Vec<SavingsYear>,
}

/// Contribution needed to reach a savings target, or the time it takes with
/// a given contribution.
pub fn plan_savings_goal(
    input: &SavingsGoalInput,
) -> TvmResult<ComputationOutput<SavingsGoalOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    require_positive("target_amount", input.target_amount)?;
    require_non_negative("current_savings", input.current_savings)?;

    let compounding = input.compounding_periods_per_year.unwrap_or(input.payments_per_year);
    let rate = periodic_rate(input.annual_rate_pct, compounding, input.payments_per_year)?;
    let ppy = Decimal::from(input.payments_per_year);

    if input.current_savings >= input.target_amount {
        warnings.push("Current savings already meet the target".into());
    }

    // Savings are outflows (negative); the target is received (positive).
    let (mode, contribution, periods) = match input.contribution {
        Some(contribution) => {
            require_non_negative("contribution", contribution)?;
            let periods = if input.current_savings >= input.target_amount {
                Decimal::ZERO
            } else {
                solve_n(rate, -input.current_savings, -contribution, input.target_amount, input.timing)?
            };
            (SavingsMode::TimeToGoal, contribution, periods)
        }
        None => {
            let years = input.years.ok_or_else(|| {
                TvmError::InsufficientData("years is required when no contribution is given".into())
            })?;
            require_positive("years", years)?;
            let periods = years * ppy;
            let required = -solve_pmt(periods, rate, -input.current_savings, input.target_amount, input.timing)?;
            let contribution = if required < Decimal::ZERO {
                warnings.push("Existing savings grow past the target without contributions".into());
                Decimal::ZERO
            } else {
                required
            };
            (SavingsMode::RequiredContribution, contribution, periods)
        }
    };

    let projection = project_savings(input, rate, contribution, periods)?;
    let total_contributions = contribution * periods;
    let final_balance = solve_fv(periods, rate, -input.current_savings, -contribution, input.timing)?;

    let output = SavingsGoalOutput {
        mode,
        periodic_rate: rate,
        contribution,
        periods,
        years: periods / ppy,
        total_contributions,
        interest_earned: final_balance - input.current_savings - total_contributions,
        projection,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Savings goal via closed-form annuity",
        &serde_json::json!({
            "target_amount": input.target_amount.to_string(),
            "current_savings": input.current_savings.to_string(),
            "annual_rate_pct": input.annual_rate_pct.to_string(),
            "payments_per_year": input.payments_per_year,
            "compounding_periods_per_year": compounding,
            "timing": input.timing,
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn project_savings(
    input: &SavingsGoalInput,
    rate: Rate,
    contribution: Money,
    periods: Periods,
) -> TvmResult<Vec<SavingsYear>> {
    let ppy = Decimal::from(input.payments_per_year);
    let year_count = (periods / ppy)
        .ceil()
        .to_u32()
        .ok_or_else(|| TvmError::overflow("savings projection length"))?;

    (1..=year_count)
        .map(|year| {
            let elapsed = (Decimal::from(year) * ppy).min(periods);
            let balance = solve_fv(elapsed, rate, -input.current_savings, -contribution, input.timing)?;
            let total_contributions = contribution * elapsed;
            Ok(SavingsYear {
                year,
                balance,
                total_contributions,
                interest_earned: balance - input.current_savings - total_contributions,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Annuity payout (pension / retirement drawdown)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnuityPayoutInput {
    /// Balance at the start of the payout phase
    pub balance: Money,
    pub annual_rate_pct: Decimal,
    pub years: u32,
    #[serde(default = "default_payments_per_year")]
    pub payments_per_year: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compounding_periods_per_year: Option<u32>,
    #[serde(default)]
    pub timing: AnnuityTiming,
    /// Balance left over after the last payment
    #[serde(default)]
    pub residual_value: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnuityPayoutOutput {
    pub periodic_rate: Rate,
    /// Payout per period (positive)
    pub payment: Money,
    pub number_of_payments: u32,
    pub total_payout: Money,
    pub interest_earned: Money,
    pub annual_summary: Vec<AnnualSummary>,
}

/// Level payout that draws `balance` down to `residual_value` over the term.
pub fn plan_annuity_payout(
    input: &AnnuityPayoutInput,
) -> TvmResult<ComputationOutput<AnnuityPayoutOutput>> {
    let start = Instant::now();
    let warnings: Vec<String> = Vec::new();

    require_positive("balance", input.balance)?;
    require_non_negative("residual_value", input.residual_value)?;
    if input.years == 0 {
        return Err(TvmError::invalid("years", "Payout term must be at least one year"));
    }

    let compounding = input.compounding_periods_per_year.unwrap_or(input.payments_per_year);
    let rate = periodic_rate(input.annual_rate_pct, compounding, input.payments_per_year)?;
    let number_of_payments = input
        .years
        .checked_mul(input.payments_per_year)
        .ok_or_else(|| TvmError::overflow("number of payments"))?;

    // Balance is received by the annuitant's account, payouts flow back out,
    // the residual stays behind.
    let payment = solve_pmt(
        Decimal::from(number_of_payments),
        rate,
        -input.balance,
        input.residual_value,
        input.timing,
    )?;
    if payment <= Decimal::ZERO {
        return Err(TvmError::invalid(
            "residual_value",
            "Residual value leaves nothing to pay out",
        ));
    }

    let rows = amortization_schedule(input.balance, rate, payment, number_of_payments, input.timing)?;
    let total_payout = payment * Decimal::from(number_of_payments);

    let output = AnnuityPayoutOutput {
        periodic_rate: rate,
        payment,
        number_of_payments,
        total_payout,
        interest_earned: total_payout + input.residual_value - input.balance,
        annual_summary: annual_summary(&rows, input.payments_per_year)?,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Annuity payout via closed-form annuity",
        &serde_json::json!({
            "balance": input.balance.to_string(),
            "annual_rate_pct": input.annual_rate_pct.to_string(),
            "years": input.years,
            "payments_per_year": input.payments_per_year,
            "timing": input.timing,
            "residual_value": input.residual_value.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}
