use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::loan::default_payments_per_year;
use super::{require_non_negative, require_positive};
use crate::error::TvmError;
use crate::payoff::{compare_payoff, PayoffComparison, PayoffOutcome, PayoffParams};
use crate::rate_convert::periodic_rate;
use crate::types::*;
use crate::TvmResult;

/// Input for an early-payoff analysis (mortgage, credit card, student loan)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoffInput {
    pub balance: Money,
    /// Nominal annual rate in percent
    pub annual_rate_pct: Decimal,
    #[serde(default = "default_payments_per_year")]
    pub payments_per_year: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compounding_periods_per_year: Option<u32>,
    pub base_payment: Money,
    #[serde(default)]
    pub extra_per_period: Money,
    #[serde(default)]
    pub extra_per_year: Money,
    #[serde(default)]
    pub one_time_extra: Money,
    /// Simulation cap in years (default 40)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_years: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoffOutput {
    pub periodic_rate: Rate,
    pub baseline_years: Decimal,
    pub accelerated_years: Decimal,
    pub comparison: PayoffComparison,
}

/// Compare paying the base payment alone against paying it with extras.
pub fn analyze_payoff(input: &PayoffInput) -> TvmResult<ComputationOutput<PayoffOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    require_positive("balance", input.balance)?;
    require_positive("base_payment", input.base_payment)?;
    require_non_negative("extra_per_period", input.extra_per_period)?;

    let compounding = input.compounding_periods_per_year.unwrap_or(input.payments_per_year);
    let rate = periodic_rate(input.annual_rate_pct, compounding, input.payments_per_year)?;

    let max_periods = match input.max_years {
        Some(years) => Some(
            years
                .checked_mul(input.payments_per_year)
                .ok_or_else(|| TvmError::overflow("payoff period cap"))?,
        ),
        None => None,
    };

    let params = PayoffParams {
        balance: input.balance,
        periodic_rate: rate,
        base_payment: input.base_payment,
        extra_per_period: input.extra_per_period,
        extra_per_year: input.extra_per_year,
        one_time_extra: input.one_time_extra,
        periods_per_year: input.payments_per_year,
        max_periods,
    };
    let comparison = compare_payoff(&params)?;

    for (label, plan) in [("Baseline", &comparison.baseline), ("Accelerated", &comparison.accelerated)] {
        if plan.outcome == PayoffOutcome::TermCapReached {
            warnings.push(format!(
                "{label} plan reached the {}-period cap with {} still owed",
                plan.periods, plan.remaining_balance
            ));
        }
    }

    let ppy = Decimal::from(input.payments_per_year);
    let output = PayoffOutput {
        periodic_rate: rate,
        baseline_years: Decimal::from(comparison.baseline.periods) / ppy,
        accelerated_years: Decimal::from(comparison.accelerated.periods) / ppy,
        comparison,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Period-by-period payoff simulation with extra payments",
        &serde_json::json!({
            "balance": input.balance.to_string(),
            "annual_rate_pct": input.annual_rate_pct.to_string(),
            "payments_per_year": input.payments_per_year,
            "base_payment": input.base_payment.to_string(),
            "extra_per_period": input.extra_per_period.to_string(),
            "extra_per_year": input.extra_per_year.to_string(),
            "one_time_extra": input.one_time_extra.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}
