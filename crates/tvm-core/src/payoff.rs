//! Payoff simulation with extra payments.
//!
//! Runs a balance forward one period at a time: accrue interest, pay the base
//! payment plus any per-period extra (and the yearly extra on each
//! year-end period), until the balance is gone or the term cap is reached.

use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_PAYOFF_CAP_YEARS;
use crate::error::TvmError;
use crate::types::{Money, Rate};
use crate::TvmResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoffParams {
    pub balance: Money,
    pub periodic_rate: Rate,
    pub base_payment: Money,
    #[serde(default)]
    pub extra_per_period: Money,
    /// Added on every period that closes a year
    #[serde(default)]
    pub extra_per_year: Money,
    /// Applied against the balance before the first period
    #[serde(default)]
    pub one_time_extra: Money,
    pub periods_per_year: u32,
    /// Defaults to 40 years of periods
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_periods: Option<u32>,
}

impl PayoffParams {
    /// Same loan with every extra payment removed.
    pub fn baseline(&self) -> Self {
        Self {
            extra_per_period: Decimal::ZERO,
            extra_per_year: Decimal::ZERO,
            one_time_extra: Decimal::ZERO,
            ..self.clone()
        }
    }

    fn cap(&self) -> u32 {
        self.max_periods
            .unwrap_or_else(|| DEFAULT_PAYOFF_CAP_YEARS.saturating_mul(self.periods_per_year))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoffOutcome {
    PaidOff,
    /// Balance remained when the period cap was hit
    TermCapReached,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoffPlan {
    pub periods: u32,
    pub total_interest: Money,
    /// All payments including the one-time extra
    pub total_paid: Money,
    pub remaining_balance: Money,
    pub outcome: PayoffOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoffComparison {
    pub baseline: PayoffPlan,
    pub accelerated: PayoffPlan,
    pub interest_saved: Money,
    pub periods_saved: i64,
}

fn validate(params: &PayoffParams) -> TvmResult<()> {
    if params.balance < Decimal::ZERO {
        return Err(TvmError::invalid("balance", "Balance must be >= 0"));
    }
    if params.periodic_rate < Decimal::ZERO {
        return Err(TvmError::invalid("periodic_rate", "Periodic rate must be >= 0"));
    }
    if params.base_payment < Decimal::ZERO {
        return Err(TvmError::invalid("base_payment", "Base payment must be >= 0"));
    }
    for (field, value) in [
        ("extra_per_period", params.extra_per_period),
        ("extra_per_year", params.extra_per_year),
        ("one_time_extra", params.one_time_extra),
    ] {
        if value < Decimal::ZERO {
            return Err(TvmError::invalid(field, "Extra payments must be >= 0"));
        }
    }
    if params.periods_per_year == 0 {
        return Err(TvmError::invalid("periods_per_year", "Periods per year must be >= 1"));
    }
    if params.max_periods == Some(0) {
        return Err(TvmError::invalid("max_periods", "Period cap must be >= 1"));
    }
    Ok(())
}

/// Simulate paying down `params.balance`.
///
/// Fails with [`TvmError::PaymentInsufficient`] up front when the regular
/// payment does not exceed the first period's interest, so the balance
/// could never shrink.
pub fn simulate_payoff(params: &PayoffParams) -> TvmResult<PayoffPlan> {
    validate(params)?;

    let upfront = params.one_time_extra.min(params.balance);
    let mut balance = params.balance - upfront;
    let mut total_interest = Decimal::ZERO;
    let mut total_paid = upfront;

    if balance <= Decimal::ZERO {
        return Ok(PayoffPlan {
            periods: 0,
            total_interest,
            total_paid,
            remaining_balance: Decimal::ZERO,
            outcome: PayoffOutcome::PaidOff,
        });
    }

    let regular = params.base_payment + params.extra_per_period;
    let first_interest = balance
        .checked_mul(params.periodic_rate)
        .ok_or_else(|| TvmError::overflow("first-period interest"))?;
    if regular <= first_interest {
        return Err(TvmError::PaymentInsufficient {
            payment: regular,
            required: first_interest,
        });
    }

    let cap = params.cap();
    let mut periods = 0u32;

    while balance > Decimal::ZERO && periods < cap {
        periods += 1;

        let interest = balance
            .checked_mul(params.periodic_rate)
            .ok_or_else(|| TvmError::overflow(format!("payoff interest at period {periods}")))?;
        balance += interest;
        total_interest += interest;

        let mut payment = regular;
        if periods % params.periods_per_year == 0 {
            payment += params.extra_per_year;
        }
        // Final payment covers only what is owed.
        let payment = payment.min(balance);
        balance -= payment;
        total_paid += payment;
    }

    let outcome = if balance > Decimal::ZERO {
        warn!("payoff reached the {cap}-period cap with {balance} outstanding");
        PayoffOutcome::TermCapReached
    } else {
        debug!("payoff completed in {periods} periods");
        PayoffOutcome::PaidOff
    };

    Ok(PayoffPlan {
        periods,
        total_interest,
        total_paid,
        remaining_balance: balance,
        outcome,
    })
}

/// Run the plan with and without the extra payments.
pub fn compare_payoff(params: &PayoffParams) -> TvmResult<PayoffComparison> {
    let baseline = simulate_payoff(&params.baseline())?;
    let accelerated = simulate_payoff(params)?;

    Ok(PayoffComparison {
        interest_saved: baseline.total_interest - accelerated.total_interest,
        periods_saved: i64::from(baseline.periods) - i64::from(accelerated.periods),
        baseline,
        accelerated,
    })
}
