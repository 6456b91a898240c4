use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use tvm_core::calculators::savings::{self, AnnuityPayoutInput, SavingsGoalInput};

use super::tvm::timing;
use crate::input;

/// Arguments for a savings goal
#[derive(Args)]
pub struct SavingsGoalArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount to reach
    #[arg(long)]
    pub target: Option<Decimal>,

    /// Amount already saved
    #[arg(long)]
    pub current: Option<Decimal>,

    /// Nominal annual rate in percent
    #[arg(long)]
    pub annual_rate: Option<Decimal>,

    /// Years to reach the target (solves for the contribution)
    #[arg(long)]
    pub years: Option<Decimal>,

    /// Contribution per period (solves for the time instead)
    #[arg(long)]
    pub contribution: Option<Decimal>,

    /// Contributions per year
    #[arg(long, default_value = "12")]
    pub payments_per_year: u32,

    /// Compounding periods per year (defaults to payments per year)
    #[arg(long)]
    pub compounding: Option<u32>,

    /// Contributions at the start of each period
    #[arg(long)]
    pub due: bool,
}

pub fn run_savings_goal(args: SavingsGoalArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let goal: SavingsGoalInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let target = args.target.ok_or("--target is required (or provide --input)")?;
        let annual_rate = args
            .annual_rate
            .ok_or("--annual-rate is required (or provide --input)")?;
        if args.years.is_none() && args.contribution.is_none() {
            return Err("one of --years or --contribution is required".into());
        }

        SavingsGoalInput {
            target_amount: target,
            current_savings: args.current.unwrap_or(Decimal::ZERO),
            annual_rate_pct: annual_rate,
            payments_per_year: args.payments_per_year,
            compounding_periods_per_year: args.compounding,
            years: args.years,
            contribution: args.contribution,
            timing: timing(args.due),
        }
    };

    let result = savings::plan_savings_goal(&goal)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for an annuity payout
#[derive(Args)]
pub struct AnnuityPayoutArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Balance at the start of the payout
    #[arg(long)]
    pub balance: Option<Decimal>,

    /// Nominal annual rate in percent
    #[arg(long)]
    pub annual_rate: Option<Decimal>,

    /// Payout term in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Payouts per year
    #[arg(long, default_value = "12")]
    pub payments_per_year: u32,

    /// Compounding periods per year (defaults to payments per year)
    #[arg(long)]
    pub compounding: Option<u32>,

    /// Balance to leave after the final payout
    #[arg(long)]
    pub residual: Option<Decimal>,

    /// Payouts at the start of each period
    #[arg(long)]
    pub due: bool,
}

pub fn run_annuity_payout(args: AnnuityPayoutArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let payout: AnnuityPayoutInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        AnnuityPayoutInput {
            balance: args.balance.ok_or("--balance is required (or provide --input)")?,
            annual_rate_pct: args
                .annual_rate
                .ok_or("--annual-rate is required (or provide --input)")?,
            years: args.years.ok_or("--years is required (or provide --input)")?,
            payments_per_year: args.payments_per_year,
            compounding_periods_per_year: args.compounding,
            timing: timing(args.due),
            residual_value: args.residual.unwrap_or(Decimal::ZERO),
        }
    };

    let result = savings::plan_annuity_payout(&payout)?;
    Ok(serde_json::to_value(result)?)
}
