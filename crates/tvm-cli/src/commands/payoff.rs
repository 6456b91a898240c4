use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use tvm_core::calculators::payoff::{self, PayoffInput};

use crate::input;

/// Arguments for an early-payoff comparison
#[derive(Args)]
pub struct PayoffArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Outstanding balance
    #[arg(long)]
    pub balance: Option<Decimal>,

    /// Nominal annual rate in percent
    #[arg(long)]
    pub annual_rate: Option<Decimal>,

    /// Regular payment per period
    #[arg(long)]
    pub payment: Option<Decimal>,

    /// Extra paid every period
    #[arg(long)]
    pub extra: Option<Decimal>,

    /// Extra paid once a year
    #[arg(long)]
    pub extra_yearly: Option<Decimal>,

    /// Lump sum paid before the first period
    #[arg(long)]
    pub lump_sum: Option<Decimal>,

    /// Payments per year
    #[arg(long, default_value = "12")]
    pub payments_per_year: u32,

    /// Stop simulating after this many years
    #[arg(long)]
    pub max_years: Option<u32>,
}

pub fn run_payoff(args: PayoffArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let payoff_input: PayoffInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        PayoffInput {
            balance: args.balance.ok_or("--balance is required (or provide --input)")?,
            annual_rate_pct: args
                .annual_rate
                .ok_or("--annual-rate is required (or provide --input)")?,
            payments_per_year: args.payments_per_year,
            compounding_periods_per_year: None,
            base_payment: args.payment.ok_or("--payment is required (or provide --input)")?,
            extra_per_period: args.extra.unwrap_or(Decimal::ZERO),
            extra_per_year: args.extra_yearly.unwrap_or(Decimal::ZERO),
            one_time_extra: args.lump_sum.unwrap_or(Decimal::ZERO),
            max_years: args.max_years,
        }
    };

    let result = payoff::analyze_payoff(&payoff_input)?;
    Ok(serde_json::to_value(result)?)
}
