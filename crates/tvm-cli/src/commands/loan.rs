use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use tvm_core::calculators::loan::{self, LoanInput, LoanRateInput};

use super::tvm::timing;
use crate::input;

/// Arguments for loan amortization
#[derive(Args)]
pub struct LoanArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Purchase price or loan amount
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Down payment deducted from the principal
    #[arg(long)]
    pub down_payment: Option<Decimal>,

    /// Nominal annual rate in percent
    #[arg(long)]
    pub annual_rate: Option<Decimal>,

    /// Term in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Payments per year
    #[arg(long, default_value = "12")]
    pub payments_per_year: u32,

    /// Compounding periods per year (defaults to payments per year)
    #[arg(long)]
    pub compounding: Option<u32>,

    /// Payments at the start of each period
    #[arg(long)]
    pub due: bool,

    /// Omit the period-by-period schedule
    #[arg(long)]
    pub summary_only: bool,
}

pub fn run_loan(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan_input: LoanInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let principal = args
            .principal
            .ok_or("--principal is required (or provide --input)")?;
        let annual_rate = args
            .annual_rate
            .ok_or("--annual-rate is required (or provide --input)")?;
        let years = args.years.ok_or("--years is required (or provide --input)")?;

        LoanInput {
            principal,
            down_payment: args.down_payment.unwrap_or(Decimal::ZERO),
            annual_rate_pct: annual_rate,
            term_years: years,
            payments_per_year: args.payments_per_year,
            compounding_periods_per_year: args.compounding,
            timing: timing(args.due),
            include_schedule: !args.summary_only,
        }
    };

    let result = loan::analyze_loan(&loan_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for the implied loan rate
#[derive(Args)]
pub struct LoanRateArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Payment per period
    #[arg(long)]
    pub payment: Option<Decimal>,

    /// Number of payments
    #[arg(long)]
    pub n: Option<u32>,

    /// Payments per year (for the APR)
    #[arg(long, default_value = "12")]
    pub payments_per_year: u32,
}

pub fn run_loan_rate(args: LoanRateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let rate_input: LoanRateInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        LoanRateInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            payment: args
                .payment
                .ok_or("--payment is required (or provide --input)")?,
            number_of_payments: args.n.ok_or("--n is required (or provide --input)")?,
            payments_per_year: args.payments_per_year,
        }
    };

    let result = loan::find_loan_rate(&rate_input)?;
    Ok(serde_json::to_value(result)?)
}
