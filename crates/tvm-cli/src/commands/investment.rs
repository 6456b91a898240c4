use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use tvm_core::calculators::investment::{self, InvestmentInput};
use tvm_core::irr::{self, DEFAULT_IRR_GUESS};

use crate::input;

/// Arguments for investment return analysis
#[derive(Args)]
pub struct InvestmentArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Periodic cash flows (comma-separated, e.g. "-10000,2000,3000,4000,5000")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,

    /// Discount rate per period for NPV (decimal)
    #[arg(long)]
    pub discount_rate: Option<Decimal>,
}

pub fn run_investment(args: InvestmentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let investment_input: InvestmentInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let cash_flows = args
            .cash_flows
            .ok_or("--cash-flows is required (or provide --input)")?;

        InvestmentInput {
            cash_flows,
            dated_cash_flows: None,
            discount_rate: args.discount_rate,
            irr_guess: None,
        }
    };

    let result = investment::analyze_investment(&investment_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for a bare IRR solve
#[derive(Args)]
pub struct IrrArgs {
    /// Cash flows (comma-separated, first flow at t = 0)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,

    /// Starting guess (decimal)
    #[arg(long)]
    pub guess: Option<Decimal>,
}

pub fn run_irr(args: IrrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let cash_flows: Vec<Decimal> = if let Some(flows) = args.cash_flows {
        flows
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--cash-flows or a JSON array on stdin is required".into());
    };

    let solution = irr::irr(&cash_flows, args.guess.unwrap_or(DEFAULT_IRR_GUESS))?;
    Ok(serde_json::to_value(solution)?)
}
