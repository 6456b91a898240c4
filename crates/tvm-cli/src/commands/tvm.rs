use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use tvm_core::calculators::tvm::{self, RateConversionInput, SolveFor, TvmInput};
use tvm_core::AnnuityTiming;

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SolveForArg {
    N,
    Rate,
    Pv,
    Pmt,
    Fv,
}

impl From<SolveForArg> for SolveFor {
    fn from(arg: SolveForArg) -> Self {
        match arg {
            SolveForArg::N => SolveFor::Periods,
            SolveForArg::Rate => SolveFor::Rate,
            SolveForArg::Pv => SolveFor::PresentValue,
            SolveForArg::Pmt => SolveFor::Payment,
            SolveForArg::Fv => SolveFor::FutureValue,
        }
    }
}

pub(crate) fn timing(due: bool) -> AnnuityTiming {
    if due {
        AnnuityTiming::Due
    } else {
        AnnuityTiming::Ordinary
    }
}

/// Arguments for the five-variable TVM solve
#[derive(Args)]
pub struct TvmArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Variable to solve for
    #[arg(long)]
    pub solve_for: Option<SolveForArg>,

    /// Number of periods
    #[arg(long)]
    pub n: Option<Decimal>,

    /// Periodic rate as a decimal (0.005 = 0.5% per period)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Present value (signed)
    #[arg(long, allow_hyphen_values = true)]
    pub pv: Option<Decimal>,

    /// Payment per period (signed)
    #[arg(long, allow_hyphen_values = true)]
    pub pmt: Option<Decimal>,

    /// Future value (signed)
    #[arg(long, allow_hyphen_values = true)]
    pub fv: Option<Decimal>,

    /// Payments at the start of each period (annuity-due)
    #[arg(long)]
    pub due: bool,
}

pub fn run_tvm(args: TvmArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let tvm_input: TvmInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let solve_for = args
            .solve_for
            .ok_or("--solve-for is required (or provide --input)")?;

        TvmInput {
            solve_for: solve_for.into(),
            periods: args.n,
            rate: args.rate,
            present_value: args.pv,
            payment: args.pmt,
            future_value: args.fv,
            timing: timing(args.due),
        }
    };

    let result = tvm::solve_tvm(&tvm_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for rate conversion
#[derive(Args)]
pub struct ConvertRateArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Quoted nominal annual rate in percent (e.g. 6 for 6%)
    #[arg(long)]
    pub annual_rate: Option<Decimal>,

    /// Compounding periods per year
    #[arg(long, default_value = "12")]
    pub compounding: u32,

    /// Payment periods per year
    #[arg(long, default_value = "12")]
    pub payments_per_year: u32,
}

pub fn run_convert_rate(args: ConvertRateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let conversion: RateConversionInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let annual_rate = args
            .annual_rate
            .ok_or("--annual-rate is required (or provide --input)")?;

        RateConversionInput {
            nominal_annual_rate_pct: annual_rate,
            compounding_periods_per_year: args.compounding,
            payment_periods_per_year: args.payments_per_year,
        }
    };

    let result = tvm::convert_rate(&conversion)?;
    Ok(serde_json::to_value(result)?)
}
