mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::investment::{InvestmentArgs, IrrArgs};
use commands::loan::{LoanArgs, LoanRateArgs};
use commands::payoff::PayoffArgs;
use commands::savings::{AnnuityPayoutArgs, SavingsGoalArgs};
use commands::tvm::{ConvertRateArgs, TvmArgs};

/// Time-value-of-money, loan and payoff calculations
#[derive(Parser)]
#[command(
    name = "tvm",
    version,
    about = "Time-value-of-money, loan and payoff calculations",
    long_about = "A CLI for personal-finance calculations with decimal precision. \
                  Supports the five-variable TVM solve, rate conversion, loan \
                  amortization, implied loan rates, savings goals, annuity payouts, \
                  early-payoff comparisons and investment returns (IRR/XIRR)."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve for one of N, I/Y, PV, PMT, FV given the other four
    Tvm(TvmArgs),
    /// Convert a quoted annual rate to a per-payment-period rate
    ConvertRate(ConvertRateArgs),
    /// Level payment and amortization schedule for a loan
    Loan(LoanArgs),
    /// Implied interest rate of a loan from its payment
    LoanRate(LoanRateArgs),
    /// Contribution (or time) needed to reach a savings target
    SavingsGoal(SavingsGoalArgs),
    /// Level payout that draws down a balance over a term
    AnnuityPayout(AnnuityPayoutArgs),
    /// Compare paying off a balance with and without extra payments
    Payoff(PayoffArgs),
    /// Investment returns: IRR, XIRR, NPV, multiple, payback
    Investment(InvestmentArgs),
    /// Internal rate of return of a periodic cash-flow series
    Irr(IrrArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Tvm(args) => commands::tvm::run_tvm(args),
        Commands::ConvertRate(args) => commands::tvm::run_convert_rate(args),
        Commands::Loan(args) => commands::loan::run_loan(args),
        Commands::LoanRate(args) => commands::loan::run_loan_rate(args),
        Commands::SavingsGoal(args) => commands::savings::run_savings_goal(args),
        Commands::AnnuityPayout(args) => commands::savings::run_annuity_payout(args),
        Commands::Payoff(args) => commands::payoff::run_payoff(args),
        Commands::Investment(args) => commands::investment::run_investment(args),
        Commands::Irr(args) => commands::investment::run_irr(args),
        Commands::Version => {
            println!("tvm {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
