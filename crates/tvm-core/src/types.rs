use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Period counts. Decimal so that a fractional term from `solve_n` can be
/// fed straight back into the other solvers.
pub type Periods = Decimal;

/// Payment timing within each period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnuityTiming {
    /// Payment at the end of the period (annuity-immediate).
    #[default]
    Ordinary,
    /// Payment at the start of the period (annuity-due).
    Due,
}

impl AnnuityTiming {
    /// The `k` factor applied to the payment term: `1 + rate` for an
    /// annuity-due, otherwise one.
    pub fn payment_factor(self, rate: Rate) -> Decimal {
        match self {
            AnnuityTiming::Ordinary => Decimal::ONE,
            AnnuityTiming::Due => Decimal::ONE + rate,
        }
    }

    pub fn is_due(self) -> bool {
        matches!(self, AnnuityTiming::Due)
    }
}

/// The five TVM variables plus payment timing.
///
/// Sign convention follows a financial calculator: money paid out and money
/// received carry opposite signs. The engine never infers signs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvmParameters {
    pub periods: Periods,
    pub rate: Rate,
    pub present_value: Money,
    pub payment: Money,
    pub future_value: Money,
    #[serde(default)]
    pub timing: AnnuityTiming,
}

/// A cash flow pinned to a calendar date (XIRR input)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatedCashFlow {
    pub date: NaiveDate,
    pub amount: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Outcome of an iterative rate search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSolution {
    /// Periodic rate found (best estimate when not converged).
    pub rate: Rate,
    pub iterations: u32,
    /// False when the iteration cap was hit before the tolerance was met.
    pub converged: bool,
    /// Objective value at `rate`.
    pub residual: Decimal,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_payment_factor() {
        assert_eq!(AnnuityTiming::Ordinary.payment_factor(dec!(0.01)), dec!(1));
        assert_eq!(AnnuityTiming::Due.payment_factor(dec!(0.01)), dec!(1.01));
    }

    #[test]
    fn test_timing_serde_snake_case() {
        let json = serde_json::to_string(&AnnuityTiming::Due).unwrap();
        assert_eq!(json, "\"due\"");
        let parsed: AnnuityTiming = serde_json::from_str("\"ordinary\"").unwrap();
        assert_eq!(parsed, AnnuityTiming::Ordinary);
    }

    #[test]
    fn test_tvm_parameters_default_timing() {
        let json = r#"{"periods":"12","rate":"0.01","present_value":"1000","payment":"-88.85","future_value":"0"}"#;
        let params: TvmParameters = serde_json::from_str(json).unwrap();
        assert_eq!(params.timing, AnnuityTiming::Ordinary);
        assert_eq!(params.periods, dec!(12));
    }
}
