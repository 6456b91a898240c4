use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::TvmError;
use crate::irr::{irr, xirr, DEFAULT_IRR_GUESS};
use crate::time_value::npv;
use crate::types::*;
use crate::TvmResult;

/// Input for an investment return analysis (rental property, project)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentInput {
    /// Periodic cash flows, index 0 = initial investment (negative)
    pub cash_flows: Vec<Money>,
    /// Dated cash flows for XIRR
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dated_cash_flows: Option<Vec<DatedCashFlow>>,
    /// Per-period discount rate for NPV (decimal)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_rate: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub irr_guess: Option<Rate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentOutput {
    /// Periodic IRR (decimal)
    pub irr: Option<Rate>,
    pub irr_pct: Option<Decimal>,
    /// Annualised IRR of the dated flows
    pub xirr: Option<Rate>,
    pub npv: Option<Money>,
    /// Total returned / total invested
    pub multiple: Decimal,
    pub total_invested: Money,
    pub total_returned: Money,
    /// Periods until cumulative cash flow turns non-negative, interpolated
    pub payback_period: Option<Decimal>,
}

/// IRR, NPV, multiple and payback for a cash-flow series.
pub fn analyze_investment(
    input: &InvestmentInput,
) -> TvmResult<ComputationOutput<InvestmentOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.cash_flows.is_empty() {
        return Err(TvmError::InsufficientData(
            "At least one cash flow is required".into(),
        ));
    }

    let total_invested: Money = input
        .cash_flows
        .iter()
        .filter(|cf| cf.is_sign_negative())
        .map(|cf| cf.abs())
        .sum();
    let total_returned: Money = input
        .cash_flows
        .iter()
        .filter(|cf| cf.is_sign_positive())
        .sum();

    if total_invested.is_zero() {
        return Err(TvmError::invalid(
            "cash_flows",
            "Cash flows contain no investment (negative flow)",
        ));
    }

    let guess = input.irr_guess.unwrap_or(DEFAULT_IRR_GUESS);
    let irr_result = match irr(&input.cash_flows, guess) {
        Ok(sol) => Some(sol),
        Err(e) => {
            warnings.push(format!("IRR calculation warning: {e}"));
            None
        }
    };

    let xirr_result = match input.dated_cash_flows.as_deref() {
        Some(dated) => match xirr(dated, guess) {
            Ok(sol) => Some(sol.rate),
            Err(e) => {
                warnings.push(format!("XIRR calculation warning: {e}"));
                None
            }
        },
        None => None,
    };

    let npv_result = match input.discount_rate {
        Some(rate) => Some(npv(rate, &input.cash_flows)?),
        None => None,
    };

    let payback_period = payback(&input.cash_flows);
    if payback_period.is_none() {
        warnings.push("Investment is not paid back within the cash-flow horizon".into());
    }

    let output = InvestmentOutput {
        irr: irr_result.as_ref().map(|s| s.rate),
        irr_pct: irr_result.as_ref().map(|s| s.rate_pct),
        xirr: xirr_result,
        npv: npv_result,
        multiple: total_returned / total_invested,
        total_invested,
        total_returned,
        payback_period,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Investment returns: IRR (Newton-Raphson), NPV, multiple, payback",
        &serde_json::json!({
            "periods": input.cash_flows.len(),
            "discount_rate": input.discount_rate.map(|r| r.to_string()),
            "irr_guess": guess.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn payback(cash_flows: &[Money]) -> Option<Decimal> {
    let mut cumulative = Decimal::ZERO;
    for (t, cf) in cash_flows.iter().enumerate() {
        let before = cumulative;
        cumulative += cf;
        if before < Decimal::ZERO && cumulative >= Decimal::ZERO && t > 0 {
            // Linear within the period
            let fraction = -before / cf;
            return Some(Decimal::from(t as u64 - 1) + fraction);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn rental() -> InvestmentInput {
        InvestmentInput {
            cash_flows: vec![dec!(-10000), dec!(2000), dec!(3000), dec!(4000), dec!(5000)],
            dated_cash_flows: None,
            discount_rate: Some(dec!(0.08)),
            irr_guess: None,
        }
    }

    #[test]
    fn test_rental_returns() {
        let out = analyze_investment(&rental()).unwrap();
        let r = &out.result;
        assert!((r.irr.unwrap() - dec!(0.1282573)).abs() < dec!(0.000001));
        assert!(r.npv.unwrap() > Decimal::ZERO);
        assert_eq!(r.multiple, dec!(1.4));
        // -10000, -8000, -5000, -1000, +4000: 3 + 1000/5000
        assert_eq!(r.payback_period, Some(dec!(3.2)));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_irr_failure_becomes_warning() {
        let input = InvestmentInput {
            cash_flows: vec![dec!(-100), dec!(-50)],
            ..rental()
        };
        let out = analyze_investment(&input).unwrap();
        assert!(out.result.irr.is_none());
        assert!(out.warnings.iter().any(|w| w.contains("IRR")));
    }

    #[test]
    fn test_no_investment_rejected() {
        let input = InvestmentInput {
            cash_flows: vec![dec!(100), dec!(50)],
            ..rental()
        };
        assert!(analyze_investment(&input).is_err());
    }
}
