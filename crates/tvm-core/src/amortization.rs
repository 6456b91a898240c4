//! Period-by-period amortization schedules and annual roll-ups.
//!
//! Balances and payments are positive magnitudes. The schedule is pure
//! arithmetic: a payment that does not exactly retire the principal leaves a
//! visible residual (or overshoot) in the final row.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TvmError;
use crate::types::{AnnuityTiming, Money, Rate};
use crate::TvmResult;

/// A single row in the amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    /// Period number (1-indexed)
    pub period: u32,
    /// Balance at the start of the period
    pub opening_balance: Money,
    pub payment: Money,
    pub interest: Money,
    /// Portion of the payment that reduces the balance
    pub principal: Money,
    /// Balance at the end of the period
    pub closing_balance: Money,
}

/// Interest and principal summed over one year of rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualSummary {
    /// Year number (1-indexed)
    pub year: u32,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    /// Closing balance of the last row in the year
    pub closing_balance: Money,
}

/// Whole-schedule totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleTotals {
    pub total_payment: Money,
    pub total_interest: Money,
    pub total_principal: Money,
}

impl ScheduleTotals {
    pub fn from_rows(rows: &[ScheduleRow]) -> Self {
        rows.iter().fold(Self::default(), |mut acc, row| {
            acc.total_payment += row.payment;
            acc.total_interest += row.interest;
            acc.total_principal += row.principal;
            acc
        })
    }
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// Build the schedule for `periods` level payments.
///
/// Ordinary timing accrues interest on the opening balance. Due timing
/// applies the payment first and accrues interest on what remains.
pub fn amortization_schedule(
    principal: Money,
    rate: Rate,
    payment: Money,
    periods: u32,
    timing: AnnuityTiming,
) -> TvmResult<Vec<ScheduleRow>> {
    if principal < Decimal::ZERO {
        return Err(TvmError::invalid("principal", "Principal must be >= 0"));
    }
    if rate < Decimal::ZERO {
        return Err(TvmError::invalid("rate", "Periodic rate must be >= 0"));
    }
    if periods == 0 {
        return Err(TvmError::invalid("periods", "Number of periods must be >= 1"));
    }

    let mut rows = Vec::with_capacity(periods as usize);
    let mut balance = principal;

    for period in 1..=periods {
        let opening = balance;
        let interest_base = match timing {
            AnnuityTiming::Ordinary => opening,
            AnnuityTiming::Due => opening - payment,
        };
        let interest = interest_base
            .checked_mul(rate)
            .ok_or_else(|| TvmError::overflow(format!("interest at period {period}")))?;
        let principal_paid = payment - interest;
        balance = opening - principal_paid;

        rows.push(ScheduleRow {
            period,
            opening_balance: opening,
            payment,
            interest,
            principal: principal_paid,
            closing_balance: balance,
        });
    }

    Ok(rows)
}

/// Aggregate rows into blocks of `payments_per_year`. A trailing partial
/// block becomes its own (short) year.
pub fn annual_summary(rows: &[ScheduleRow], payments_per_year: u32) -> TvmResult<Vec<AnnualSummary>> {
    if payments_per_year == 0 {
        return Err(TvmError::invalid(
            "payments_per_year",
            "Payments per year must be >= 1",
        ));
    }

    Ok(rows
        .chunks(payments_per_year as usize)
        .enumerate()
        .map(|(i, block)| {
            let totals = ScheduleTotals::from_rows(block);
            AnnualSummary {
                year: (i + 1) as u32,
                payment: totals.total_payment,
                interest: totals.total_interest,
                principal: totals.total_principal,
                closing_balance: block.last().map_or(Decimal::ZERO, |r| r.closing_balance),
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_value::solve_pmt;
    use rust_decimal_macros::dec;

    #[test]
    fn test_first_row_ordinary() {
        let rows = amortization_schedule(dec!(200000), dec!(0.005), dec!(1199.10), 360, AnnuityTiming::Ordinary)
            .unwrap();
        assert_eq!(rows.len(), 360);
        let first = &rows[0];
        assert_eq!(first.period, 1);
        assert_eq!(first.interest, dec!(1000.000));
        assert_eq!(first.principal, dec!(199.100));
        assert_eq!(first.closing_balance, dec!(199800.900));
    }

    #[test]
    fn test_first_row_due() {
        let rows = amortization_schedule(dec!(1000), dec!(0.01), dec!(100), 3, AnnuityTiming::Due).unwrap();
        // (1000 - 100) * 1%
        assert_eq!(rows[0].interest, dec!(9.00));
        assert_eq!(rows[0].closing_balance, dec!(909.00));
    }

    #[test]
    fn test_consistent_payment_retires_balance() {
        let pmt = -solve_pmt(dec!(60), dec!(0.004), dec!(25000), Decimal::ZERO, AnnuityTiming::Ordinary).unwrap();
        let rows = amortization_schedule(dec!(25000), dec!(0.004), pmt, 60, AnnuityTiming::Ordinary).unwrap();
        let last = rows.last().unwrap();
        assert!(last.closing_balance.abs() < dec!(0.000001), "got {}", last.closing_balance);
    }

    #[test]
    fn test_residual_not_clamped() {
        // Rounded payment leaves an overshoot visible in the last row.
        let rows = amortization_schedule(dec!(1000), Decimal::ZERO, dec!(334), 3, AnnuityTiming::Ordinary).unwrap();
        assert_eq!(rows[2].closing_balance, dec!(-2));
    }

    #[test]
    fn test_annual_summary_partial_year() {
        let rows = amortization_schedule(dec!(1800), Decimal::ZERO, dec!(100), 18, AnnuityTiming::Ordinary).unwrap();
        let years = annual_summary(&rows, 12).unwrap();
        assert_eq!(years.len(), 2);
        assert_eq!(years[0].principal, dec!(1200));
        assert_eq!(years[0].closing_balance, dec!(600));
        assert_eq!(years[1].payment, dec!(600));
        assert_eq!(years[1].closing_balance, Decimal::ZERO);
    }

    #[test]
    fn test_validation() {
        assert!(amortization_schedule(dec!(-1), dec!(0.01), dec!(10), 12, AnnuityTiming::Ordinary).is_err());
        assert!(amortization_schedule(dec!(100), dec!(-0.01), dec!(10), 12, AnnuityTiming::Ordinary).is_err());
        assert!(amortization_schedule(dec!(100), dec!(0.01), dec!(10), 0, AnnuityTiming::Ordinary).is_err());
        assert!(annual_summary(&[], 0).is_err());
    }
}
