//! Iterative solvers for the periodic rate.
//!
//! Two shapes of problem are handled:
//!
//! - Loan shape (FV = 0, ordinary annuity): bisection on `[0, 1]` for
//!   `PV = PMT * (1 - (1+i)^-N) / i`. Robust for long terms where Newton
//!   started at 10% overshoots.
//! - General TVM shape: Newton-Raphson on the full identity with an
//!   analytic derivative, supporting annuity-due.

use log::{debug, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::config::{SolverSettings, DERIVATIVE_FLOOR};
use crate::error::TvmError;
use crate::math::{checked, checked_pow_int, growth_factor};
use crate::types::{AnnuityTiming, Money, Periods, Rate, RateSolution, TvmParameters};
use crate::TvmResult;

/// Upper end of the bisection bracket: 100% per period.
const BISECTION_UPPER: Rate = dec!(1);

/// Newton start point.
const NEWTON_GUESS: Rate = dec!(0.1);

/// A converged Newton rate this close below zero is reported as zero.
const ZERO_RATE_SLACK: Rate = dec!(0.00000001);

// ---------------------------------------------------------------------------
// Bisection
// ---------------------------------------------------------------------------

/// Present value of `periods` level payments of 1 at `rate`, payments in
/// arrears. Discounts rather than compounds so a high trial rate underflows
/// toward zero instead of overflowing.
fn annuity_pv_factor(rate: Rate, periods: u32) -> TvmResult<Decimal> {
    if rate.is_zero() {
        return Ok(Decimal::from(periods));
    }
    let v = Decimal::ONE / (Decimal::ONE + rate);
    let v_n = checked_pow_int(v, u64::from(periods))
        .ok_or_else(|| TvmError::overflow("annuity discount factor"))?;
    Ok((Decimal::ONE - v_n) / rate)
}

/// Solve for the periodic rate of a fully amortising loan with bisection
/// using the default settings (one-cent tolerance, 100 iterations).
pub fn solve_rate_bisection(
    present_value: Money,
    periods: u32,
    payment: Money,
) -> TvmResult<RateSolution> {
    solve_rate_bisection_with(present_value, periods, payment, &SolverSettings::bisection())
}

/// Bisection with explicit settings.
///
/// `present_value` and `payment` are both positive magnitudes. When the
/// iteration cap is reached the best midpoint is returned with
/// `converged = false` rather than an error.
pub fn solve_rate_bisection_with(
    present_value: Money,
    periods: u32,
    payment: Money,
    settings: &SolverSettings,
) -> TvmResult<RateSolution> {
    if present_value <= Decimal::ZERO {
        return Err(TvmError::invalid("present_value", "Loan amount must be positive"));
    }
    if payment <= Decimal::ZERO {
        return Err(TvmError::invalid("payment", "Payment must be positive"));
    }
    if periods == 0 {
        return Err(TvmError::invalid("periods", "Number of periods must be > 0"));
    }

    let total_paid = checked(payment.checked_mul(Decimal::from(periods)), "total of payments")?;
    if total_paid < present_value {
        return Err(TvmError::PaymentInsufficient {
            payment: total_paid,
            required: present_value,
        });
    }
    if total_paid == present_value {
        return Ok(RateSolution {
            rate: Decimal::ZERO,
            iterations: 0,
            converged: true,
            residual: Decimal::ZERO,
        });
    }

    let mut lo = Decimal::ZERO;
    let mut hi = BISECTION_UPPER;
    let mut best = RateSolution {
        rate: hi,
        iterations: 0,
        converged: false,
        residual: Decimal::MAX,
    };

    for iteration in 1..=settings.max_iterations {
        let mid = (lo + hi) / dec!(2);
        let implied = checked(
            payment.checked_mul(annuity_pv_factor(mid, periods)?),
            "implied loan amount",
        )?;
        let residual = implied - present_value;

        if residual.abs() < best.residual.abs() {
            best = RateSolution {
                rate: mid,
                iterations: iteration,
                converged: false,
                residual,
            };
        }

        if residual.abs() < settings.tolerance {
            debug!("bisection converged to {mid} after {iteration} iterations");
            return Ok(RateSolution {
                rate: mid,
                iterations: iteration,
                converged: true,
                residual,
            });
        }

        // Implied PV falls as the rate rises.
        if implied > present_value {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    warn!(
        "bisection hit {} iterations without meeting tolerance {}; best rate {} (residual {})",
        settings.max_iterations, settings.tolerance, best.rate, best.residual
    );
    best.iterations = settings.max_iterations;
    Ok(best)
}

// ---------------------------------------------------------------------------
// Newton-Raphson
// ---------------------------------------------------------------------------

/// f(i) and f'(i) for the TVM identity. Any intermediate product that leaves
/// the `Decimal` range is reported as [`TvmError::Overflow`].
fn tvm_objective(params: &TvmParameters, rate: Rate) -> TvmResult<(Decimal, Decimal)> {
    let n = params.periods;
    let pv = params.present_value;
    let pmt = params.payment;
    let fv = params.future_value;
    let due = params.timing.is_due();

    if rate.is_zero() {
        // Limits as i -> 0.
        let f = checked(
            pmt.checked_mul(n)
                .and_then(|paid| fv.checked_add(pv)?.checked_add(paid)),
            "TVM residual at zero rate",
        )?;
        let mut slope = checked(
            n.checked_mul(n - Decimal::ONE).map(|x| x / dec!(2)),
            "TVM slope at zero rate",
        )?;
        if due {
            slope = checked(slope.checked_add(n), "TVM slope at zero rate")?;
        }
        let df = checked(
            pv.checked_mul(n)
                .zip(pmt.checked_mul(slope))
                .and_then(|(a, b)| a.checked_add(b)),
            "TVM derivative at zero rate",
        )?;
        return Ok((f, df));
    }

    let g = growth_factor(rate, n)?;
    let one_plus_r = Decimal::ONE + rate;
    let dg = checked(
        n.checked_mul(g).and_then(|x| x.checked_div(one_plus_r)),
        "growth factor derivative",
    )?;
    let k = params.timing.payment_factor(rate);
    let dk = if due { Decimal::ONE } else { Decimal::ZERO };

    let g_minus_one = g - Decimal::ONE;
    let accumulation = checked(g_minus_one.checked_div(rate), "accumulation factor")?;
    let d_accumulation = checked(
        dg.checked_mul(rate)
            .and_then(|x| x.checked_sub(g_minus_one))
            .and_then(|x| x.checked_div(rate.checked_mul(rate)?)),
        "accumulation derivative",
    )?;

    let f = checked(
        pv.checked_mul(g)
            .zip(pmt.checked_mul(k).and_then(|x| x.checked_mul(accumulation)))
            .and_then(|(grown, accumulated)| fv.checked_add(grown)?.checked_add(accumulated)),
        "TVM residual",
    )?;
    let df = checked(
        dk.checked_mul(accumulation)
            .zip(k.checked_mul(d_accumulation))
            .and_then(|(a, b)| a.checked_add(b))
            .and_then(|inner| pmt.checked_mul(inner))
            .zip(pv.checked_mul(dg))
            .and_then(|(a, b)| a.checked_add(b)),
        "TVM derivative",
    )?;
    Ok((f, df))
}

/// Solve the general TVM identity for the periodic rate with Newton-Raphson
/// using the default settings (|f| < 1e-5, 20 iterations, guess 10%).
pub fn solve_rate_newton(params: &TvmParameters) -> TvmResult<RateSolution> {
    solve_rate_newton_with(params, NEWTON_GUESS, &SolverSettings::newton_rate())
}

/// Newton-Raphson with an explicit start guess and settings.
pub fn solve_rate_newton_with(
    params: &TvmParameters,
    guess: Rate,
    settings: &SolverSettings,
) -> TvmResult<RateSolution> {
    if params.periods <= Decimal::ZERO {
        return Err(TvmError::invalid("periods", "Number of periods must be > 0"));
    }
    if guess <= Decimal::NEGATIVE_ONE {
        return Err(TvmError::invalid("guess", "Initial guess must be greater than -100%"));
    }

    let mut rate = guess;
    let mut last_f = Decimal::ZERO;

    for iteration in 0..settings.max_iterations {
        let (f, df) = match tvm_objective(params, rate) {
            Ok(v) => v,
            Err(TvmError::Overflow { context }) => {
                return Err(TvmError::non_convergent(
                    "TVM rate",
                    iteration,
                    last_f,
                    format!("iterate {rate} overflowed ({context})"),
                ));
            }
            Err(e) => return Err(e),
        };
        last_f = f;

        if f.abs() < settings.tolerance {
            debug!("newton rate converged to {rate} after {iteration} iterations");
            return finish_newton(rate, iteration, f);
        }

        if df.abs() < DERIVATIVE_FLOOR {
            warn!("newton rate: derivative vanished at {rate}");
            return Err(TvmError::non_convergent(
                "TVM rate",
                iteration,
                f,
                format!("derivative {df} below floor at rate {rate}"),
            ));
        }

        let Some(next) = f.checked_div(df).and_then(|step| rate.checked_sub(step)) else {
            return Err(TvmError::non_convergent(
                "TVM rate",
                iteration + 1,
                f,
                format!("Newton step from rate {rate} overflowed"),
            ));
        };
        if next <= Decimal::NEGATIVE_ONE {
            return Err(TvmError::non_convergent(
                "TVM rate",
                iteration + 1,
                f,
                format!("iterate {next} left the domain (rate must exceed -100%)"),
            ));
        }
        rate = next;
    }

    warn!(
        "newton rate exhausted {} iterations at {rate} (f = {last_f})",
        settings.max_iterations
    );
    Err(TvmError::non_convergent(
        "TVM rate",
        settings.max_iterations,
        last_f,
        "iteration cap exhausted",
    ))
}

fn finish_newton(rate: Rate, iterations: u32, residual: Decimal) -> TvmResult<RateSolution> {
    let rate = if rate < Decimal::ZERO && rate.abs() < ZERO_RATE_SLACK {
        Decimal::ZERO
    } else {
        rate
    };
    if rate < Decimal::ZERO {
        return Err(TvmError::invalid(
            "rate",
            format!("Solution rate {rate} is negative"),
        ));
    }
    Ok(RateSolution {
        rate,
        iterations,
        converged: true,
        residual,
    })
}

/// Convenience wrapper building [`TvmParameters`] for the Newton solver.
pub fn solve_rate(
    periods: Periods,
    present_value: Money,
    payment: Money,
    future_value: Money,
    timing: AnnuityTiming,
) -> TvmResult<RateSolution> {
    solve_rate_newton(&TvmParameters {
        periods,
        rate: Decimal::ZERO,
        present_value,
        payment,
        future_value,
        timing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE_TOL: Decimal = dec!(0.000001);

    fn params(n: Decimal, pv: Decimal, pmt: Decimal, fv: Decimal, timing: AnnuityTiming) -> TvmParameters {
        TvmParameters {
            periods: n,
            rate: Decimal::ZERO,
            present_value: pv,
            payment: pmt,
            future_value: fv,
            timing,
        }
    }

    #[test]
    fn test_bisection_30y_mortgage() {
        let sol = solve_rate_bisection(dec!(200000), 360, dec!(1199.10)).unwrap();
        assert!(sol.converged);
        assert!((sol.rate - dec!(0.005)).abs() < dec!(0.00001), "got {}", sol.rate);
        assert!(sol.residual.abs() < dec!(0.01));
    }

    #[test]
    fn test_bisection_zero_rate_when_payments_equal_principal() {
        let sol = solve_rate_bisection(dec!(1200), 12, dec!(100)).unwrap();
        assert_eq!(sol.rate, Decimal::ZERO);
        assert!(sol.converged);
    }

    #[test]
    fn test_bisection_payment_insufficient() {
        let err = solve_rate_bisection(dec!(1200), 12, dec!(99)).unwrap_err();
        assert!(matches!(err, TvmError::PaymentInsufficient { .. }));
    }

    #[test]
    fn test_bisection_cap_returns_flagged_midpoint() {
        let settings = SolverSettings::bisection().with_max_iterations(3);
        let sol = solve_rate_bisection_with(dec!(200000), 360, dec!(1199.10), &settings).unwrap();
        assert!(!sol.converged);
        assert_eq!(sol.iterations, 3);
        assert!(sol.rate > Decimal::ZERO && sol.rate < dec!(1));
    }

    #[test]
    fn test_bisection_validation() {
        assert!(solve_rate_bisection(Decimal::ZERO, 12, dec!(100)).is_err());
        assert!(solve_rate_bisection(dec!(1000), 0, dec!(100)).is_err());
        assert!(solve_rate_bisection(dec!(1000), 12, dec!(-100)).is_err());
    }

    #[test]
    fn test_newton_savings_with_fv() {
        let p = params(dec!(10), dec!(-1000), dec!(-100), dec!(2500), AnnuityTiming::Ordinary);
        let sol = solve_rate_newton(&p).unwrap();
        assert!(sol.converged);
        assert!((sol.rate - dec!(0.0305279499)).abs() < RATE_TOL, "got {}", sol.rate);
    }

    #[test]
    fn test_newton_annuity_due() {
        let p = params(dec!(10), dec!(-1000), dec!(-100), dec!(2500), AnnuityTiming::Due);
        let sol = solve_rate_newton(&p).unwrap();
        assert!((sol.rate - dec!(0.0287358298)).abs() < RATE_TOL, "got {}", sol.rate);
    }

    #[test]
    fn test_newton_five_year_loan() {
        let p = params(dec!(60), dec!(25000), dec!(-500), Decimal::ZERO, AnnuityTiming::Ordinary);
        let sol = solve_rate_newton(&p).unwrap();
        assert!((sol.rate - dec!(0.0061834132)).abs() < RATE_TOL, "got {}", sol.rate);
    }

    #[test]
    fn test_newton_lump_sum() {
        let p = params(dec!(12), dec!(-1000), Decimal::ZERO, dec!(1126.825030131970), AnnuityTiming::Ordinary);
        let sol = solve_rate(p.periods, p.present_value, p.payment, p.future_value, p.timing).unwrap();
        assert!((sol.rate - dec!(0.01)).abs() < RATE_TOL);
    }

    #[test]
    fn test_newton_guess_already_root() {
        // Par bond: 10% coupon priced at 1000
        let p = params(dec!(5), dec!(-1000), dec!(100), dec!(1000), AnnuityTiming::Ordinary);
        let sol = solve_rate_newton(&p).unwrap();
        assert_eq!(sol.iterations, 0);
        assert_eq!(sol.rate, dec!(0.1));
    }

    #[test]
    fn test_newton_cap_is_reported() {
        // A 30-year loan from a 10% start needs more than 20 steps.
        let p = params(dec!(360), dec!(200000), dec!(-1199.10105), Decimal::ZERO, AnnuityTiming::Ordinary);
        let err = solve_rate_newton(&p).unwrap_err();
        assert!(matches!(err, TvmError::NonConvergent { .. }));
    }

    #[test]
    fn test_newton_flat_objective() {
        // No cash flows at all: f and f' are identically zero apart from FV.
        let p = params(dec!(10), Decimal::ZERO, Decimal::ZERO, dec!(100), AnnuityTiming::Ordinary);
        let err = solve_rate_newton(&p).unwrap_err();
        assert!(matches!(err, TvmError::NonConvergent { .. }));
    }

    #[test]
    fn test_newton_step_into_overflow_is_non_convergent() {
        // The first step lands near a 27,000,000% rate; (1+i)^5 still fits
        // but PV * (1+i)^5 does not.
        for fv in [dec!(200000000), dec!(300000000), dec!(500000000)] {
            let p = params(dec!(5), dec!(-100), Decimal::ZERO, fv, AnnuityTiming::Ordinary);
            let err = solve_rate_newton(&p).unwrap_err();
            assert!(matches!(err, TvmError::NonConvergent { .. }), "fv {fv}: got {err:?}");
        }
    }

    #[test]
    fn test_objective_reports_product_overflow() {
        let p = params(dec!(5), dec!(-100), Decimal::ZERO, dec!(200000000), AnnuityTiming::Ordinary);
        let err = tvm_objective(&p, dec!(273205)).unwrap_err();
        assert!(matches!(err, TvmError::Overflow { .. }));
    }

    #[test]
    fn test_bisection_total_overflow_is_reported() {
        let err = solve_rate_bisection(dec!(1000), 10, Decimal::MAX).unwrap_err();
        assert!(matches!(err, TvmError::Overflow { .. }));
    }

    #[test]
    fn test_newton_rejects_zero_periods() {
        let p = params(Decimal::ZERO, dec!(100), dec!(-10), Decimal::ZERO, AnnuityTiming::Ordinary);
        assert!(matches!(solve_rate_newton(&p), Err(TvmError::InvalidDomain { .. })));
    }

    #[test]
    fn test_objective_zero_rate_limits() {
        let p = params(dec!(12), dec!(1200), dec!(-100), Decimal::ZERO, AnnuityTiming::Ordinary);
        let (f, df) = tvm_objective(&p, Decimal::ZERO).unwrap();
        assert_eq!(f, Decimal::ZERO);
        // 1200*12 - 100*66
        assert_eq!(df, dec!(7800));
    }
}
