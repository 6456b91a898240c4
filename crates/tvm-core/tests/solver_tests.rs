use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tvm_core::config::SolverSettings;
use tvm_core::irr::{irr, irr_with, xirr, DEFAULT_IRR_GUESS};
use tvm_core::rate_solver::{solve_rate_bisection, solve_rate_newton, solve_rate_newton_with};
use tvm_core::time_value::{npv, solve_pmt};
use tvm_core::{AnnuityTiming, DatedCashFlow, TvmError, TvmParameters};

// ===========================================================================
// Bisection
// ===========================================================================

#[test]
fn test_bisection_auto_loan() {
    // 25,000 over 60 months at 0.4%
    let pmt = -solve_pmt(dec!(60), dec!(0.004), dec!(25000), Decimal::ZERO, AnnuityTiming::Ordinary).unwrap();
    let sol = solve_rate_bisection(dec!(25000), 60, pmt).unwrap();
    assert!(sol.converged);
    assert!((sol.rate - dec!(0.004)).abs() < dec!(0.0001));
}

#[test]
fn test_bisection_rate_above_bracket_is_flagged() {
    // Payment of 2,000 on a 1,000 loan over 12 periods implies > 100% per period
    let sol = solve_rate_bisection(dec!(1000), 12, dec!(2000)).unwrap();
    assert!(!sol.converged);
    assert!(sol.rate > dec!(0.99));
}

#[test]
fn test_bisection_short_payment_is_payment_insufficient() {
    match solve_rate_bisection(dec!(10000), 10, dec!(999)) {
        Err(TvmError::PaymentInsufficient { payment, required }) => {
            assert_eq!(payment, dec!(9990));
            assert_eq!(required, dec!(10000));
        }
        other => panic!("expected PaymentInsufficient, got {other:?}"),
    }
}

// ===========================================================================
// Newton-Raphson on the TVM identity
// ===========================================================================

fn params(n: Decimal, pv: Decimal, pmt: Decimal, fv: Decimal) -> TvmParameters {
    TvmParameters {
        periods: n,
        rate: Decimal::ZERO,
        present_value: pv,
        payment: pmt,
        future_value: fv,
        timing: AnnuityTiming::Ordinary,
    }
}

#[test]
fn test_newton_recovers_rate_for_savings_plan() {
    let sol = solve_rate_newton(&params(dec!(10), dec!(-1000), dec!(-100), dec!(2500))).unwrap();
    assert!(sol.converged);
    assert!(sol.residual.abs() < dec!(0.00001));
}

#[test]
fn test_newton_zero_rate_solution() {
    // 12 x 100 repays 1,200 exactly: the root is i = 0
    let sol = solve_rate_newton(&params(dec!(12), dec!(1200), dec!(-100), Decimal::ZERO)).unwrap();
    assert!(sol.rate.abs() < dec!(0.000001), "got {}", sol.rate);
}

#[test]
fn test_newton_negative_root_is_invalid_domain() {
    // Getting back less than was put in implies a negative rate
    let err = solve_rate_newton(&params(dec!(12), dec!(1200), dec!(-90), Decimal::ZERO)).unwrap_err();
    assert!(matches!(err, TvmError::InvalidDomain { .. }), "got {err:?}");
}

#[test]
fn test_newton_more_iterations_reach_long_loan() {
    let settings = SolverSettings::newton_rate().with_max_iterations(200);
    let p = params(dec!(360), dec!(200000), dec!(-1199.101050), Decimal::ZERO);
    let sol = solve_rate_newton_with(&p, dec!(0.01), &settings).unwrap();
    assert!((sol.rate - dec!(0.005)).abs() < dec!(0.000001), "got {}", sol.rate);
}

// ===========================================================================
// IRR
// ===========================================================================

#[test]
fn test_irr_one_outflow_one_inflow() {
    let sol = irr(&[dec!(-100), dec!(110)], DEFAULT_IRR_GUESS).unwrap();
    assert!((sol.rate_pct - dec!(10)).abs() < dec!(0.01));
}

#[test]
fn test_irr_three_year_doubling() {
    let sol = irr(&[dec!(-1000), Decimal::ZERO, Decimal::ZERO, dec!(1331)], DEFAULT_IRR_GUESS).unwrap();
    assert!((sol.rate - dec!(0.1)).abs() < dec!(0.0000001));
}

#[test]
fn test_irr_all_zero_flows() {
    let err = irr(&[Decimal::ZERO, Decimal::ZERO, Decimal::ZERO], DEFAULT_IRR_GUESS).unwrap_err();
    assert!(matches!(err, TvmError::NonConvergent { .. }));
}

#[test]
fn test_irr_two_root_series_returns_a_true_root() {
    // Outflow, inflow, outflow: NPV is zero at both 10% and 20%
    let flows = [dec!(-100), dec!(230), dec!(-132)];
    let sol = irr(&flows, DEFAULT_IRR_GUESS).unwrap();
    let npv_at_root = npv(sol.rate, &flows).unwrap();
    assert!(npv_at_root.abs() < dec!(0.000001), "NPV {npv_at_root} at {}", sol.rate);
    assert!(
        (sol.rate - dec!(0.1)).abs() < dec!(0.000001) || (sol.rate - dec!(0.2)).abs() < dec!(0.000001),
        "got {}",
        sol.rate
    );
}

#[test]
fn test_irr_mid_series_outflow_is_non_convergent() {
    // The only real root is at -50%; Newton from 5% is thrown out of the domain
    let err = irr(&[dec!(-100), dec!(50), dec!(-100), dec!(50)], DEFAULT_IRR_GUESS).unwrap_err();
    assert!(matches!(err, TvmError::NonConvergent { .. }), "got {err:?}");
}

#[test]
fn test_irr_series_without_real_root_is_non_convergent() {
    // NPV = 100 - 300v + 250v^2 is positive for every discount factor v
    let err = irr(&[dec!(100), dec!(-300), dec!(250)], DEFAULT_IRR_GUESS).unwrap_err();
    assert!(matches!(err, TvmError::NonConvergent { .. }), "got {err:?}");
}

#[test]
fn test_irr_cap_exhaustion_reports_iterations() {
    let settings = SolverSettings::irr().with_max_iterations(2);
    match irr_with(&[dec!(-10000), dec!(2000), dec!(3000), dec!(4000), dec!(5000)], DEFAULT_IRR_GUESS, &settings) {
        Err(TvmError::NonConvergent { iterations, function, .. }) => {
            assert_eq!(iterations, 2);
            assert_eq!(function, "IRR");
        }
        other => panic!("expected NonConvergent, got {other:?}"),
    }
}

#[test]
fn test_xirr_quarterly_flows() {
    let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
    let flows = vec![
        DatedCashFlow { date: d(2023, 1, 1), amount: dec!(-5000), label: Some("purchase".into()) },
        DatedCashFlow { date: d(2023, 4, 1), amount: dec!(1500), label: None },
        DatedCashFlow { date: d(2023, 7, 1), amount: dec!(1500), label: None },
        DatedCashFlow { date: d(2023, 10, 1), amount: dec!(1500), label: None },
        DatedCashFlow { date: d(2024, 1, 1), amount: dec!(1500), label: None },
    ];
    let sol = xirr(&flows, DEFAULT_IRR_GUESS).unwrap();
    assert!(sol.rate > dec!(0.3) && sol.rate < dec!(0.4), "got {}", sol.rate);
}
