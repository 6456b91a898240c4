use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tvm_core::amortization::{amortization_schedule, ScheduleTotals};
use tvm_core::payoff::{simulate_payoff, PayoffParams};
use tvm_core::rate_solver::solve_rate_bisection;
use tvm_core::time_value::{solve_fv, solve_n, solve_pmt, solve_pv};
use tvm_core::AnnuityTiming;

fn bp(v: u32) -> Decimal {
    Decimal::from(v) / dec!(10000)
}

fn timing(due: bool) -> AnnuityTiming {
    if due {
        AnnuityTiming::Due
    } else {
        AnnuityTiming::Ordinary
    }
}

fn close(actual: Decimal, expected: Decimal, rel: Decimal) -> bool {
    let scale = expected.abs().max(Decimal::ONE);
    (actual - expected).abs() <= rel * scale
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_fv_pv_round_trip(
        n in 1u32..480,
        rate_bp in 0u32..300,
        pv in 1i64..1_000_000,
        pmt in -10_000i64..10_000,
        due in any::<bool>(),
    ) {
        let (n, i) = (Decimal::from(n), bp(rate_bp));
        let (pv, pmt) = (Decimal::from(pv), Decimal::from(pmt));
        let fv = solve_fv(n, i, pv, pmt, timing(due)).unwrap();
        let back = solve_pv(n, i, pmt, fv, timing(due)).unwrap();
        prop_assert!(close(back, pv, dec!(0.000001)), "pv {} -> fv {} -> {}", pv, fv, back);
    }

    #[test]
    fn prop_pmt_and_n_are_inverse(
        n in 1u32..=360,
        rate_bp in 1u32..150,
        pv in 1_000i64..1_000_000,
        due in any::<bool>(),
    ) {
        let (periods, i, pv) = (Decimal::from(n), bp(rate_bp), Decimal::from(pv));
        let pmt = solve_pmt(periods, i, pv, Decimal::ZERO, timing(due)).unwrap();
        let back = solve_n(i, pv, pmt, Decimal::ZERO, timing(due)).unwrap();
        prop_assert!(close(back, periods, dec!(0.000001)), "n {} -> pmt {} -> {}", periods, pmt, back);
    }

    #[test]
    fn prop_zero_rate_payment_is_linear(
        n in 1u32..600,
        pv in -1_000_000i64..1_000_000,
        fv in -1_000_000i64..1_000_000,
    ) {
        let (periods, pv, fv) = (Decimal::from(n), Decimal::from(pv), Decimal::from(fv));
        let pmt = solve_pmt(periods, Decimal::ZERO, pv, fv, AnnuityTiming::Ordinary).unwrap();
        prop_assert_eq!(pmt, -(pv + fv) / periods);
    }

    #[test]
    fn prop_bisection_matches_closed_form(
        n in 12u32..=360,
        rate_bp in 1u32..150,
        pv in 1_000i64..1_000_000,
    ) {
        let (i, pv) = (bp(rate_bp), Decimal::from(pv));
        let pmt = -solve_pmt(Decimal::from(n), i, pv, Decimal::ZERO, AnnuityTiming::Ordinary).unwrap();
        let sol = solve_rate_bisection(pv, n, pmt).unwrap();
        prop_assert!(sol.converged);
        prop_assert!((sol.rate - i).abs() < dec!(0.0001), "expected {}, got {}", i, sol.rate);
    }

    #[test]
    fn prop_amortization_conserves_principal(
        n in 1u32..=360,
        rate_bp in 0u32..150,
        principal in 100i64..1_000_000,
        due in any::<bool>(),
    ) {
        let (i, principal) = (bp(rate_bp), Decimal::from(principal));
        let pmt = -solve_pmt(Decimal::from(n), i, principal, Decimal::ZERO, timing(due)).unwrap();
        let rows = amortization_schedule(principal, i, pmt, n, timing(due)).unwrap();
        let totals = ScheduleTotals::from_rows(&rows);
        let last = rows.last().unwrap();

        prop_assert!(last.closing_balance.abs() < dec!(0.000001));
        prop_assert!((totals.total_principal + last.closing_balance - principal).abs() < dec!(0.000001));
        prop_assert!((totals.total_payment - totals.total_interest - totals.total_principal).abs() < dec!(0.000001));
    }

    #[test]
    fn prop_extra_payment_never_lengthens_payoff(
        balance in 10_000i64..500_000,
        rate_bp in 1u32..100,
        margin in 10i64..5_000,
        extra in 1i64..2_000,
    ) {
        let balance = Decimal::from(balance);
        let rate = bp(rate_bp);
        let base = PayoffParams {
            balance,
            periodic_rate: rate,
            base_payment: balance * rate + Decimal::from(margin),
            extra_per_period: Decimal::ZERO,
            extra_per_year: Decimal::ZERO,
            one_time_extra: Decimal::ZERO,
            periods_per_year: 12,
            max_periods: None,
        };
        let accelerated = PayoffParams {
            extra_per_period: Decimal::from(extra),
            ..base.clone()
        };
        let a = simulate_payoff(&base).unwrap();
        let b = simulate_payoff(&accelerated).unwrap();
        prop_assert!(b.periods <= a.periods);
        prop_assert!(b.total_interest <= a.total_interest);
    }
}
