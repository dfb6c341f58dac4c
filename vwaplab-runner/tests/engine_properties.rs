//! Property tests for the replay engine's accounting.

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use vwaplab_core::components::{
    IndicatorSpec, LongBracket, ShortReversal, Strategy as DecisionMachine,
};
use vwaplab_core::domain::{Bar, PositionSide};
use vwaplab_core::indicators::{annotate, PriceMode};
use vwaplab_runner::engine::ReplayEngine;

/// One or two sessions of 15-minute bars from a bounded random walk.
///
/// Steps stay small so no single short can lose more than the account.
fn arb_bars() -> impl Strategy<Value = Vec<Bar>> {
    (
        proptest::collection::vec((-0.3f64..0.3, 0.1f64..1.0, 1.0f64..5_000.0), 2..60),
        1usize..3,
    )
        .prop_map(|(steps, sessions)| {
            let day = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
            let per_session = steps.len().div_ceil(sessions).max(1);
            let mut price = 100.0_f64;
            steps
                .iter()
                .enumerate()
                .map(|(i, &(step, wick, volume))| {
                    let date = day + Duration::days((i / per_session) as i64);
                    let slot = (i % per_session) as i64;
                    let open = price;
                    price = (price + step).max(1.0);
                    Bar {
                        timestamp: date.and_hms_opt(9, 30, 0).unwrap()
                            + Duration::minutes(15 * slot),
                        open,
                        high: open.max(price) + wick,
                        low: (open.min(price) - wick).max(0.5),
                        close: price,
                        volume,
                    }
                })
                .collect()
        })
}

fn check_accounting(strategy: &mut dyn DecisionMachine, bars: &[Bar], capital: f64) {
    let annotated = annotate(bars, strategy.indicator_spec());
    let out = ReplayEngine::new(capital).run(strategy, &annotated).unwrap();

    assert_eq!(out.equity_curve.len(), bars.len());
    let total_pnl: f64 = out.trades.iter().map(|t| t.pnl).sum();
    let last = *out.equity_curve.last().unwrap();
    assert!(
        (last - (capital + total_pnl)).abs() < 1e-6 * capital,
        "final equity {last} != capital + pnl {}",
        capital + total_pnl
    );
    assert_eq!(strategy.position(), PositionSide::Flat);
    for pair in out.trades.windows(2) {
        assert!(pair[0].exit_bar <= pair[1].entry_bar, "trades overlap");
    }
}

proptest! {
    #[test]
    fn long_bracket_equity_reconciles(bars in arb_bars(), capital in 1_000.0f64..1_000_000.0) {
        check_accounting(&mut LongBracket::default(), &bars, capital);
    }

    #[test]
    fn short_reversal_equity_reconciles(bars in arb_bars(), capital in 1_000.0f64..1_000_000.0) {
        check_accounting(&mut ShortReversal::default(), &bars, capital);
    }

    #[test]
    fn price_mode_does_not_break_accounting(bars in arb_bars()) {
        let spec = IndicatorSpec { price_mode: PriceMode::Typical, ..IndicatorSpec::default() };
        let annotated = annotate(&bars, spec);
        let out = ReplayEngine::new(10_000.0)
            .run(&mut LongBracket::default(), &annotated)
            .unwrap();
        prop_assert!(out.equity_curve.iter().all(|e| e.is_finite()));
    }
}
