//! Criterion benchmarks for VWAPLab hot paths.
//!
//! Benchmarks:
//! 1. Minute-bar aggregation to 15-minute bars
//! 2. Session indicator annotation (VWAP + ATR)
//! 3. Decision machine replay over the annotated series

use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use vwaplab_core::components::strategy::{LongBracket, ShortReversal};
use vwaplab_core::components::{IndicatorBar, IndicatorSpec, Strategy};
use vwaplab_core::data::BarAggregator;
use vwaplab_core::domain::Bar;
use vwaplab_core::indicators::{annotate, PriceMode};

// ── Helpers ──────────────────────────────────────────────────────────

/// `days` regular sessions of 390 one-minute bars each.
fn make_minutes(days: usize) -> Vec<Bar> {
    let first = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
    let mut bars = Vec::with_capacity(days * 390);
    for d in 0..days {
        let open_ts = (first + Duration::days(d as i64)).and_hms_opt(9, 30, 0).unwrap();
        for m in 0..390 {
            let i = d * 390 + m;
            let close = 100.0 + (i as f64 * 0.01).sin() * 5.0;
            bars.push(Bar {
                timestamp: open_ts + Duration::minutes(m as i64),
                open: close - 0.02,
                high: close + 0.05,
                low: close - 0.05,
                close,
                volume: 1_000.0 + (i % 500) as f64,
            });
        }
    }
    bars
}

fn replay(strategy: &mut dyn Strategy, history: &[IndicatorBar]) -> usize {
    strategy.on_start();
    let mut count = 0;
    for t in 0..history.len() {
        let pos = strategy.position();
        if let Ok(Some(_)) = strategy.on_bar(&history[..=t], pos) {
            count += 1;
        }
    }
    count
}

// ── 1. Aggregation ───────────────────────────────────────────────────

fn bench_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");
    for days in [20, 250] {
        let raw = make_minutes(days);
        let agg = BarAggregator::default();
        group.bench_with_input(BenchmarkId::from_parameter(days), &raw, |b, raw| {
            b.iter(|| agg.aggregate(black_box(raw)))
        });
    }
    group.finish();
}

// ── 2. Indicators ────────────────────────────────────────────────────

fn bench_annotate(c: &mut Criterion) {
    let bars = BarAggregator::default()
        .aggregate(&make_minutes(250))
        .unwrap();
    let mut group = c.benchmark_group("annotate");
    for mode in [PriceMode::Close, PriceMode::Typical] {
        let spec = IndicatorSpec { price_mode: mode, atr_period: 14 };
        group.bench_with_input(BenchmarkId::from_parameter(mode), &bars, |b, bars| {
            b.iter(|| annotate(black_box(bars), spec))
        });
    }
    group.finish();
}

// ── 3. Decision machines ─────────────────────────────────────────────

fn bench_strategies(c: &mut Criterion) {
    let bars = BarAggregator::default()
        .aggregate(&make_minutes(250))
        .unwrap();

    let long_history = annotate(&bars, LongBracket::default().indicator_spec());
    c.bench_function("replay/long_bracket", |b| {
        b.iter(|| replay(&mut LongBracket::default(), black_box(&long_history)))
    });

    let short_history = annotate(&bars, ShortReversal::default().indicator_spec());
    c.bench_function("replay/short_reversal", |b| {
        b.iter(|| replay(&mut ShortReversal::default(), black_box(&short_history)))
    });
}

criterion_group!(benches, bench_aggregation, bench_annotate, bench_strategies);
criterion_main!(benches);
