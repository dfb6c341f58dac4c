//! Seeded synthetic 1-minute bars for development, tests and benchmarks.
//!
//! Produces a random walk over regular sessions (09:30–16:00 exchange time,
//! weekdays only). Output is fully determined by the config.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use vwaplab_core::domain::Bar;

/// Minutes in a regular US equity session.
pub const SESSION_MINUTES: u32 = 390;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyntheticConfig {
    pub seed: u64,
    pub start: NaiveDate,
    /// Number of trading days (weekends are skipped, not counted).
    pub days: usize,
    pub start_price: f64,
    /// Maximum absolute per-minute return.
    pub max_step: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            start: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap_or_default(),
            days: 5,
            start_price: 100.0,
            max_step: 0.0015,
        }
    }
}

fn session_open() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 30, 0).unwrap_or(NaiveTime::MIN)
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Generate `config.days` sessions of 1-minute bars.
pub fn generate_minute_bars(config: &SyntheticConfig) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut bars = Vec::with_capacity(config.days * SESSION_MINUTES as usize);
    let mut price = config.start_price;
    let mut date = config.start;
    let mut produced = 0;

    while produced < config.days {
        if is_weekend(date) {
            date += Duration::days(1);
            continue;
        }
        let open_ts = date.and_time(session_open());
        // Overnight gap.
        price *= 1.0 + rng.gen_range(-0.01..0.01);

        for minute in 0..SESSION_MINUTES {
            let open = price;
            let step = if config.max_step > 0.0 {
                rng.gen_range(-config.max_step..config.max_step)
            } else {
                0.0
            };
            let close = (price * (1.0 + step)).max(0.01);
            let wick = price * config.max_step;
            let high = open.max(close) + rng.gen_range(0.0..=wick);
            let low = (open.min(close) - rng.gen_range(0.0..=wick)).max(0.005);
            let volume = f64::from(rng.gen_range(100u32..20_000));

            bars.push(Bar {
                timestamp: open_ts + Duration::minutes(i64::from(minute)),
                open,
                high,
                low,
                close,
                volume,
            });
            price = close;
        }

        produced += 1;
        date += Duration::days(1);
    }
    bars
}
