//! Fixed-width resampling of raw bars.
//!
//! Buckets are half-open `[start, start + width)` intervals laid on a grid that
//! starts at midnight of the first record's day. Buckets with no records are
//! omitted rather than filled.

use chrono::{Duration, NaiveDateTime};
use tracing::debug;

use super::ingest::DataError;
use crate::domain::Bar;

/// Default aggregation width in minutes.
pub const DEFAULT_INTERVAL_MINUTES: u32 = 15;

/// Resamples an ordered raw-bar stream into coarser OHLCV bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarAggregator {
    width_secs: i64,
}

impl BarAggregator {
    /// Width must be a positive whole number of seconds.
    pub fn new(width: Duration) -> Result<Self, DataError> {
        if width <= Duration::zero() || width.subsec_nanos() != 0 {
            return Err(DataError::InvalidInterval(format!(
                "width must be a positive whole number of seconds, got {width}"
            )));
        }
        Ok(Self {
            width_secs: width.num_seconds(),
        })
    }

    pub fn minutes(minutes: u32) -> Result<Self, DataError> {
        Self::new(Duration::minutes(i64::from(minutes)))
    }

    pub fn width(&self) -> Duration {
        Duration::seconds(self.width_secs)
    }

    /// Start of the bucket containing `ts` on the grid anchored at `origin`.
    pub fn bucket_start(&self, origin: NaiveDateTime, ts: NaiveDateTime) -> NaiveDateTime {
        let offset = (ts - origin).num_seconds().div_euclid(self.width_secs);
        origin + Duration::seconds(offset * self.width_secs)
    }

    /// Aggregate `raw` (sorted by timestamp) into fixed-width bars.
    ///
    /// Equal consecutive timestamps are accepted; a timestamp earlier than its
    /// predecessor fails with `DataError::Unsorted`.
    pub fn aggregate(&self, raw: &[Bar]) -> Result<Vec<Bar>, DataError> {
        let Some(first) = raw.first() else {
            return Ok(Vec::new());
        };
        let origin = first.timestamp.date().and_time(chrono::NaiveTime::MIN);

        let mut out: Vec<Bar> = Vec::new();
        let mut current: Option<Bar> = None;
        let mut previous_ts = first.timestamp;

        for (index, bar) in raw.iter().enumerate() {
            if bar.timestamp < previous_ts {
                return Err(DataError::Unsorted {
                    index,
                    previous: previous_ts,
                    current: bar.timestamp,
                });
            }
            previous_ts = bar.timestamp;

            let start = self.bucket_start(origin, bar.timestamp);
            match current.as_mut() {
                Some(acc) if acc.timestamp == start => {
                    acc.high = acc.high.max(bar.high);
                    acc.low = acc.low.min(bar.low);
                    acc.close = bar.close;
                    acc.volume += bar.volume;
                }
                _ => {
                    if let Some(done) = current.take() {
                        out.push(done);
                    }
                    current = Some(Bar {
                        timestamp: start,
                        ..*bar
                    });
                }
            }
        }
        out.extend(current);

        debug!(
            raw = raw.len(),
            aggregated = out.len(),
            width = %self.width(),
            "aggregated bars"
        );
        Ok(out)
    }
}

impl Default for BarAggregator {
    fn default() -> Self {
        Self {
            width_secs: i64::from(DEFAULT_INTERVAL_MINUTES) * 60,
        }
    }
}
