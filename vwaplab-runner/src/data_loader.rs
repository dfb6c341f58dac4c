//! Bar loading for the runner.
//!
//! Reads the configured CSV of 1-minute records, aggregates them to the
//! configured width and restricts annotated bars to the configured session
//! range. Indicators are always computed over the full history first, then
//! sliced, so the first bar of the range sees the same values it would in a
//! run over all the data.

use thiserror::Error;
use tracing::{info, warn};

use vwaplab_core::components::IndicatorBar;
use vwaplab_core::data::{DataError, DataIngestor};
use vwaplab_core::domain::Bar;

use crate::config::{ConfigError, DataConfig, RunConfig};
use crate::fingerprint::dataset_hash;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("data error: {0}")]
    Data(#[from] DataError),
}

/// Aggregated bars plus provenance.
#[derive(Debug, Clone)]
pub struct LoadedData {
    /// Aggregated bars over the whole file, in time order.
    pub bars: Vec<Bar>,
    /// Number of raw 1-minute records read.
    pub raw_count: usize,
    /// BLAKE3 over the raw records.
    pub dataset_hash: String,
}

/// Read, aggregate and fingerprint the configured data file.
pub fn load_bars(config: &RunConfig) -> Result<LoadedData, LoadError> {
    let ingestor = DataIngestor::new(config.clock()?);
    let raw = ingestor.ingest_csv(&config.data.path)?;
    prepare_bars(config, &raw)
}

/// Aggregate raw records already in memory.
pub fn prepare_bars(config: &RunConfig, raw: &[Bar]) -> Result<LoadedData, LoadError> {
    let bars = config.aggregator()?.aggregate(raw)?;
    info!(
        symbol = %config.data.symbol,
        raw = raw.len(),
        bars = bars.len(),
        interval_minutes = config.aggregation.interval_minutes,
        "prepared bars"
    );
    Ok(LoadedData {
        raw_count: raw.len(),
        dataset_hash: dataset_hash(raw),
        bars,
    })
}

/// Keep only bars whose session lies inside the configured date range.
///
/// A range outside the data's coverage yields an empty vector, not an error.
pub fn slice_sessions(bars: &[IndicatorBar], data: &DataConfig) -> Vec<IndicatorBar> {
    let sliced: Vec<IndicatorBar> = bars
        .iter()
        .filter(|b| data.contains(b.bar.session()))
        .copied()
        .collect();
    if sliced.is_empty() && !bars.is_empty() {
        warn!(
            start = ?data.start_date,
            end = ?data.end_date,
            "date range selects no bars"
        );
    }
    sliced
}
