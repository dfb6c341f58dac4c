//! Run orchestration: wires together loading, indicators, engine and metrics.
//!
//! Two entry points:
//! - `run_single()`: loads the configured CSV, then runs. Used by the CLI.
//! - `run_on_bars()`: takes raw 1-minute bars already in memory. Used by batch
//!   runs and tests.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use vwaplab_core::domain::{Bar, TradeRecord};
use vwaplab_core::indicators::annotate;

use crate::config::{ConfigError, RunConfig, StrategyVariant};
use crate::data_loader::{load_bars, prepare_bars, slice_sessions, LoadError, LoadedData};
use crate::engine::{EngineError, IntentRecord, ReplayEngine};
use crate::fingerprint::RunFingerprint;
use crate::metrics::PerformanceMetrics;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("failed to fingerprint config: {0}")]
    Fingerprint(#[from] serde_json::Error),
}

/// Current schema version for serialized reports.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub symbol: String,
    pub strategy: String,
    pub variant: StrategyVariant,
    pub config: RunConfig,
    /// First and last session actually evaluated.
    pub first_session: Option<String>,
    pub last_session: Option<String>,
    pub raw_count: usize,
    pub bar_count: usize,
    /// Hashes of the raw records and of `config`.
    pub fingerprint: RunFingerprint,
    /// Combined id of the fingerprint; equal ids mean equal reports.
    pub run_id: String,
    pub metrics: PerformanceMetrics,
    pub trades: Vec<TradeRecord>,
    pub intents: Vec<IntentRecord>,
    pub equity_curve: Vec<f64>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Load the configured data file and run the configured strategy over it.
pub fn run_single(config: &RunConfig) -> Result<RunReport, RunError> {
    config.validate()?;
    let loaded = load_bars(config)?;
    run_loaded(config, loaded)
}

/// Run over raw 1-minute bars already in memory. No I/O.
pub fn run_on_bars(config: &RunConfig, raw: &[Bar]) -> Result<RunReport, RunError> {
    config.validate()?;
    let loaded = prepare_bars(config, raw)?;
    run_loaded(config, loaded)
}

fn run_loaded(config: &RunConfig, loaded: LoadedData) -> Result<RunReport, RunError> {
    let fingerprint = RunFingerprint::new(loaded.dataset_hash, config)?;
    let mut strategy = config.build_strategy();

    // Indicators over the full history, then the date slice.
    let annotated = annotate(&loaded.bars, strategy.indicator_spec());
    let bars = slice_sessions(&annotated, &config.data);

    let initial_capital = config.backtest.initial_capital;
    let output = ReplayEngine::new(initial_capital).run(strategy.as_mut(), &bars)?;
    let metrics = PerformanceMetrics::compute(
        &output.equity_curve,
        &output.trades,
        initial_capital,
        output.bars_in_market,
    );

    info!(
        symbol = %config.data.symbol,
        strategy = strategy.name(),
        bars = bars.len(),
        trades = metrics.trade_count,
        return_pct = metrics.total_return_pct,
        "run finished"
    );

    Ok(RunReport {
        schema_version: SCHEMA_VERSION,
        symbol: config.data.symbol.clone(),
        strategy: strategy.name().to_string(),
        variant: config.strategy.variant,
        config: config.clone(),
        first_session: bars.first().map(|b| b.bar.session().to_string()),
        last_session: bars.last().map(|b| b.bar.session().to_string()),
        raw_count: loaded.raw_count,
        bar_count: bars.len(),
        run_id: fingerprint.run_id(),
        fingerprint,
        metrics,
        trades: output.trades,
        intents: output.intents,
        equity_curve: output.equity_curve,
    })
}
