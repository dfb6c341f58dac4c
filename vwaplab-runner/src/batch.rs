//! Parallel batch runs.
//!
//! Each configuration is an independent run with its own indicator and
//! position state, so configurations are simply mapped across the rayon pool.

use rayon::prelude::*;
use tracing::info;

use vwaplab_core::domain::Bar;

use crate::config::RunConfig;
use crate::runner::{run_on_bars, run_single, RunError, RunReport};

/// Run every configuration, each loading its own data file.
///
/// Results are returned in input order.
pub fn run_batch(configs: &[RunConfig]) -> Vec<Result<RunReport, RunError>> {
    info!(runs = configs.len(), "starting batch");
    configs.par_iter().map(run_single).collect()
}

/// Run every configuration over the same raw bars.
pub fn run_batch_on_bars(configs: &[RunConfig], raw: &[Bar]) -> Vec<Result<RunReport, RunError>> {
    info!(runs = configs.len(), raw = raw.len(), "starting batch on shared bars");
    configs
        .par_iter()
        .map(|config| run_on_bars(config, raw))
        .collect()
}
