//! VWAPLab Runner: run orchestration on top of `vwaplab-core`.
//!
//! This crate provides:
//! - TOML run configuration with validation
//! - Data loading (CSV ingest, aggregation, session date slicing)
//! - Seeded synthetic minute-bar generation
//! - A reference replay engine that applies order intents
//! - Performance metrics and run fingerprinting
//! - Parallel batch runs and CSV/JSON export

pub mod batch;
pub mod config;
pub mod data_loader;
pub mod engine;
pub mod export;
pub mod fingerprint;
pub mod metrics;
pub mod runner;
pub mod synthetic;

pub use batch::{run_batch, run_batch_on_bars};
pub use config::{ConfigError, RunConfig, StrategyVariant};
pub use data_loader::{load_bars, prepare_bars, slice_sessions, LoadError, LoadedData};
pub use engine::{EngineError, IntentRecord, ReplayEngine, ReplayOutput};
pub use export::{load_artifacts, save_artifacts};
pub use fingerprint::RunFingerprint;
pub use metrics::PerformanceMetrics;
pub use runner::{run_on_bars, run_single, RunError, RunReport};
pub use synthetic::{generate_minute_bars, SyntheticConfig};
