//! Data ingestion and resampling

pub mod aggregate;
pub mod ingest;

pub use aggregate::{BarAggregator, DEFAULT_INTERVAL_MINUTES};
pub use ingest::{parse_timestamp, DataError, DataIngestor};
