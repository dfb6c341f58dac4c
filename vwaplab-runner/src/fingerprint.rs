//! BLAKE3 fingerprints of run inputs.
//!
//! Two runs with the same dataset hash and config hash must produce the same
//! report.

use serde::{Deserialize, Serialize};
use vwaplab_core::domain::Bar;

use crate::config::RunConfig;

/// Content hashes identifying the inputs of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFingerprint {
    pub dataset_hash: String,
    pub config_hash: String,
}

impl RunFingerprint {
    /// Pair an already computed dataset hash with the hash of `config`.
    pub fn new(dataset_hash: String, config: &RunConfig) -> Result<Self, serde_json::Error> {
        Ok(Self {
            dataset_hash,
            config_hash: config_hash(config)?,
        })
    }

    /// Single id combining both hashes.
    pub fn run_id(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.dataset_hash.as_bytes());
        hasher.update(self.config_hash.as_bytes());
        hasher.finalize().to_hex().to_string()
    }
}

/// Hash over timestamps and OHLCV values, in order.
pub fn dataset_hash(bars: &[Bar]) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(&bar.timestamp.and_utc().timestamp().to_le_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Hash of the config's canonical JSON.
pub fn config_hash(config: &RunConfig) -> Result<String, serde_json::Error> {
    let json = serde_json::to_vec(config)?;
    Ok(blake3::hash(&json).to_hex().to_string())
}
