//! Session-cumulative Volume-Weighted Average Price (VWAP).
//!
//! VWAP = Σ(price × volume) / Σ(volume) over the bars of the current session.
//! Undefined while the session's cumulative volume is zero.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::components::indicator::SessionIndicator;
use crate::domain::Bar;

/// Representative price used to weight volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceMode {
    /// Last trade price of the bar.
    Close,
    /// (high + low + close) / 3.
    Typical,
}

impl PriceMode {
    pub fn price(&self, bar: &Bar) -> f64 {
        match self {
            PriceMode::Close => bar.close,
            PriceMode::Typical => bar.typical_price(),
        }
    }

    fn suffix(&self) -> &'static str {
        match self {
            PriceMode::Close => "close",
            PriceMode::Typical => "typical",
        }
    }
}

impl fmt::Display for PriceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown price mode '{0}' (expected close|typical)")]
pub struct ParsePriceModeError(pub String);

impl FromStr for PriceMode {
    type Err = ParsePriceModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "close" => Ok(PriceMode::Close),
            "typical" => Ok(PriceMode::Typical),
            _ => Err(ParsePriceModeError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionVwap {
    mode: PriceMode,
    cum_pv: f64,
    cum_volume: f64,
    name: String,
}

impl SessionVwap {
    pub fn new(mode: PriceMode) -> Self {
        Self {
            mode,
            cum_pv: 0.0,
            cum_volume: 0.0,
            name: format!("vwap_{}", mode.suffix()),
        }
    }

}

impl SessionIndicator for SessionVwap {
    fn name(&self) -> &str {
        &self.name
    }

    fn reset(&mut self) {
        self.cum_pv = 0.0;
        self.cum_volume = 0.0;
    }

    fn update(&mut self, bar: &Bar) -> Option<f64> {
        self.cum_pv += self.mode.price(bar) * bar.volume;
        self.cum_volume += bar.volume;
        if self.cum_volume > 0.0 {
            Some(self.cum_pv / self.cum_volume)
        } else {
            None
        }
    }
}
