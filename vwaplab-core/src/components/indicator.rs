//! Indicator trait and the per-bar indicator record.
//!
//! Indicators are incremental and session-relative: the engine feeds them one
//! bar at a time and calls `reset` whenever a new session opens. The values
//! they produce are attached to each bar as a plain `IndicatorValues` record
//! that the decision machines read directly.

use serde::{Deserialize, Serialize};

use crate::domain::Bar;
use crate::indicators::PriceMode;

/// Default ATR lookback, in aggregated bars.
pub const DEFAULT_ATR_PERIOD: usize = 14;

/// Trait for session-relative indicators.
///
/// # Look-ahead contamination guard
/// `update` sees bars strictly in time order and may only use the bar it is
/// given plus state accumulated from earlier bars of the same session.
pub trait SessionIndicator: Send + Sync {
    /// Human-readable name (e.g., "vwap_close", "atr_14").
    fn name(&self) -> &str;

    /// Drop all accumulated state. Called at every session boundary.
    fn reset(&mut self);

    /// Fold in the next bar and return the indicator value for it, or `None`
    /// when the value is undefined.
    fn update(&mut self, bar: &Bar) -> Option<f64>;
}

/// Indicator values attached to one aggregated bar.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IndicatorValues {
    pub vwap: Option<f64>,
    pub atr: Option<f64>,
}

/// An aggregated bar annotated with its indicator values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorBar {
    pub bar: Bar,
    pub indicators: IndicatorValues,
}

/// What a decision machine needs the indicator engine to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorSpec {
    pub price_mode: PriceMode,
    pub atr_period: usize,
}

impl Default for IndicatorSpec {
    fn default() -> Self {
        Self {
            price_mode: PriceMode::Close,
            atr_period: DEFAULT_ATR_PERIOD,
        }
    }
}
