//! Session-relative indicator engine.
//!
//! Drives VWAP and ATR one bar at a time and resets both whenever the session
//! key changes, so no accumulated state crosses a session boundary.

use chrono::NaiveDate;
use tracing::trace;

use super::{SessionAtr, SessionVwap};
use crate::components::indicator::{IndicatorBar, IndicatorSpec, IndicatorValues, SessionIndicator};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct SessionIndicatorEngine {
    vwap: SessionVwap,
    atr: SessionAtr,
    session: Option<NaiveDate>,
}

impl SessionIndicatorEngine {
    pub fn new(spec: IndicatorSpec) -> Self {
        Self {
            vwap: SessionVwap::new(spec.price_mode),
            atr: SessionAtr::new(spec.atr_period),
            session: None,
        }
    }

    /// Fold in the next bar (in time order) and return its indicator values.
    pub fn update(&mut self, bar: &Bar) -> IndicatorValues {
        let session = bar.session();
        if self.session != Some(session) {
            trace!(
                %session,
                vwap = self.vwap.name(),
                atr = self.atr.name(),
                "session reset"
            );
            self.vwap.reset();
            self.atr.reset();
            self.session = Some(session);
        }

        IndicatorValues {
            vwap: self.vwap.update(bar),
            atr: self.atr.update(bar),
        }
    }
}

/// Annotate a time-ordered aggregated bar sequence with VWAP and ATR.
pub fn annotate(bars: &[Bar], spec: IndicatorSpec) -> Vec<IndicatorBar> {
    let mut engine = SessionIndicatorEngine::new(spec);
    bars.iter()
        .map(|bar| IndicatorBar {
            bar: *bar,
            indicators: engine.update(bar),
        })
        .collect()
}
