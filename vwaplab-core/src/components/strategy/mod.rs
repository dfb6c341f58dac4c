//! Decision state machines: single-position strategies driven bar by bar.
//!
//! A strategy receives the causal bar history (everything up to and including
//! the current bar) plus the position the execution engine currently holds,
//! and answers with at most one `OrderIntent`. It tracks its own position
//! state and treats any disagreement with the engine as a contract violation.

pub mod crossover;
pub mod long_bracket;
pub mod short_reversal;

pub use crossover::{close_crosses_above_vwap, crossover, vwap_crosses_above_close};
pub use long_bracket::{LongBracket, LongBracketParams, LongState};
pub use short_reversal::{ShortReversal, ShortReversalParams, ShortState};

use thiserror::Error;

use super::indicator::{IndicatorBar, IndicatorSpec};
use crate::domain::{OrderIntent, PositionSide};

/// A decision state machine.
///
/// # Call protocol
/// 1. `on_start` once before the first bar.
/// 2. `on_bar` exactly once per bar, in time order, with
///    `history = bars[..=current]`.
/// 3. `on_finish` once after the last bar; returns the forced `Close` if a
///    position is still open.
pub trait Strategy: Send {
    /// Human-readable name (e.g., "vwap_long_bracket").
    fn name(&self) -> &str;

    /// Indicators this strategy expects on every bar.
    fn indicator_spec(&self) -> IndicatorSpec;

    /// Reset to Flat before a run.
    fn on_start(&mut self);

    /// Decide on the last bar of `history`.
    fn on_bar(
        &mut self,
        history: &[IndicatorBar],
        position: PositionSide,
    ) -> Result<Option<OrderIntent>, ContractViolation>;

    /// The machine's own view of its position.
    fn position(&self) -> PositionSide;

    /// Force the machine Flat at the end of the bar stream.
    fn on_finish(&mut self) -> Option<OrderIntent>;
}

/// Logic invariant broken between a strategy and its engine.
///
/// These indicate a bug, not a runtime condition to recover from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractViolation {
    #[error("{strategy}: on_bar called with an empty history")]
    EmptyHistory { strategy: String },

    #[error("{strategy}: engine reports {reported:?} but the machine holds {expected:?}")]
    PositionMismatch {
        strategy: String,
        expected: PositionSide,
        reported: PositionSide,
    },

    #[error("{strategy}: cannot {action} while {state:?}")]
    InvalidTransition {
        strategy: String,
        action: &'static str,
        state: PositionSide,
    },
}

/// Fail unless the engine's position matches the machine's own state.
pub(crate) fn check_position(
    strategy: &str,
    expected: PositionSide,
    reported: PositionSide,
) -> Result<(), ContractViolation> {
    if expected != reported {
        return Err(ContractViolation::PositionMismatch {
            strategy: strategy.to_string(),
            expected,
            reported,
        });
    }
    Ok(())
}

/// The last bar of the history, or a contract violation if there is none.
pub(crate) fn current_bar<'a>(
    strategy: &str,
    history: &'a [IndicatorBar],
) -> Result<&'a IndicatorBar, ContractViolation> {
    history.last().ok_or_else(|| ContractViolation::EmptyHistory {
        strategy: strategy.to_string(),
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::components::indicator::{IndicatorBar, IndicatorValues};
    use crate::domain::Bar;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    pub fn session_start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 2)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    /// Bars of one session from (close, vwap, atr) triples.
    pub fn history(rows: &[(f64, Option<f64>, Option<f64>)]) -> Vec<IndicatorBar> {
        rows.iter()
            .enumerate()
            .map(|(i, &(close, vwap, atr))| IndicatorBar {
                bar: Bar {
                    timestamp: session_start() + Duration::minutes(15 * i as i64),
                    open: close,
                    high: close + 0.5,
                    low: close - 0.5,
                    close,
                    volume: 100.0,
                },
                indicators: IndicatorValues { vwap, atr },
            })
            .collect()
    }
}
