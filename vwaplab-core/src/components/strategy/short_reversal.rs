//! Short/reversal VWAP strategy.
//!
//! Goes short when VWAP crosses above the close and covers when the close
//! crosses back above VWAP. No stop or target.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    check_position, close_crosses_above_vwap, current_bar, vwap_crosses_above_close,
    ContractViolation, Strategy,
};
use crate::components::indicator::{IndicatorBar, IndicatorSpec, DEFAULT_ATR_PERIOD};
use crate::domain::{ExitReason, OrderIntent, PositionSide};
use crate::indicators::PriceMode;

const NAME: &str = "vwap_short_reversal";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShortReversalParams {
    pub price_mode: PriceMode,
    /// Only used to annotate bars; the machine itself ignores ATR.
    pub atr_period: usize,
}

impl Default for ShortReversalParams {
    fn default() -> Self {
        Self {
            price_mode: PriceMode::Typical,
            atr_period: DEFAULT_ATR_PERIOD,
        }
    }
}

/// Position state of the short machine. It can never be long.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShortState {
    Flat,
    Short { entry_price: f64 },
}

impl ShortState {
    pub fn side(&self) -> PositionSide {
        match self {
            ShortState::Flat => PositionSide::Flat,
            ShortState::Short { .. } => PositionSide::Short,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShortReversal {
    params: ShortReversalParams,
    state: ShortState,
}

impl ShortReversal {
    pub fn new(params: ShortReversalParams) -> Self {
        assert!(params.atr_period >= 1, "atr_period must be >= 1");
        Self {
            params,
            state: ShortState::Flat,
        }
    }

    pub fn state(&self) -> ShortState {
        self.state
    }

    fn enter(&mut self, price: f64) -> Result<OrderIntent, ContractViolation> {
        if let ShortState::Short { .. } = self.state {
            return Err(ContractViolation::InvalidTransition {
                strategy: NAME.to_string(),
                action: "enter short",
                state: PositionSide::Short,
            });
        }
        self.state = ShortState::Short { entry_price: price };
        Ok(OrderIntent::EnterShort)
    }

    fn close(&mut self, reason: ExitReason) -> Result<OrderIntent, ContractViolation> {
        if self.state == ShortState::Flat {
            return Err(ContractViolation::InvalidTransition {
                strategy: NAME.to_string(),
                action: "close",
                state: PositionSide::Flat,
            });
        }
        self.state = ShortState::Flat;
        Ok(OrderIntent::Close { reason })
    }
}

impl Default for ShortReversal {
    fn default() -> Self {
        Self::new(ShortReversalParams::default())
    }
}

impl Strategy for ShortReversal {
    fn name(&self) -> &str {
        NAME
    }

    fn indicator_spec(&self) -> IndicatorSpec {
        IndicatorSpec {
            price_mode: self.params.price_mode,
            atr_period: self.params.atr_period,
        }
    }

    fn on_start(&mut self) {
        self.state = ShortState::Flat;
    }

    fn on_bar(
        &mut self,
        history: &[IndicatorBar],
        position: PositionSide,
    ) -> Result<Option<OrderIntent>, ContractViolation> {
        let current = current_bar(NAME, history)?;
        check_position(NAME, self.state.side(), position)?;

        let Some(vwap) = current.indicators.vwap else {
            return Ok(None);
        };
        let ts = current.bar.timestamp;
        let price = current.bar.close;

        match self.state {
            ShortState::Short { .. } if close_crosses_above_vwap(history) => {
                debug!(%ts, price, vwap, "short exit");
                self.close(ExitReason::VwapCross).map(Some)
            }
            ShortState::Flat if vwap_crosses_above_close(history) => {
                debug!(%ts, price, vwap, "short entry");
                self.enter(price).map(Some)
            }
            _ => Ok(None),
        }
    }

    fn position(&self) -> PositionSide {
        self.state.side()
    }

    fn on_finish(&mut self) -> Option<OrderIntent> {
        self.close(ExitReason::EndOfData).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::strategy::test_support::history;

    fn run(machine: &mut ShortReversal, rows: &[(f64, Option<f64>, Option<f64>)]) -> Vec<Option<OrderIntent>> {
        let h = history(rows);
        machine.on_start();
        (0..h.len())
            .map(|i| {
                let pos = machine.position();
                machine.on_bar(&h[..=i], pos).unwrap()
            })
            .collect()
    }

    #[test]
    fn enters_when_price_falls_below_vwap() {
        let mut m = ShortReversal::default();
        let out = run(&mut m, &[(101.0, Some(100.0), None), (99.0, Some(100.0), None)]);
        assert_eq!(out, vec![None, Some(OrderIntent::EnterShort)]);
        assert_eq!(m.state(), ShortState::Short { entry_price: 99.0 });
    }

    #[test]
    fn covers_when_price_reclaims_vwap() {
        let mut m = ShortReversal::default();
        let out = run(
            &mut m,
            &[
                (101.0, Some(100.0), None),
                (99.0, Some(100.0), None),
                (98.0, Some(99.5), None),
                (100.0, Some(99.4), None),
            ],
        );
        assert_eq!(out[2], None);
        assert_eq!(
            out[3],
            Some(OrderIntent::Close {
                reason: ExitReason::VwapCross
            })
        );
        assert_eq!(m.position(), PositionSide::Flat);
    }

    #[test]
    fn ignores_missing_atr() {
        // ATR is never required by the short machine.
        let mut m = ShortReversal::default();
        let out = run(&mut m, &[(101.0, Some(100.0), None), (99.0, Some(100.0), None)]);
        assert_eq!(out[1], Some(OrderIntent::EnterShort));
    }

    #[test]
    fn undefined_vwap_skips_the_bar() {
        let mut m = ShortReversal::default();
        let out = run(&mut m, &[(101.0, Some(100.0), None), (99.0, None, None)]);
        assert_eq!(out, vec![None, None]);
    }

    #[test]
    fn never_goes_long() {
        let mut m = ShortReversal::default();
        // Close crossing above VWAP while flat must not open anything.
        let out = run(&mut m, &[(99.0, Some(100.0), None), (101.0, Some(100.0), None)]);
        assert_eq!(out, vec![None, None]);
        assert_eq!(m.position(), PositionSide::Flat);
    }

    #[test]
    fn engine_long_is_contract_violation() {
        let mut m = ShortReversal::default();
        let h = history(&[(99.0, Some(100.0), None)]);
        assert!(matches!(
            m.on_bar(&h, PositionSide::Long),
            Err(ContractViolation::PositionMismatch {
                reported: PositionSide::Long,
                ..
            })
        ));
    }

    #[test]
    fn on_finish_forces_flat() {
        let mut m = ShortReversal::default();
        run(&mut m, &[(101.0, Some(100.0), None), (99.0, Some(100.0), None)]);
        assert_eq!(
            m.on_finish(),
            Some(OrderIntent::Close {
                reason: ExitReason::EndOfData
            })
        );
        assert_eq!(m.on_finish(), None);
    }

    #[test]
    fn defaults_to_typical_price() {
        let m = ShortReversal::default();
        assert_eq!(m.indicator_spec().price_mode, PriceMode::Typical);
        assert_eq!(m.name(), "vwap_short_reversal");
    }
}
