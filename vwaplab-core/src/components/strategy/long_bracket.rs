//! Long/bracket VWAP strategy.
//!
//! Enters long when the close crosses above the session VWAP and attaches a
//! bracket fixed at entry: stop at `entry - stop_loss_atr × ATR`, target at
//! `entry + take_profit_atr × ATR`. While long, the bracket is checked first;
//! only if neither level is hit does a VWAP-over-close crossover close the
//! position.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    check_position, close_crosses_above_vwap, current_bar, vwap_crosses_above_close,
    ContractViolation, Strategy,
};
use crate::components::indicator::{IndicatorBar, IndicatorSpec, DEFAULT_ATR_PERIOD};
use crate::domain::{Bracket, ExitReason, OrderIntent, PositionSide};
use crate::indicators::PriceMode;

const NAME: &str = "vwap_long_bracket";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LongBracketParams {
    /// Stop distance below entry, in ATRs.
    pub stop_loss_atr: f64,
    /// Target distance above entry, in ATRs.
    pub take_profit_atr: f64,
    pub price_mode: PriceMode,
    pub atr_period: usize,
}

impl Default for LongBracketParams {
    fn default() -> Self {
        Self {
            stop_loss_atr: 1.0,
            take_profit_atr: 1.5,
            price_mode: PriceMode::Close,
            atr_period: DEFAULT_ATR_PERIOD,
        }
    }
}

/// Position state of the long machine. It can never be short.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LongState {
    Flat,
    Long(Bracket),
}

impl LongState {
    pub fn side(&self) -> PositionSide {
        match self {
            LongState::Flat => PositionSide::Flat,
            LongState::Long(_) => PositionSide::Long,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LongBracket {
    params: LongBracketParams,
    state: LongState,
}

impl LongBracket {
    pub fn new(params: LongBracketParams) -> Self {
        assert!(
            params.stop_loss_atr.is_finite() && params.stop_loss_atr >= 0.0,
            "stop_loss_atr must be finite and >= 0"
        );
        assert!(
            params.take_profit_atr.is_finite() && params.take_profit_atr >= 0.0,
            "take_profit_atr must be finite and >= 0"
        );
        assert!(params.atr_period >= 1, "atr_period must be >= 1");
        Self {
            params,
            state: LongState::Flat,
        }
    }

    pub fn state(&self) -> LongState {
        self.state
    }

    fn enter(&mut self, price: f64, atr: f64) -> Result<OrderIntent, ContractViolation> {
        if let LongState::Long(_) = self.state {
            return Err(ContractViolation::InvalidTransition {
                strategy: NAME.to_string(),
                action: "enter long",
                state: PositionSide::Long,
            });
        }
        let bracket = Bracket::from_atr(
            price,
            atr,
            self.params.stop_loss_atr,
            self.params.take_profit_atr,
        );
        self.state = LongState::Long(bracket);
        Ok(OrderIntent::EnterLong {
            stop_loss: bracket.stop_loss,
            take_profit: bracket.take_profit,
        })
    }

    fn close(&mut self, reason: ExitReason) -> Result<OrderIntent, ContractViolation> {
        if self.state == LongState::Flat {
            return Err(ContractViolation::InvalidTransition {
                strategy: NAME.to_string(),
                action: "close",
                state: PositionSide::Flat,
            });
        }
        self.state = LongState::Flat;
        Ok(OrderIntent::Close { reason })
    }
}

impl Default for LongBracket {
    fn default() -> Self {
        Self::new(LongBracketParams::default())
    }
}

impl Strategy for LongBracket {
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
        self.state = LongState::Flat;
    }

    fn on_bar(
        &mut self,
        history: &[IndicatorBar],
        position: PositionSide,
    ) -> Result<Option<OrderIntent>, ContractViolation> {
        let current = current_bar(NAME, history)?;
        check_position(NAME, self.state.side(), position)?;

        let (Some(vwap), Some(atr)) = (current.indicators.vwap, current.indicators.atr) else {
            return Ok(None);
        };
        let ts = current.bar.timestamp;
        let price = current.bar.close;

        match self.state {
            LongState::Long(bracket) => {
                let reason = if bracket.stop_hit(price) {
                    Some(ExitReason::StopLoss)
                } else if bracket.target_hit(price) {
                    Some(ExitReason::TakeProfit)
                } else if vwap_crosses_above_close(history) {
                    Some(ExitReason::VwapCross)
                } else {
                    None
                };
                match reason {
                    Some(reason) => {
                        debug!(%ts, price, vwap, %reason, "long exit");
                        self.close(reason).map(Some)
                    }
                    None => Ok(None),
                }
            }
            LongState::Flat => {
                if !close_crosses_above_vwap(history) {
                    return Ok(None);
                }
                let intent = self.enter(price, atr)?;
                debug!(%ts, price, vwap, atr, "long entry");
                Ok(Some(intent))
            }
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

    fn run(machine: &mut LongBracket, rows: &[(f64, Option<f64>, Option<f64>)]) -> Vec<Option<OrderIntent>> {
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
    fn enters_on_close_crossing_above_vwap() {
        let mut m = LongBracket::default();
        let out = run(&mut m, &[(99.0, Some(100.0), Some(2.0)), (101.0, Some(100.0), Some(2.0))]);
        assert_eq!(out[0], None);
        assert_eq!(
            out[1],
            Some(OrderIntent::EnterLong {
                stop_loss: 99.0,
                take_profit: 104.0
            })
        );
        assert_eq!(m.position(), PositionSide::Long);
    }

    #[test]
    fn stop_takes_precedence_over_vwap_cross() {
        let mut m = LongBracket::default();
        // Entry at 101 (stop 99, target 104). Next bar closes at 98.5 below
        // VWAP 100: both the stop and the VWAP crossover would fire.
        let out = run(
            &mut m,
            &[
                (99.0, Some(100.0), Some(2.0)),
                (101.0, Some(100.0), Some(2.0)),
                (98.5, Some(100.0), Some(2.0)),
            ],
        );
        assert_eq!(
            out[2],
            Some(OrderIntent::Close {
                reason: ExitReason::StopLoss
            })
        );
        assert_eq!(m.state(), LongState::Flat);
    }

    #[test]
    fn take_profit_hit() {
        let mut m = LongBracket::default();
        let out = run(
            &mut m,
            &[
                (99.0, Some(100.0), Some(2.0)),
                (101.0, Some(100.0), Some(2.0)),
                (104.0, Some(101.0), Some(2.0)),
            ],
        );
        assert_eq!(
            out[2],
            Some(OrderIntent::Close {
                reason: ExitReason::TakeProfit
            })
        );
    }

    #[test]
    fn vwap_cross_exit_inside_bracket() {
        let mut m = LongBracket::default();
        let out = run(
            &mut m,
            &[
                (99.0, Some(100.0), Some(2.0)),
                (101.0, Some(100.0), Some(2.0)),
                (100.5, Some(100.0), Some(2.0)),
                (99.5, Some(100.2), Some(2.0)), // above stop 99, below VWAP
            ],
        );
        assert_eq!(out[2], None);
        assert_eq!(
            out[3],
            Some(OrderIntent::Close {
                reason: ExitReason::VwapCross
            })
        );
    }

    #[test]
    fn bracket_is_fixed_at_entry() {
        let mut m = LongBracket::default();
        run(
            &mut m,
            &[
                (99.0, Some(100.0), Some(2.0)),
                (101.0, Some(100.0), Some(2.0)),
                (102.0, Some(100.5), Some(5.0)), // ATR widens; bracket must not move
            ],
        );
        match m.state() {
            LongState::Long(b) => {
                assert_eq!(b.stop_loss, 99.0);
                assert_eq!(b.take_profit, 104.0);
                assert_eq!(b.entry_price, 101.0);
            }
            LongState::Flat => panic!("expected an open long"),
        }
    }

    #[test]
    fn no_reentry_on_exit_bar() {
        let mut m = LongBracket::default();
        let out = run(
            &mut m,
            &[
                (99.0, Some(100.0), Some(2.0)),
                (101.0, Some(100.0), Some(2.0)),
                (98.0, Some(100.0), Some(2.0)),
                (101.0, Some(100.0), Some(2.0)),
            ],
        );
        assert!(matches!(out[2], Some(OrderIntent::Close { .. })));
        assert!(matches!(out[3], Some(OrderIntent::EnterLong { .. })));
    }

    #[test]
    fn undefined_indicators_skip_the_bar() {
        let mut m = LongBracket::default();
        let out = run(
            &mut m,
            &[
                (99.0, Some(100.0), Some(2.0)),
                (101.0, None, Some(2.0)),
                (102.0, Some(100.0), None),
            ],
        );
        assert!(out.iter().all(Option::is_none));
        assert_eq!(m.state(), LongState::Flat);
    }

    #[test]
    fn position_mismatch_is_contract_violation() {
        let mut m = LongBracket::default();
        let h = history(&[(99.0, Some(100.0), Some(2.0))]);
        let err = m.on_bar(&h, PositionSide::Short).unwrap_err();
        assert!(matches!(err, ContractViolation::PositionMismatch { .. }));
    }

    #[test]
    fn empty_history_is_contract_violation() {
        let mut m = LongBracket::default();
        assert!(matches!(
            m.on_bar(&[], PositionSide::Flat),
            Err(ContractViolation::EmptyHistory { .. })
        ));
    }

    #[test]
    fn on_finish_forces_flat() {
        let mut m = LongBracket::default();
        run(&mut m, &[(99.0, Some(100.0), Some(2.0)), (101.0, Some(100.0), Some(2.0))]);
        assert_eq!(
            m.on_finish(),
            Some(OrderIntent::Close {
                reason: ExitReason::EndOfData
            })
        );
        assert_eq!(m.position(), PositionSide::Flat);
        assert_eq!(m.on_finish(), None);
    }

    #[test]
    fn custom_multiples() {
        let mut m = LongBracket::new(LongBracketParams {
            stop_loss_atr: 2.0,
            take_profit_atr: 3.0,
            ..LongBracketParams::default()
        });
        let out = run(&mut m, &[(99.0, Some(100.0), Some(1.0)), (101.0, Some(100.0), Some(1.0))]);
        assert_eq!(
            out[1],
            Some(OrderIntent::EnterLong {
                stop_loss: 99.0,
                take_profit: 104.0
            })
        );
    }

    #[test]
    fn indicator_spec_follows_params() {
        let m = LongBracket::default();
        assert_eq!(m.indicator_spec().price_mode, PriceMode::Close);
        assert_eq!(m.indicator_spec().atr_period, 14);
        assert_eq!(m.name(), "vwap_long_bracket");
    }

    #[test]
    #[should_panic(expected = "stop_loss_atr must be finite and >= 0")]
    fn rejects_negative_stop_multiple() {
        LongBracket::new(LongBracketParams {
            stop_loss_atr: -1.0,
            ..LongBracketParams::default()
        });
    }
}
