//! Reference replay engine.
//!
//! Drives a `Strategy` over annotated bars and applies its intents:
//! - fills at the close of the bar that produced the intent
//! - zero commission, one position at a time
//! - all-in fractional sizing of current equity
//! - any position still open after the last bar is closed at the last close
//!
//! The engine keeps its own position and hands it to the strategy on every
//! bar, so a machine whose internal state drifts fails with a contract
//! violation instead of trading on a wrong assumption.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use vwaplab_core::components::{ContractViolation, IndicatorBar, Strategy};
use vwaplab_core::domain::{ExitReason, OrderIntent, PositionSide, TradeRecord};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Contract(#[from] ContractViolation),

    #[error("cannot open a position at bar {bar}: equity is {equity}")]
    InsufficientCapital { bar: usize, equity: f64 },
}

/// An intent as the engine applied it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntentRecord {
    pub bar_index: usize,
    pub timestamp: NaiveDateTime,
    pub price: f64,
    pub intent: OrderIntent,
}

/// Everything a replay produces.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplayOutput {
    pub intents: Vec<IntentRecord>,
    pub trades: Vec<TradeRecord>,
    /// Mark-to-market equity after each bar.
    pub equity_curve: Vec<f64>,
    /// Bars that ended with a position open.
    pub bars_in_market: usize,
}

#[derive(Debug, Clone, Copy)]
struct OpenPosition {
    side: PositionSide,
    quantity: f64,
    entry_bar: usize,
    entry_time: NaiveDateTime,
    entry_price: f64,
}

impl OpenPosition {
    fn signed_quantity(&self) -> f64 {
        self.side.sign() * self.quantity
    }
}

#[derive(Debug, Clone)]
pub struct ReplayEngine {
    cash: f64,
    position: Option<OpenPosition>,
    output: ReplayOutput,
}

impl ReplayEngine {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            cash: initial_capital,
            position: None,
            output: ReplayOutput::default(),
        }
    }

    pub fn side(&self) -> PositionSide {
        self.position.map_or(PositionSide::Flat, |p| p.side)
    }

    pub fn equity(&self, price: f64) -> f64 {
        self.cash + self.position.map_or(0.0, |p| p.signed_quantity() * price)
    }

    /// Replay `bars` through `strategy` and return the applied intents,
    /// trades and equity curve.
    pub fn run(
        mut self,
        strategy: &mut dyn Strategy,
        bars: &[IndicatorBar],
    ) -> Result<ReplayOutput, EngineError> {
        strategy.on_start();

        for (t, current) in bars.iter().enumerate() {
            if let Some(intent) = strategy.on_bar(&bars[..=t], self.side())? {
                self.apply(strategy.name(), t, current, intent)?;
            }
            let close = current.bar.close;
            self.output.equity_curve.push(self.equity(close));
            if self.position.is_some() {
                self.output.bars_in_market += 1;
            }
        }

        self.finish(strategy, bars)?;
        info!(
            strategy = strategy.name(),
            bars = bars.len(),
            trades = self.output.trades.len(),
            "replay complete"
        );
        Ok(self.output)
    }

    fn apply(
        &mut self,
        strategy: &str,
        bar_index: usize,
        current: &IndicatorBar,
        intent: OrderIntent,
    ) -> Result<(), EngineError> {
        let price = current.bar.close;
        let timestamp = current.bar.timestamp;
        match intent {
            OrderIntent::EnterLong { .. } => {
                self.open(strategy, PositionSide::Long, bar_index, timestamp, price)?
            }
            OrderIntent::EnterShort => {
                self.open(strategy, PositionSide::Short, bar_index, timestamp, price)?
            }
            OrderIntent::Close { reason } => {
                self.close(strategy, bar_index, timestamp, price, reason)?
            }
        }
        debug!(bar = bar_index, %timestamp, price, ?intent, "applied intent");
        self.output.intents.push(IntentRecord {
            bar_index,
            timestamp,
            price,
            intent,
        });
        Ok(())
    }

    fn open(
        &mut self,
        strategy: &str,
        side: PositionSide,
        bar: usize,
        time: NaiveDateTime,
        price: f64,
    ) -> Result<(), EngineError> {
        if self.position.is_some() {
            return Err(ContractViolation::InvalidTransition {
                strategy: strategy.to_string(),
                action: "enter",
                state: self.side(),
            }
            .into());
        }
        let equity = self.cash;
        if equity <= 0.0 || price <= 0.0 {
            return Err(EngineError::InsufficientCapital { bar, equity });
        }
        let position = OpenPosition {
            side,
            quantity: equity / price,
            entry_bar: bar,
            entry_time: time,
            entry_price: price,
        };
        self.cash -= position.signed_quantity() * price;
        self.position = Some(position);
        Ok(())
    }

    fn close(
        &mut self,
        strategy: &str,
        bar: usize,
        time: NaiveDateTime,
        price: f64,
        reason: ExitReason,
    ) -> Result<(), EngineError> {
        let Some(open) = self.position.take() else {
            return Err(ContractViolation::InvalidTransition {
                strategy: strategy.to_string(),
                action: "close",
                state: PositionSide::Flat,
            }
            .into());
        };
        self.cash += open.signed_quantity() * price;
        self.output.trades.push(TradeRecord {
            side: open.side,
            entry_bar: open.entry_bar,
            entry_time: open.entry_time,
            entry_price: open.entry_price,
            exit_bar: bar,
            exit_time: time,
            exit_price: price,
            exit_reason: reason,
            quantity: open.quantity,
            pnl: open.signed_quantity() * (price - open.entry_price),
        });
        Ok(())
    }

    /// Tell the strategy the stream ended and close whatever is still open.
    fn finish(&mut self, strategy: &mut dyn Strategy, bars: &[IndicatorBar]) -> Result<(), EngineError> {
        let machine = strategy.position();
        if machine != self.side() {
            return Err(ContractViolation::PositionMismatch {
                strategy: strategy.name().to_string(),
                expected: machine,
                reported: self.side(),
            }
            .into());
        }
        let (Some(intent), Some(last)) = (strategy.on_finish(), bars.last()) else {
            return Ok(());
        };
        let bar_index = bars.len() - 1;
        self.apply(strategy.name(), bar_index, last, intent)?;
        if let Some(eq) = self.output.equity_curve.last_mut() {
            *eq = self.cash;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use vwaplab_core::components::{IndicatorSpec, IndicatorValues, LongBracket, ShortReversal};
    use vwaplab_core::domain::Bar;

    fn history(rows: &[(f64, f64, f64)]) -> Vec<IndicatorBar> {
        let start = NaiveDate::from_ymd_opt(2025, 1, 2)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        rows.iter()
            .enumerate()
            .map(|(i, &(close, vwap, atr))| IndicatorBar {
                bar: Bar {
                    timestamp: start + Duration::minutes(15 * i as i64),
                    open: close,
                    high: close + 0.5,
                    low: close - 0.5,
                    close,
                    volume: 100.0,
                },
                indicators: IndicatorValues {
                    vwap: Some(vwap),
                    atr: Some(atr),
                },
            })
            .collect()
    }

    /// A machine that ignores the protocol and always tries to enter.
    struct AlwaysLong;

    impl Strategy for AlwaysLong {
        fn name(&self) -> &str {
            "always_long"
        }
        fn indicator_spec(&self) -> IndicatorSpec {
            IndicatorSpec::default()
        }
        fn on_start(&mut self) {}
        fn on_bar(
            &mut self,
            _history: &[IndicatorBar],
            _position: PositionSide,
        ) -> Result<Option<OrderIntent>, ContractViolation> {
            Ok(Some(OrderIntent::EnterLong {
                stop_loss: 0.0,
                take_profit: f64::MAX,
            }))
        }
        fn position(&self) -> PositionSide {
            PositionSide::Long
        }
        fn on_finish(&mut self) -> Option<OrderIntent> {
            None
        }
    }

    #[test]
    fn long_round_trip_accounting() {
        // Enter at 101 (stop 99, target 104), exit at take-profit 104.
        let bars = history(&[(99.0, 100.0, 2.0), (101.0, 100.0, 2.0), (104.0, 101.0, 2.0)]);
        let out = ReplayEngine::new(10_000.0)
            .run(&mut LongBracket::default(), &bars)
            .unwrap();

        assert_eq!(out.trades.len(), 1);
        let t = &out.trades[0];
        assert_eq!(t.exit_reason, ExitReason::TakeProfit);
        assert_eq!((t.entry_bar, t.exit_bar), (1, 2));
        assert!((t.pnl - 10_000.0 * (104.0 / 101.0 - 1.0)).abs() < 1e-6);

        assert_eq!(out.equity_curve.len(), 3);
        assert_eq!(out.equity_curve[0], 10_000.0);
        assert!((out.equity_curve[1] - 10_000.0).abs() < 1e-9);
        assert!((out.equity_curve[2] - (10_000.0 + t.pnl)).abs() < 1e-6);
        assert_eq!(out.bars_in_market, 1);
        assert_eq!(out.intents.len(), 2);
    }

    #[test]
    fn short_profits_when_price_falls() {
        let bars = history(&[
            (101.0, 100.0, 1.0),
            (99.0, 100.0, 1.0),
            (90.0, 95.0, 1.0),
            (96.0, 95.0, 1.0),
        ]);
        let out = ReplayEngine::new(9_900.0)
            .run(&mut ShortReversal::default(), &bars)
            .unwrap();
        assert_eq!(out.trades.len(), 1);
        let t = &out.trades[0];
        assert_eq!(t.side, PositionSide::Short);
        assert_eq!(t.exit_reason, ExitReason::VwapCross);
        // 100 units short from 99 to 96.
        assert!((t.quantity - 100.0).abs() < 1e-9);
        assert!((t.pnl - 300.0).abs() < 1e-6);
        assert!((out.equity_curve[2] - (9_900.0 + 900.0)).abs() < 1e-6);
    }

    #[test]
    fn open_position_is_closed_at_end_of_data() {
        let bars = history(&[(99.0, 100.0, 2.0), (101.0, 100.0, 2.0), (102.0, 100.5, 2.0)]);
        let out = ReplayEngine::new(1_000.0)
            .run(&mut LongBracket::default(), &bars)
            .unwrap();
        assert_eq!(out.trades.len(), 1);
        let t = &out.trades[0];
        assert_eq!(t.exit_reason, ExitReason::EndOfData);
        assert_eq!(t.exit_bar, 2);
        assert_eq!(t.exit_price, 102.0);
        assert_eq!(
            out.intents.last().map(|r| r.intent),
            Some(OrderIntent::Close {
                reason: ExitReason::EndOfData
            })
        );
    }

    #[test]
    fn empty_stream_is_a_no_op() {
        let out = ReplayEngine::new(1_000.0)
            .run(&mut LongBracket::default(), &[])
            .unwrap();
        assert!(out.trades.is_empty());
        assert!(out.equity_curve.is_empty());
    }

    #[test]
    fn double_entry_is_contract_violation() {
        let bars = history(&[(99.0, 100.0, 2.0), (101.0, 100.0, 2.0)]);
        let err = ReplayEngine::new(1_000.0)
            .run(&mut AlwaysLong, &bars)
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Contract(ContractViolation::InvalidTransition { .. })
        ));
    }
}
