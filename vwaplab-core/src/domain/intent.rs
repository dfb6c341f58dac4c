//! Order intents emitted by the decision state machines.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an open position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    /// Price crossed back through VWAP against the position.
    VwapCross,
    /// Forced closure at the end of the bar stream.
    EndOfData,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::StopLoss => "stop_loss",
            Self::TakeProfit => "take_profit",
            Self::VwapCross => "vwap_cross",
            Self::EndOfData => "end_of_data",
        };
        f.write_str(s)
    }
}

/// At most one of these is emitted per bar per machine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum OrderIntent {
    EnterLong { stop_loss: f64, take_profit: f64 },
    EnterShort,
    Close { reason: ExitReason },
}
