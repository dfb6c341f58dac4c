//! Component traits: session indicators and decision state machines.
//!
//! - `indicator`: the `SessionIndicator` trait plus the per-bar value record
//! - `strategy`: the `Strategy` trait, crossover helpers and both VWAP machines

pub mod indicator;
pub mod strategy;

pub use indicator::{
    IndicatorBar, IndicatorSpec, IndicatorValues, SessionIndicator, DEFAULT_ATR_PERIOD,
};
pub use strategy::{
    ContractViolation, LongBracket, LongBracketParams, LongState, ShortReversal,
    ShortReversalParams, ShortState, Strategy,
};
