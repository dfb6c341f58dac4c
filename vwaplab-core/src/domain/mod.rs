//! Domain types for VWAPLab

pub mod bar;
pub mod intent;
pub mod position;
pub mod trade;

pub use bar::Bar;
pub use intent::{ExitReason, OrderIntent};
pub use position::{Bracket, PositionSide};
pub use trade::TradeRecord;
