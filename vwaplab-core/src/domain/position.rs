use serde::{Deserialize, Serialize};

/// Direction of the single open position, as seen by the execution engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PositionSide {
    #[default]
    Flat,
    Long,
    Short,
}

impl PositionSide {
    /// +1 for long, -1 for short, 0 when flat.
    pub fn sign(&self) -> f64 {
        match self {
            Self::Flat => 0.0,
            Self::Long => 1.0,
            Self::Short => -1.0,
        }
    }
}

/// Stop-loss and take-profit levels attached to a long entry.
///
/// Both levels are fixed when the position opens and never revised.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bracket {
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

impl Bracket {
    /// Build a bracket `stop_mult`×ATR below and `target_mult`×ATR above the entry.
    pub fn from_atr(entry_price: f64, atr: f64, stop_mult: f64, target_mult: f64) -> Self {
        Self {
            entry_price,
            stop_loss: entry_price - stop_mult * atr,
            take_profit: entry_price + target_mult * atr,
        }
    }

    pub fn stop_hit(&self, price: f64) -> bool {
        price <= self.stop_loss
    }

    pub fn target_hit(&self, price: f64) -> bool {
        price >= self.take_profit
    }
}
