//! Performance metrics: pure functions that compute run statistics.
//!
//! Every metric is a pure function: equity curve and/or trade list in, scalar
//! out. Percentages are expressed in percent (12.5 == 12.5%).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vwaplab_core::domain::TradeRecord;

/// Summary statistics for a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub final_equity: f64,
    pub total_return_pct: f64,
    pub max_drawdown_pct: f64,
    pub exposure_pct: f64,
    pub trade_count: usize,
    pub win_rate_pct: f64,
    pub profit_factor: f64,
    pub avg_trade_pct: f64,
    pub best_trade_pct: f64,
    pub worst_trade_pct: f64,
    /// Trade count per exit reason.
    pub exits: BTreeMap<String, usize>,
}

impl PerformanceMetrics {
    pub fn compute(
        equity_curve: &[f64],
        trades: &[TradeRecord],
        initial_capital: f64,
        bars_in_market: usize,
    ) -> Self {
        let trade_returns: Vec<f64> = trades.iter().map(|t| t.return_pct() * 100.0).collect();
        let mut exits = BTreeMap::new();
        for t in trades {
            *exits.entry(t.exit_reason.to_string()).or_insert(0) += 1;
        }

        Self {
            final_equity: equity_curve.last().copied().unwrap_or(initial_capital),
            total_return_pct: total_return(equity_curve, initial_capital) * 100.0,
            max_drawdown_pct: max_drawdown(equity_curve, initial_capital) * 100.0,
            exposure_pct: exposure(bars_in_market, equity_curve.len()) * 100.0,
            trade_count: trades.len(),
            win_rate_pct: win_rate(trades) * 100.0,
            profit_factor: profit_factor(trades),
            avg_trade_pct: mean(&trade_returns),
            best_trade_pct: trade_returns.iter().copied().reduce(f64::max).unwrap_or(0.0),
            worst_trade_pct: trade_returns.iter().copied().reduce(f64::min).unwrap_or(0.0),
            exits,
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction of initial capital.
pub fn total_return(equity_curve: &[f64], initial_capital: f64) -> f64 {
    match equity_curve.last() {
        Some(&last) if initial_capital > 0.0 => (last - initial_capital) / initial_capital,
        _ => 0.0,
    }
}

/// Maximum drawdown as a negative fraction (e.g., -0.15 = 15% drawdown).
///
/// The running peak starts at the initial capital.
pub fn max_drawdown(equity_curve: &[f64], initial_capital: f64) -> f64 {
    let mut peak = initial_capital;
    let mut max_dd = 0.0_f64;
    for &eq in equity_curve {
        peak = peak.max(eq);
        if peak > 0.0 {
            max_dd = max_dd.min((eq - peak) / peak);
        }
    }
    max_dd
}

/// Fraction of bars that ended with a position open.
pub fn exposure(bars_in_market: usize, total_bars: usize) -> f64 {
    if total_bars == 0 {
        return 0.0;
    }
    bars_in_market as f64 / total_bars as f64
}

/// Win rate: fraction of trades that were winners.
pub fn win_rate(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64
}

/// Profit factor: gross profits / gross losses.
///
/// Capped at 100.0 for edge cases (all winners, zero losses).
pub fn profit_factor(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let gross_profit: f64 = trades.iter().filter(|t| t.pnl > 0.0).map(|t| t.pnl).sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.pnl < 0.0)
        .map(|t| t.pnl.abs())
        .sum();

    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { 100.0 } else { 0.0 };
    }
    (gross_profit / gross_loss).min(100.0)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
