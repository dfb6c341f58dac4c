//! Two-series crossover detection on the causal bar history.

use crate::components::indicator::IndicatorBar;
use crate::session::is_new_session;

/// Series A crosses over series B between the previous and current observation.
///
/// Previous: A <= B. Current: A > B.
pub fn crossover(a_prev: f64, b_prev: f64, a_cur: f64, b_cur: f64) -> bool {
    a_prev <= b_prev && a_cur > b_cur
}

/// (close, vwap) of the previous and current bar.
///
/// `None` unless both bars belong to the same session and both carry a VWAP,
/// so the first bar of a run or of a session never produces a crossover.
fn close_vwap_pairs(history: &[IndicatorBar]) -> Option<((f64, f64), (f64, f64))> {
    let [.., prev, cur] = history else {
        return None;
    };
    if is_new_session(prev.bar.timestamp, cur.bar.timestamp) {
        return None;
    }
    Some((
        (prev.bar.close, prev.indicators.vwap?),
        (cur.bar.close, cur.indicators.vwap?),
    ))
}

/// Close moved from at-or-below VWAP to above it.
pub fn close_crosses_above_vwap(history: &[IndicatorBar]) -> bool {
    close_vwap_pairs(history)
        .is_some_and(|((pc, pv), (cc, cv))| crossover(pc, pv, cc, cv))
}

/// VWAP moved from at-or-below close to above it (price fell under VWAP).
pub fn vwap_crosses_above_close(history: &[IndicatorBar]) -> bool {
    close_vwap_pairs(history)
        .is_some_and(|((pc, pv), (cc, cv))| crossover(pv, pc, cv, cc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::strategy::test_support::history;
    use chrono::Duration;

    #[test]
    fn crossover_requires_strict_move_above() {
        assert!(crossover(1.0, 2.0, 3.0, 2.0));
        assert!(crossover(2.0, 2.0, 2.1, 2.0)); // equal counts as "at or below"
        assert!(!crossover(2.0, 2.0, 2.0, 2.0)); // flat: never fires
        assert!(!crossover(3.0, 2.0, 4.0, 2.0)); // already above
        assert!(!crossover(1.0, 2.0, 2.0, 2.0)); // touch without crossing
    }

    #[test]
    fn nan_never_crosses() {
        assert!(!crossover(f64::NAN, 2.0, 3.0, 2.0));
        assert!(!crossover(1.0, 2.0, f64::NAN, 2.0));
    }

    #[test]
    fn close_over_vwap() {
        let h = history(&[(99.0, Some(100.0), None), (101.0, Some(100.0), None)]);
        assert!(close_crosses_above_vwap(&h));
        assert!(!vwap_crosses_above_close(&h));
    }

    #[test]
    fn vwap_over_close() {
        let h = history(&[(101.0, Some(100.0), None), (99.0, Some(100.0), None)]);
        assert!(vwap_crosses_above_close(&h));
        assert!(!close_crosses_above_vwap(&h));
    }

    #[test]
    fn single_bar_never_crosses() {
        let h = history(&[(101.0, Some(100.0), None)]);
        assert!(!close_crosses_above_vwap(&h));
        assert!(!vwap_crosses_above_close(&h));
        assert!(!close_crosses_above_vwap(&[]));
    }

    #[test]
    fn undefined_previous_vwap_never_crosses() {
        let h = history(&[(99.0, None, None), (101.0, Some(100.0), None)]);
        assert!(!close_crosses_above_vwap(&h));
    }

    #[test]
    fn session_boundary_never_crosses() {
        let mut h = history(&[(99.0, Some(100.0), None), (101.0, Some(100.0), None)]);
        h[1].bar.timestamp += Duration::days(1);
        assert!(!close_crosses_above_vwap(&h));
    }
}
