//! Session-relative Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|), where
//! prev_close is the previous bar of the same session. The session's first bar
//! has no previous close and its TR is high-low.
//! ATR is the simple mean of the last `period` TR values of the session, with
//! fewer samples at the start of a session (min-periods = 1).

use std::collections::VecDeque;

use crate::components::indicator::SessionIndicator;
use crate::domain::Bar;

/// True Range of a bar given the previous close in the same session.
pub fn true_range(high: f64, low: f64, prev_close: Option<f64>) -> f64 {
    let range = high - low;
    match prev_close {
        Some(pc) => range.max((high - pc).abs()).max((low - pc).abs()),
        None => range,
    }
}

#[derive(Debug, Clone)]
pub struct SessionAtr {
    period: usize,
    window: VecDeque<f64>,
    prev_close: Option<f64>,
    name: String,
}

impl SessionAtr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            window: VecDeque::with_capacity(period),
            prev_close: None,
            name: format!("atr_{period}"),
        }
    }
}

impl SessionIndicator for SessionAtr {
    fn name(&self) -> &str {
        &self.name
    }

    fn reset(&mut self) {
        self.window.clear();
        self.prev_close = None;
    }

    fn update(&mut self, bar: &Bar) -> Option<f64> {
        let tr = true_range(bar.high, bar.low, self.prev_close);
        self.prev_close = Some(bar.close);

        if self.window.len() == self.period {
            self.window.pop_front();
        }
        self.window.push_back(tr);

        // Window is never empty after a push.
        Some(self.window.iter().sum::<f64>() / self.window.len() as f64)
    }
}
