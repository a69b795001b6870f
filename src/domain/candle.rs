//! OHLCV candle representation.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One sampled price bar. `date` is the start of the sampling bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candle {
    pub date: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// close > open. Flat bars count as bearish.
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn body_top(&self) -> f64 {
        self.open.max(self.close)
    }

    pub fn body_bottom(&self) -> f64 {
        self.open.min(self.close)
    }
}

/// Sorts ascending by `date` and collapses duplicate instants, keeping the
/// entry that came last in the input.
pub fn sort_and_dedup(candles: &mut Vec<Candle>) {
    // stable sort keeps input order among equal dates
    candles.sort_by_key(|c| c.date);
    let mut out: Vec<Candle> = Vec::with_capacity(candles.len());
    for candle in candles.drain(..) {
        match out.last_mut() {
            Some(last) if last.date == candle.date => *last = candle,
            _ => out.push(candle),
        }
    }
    *candles = out;
}
