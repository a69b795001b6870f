//! Technical indicators drawn under the price chart.
//!
//! - `IndicatorPoint`: one value aligned to a candle date, with a validity flag
//!   for the warmup region
//! - `IndicatorSeries`: a named series aligned 1:1 with the candles it was
//!   computed from

pub mod rsi;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

pub use rsi::{calculate_rsi, DEFAULT_RSI_PERIOD};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorPoint {
    pub date: DateTime<Utc>,
    pub valid: bool,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IndicatorType {
    Rsi(usize),
}

#[derive(Debug, Clone, Serialize)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Values inside the warmup region are `None`.
    pub fn valid_values(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.values
            .iter()
            .map(|p| if p.valid { Some(p.value) } else { None })
    }

    pub fn last_valid(&self) -> Option<f64> {
        self.values.iter().rev().find(|p| p.valid).map(|p| p.value)
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
        }
    }
}
