//! Intraday sampling intervals accepted by the quote API.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Interval {
    #[serde(rename = "1min")]
    OneMin,
    #[default]
    #[serde(rename = "5min")]
    FiveMin,
    #[serde(rename = "15min")]
    FifteenMin,
    #[serde(rename = "30min")]
    ThirtyMin,
    #[serde(rename = "60min")]
    SixtyMin,
}

impl Interval {
    pub const ALL: [Interval; 5] = [
        Interval::OneMin,
        Interval::FiveMin,
        Interval::FifteenMin,
        Interval::ThirtyMin,
        Interval::SixtyMin,
    ];

    /// Wire value used in the `interval` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            Interval::OneMin => "1min",
            Interval::FiveMin => "5min",
            Interval::FifteenMin => "15min",
            Interval::ThirtyMin => "30min",
            Interval::SixtyMin => "60min",
        }
    }

    /// Human label for the dropdown.
    pub fn label(self) -> &'static str {
        match self {
            Interval::OneMin => "1 min",
            Interval::FiveMin => "5 min",
            Interval::FifteenMin => "15 min",
            Interval::ThirtyMin => "30 min",
            Interval::SixtyMin => "60 min",
        }
    }

    /// Response key holding the series, e.g. `Time Series (5min)`.
    pub fn series_key(self) -> String {
        format!("Time Series ({})", self.as_str())
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown interval '{0}', expected one of 1min, 5min, 15min, 30min, 60min")]
pub struct UnknownInterval(pub String);

impl FromStr for Interval {
    type Err = UnknownInterval;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Interval::ALL
            .into_iter()
            .find(|i| i.as_str() == s.trim())
            .ok_or_else(|| UnknownInterval(s.to_string()))
    }
}
