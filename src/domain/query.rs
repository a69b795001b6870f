//! User-owned query parameters (symbol, interval, API key).

use serde::Serialize;

use crate::domain::interval::Interval;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pub symbol: String,
    pub interval: Interval,
    pub api_key: String,
}

impl QueryParams {
    pub fn new(symbol: &str, interval: Interval, api_key: &str) -> Self {
        Self {
            symbol: normalize_symbol(symbol),
            interval,
            api_key: api_key.trim().to_string(),
        }
    }

    /// Params from a form submission. The page never echoes the key back,
    /// so a blank key field keeps the current one.
    pub fn resubmitted(&self, symbol: &str, interval: Interval, api_key: &str) -> Self {
        let api_key = if api_key.trim().is_empty() {
            self.api_key.as_str()
        } else {
            api_key
        };
        Self::new(symbol, interval, api_key)
    }

    /// A fetch is only attempted when both symbol and key are present.
    pub fn is_ready(&self) -> bool {
        !self.symbol.is_empty() && !self.api_key.is_empty()
    }

    /// Copy safe to expose to the browser: the key is reduced to a flag.
    pub fn public_view(&self) -> PublicParams {
        PublicParams {
            symbol: self.symbol.clone(),
            interval: self.interval,
            has_api_key: !self.api_key.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicParams {
    pub symbol: String,
    pub interval: Interval,
    pub has_api_key: bool,
}

/// Trims and uppercases free-text symbol input.
pub fn normalize_symbol(raw: &str) -> String {
    raw.trim().to_uppercase()
}
