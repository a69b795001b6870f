//! Parse-and-validate step for intraday time-series responses.
//!
//! The provider payload is loosely typed: either a `Time Series (<interval>)`
//! object keyed by timestamp, or one of several message fields explaining why
//! there is no data. [`parse_intraday`] turns it into an [`IntradayResponse`]
//! so that nothing downstream inspects raw JSON.
//!
//! Message priority when the series is missing:
//! `Note` > `Error Message` > `Information` > generic failure.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::domain::candle::{sort_and_dedup, Candle};
use crate::domain::error::{AlphaChartError, GENERIC_FETCH_MESSAGE};
use crate::domain::interval::Interval;

pub const FIELD_OPEN: &str = "1. open";
pub const FIELD_HIGH: &str = "2. high";
pub const FIELD_LOW: &str = "3. low";
pub const FIELD_CLOSE: &str = "4. close";
pub const FIELD_VOLUME: &str = "5. volume";

const KEY_NOTE: &str = "Note";
const KEY_ERROR_MESSAGE: &str = "Error Message";
const KEY_INFORMATION: &str = "Information";

#[derive(Debug, Clone, PartialEq)]
pub enum IntradayResponse {
    /// Candles sorted ascending by date, unique dates.
    Candles(Vec<Candle>),
    /// Provider quota notice.
    RateLimited(String),
    /// Provider-reported error such as an unknown symbol or bad key.
    ProviderError(String),
    /// Anything else; carries a diagnostic reason for logs.
    Malformed(String),
}

impl IntradayResponse {
    pub fn into_result(self) -> Result<Vec<Candle>, AlphaChartError> {
        match self {
            IntradayResponse::Candles(candles) => Ok(candles),
            IntradayResponse::RateLimited(message) => Err(AlphaChartError::RateLimited { message }),
            IntradayResponse::ProviderError(message) => Err(AlphaChartError::Provider { message }),
            IntradayResponse::Malformed(reason) => Err(AlphaChartError::MalformedResponse { reason }),
        }
    }
}

pub fn parse_intraday(body: &Value, interval: Interval) -> IntradayResponse {
    let Some(root) = body.as_object() else {
        return IntradayResponse::Malformed("response body is not an object".into());
    };

    let key = interval.series_key();
    match root.get(&key) {
        Some(Value::Object(series)) => match parse_series(series) {
            Ok(candles) => IntradayResponse::Candles(candles),
            Err(reason) => IntradayResponse::Malformed(reason),
        },
        Some(_) => IntradayResponse::Malformed(format!("'{}' is not an object", key)),
        None => missing_series(root),
    }
}

/// Parses a raw body string; invalid JSON is a malformed response.
pub fn parse_intraday_str(body: &str, interval: Interval) -> IntradayResponse {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => parse_intraday(&value, interval),
        Err(e) => IntradayResponse::Malformed(format!("invalid JSON: {}", e)),
    }
}

fn missing_series(root: &Map<String, Value>) -> IntradayResponse {
    if let Some(note) = non_empty_str(root, KEY_NOTE) {
        return IntradayResponse::RateLimited(note.to_string());
    }
    if let Some(message) = non_empty_str(root, KEY_ERROR_MESSAGE) {
        return IntradayResponse::ProviderError(message.to_string());
    }
    if let Some(info) = non_empty_str(root, KEY_INFORMATION) {
        return IntradayResponse::RateLimited(info.to_string());
    }
    IntradayResponse::Malformed(GENERIC_FETCH_MESSAGE.to_string())
}

fn non_empty_str<'a>(root: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    root.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn parse_series(series: &Map<String, Value>) -> Result<Vec<Candle>, String> {
    let mut candles = Vec::with_capacity(series.len());

    for (stamp, entry) in series {
        let date = parse_timestamp(stamp)
            .ok_or_else(|| format!("invalid timestamp '{}'", stamp))?;
        let fields = entry
            .as_object()
            .ok_or_else(|| format!("entry '{}' is not an object", stamp))?;

        candles.push(Candle {
            date,
            open: decimal_field(fields, FIELD_OPEN, stamp)?,
            high: decimal_field(fields, FIELD_HIGH, stamp)?,
            low: decimal_field(fields, FIELD_LOW, stamp)?,
            close: decimal_field(fields, FIELD_CLOSE, stamp)?,
            volume: decimal_field(fields, FIELD_VOLUME, stamp)?,
        });
    }

    sort_and_dedup(&mut candles);
    Ok(candles)
}

fn decimal_field(fields: &Map<String, Value>, name: &str, stamp: &str) -> Result<f64, String> {
    let value = fields
        .get(name)
        .ok_or_else(|| format!("entry '{}' missing '{}'", stamp, name))?;

    let parsed = match value {
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };

    parsed
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("entry '{}' has non-numeric '{}': {}", stamp, name, value))
}

/// Accepts `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD HH:MM`, RFC 3339 and bare
/// dates. Naive values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M") {
        return Some(dt.and_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
