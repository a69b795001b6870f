//! Alpha Vantage intraday quote adapter.
//!
//! One `GET` per call against `TIME_SERIES_INTRADAY` with the compact output
//! size (about 100 points). The body is handed to
//! [`parse_intraday_str`](crate::domain::intraday::parse_intraday_str);
//! no retry and no caching happen here.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::candle::Candle;
use crate::domain::error::AlphaChartError;
use crate::domain::interval::Interval;
use crate::domain::intraday::parse_intraday_str;
use crate::ports::quote_port::QuotePort;

pub const FUNCTION_INTRADAY: &str = "TIME_SERIES_INTRADAY";
pub const OUTPUT_SIZE: &str = "compact";

pub struct AlphaVantageAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl AlphaVantageAdapter {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AlphaChartError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AlphaChartError::Network {
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Transport errors embed the request URL, which carries the key.
fn network_error(err: reqwest::Error) -> AlphaChartError {
    AlphaChartError::Network {
        reason: err.without_url().to_string(),
    }
}

#[async_trait]
impl QuotePort for AlphaVantageAdapter {
    async fn fetch_candles(
        &self,
        symbol: &str,
        api_key: &str,
        interval: Interval,
    ) -> Result<Vec<Candle>, AlphaChartError> {
        tracing::debug!(symbol, interval = %interval, "requesting intraday series");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("function", FUNCTION_INTRADAY),
                ("symbol", symbol),
                ("interval", interval.as_str()),
                ("apikey", api_key),
                ("outputsize", OUTPUT_SIZE),
            ])
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(symbol, %status, "quote request returned non-success status");
            return Err(AlphaChartError::Network {
                reason: format!("HTTP {}", status),
            });
        }

        let body = response.text().await.map_err(network_error)?;
        let result = parse_intraday_str(&body, interval).into_result();

        match &result {
            Ok(candles) => {
                tracing::info!(symbol, interval = %interval, count = candles.len(), "fetched candles")
            }
            Err(AlphaChartError::MalformedResponse { reason }) => {
                tracing::warn!(symbol, %reason, "malformed intraday response")
            }
            Err(err) => tracing::warn!(symbol, error = %err, "provider rejected request"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_keeps_base_url() {
        let adapter =
            AlphaVantageAdapter::new("http://localhost:1/query", Duration::from_secs(1)).unwrap();
        assert_eq!(adapter.base_url(), "http://localhost:1/query");
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        let adapter =
            AlphaVantageAdapter::new("http://127.0.0.1:9/query", Duration::from_secs(2)).unwrap();
        let err = adapter
            .fetch_candles("IBM", "secret-key", Interval::FiveMin)
            .await
            .unwrap_err();
        assert!(matches!(err, AlphaChartError::Network { .. }));
        assert!(err.to_string().starts_with("Failed to fetch data"));
        assert!(!err.to_string().contains("secret-key"));
    }
}
