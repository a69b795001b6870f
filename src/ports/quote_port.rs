//! Market data port trait.

use async_trait::async_trait;

use crate::domain::candle::Candle;
use crate::domain::error::AlphaChartError;
use crate::domain::interval::Interval;

/// Source of intraday candles.
#[async_trait]
pub trait QuotePort: Send + Sync {
    /// Fetch the compact intraday window for `symbol`.
    ///
    /// One outbound request per call. On success the candles are sorted
    /// ascending by date with unique dates; the call either fully succeeds or
    /// fully fails.
    async fn fetch_candles(
        &self,
        symbol: &str,
        api_key: &str,
        interval: Interval,
    ) -> Result<Vec<Candle>, AlphaChartError>;
}
