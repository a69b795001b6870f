#![allow(dead_code)]

use alphachart::domain::candle::Candle;
use alphachart::domain::error::AlphaChartError;
use alphachart::domain::interval::Interval;
use alphachart::ports::quote_port::QuotePort;
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use serde_json::{json, Map, Value};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub symbol: String,
    pub api_key: String,
    pub interval: Interval,
}

pub struct ScriptedResponse {
    pub delay: Duration,
    pub result: Result<Vec<Candle>, AlphaChartError>,
}

/// Quote port that replays scripted responses in call order and records
/// every call. Once the script runs out it answers with `fallback_candles`.
pub struct ScriptedQuotePort {
    script: Mutex<VecDeque<ScriptedResponse>>,
    calls: Mutex<Vec<RecordedCall>>,
    fallback_candles: Vec<Candle>,
}

impl ScriptedQuotePort {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            fallback_candles: generate_candles(3, 100.0),
        }
    }

    pub fn then_ok(self, delay_secs: u64, candles: Vec<Candle>) -> Self {
        self.push(delay_secs, Ok(candles))
    }

    pub fn then_err(self, delay_secs: u64, err: AlphaChartError) -> Self {
        self.push(delay_secs, Err(err))
    }

    fn push(self, delay_secs: u64, result: Result<Vec<Candle>, AlphaChartError>) -> Self {
        self.script.lock().unwrap().push_back(ScriptedResponse {
            delay: Duration::from_secs(delay_secs),
            result,
        });
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl QuotePort for ScriptedQuotePort {
    async fn fetch_candles(
        &self,
        symbol: &str,
        api_key: &str,
        interval: Interval,
    ) -> Result<Vec<Candle>, AlphaChartError> {
        self.calls.lock().unwrap().push(RecordedCall {
            symbol: symbol.to_string(),
            api_key: api_key.to_string(),
            interval,
        });
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(step) => {
                if !step.delay.is_zero() {
                    tokio::time::sleep(step.delay).await;
                }
                step.result
            }
            None => Ok(self.fallback_candles.clone()),
        }
    }
}

/// Ascending 5-minute candles starting 2024-01-15 09:30 UTC, alternating
/// up and down bars.
pub fn generate_candles(count: usize, start_price: f64) -> Vec<Candle> {
    let start = Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap();
    (0..count)
        .map(|i| {
            let open = start_price + i as f64;
            let close = if i % 2 == 0 { open + 0.5 } else { open - 0.25 };
            Candle {
                date: start + ChronoDuration::minutes(5 * i as i64),
                open,
                high: open.max(close) + 0.25,
                low: open.min(close) - 0.25,
                close,
                volume: 1000.0 + i as f64,
            }
        })
        .collect()
}

/// One series entry in the provider's string-typed wire format.
pub fn wire_entry(open: &str, high: &str, low: &str, close: &str, volume: &str) -> Value {
    json!({
        "1. open": open,
        "2. high": high,
        "3. low": low,
        "4. close": close,
        "5. volume": volume,
    })
}

/// Full intraday body with the series under `Time Series (<interval>)`.
pub fn intraday_body(interval: Interval, entries: &[(&str, Value)]) -> Value {
    let mut series = Map::new();
    for (stamp, entry) in entries {
        series.insert(stamp.to_string(), entry.clone());
    }
    let mut root = Map::new();
    root.insert(
        "Meta Data".to_string(),
        json!({ "1. Information": "Intraday", "4. Interval": interval.as_str() }),
    );
    root.insert(interval.series_key(), Value::Object(series));
    Value::Object(root)
}

#[cfg(feature = "web")]
pub mod provider {
    //! Local stand-in for the quote API.

    use axum::{
        Router,
        extract::{Query, State},
        http::StatusCode,
        response::IntoResponse,
        routing::get,
    };
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Clone)]
    struct ProviderState {
        status: StatusCode,
        body: String,
        requests: Arc<Mutex<Vec<HashMap<String, String>>>>,
    }

    pub struct MockProvider {
        pub base_url: String,
        requests: Arc<Mutex<Vec<HashMap<String, String>>>>,
    }

    impl MockProvider {
        pub fn requests(&self) -> Vec<HashMap<String, String>> {
            self.requests.lock().unwrap().clone()
        }
    }

    async fn query(
        State(state): State<ProviderState>,
        Query(params): Query<HashMap<String, String>>,
    ) -> impl IntoResponse {
        state.requests.lock().unwrap().push(params);
        (
            state.status,
            [("content-type", "application/json")],
            state.body.clone(),
        )
    }

    /// Serves `body` with `status` at `/query` on an ephemeral port.
    pub async fn spawn(status: StatusCode, body: impl Into<String>) -> MockProvider {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = ProviderState {
            status,
            body: body.into(),
            requests: requests.clone(),
        };
        let app = Router::new().route("/query", get(query)).with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        MockProvider {
            base_url: format!("http://{}/query", addr),
            requests,
        }
    }
}
