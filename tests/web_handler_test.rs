#![cfg(feature = "web")]
//! Web handler integration tests.
//!
//! Tests cover:
//! - Dashboard renders the query form and chart container
//! - Chart fragment states (prompt, loading, chart, error banner)
//! - Query submission updates parameters (htmx fragment vs redirect)
//! - JSON snapshot never exposes the API key
//! - Theme toggle and 404 fallback

mod common;

use alphachart::adapters::file_credential_store::InMemoryCredentialStore;
use alphachart::adapters::refresh_service::RefreshService;
use alphachart::adapters::web::{build_router, AppState};
use alphachart::domain::error::AlphaChartError;
use alphachart::domain::interval::Interval;
use alphachart::domain::query::QueryParams;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use common::*;
use http_body_util::BodyExt;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn create_app(quotes: Arc<ScriptedQuotePort>, params: QueryParams) -> (Router, RefreshService) {
    let refresh = RefreshService::new(
        quotes,
        Arc::new(InMemoryCredentialStore::default()),
        params,
        Duration::from_secs(15),
    );
    let router = build_router(AppState {
        refresh: refresh.clone(),
        rsi_period: 14,
    });
    (router, refresh)
}

async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

fn form_post(uri: &str, form: &str, htmx: bool) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if htmx {
        builder = builder.header("HX-Request", "true");
    }
    builder.body(Body::from(form.to_string())).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(body.to_vec()).unwrap()
}

mod dashboard {
    use super::*;

    #[tokio::test]
    async fn renders_form_and_chart_container() {
        let (app, _) = create_app(
            Arc::new(ScriptedQuotePort::new()),
            QueryParams::new("BTCUSD", Interval::FifteenMin, "secret"),
        );
        let (status, body) = get(app, "/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<!DOCTYPE html>"));
        assert!(body.contains(r#"type="password""#));
        assert!(body.contains(r#"name="symbol" value="BTCUSD""#));
        assert!(body.contains(r#"<option value="15min" selected>"#));
        assert!(body.contains(r#"id="chart""#));
        assert!(body.contains("Refresh"));
        assert!(body.contains("htmx.org"));
    }

    #[tokio::test]
    async fn theme_toggle_links_to_other_theme() {
        let (app, _) = create_app(Arc::new(ScriptedQuotePort::new()), QueryParams::default());
        let (_, body) = get(app.clone(), "/").await;
        assert!(body.contains("theme-dark"));
        assert!(body.contains(r#"href="/?theme=light""#));

        let (_, body) = get(app, "/?theme=light").await;
        assert!(body.contains("theme-light"));
        assert!(body.contains(r#"href="/?theme=dark""#));
    }

    #[tokio::test]
    async fn page_does_not_leak_server_key() {
        let (app, _) = create_app(
            Arc::new(ScriptedQuotePort::new()),
            QueryParams::new("IBM", Interval::FiveMin, "SECRETKEY123"),
        );
        let (status, body) = get(app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(!body.contains("SECRETKEY123"));
        assert!(body.contains(r#"placeholder="key set""#));
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let (app, _) = create_app(Arc::new(ScriptedQuotePort::new()), QueryParams::default());
        let (status, body) = get(app, "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Page not found"));
    }
}

mod chart {
    use super::*;

    #[tokio::test]
    async fn prompts_for_key_and_symbol() {
        let (app, _) = create_app(
            Arc::new(ScriptedQuotePort::new()),
            QueryParams::new("BTCUSD", Interval::FiveMin, ""),
        );
        let (status, body) = get(app, "/chart").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Enter API key and symbol"));
        assert!(!body.contains("<svg"));
    }

    #[tokio::test]
    async fn shows_loading_while_first_fetch_in_flight() {
        let quotes = Arc::new(ScriptedQuotePort::new().then_ok(30, generate_candles(3, 1.0)));
        let (app, refresh) = create_app(quotes, QueryParams::new("IBM", Interval::FiveMin, "k"));
        refresh.mount();

        let (_, body) = get(app, "/chart").await;
        assert!(body.contains("Loading..."));
        refresh.shutdown();
    }

    #[tokio::test]
    async fn renders_svg_after_fetch() {
        let quotes = Arc::new(ScriptedQuotePort::new().then_ok(0, generate_candles(20, 100.0)));
        let (app, refresh) = create_app(quotes, QueryParams::new("IBM", Interval::FiveMin, "k"));
        refresh.mount().unwrap().await.unwrap();

        let (_, body) = get(app, "/chart?theme=light").await;
        assert!(body.contains("<svg"));
        assert!(body.contains("theme-light"));
        assert_eq!(body.matches(r#"<g class="bar">"#).count(), 20);
        assert!(body.contains(r#"hx-trigger="every 15s""#));
        assert!(body.contains("Updated "));
        refresh.shutdown();
    }

    #[tokio::test]
    async fn rate_limit_banner_replaces_note() {
        let quotes = Arc::new(ScriptedQuotePort::new().then_err(
            0,
            AlphaChartError::RateLimited {
                message: "Our standard API call frequency is 5 calls per minute.".into(),
            },
        ));
        let (app, refresh) = create_app(quotes, QueryParams::new("IBM", Interval::FiveMin, "k"));
        refresh.mount().unwrap().await.unwrap();

        let (_, body) = get(app, "/chart").await;
        assert!(body.contains("banner-rate-limit"));
        assert!(body.contains("Rate limit hit. Using demo key? Wait 1 min or use your own key."));
        assert!(!body.contains("5 calls per minute"));
        refresh.shutdown();
    }

    #[tokio::test]
    async fn provider_error_shown_verbatim() {
        let quotes = Arc::new(ScriptedQuotePort::new().then_err(
            0,
            AlphaChartError::Provider {
                message: "Invalid API call.".into(),
            },
        ));
        let (app, refresh) = create_app(quotes, QueryParams::new("NOPE", Interval::FiveMin, "k"));
        refresh.mount().unwrap().await.unwrap();

        let (status, body) = get(app, "/chart").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("banner-provider"));
        assert!(body.contains("Invalid API call."));
        refresh.shutdown();
    }

    #[tokio::test]
    async fn network_failure_shows_generic_banner() {
        let quotes = Arc::new(ScriptedQuotePort::new().then_err(
            0,
            AlphaChartError::Network {
                reason: "HTTP 503 Service Unavailable".into(),
            },
        ));
        let (app, refresh) = create_app(quotes, QueryParams::new("IBM", Interval::FiveMin, "k"));
        refresh.mount().unwrap().await.unwrap();

        let (_, body) = get(app.clone(), "/chart").await;
        assert!(body.contains("banner-generic"));
        assert!(body.contains("Failed to fetch data"));
        assert!(!body.contains("503"));

        let (_, json) = get(app, "/api/candles").await;
        let json: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(json["banner"], "Failed to fetch data");
        refresh.shutdown();
    }
}

mod query {
    use super::*;

    #[tokio::test]
    async fn htmx_submission_returns_fragment_and_fetches() {
        let quotes = Arc::new(ScriptedQuotePort::new());
        let (app, refresh) = create_app(quotes.clone(), QueryParams::default());

        let response = app
            .oneshot(form_post(
                "/query",
                "api_key=abc&symbol=aapl&interval=60min",
                true,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains(r#"id="chart""#));
        assert!(!body.contains("<!DOCTYPE html>"));

        let params = refresh.params();
        assert_eq!(params.symbol, "AAPL");
        assert_eq!(params.interval, Interval::SixtyMin);
        assert_eq!(params.api_key, "abc");

        tokio::time::sleep(Duration::from_millis(50)).await;
        let calls = quotes.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].symbol, "AAPL");
        refresh.shutdown();
    }

    #[tokio::test]
    async fn plain_submission_redirects_home() {
        let (app, refresh) = create_app(Arc::new(ScriptedQuotePort::new()), QueryParams::default());
        let response = app
            .oneshot(form_post("/query", "api_key=&symbol=ibm&interval=5min", false))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/?theme=dark");
        refresh.shutdown();
    }

    #[tokio::test]
    async fn blank_key_field_keeps_current_key() {
        let quotes = Arc::new(ScriptedQuotePort::new());
        let (app, refresh) = create_app(
            quotes.clone(),
            QueryParams::new("IBM", Interval::FiveMin, "stored-key"),
        );

        let response = app
            .oneshot(form_post("/query", "api_key=&symbol=msft&interval=5min", true))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(refresh.params().api_key, "stored-key");
        assert_eq!(refresh.params().symbol, "MSFT");

        tokio::time::sleep(Duration::from_millis(50)).await;
        let calls = quotes.calls();
        assert_eq!(calls[0].symbol, "MSFT");
        assert_eq!(calls[0].api_key, "stored-key");
        refresh.shutdown();
    }

    #[tokio::test]
    async fn unknown_interval_is_bad_request() {
        let (app, _) = create_app(Arc::new(ScriptedQuotePort::new()), QueryParams::default());
        let response = app
            .oneshot(form_post("/query", "api_key=k&symbol=ibm&interval=2h", true))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_string(response).await.contains("unknown interval"));
    }

    #[tokio::test]
    async fn manual_refresh_triggers_fetch() {
        let quotes = Arc::new(ScriptedQuotePort::new());
        let (app, refresh) = create_app(quotes.clone(), QueryParams::new("IBM", Interval::FiveMin, "k"));

        let response = app
            .oneshot(form_post("/refresh", "", true))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(quotes.call_count(), 1);
        refresh.shutdown();
    }
}

mod api {
    use super::*;

    #[tokio::test]
    async fn snapshot_json_hides_key() {
        let quotes = Arc::new(ScriptedQuotePort::new().then_ok(0, generate_candles(16, 50.0)));
        let (app, refresh) = create_app(
            quotes,
            QueryParams::new("BTCUSD", Interval::FiveMin, "top-secret"),
        );
        refresh.mount().unwrap().await.unwrap();

        let (status, body) = get(app, "/api/candles").await;
        assert_eq!(status, StatusCode::OK);
        assert!(!body.contains("top-secret"));

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["params"]["symbol"], "BTCUSD");
        assert_eq!(json["params"]["interval"], "5min");
        assert_eq!(json["params"]["has_api_key"], true);
        assert_eq!(json["phase"], "success");
        assert_eq!(json["candles"].as_array().unwrap().len(), 16);

        let rsi = json["rsi"].as_array().unwrap();
        assert_eq!(rsi.len(), 16);
        assert!(rsi[13].is_null());
        assert!(rsi[14].is_number());
        refresh.shutdown();
    }
}
