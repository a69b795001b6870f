//! HTTP request handlers for web adapter.

use askama::Template;
use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::adapters::chart_svg::Theme;
use crate::domain::indicator::calculate_rsi;
use crate::domain::interval::Interval;
use crate::domain::refresh::RefreshSnapshot;

use super::templates::{ChartTemplate, DashboardTemplate};
use super::{is_htmx_request, AppState, WebError};

#[derive(Debug, Default, Deserialize)]
pub struct ThemeQuery {
    pub theme: Option<String>,
}

impl ThemeQuery {
    /// Unknown or missing values fall back to the dark theme.
    pub fn theme(&self) -> Theme {
        self.theme
            .as_deref()
            .and_then(|t| t.parse().ok())
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
pub struct QueryForm {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub interval: String,
}

fn render_chart_fragment(state: &AppState, theme: Theme) -> Result<String, WebError> {
    let snapshot = state.refresh.snapshot();
    let template = ChartTemplate::from_snapshot(
        &snapshot,
        theme,
        state.refresh.poll_interval().as_secs(),
        state.rsi_period,
    );
    Ok(template.render()?)
}

/// Chart fragment for htmx callers, redirect back to the page otherwise.
fn chart_or_redirect(
    state: &AppState,
    headers: &HeaderMap,
    theme: Theme,
) -> Result<Response, WebError> {
    if is_htmx_request(headers) {
        Ok(Html(render_chart_fragment(state, theme)?).into_response())
    } else {
        Ok(Redirect::to(&format!("/?theme={}", theme)).into_response())
    }
}

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ThemeQuery>,
) -> Result<Html<String>, WebError> {
    let theme = query.theme();
    let params = state.refresh.params();
    let chart = render_chart_fragment(&state, theme)?;
    let template = DashboardTemplate::new(&params, theme, &chart);
    Ok(Html(template.render()?))
}

pub async fn chart(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ThemeQuery>,
) -> Result<Html<String>, WebError> {
    Ok(Html(render_chart_fragment(&state, query.theme())?))
}

pub async fn update_query(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ThemeQuery>,
    Form(form): Form<QueryForm>,
) -> Result<Response, WebError> {
    let interval = if form.interval.trim().is_empty() {
        Interval::default()
    } else {
        form.interval
            .parse::<Interval>()
            .map_err(|e| WebError::bad_request(e.to_string()))?
    };
    let params = state
        .refresh
        .params()
        .resubmitted(&form.symbol, interval, &form.api_key);
    tracing::info!(symbol = %params.symbol, interval = %params.interval, "query parameters submitted");
    state.refresh.update_params(params);

    chart_or_redirect(&state, &headers, query.theme())
}

pub async fn refresh(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ThemeQuery>,
) -> Result<Response, WebError> {
    if state.refresh.refresh().is_some() {
        tracing::debug!("manual refresh started");
    }
    chart_or_redirect(&state, &headers, query.theme())
}

#[derive(Debug, Serialize)]
pub struct CandlesResponse {
    #[serde(flatten)]
    pub snapshot: RefreshSnapshot,
    pub rsi: Vec<Option<f64>>,
    pub banner: Option<String>,
}

pub async fn candles_json(State(state): State<Arc<AppState>>) -> Json<CandlesResponse> {
    let snapshot = state.refresh.snapshot();
    let rsi = calculate_rsi(&snapshot.candles, state.rsi_period)
        .valid_values()
        .collect();
    let banner = match (&snapshot.error, snapshot.error_class) {
        (Some(message), Some(class)) => Some(class.banner_text(message)),
        _ => None,
    };
    Json(CandlesResponse {
        snapshot,
        rsi,
        banner,
    })
}

pub async fn not_found() -> WebError {
    WebError::not_found("Page not found")
}
