//! HTML templates using Askama.

use askama::Template;

use crate::adapters::chart_svg::{render_chart, Theme};
use crate::domain::error::ErrorClass;
use crate::domain::indicator::calculate_rsi;
use crate::domain::interval::Interval;
use crate::domain::query::QueryParams;
use crate::domain::refresh::{RefreshPhase, RefreshSnapshot};

pub const PROMPT_MESSAGE: &str = "Enter API key and symbol";
pub const LOADING_MESSAGE: &str = "Loading...";
pub const NO_DATA_MESSAGE: &str = "No data";

pub struct IntervalOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

pub fn interval_options(current: Interval) -> Vec<IntervalOption> {
    Interval::ALL
        .iter()
        .map(|&i| IntervalOption {
            value: i.as_str(),
            label: i.label(),
            selected: i == current,
        })
        .collect()
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate<'a> {
    pub has_api_key: bool,
    pub symbol: &'a str,
    pub intervals: Vec<IntervalOption>,
    pub theme: &'a str,
    pub toggle_theme: &'a str,
    pub chart: &'a str,
}

impl<'a> DashboardTemplate<'a> {
    pub fn new(params: &'a QueryParams, theme: Theme, chart: &'a str) -> Self {
        Self {
            has_api_key: !params.api_key.is_empty(),
            symbol: &params.symbol,
            intervals: interval_options(params.interval),
            theme: theme.as_str(),
            toggle_theme: theme.toggled().as_str(),
            chart,
        }
    }
}

/// The `#chart` element. It re-polls itself, so every swap keeps polling.
#[derive(Template)]
#[template(path = "chart.html")]
pub struct ChartTemplate {
    pub theme: &'static str,
    pub poll_secs: u64,
    pub loading: bool,
    pub has_banner: bool,
    pub banner: String,
    pub banner_class: &'static str,
    pub placeholder: String,
    pub svg: String,
    pub last_updated: String,
}

impl ChartTemplate {
    pub fn from_snapshot(
        snapshot: &RefreshSnapshot,
        theme: Theme,
        poll_secs: u64,
        rsi_period: usize,
    ) -> Self {
        let (has_banner, banner, banner_class) = match (&snapshot.error, snapshot.error_class) {
            (Some(message), Some(class)) => (true, class.banner_text(message), banner_class(class)),
            _ => (false, String::new(), ""),
        };

        let ready = !snapshot.params.symbol.is_empty() && snapshot.params.has_api_key;
        let (placeholder, svg) = if !ready {
            (PROMPT_MESSAGE.to_string(), String::new())
        } else if snapshot.candles.is_empty() {
            let message = match snapshot.phase {
                RefreshPhase::Idle | RefreshPhase::Loading => LOADING_MESSAGE,
                RefreshPhase::Success | RefreshPhase::Failed => NO_DATA_MESSAGE,
            };
            (message.to_string(), String::new())
        } else {
            let rsi = calculate_rsi(&snapshot.candles, rsi_period);
            let caption = format!("{} {}", snapshot.params.symbol, snapshot.params.interval);
            (String::new(), render_chart(&snapshot.candles, &rsi, theme, &caption))
        };

        Self {
            theme: theme.as_str(),
            poll_secs,
            loading: snapshot.loading,
            has_banner,
            banner,
            banner_class,
            placeholder,
            svg,
            last_updated: snapshot
                .last_updated
                .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_default(),
        }
    }
}

fn banner_class(class: ErrorClass) -> &'static str {
    match class {
        ErrorClass::RateLimit => "banner-rate-limit",
        ErrorClass::Provider => "banner-provider",
        ErrorClass::Generic => "banner-generic",
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate<'a> {
    pub message: &'a str,
    pub status: u16,
}
