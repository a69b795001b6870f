//! SVG candlestick chart with an RSI panel underneath.
//!
//! Bars are spaced by index, not by time, so gaps in the session do not
//! leave holes. Each bar carries a `<title>` readout and its own crosshair
//! lines, revealed on hover by the embedded stylesheet.

use std::fmt;
use std::str::FromStr;

use crate::domain::candle::Candle;
use crate::domain::indicator::IndicatorSeries;

const WIDTH: f64 = 960.0;
const HEIGHT: f64 = 600.0;
const MARGIN_LEFT: f64 = 50.0;
const MARGIN_RIGHT: f64 = 60.0;
const MARGIN_TOP: f64 = 10.0;
const MARGIN_BOTTOM: f64 = 30.0;
const PRICE_PANEL_HEIGHT: f64 = 400.0;
const PANEL_GAP: f64 = 20.0;
const PRICE_TICKS: usize = 5;
const TIME_LABELS: usize = 6;

pub const RSI_OVERSOLD: f64 = 30.0;
pub const RSI_OVERBOUGHT: f64 = 70.0;
pub const BULLISH_COLOR: &str = "#22c55e";
pub const BEARISH_COLOR: &str = "#ef4444";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

pub struct Palette {
    pub background: &'static str,
    pub grid: &'static str,
    pub text: &'static str,
    pub rsi: &'static str,
    pub crosshair: &'static str,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            Theme::Dark => Palette {
                background: "#0f172a",
                grid: "#1e293b",
                text: "#94a3b8",
                rsi: "#a78bfa",
                crosshair: "#64748b",
            },
            Theme::Light => Palette {
                background: "#ffffff",
                grid: "#e2e8f0",
                text: "#475569",
                rsi: "#7c3aed",
                crosshair: "#94a3b8",
            },
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => Err(format!("unknown theme '{}'", other)),
        }
    }
}

struct Layout {
    left: f64,
    right: f64,
    price_top: f64,
    price_bottom: f64,
    rsi_top: f64,
    rsi_bottom: f64,
    slot: f64,
    min_price: f64,
    max_price: f64,
}

impl Layout {
    fn new(candles: &[Candle]) -> Self {
        let left = MARGIN_LEFT;
        let right = WIDTH - MARGIN_RIGHT;
        let price_top = MARGIN_TOP;
        let price_bottom = price_top + PRICE_PANEL_HEIGHT;
        let rsi_top = price_bottom + PANEL_GAP;
        let rsi_bottom = HEIGHT - MARGIN_BOTTOM;

        let low = candles.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
        let high = candles
            .iter()
            .map(|c| c.high)
            .fold(f64::NEG_INFINITY, f64::max);
        let range = high - low;
        let pad = if range > 0.0 {
            range * 0.05
        } else {
            (high.abs() * 0.01).max(1.0)
        };

        Self {
            left,
            right,
            price_top,
            price_bottom,
            rsi_top,
            rsi_bottom,
            slot: (right - left) / candles.len().max(1) as f64,
            min_price: low - pad,
            max_price: high + pad,
        }
    }

    fn x(&self, index: usize) -> f64 {
        self.left + self.slot * (index as f64 + 0.5)
    }

    fn price_y(&self, price: f64) -> f64 {
        let span = self.max_price - self.min_price;
        self.price_bottom - (price - self.min_price) / span * (self.price_bottom - self.price_top)
    }

    fn rsi_y(&self, value: f64) -> f64 {
        self.rsi_bottom - value.clamp(0.0, 100.0) / 100.0 * (self.rsi_bottom - self.rsi_top)
    }

    fn body_width(&self) -> f64 {
        (self.slot * 0.7).max(1.0)
    }
}

/// Renders the full chart. An empty slice yields a chart frame with a
/// "No data" notice.
pub fn render_chart(candles: &[Candle], rsi: &IndicatorSeries, theme: Theme, caption: &str) -> String {
    let palette = theme.palette();
    let mut svg = String::new();

    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" class="candle-chart theme-{}" viewBox="0 0 {} {}" width="100%" preserveAspectRatio="xMidYMid meet" font-family="sans-serif" font-size="11">"#,
        theme, WIDTH, HEIGHT
    ));
    svg.push_str(&format!(
        "<style>.crosshair{{visibility:hidden;pointer-events:none}}.bar:hover .crosshair{{visibility:visible}}.hit{{fill:transparent}}text{{fill:{}}}</style>",
        palette.text
    ));
    svg.push_str(&format!(
        r#"<rect x="0" y="0" width="{}" height="{}" fill="{}"/>"#,
        WIDTH, HEIGHT, palette.background
    ));

    if candles.is_empty() {
        svg.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="16">No data</text></svg>"#,
            WIDTH / 2.0,
            HEIGHT / 2.0
        ));
        return svg;
    }

    let layout = Layout::new(candles);

    svg.push_str(&format!(
        r#"<text x="{:.1}" y="{:.1}" font-size="13" font-weight="bold">{}</text>"#,
        layout.left + 4.0,
        layout.price_top + 14.0,
        escape_xml(caption)
    ));

    push_price_grid(&mut svg, &layout, &palette);
    push_rsi_frame(&mut svg, &layout, &palette, rsi);
    push_time_labels(&mut svg, &layout, candles);
    push_rsi_line(&mut svg, &layout, &palette, rsi);

    for (i, candle) in candles.iter().enumerate() {
        push_bar(&mut svg, &layout, &palette, i, candle, rsi_at(rsi, i));
    }

    svg.push_str("</svg>");
    svg
}

fn push_price_grid(svg: &mut String, layout: &Layout, palette: &Palette) {
    for step in 0..PRICE_TICKS {
        let price = layout.min_price
            + (layout.max_price - layout.min_price) * step as f64 / (PRICE_TICKS - 1) as f64;
        let y = layout.price_y(price);
        svg.push_str(&format!(
            r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{}" stroke-width="1"/>"#,
            layout.left, y, layout.right, y, palette.grid
        ));
        svg.push_str(&format!(
            r#"<text class="price-tick" x="{:.1}" y="{:.1}" dominant-baseline="middle">{:.2}</text>"#,
            layout.right + 6.0,
            y,
            price
        ));
    }
}

fn push_rsi_frame(svg: &mut String, layout: &Layout, palette: &Palette, rsi: &IndicatorSeries) {
    svg.push_str(&format!(
        r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="none" stroke="{}"/>"#,
        layout.left,
        layout.rsi_top,
        layout.right - layout.left,
        layout.rsi_bottom - layout.rsi_top,
        palette.grid
    ));
    for level in [RSI_OVERSOLD, RSI_OVERBOUGHT] {
        let y = layout.rsi_y(level);
        svg.push_str(&format!(
            r#"<line class="rsi-guide" x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{}" stroke-dasharray="4 3"/>"#,
            layout.left, y, layout.right, y, palette.crosshair
        ));
        svg.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" dominant-baseline="middle">{:.0}</text>"#,
            layout.right + 6.0,
            y,
            level
        ));
    }
    svg.push_str(&format!(
        r#"<text x="{:.1}" y="{:.1}">{}</text>"#,
        layout.left + 4.0,
        layout.rsi_top + 12.0,
        rsi.indicator_type
    ));
}

fn push_time_labels(svg: &mut String, layout: &Layout, candles: &[Candle]) {
    let step = (candles.len() / TIME_LABELS).max(1);
    for (i, candle) in candles.iter().enumerate().step_by(step) {
        svg.push_str(&format!(
            r#"<text class="time-label" x="{:.1}" y="{:.1}" text-anchor="middle">{}</text>"#,
            layout.x(i),
            layout.rsi_bottom + 18.0,
            candle.date.format("%H:%M")
        ));
    }
}

/// Broken into separate subpaths wherever the series is in warmup.
fn push_rsi_line(svg: &mut String, layout: &Layout, palette: &Palette, rsi: &IndicatorSeries) {
    let mut path = String::new();
    let mut pen_down = false;
    for (i, value) in rsi.valid_values().enumerate() {
        match value {
            Some(v) => {
                let cmd = if pen_down { 'L' } else { 'M' };
                path.push_str(&format!("{}{:.1},{:.1} ", cmd, layout.x(i), layout.rsi_y(v)));
                pen_down = true;
            }
            None => pen_down = false,
        }
    }
    if !path.is_empty() {
        svg.push_str(&format!(
            r#"<path class="rsi-line" d="{}" fill="none" stroke="{}" stroke-width="1.5"/>"#,
            path.trim_end(),
            palette.rsi
        ));
    }
}

fn rsi_at(rsi: &IndicatorSeries, index: usize) -> Option<f64> {
    rsi.values
        .get(index)
        .filter(|p| p.valid)
        .map(|p| p.value)
}

fn push_bar(
    svg: &mut String,
    layout: &Layout,
    palette: &Palette,
    index: usize,
    candle: &Candle,
    rsi: Option<f64>,
) {
    let x = layout.x(index);
    let color = if candle.is_bullish() {
        BULLISH_COLOR
    } else {
        BEARISH_COLOR
    };
    let body_w = layout.body_width();
    let body_top = layout.price_y(candle.body_top());
    let body_h = (layout.price_y(candle.body_bottom()) - body_top).max(1.0);
    let close_y = layout.price_y(candle.close);

    let mut readout = format!(
        "{} O {:.2} H {:.2} L {:.2} C {:.2} V {}",
        candle.date.format("%Y-%m-%d %H:%M"),
        candle.open,
        candle.high,
        candle.low,
        candle.close,
        candle.volume
    );
    if let Some(v) = rsi {
        readout.push_str(&format!(" RSI {:.2}", v));
    }

    svg.push_str(r#"<g class="bar">"#);
    svg.push_str(&format!("<title>{}</title>", escape_xml(&readout)));
    svg.push_str(&format!(
        r#"<rect class="hit" x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}"/>"#,
        x - layout.slot / 2.0,
        layout.price_top,
        layout.slot,
        layout.rsi_bottom - layout.price_top
    ));
    svg.push_str(&format!(
        r#"<line class="crosshair" x1="{x:.1}" y1="{:.1}" x2="{x:.1}" y2="{:.1}" stroke="{}" stroke-dasharray="2 2"/>"#,
        layout.price_top,
        layout.rsi_bottom,
        palette.crosshair
    ));
    svg.push_str(&format!(
        r#"<line class="crosshair" x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{}" stroke-dasharray="2 2"/>"#,
        layout.left, close_y, layout.right, close_y, palette.crosshair
    ));
    svg.push_str(&format!(
        r#"<line class="wick" x1="{x:.1}" y1="{:.1}" x2="{x:.1}" y2="{:.1}" stroke="{}"/>"#,
        layout.price_y(candle.high),
        layout.price_y(candle.low),
        color
    ));
    svg.push_str(&format!(
        r#"<rect class="body" x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}"/>"#,
        x - body_w / 2.0,
        body_top,
        body_w,
        body_h,
        color
    ));
    svg.push_str("</g>");
}

pub fn escape_xml(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}
