//! Server-side candlestick chart rendered as inline SVG.

use std::fmt::Write as _;

use crate::models::PriceSeries;

const UP_COLOR: &str = "#26a69a";
const DOWN_COLOR: &str = "#ef5350";
const MA50_COLOR: &str = "#1f77b4";
const MA200_COLOR: &str = "#ff7f0e";

#[derive(Debug, Clone, Copy)]
pub struct ChartOptions {
    pub width: u32,
    pub height: u32,
    /// Space reserved on the left for the price axis
    pub margin_left: u32,
    pub margin: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 960,
            height: 420,
            margin_left: 64,
            margin: 16,
        }
    }
}

/// Candles plus MA50 (blue) and MA200 (orange) overlays.
///
/// The overlay slices are aligned with `prices.bars`; `None` points are
/// skipped and break the line.
pub fn render_candlestick_svg(
    prices: &PriceSeries,
    ma50: &[Option<f64>],
    ma200: &[Option<f64>],
    options: ChartOptions,
) -> String {
    let w = options.width as f64;
    let h = options.height as f64;
    let mut svg = String::new();

    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" class="price-chart" viewBox="0 0 {w} {h}" width="{w}" height="{h}" role="img">"#
    );

    if prices.is_empty() {
        let _ = write!(
            svg,
            r##"<text x="{}" y="{}" text-anchor="middle" fill="#888">No price data</text></svg>"##,
            w / 2.0,
            h / 2.0
        );
        return svg;
    }

    let overlay_values = ma50.iter().chain(ma200.iter()).filter_map(|v| *v);
    let (mut low, mut high) = prices
        .bars
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), b| (lo.min(b.low), hi.max(b.high)));
    for v in overlay_values {
        low = low.min(v);
        high = high.max(v);
    }
    if (high - low).abs() < f64::EPSILON {
        high += 1.0;
        low -= 1.0;
    }

    let left = options.margin_left as f64;
    let top = options.margin as f64;
    let plot_w = (w - left - options.margin as f64).max(1.0);
    let plot_h = (h - top - options.margin as f64).max(1.0);

    let slot = plot_w / prices.len() as f64;
    let body_w = (slot * 0.7).max(1.0);
    let x_center = |i: usize| left + slot * (i as f64 + 0.5);
    let y = |price: f64| top + (high - price) / (high - low) * plot_h;

    // axis
    let _ = write!(
        svg,
        r##"<line x1="{left}" y1="{top}" x2="{left}" y2="{:.2}" stroke="#999"/>"##,
        top + plot_h
    );
    for price in [high, (high + low) / 2.0, low] {
        let py = y(price);
        let _ = write!(
            svg,
            r##"<text class="axis-label" x="{:.2}" y="{:.2}" text-anchor="end" font-size="11" fill="#555">{:.2}</text>"##,
            left - 6.0,
            py + 4.0,
            price
        );
        let _ = write!(
            svg,
            r##"<line x1="{left}" y1="{py:.2}" x2="{:.2}" y2="{py:.2}" stroke="#eee"/>"##,
            left + plot_w
        );
    }

    for (i, bar) in prices.bars.iter().enumerate() {
        let color = if bar.close >= bar.open { UP_COLOR } else { DOWN_COLOR };
        let cx = x_center(i);
        let body_top = y(bar.open.max(bar.close));
        let body_h = (y(bar.open.min(bar.close)) - body_top).max(1.0);

        let _ = write!(
            svg,
            r#"<g class="candle"><title>{} O {:.2} H {:.2} L {:.2} C {:.2}</title><line x1="{cx:.2}" y1="{:.2}" x2="{cx:.2}" y2="{:.2}" stroke="{color}"/><rect x="{:.2}" y="{body_top:.2}" width="{body_w:.2}" height="{body_h:.2}" fill="{color}"/></g>"#,
            bar.date,
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            y(bar.high),
            y(bar.low),
            cx - body_w / 2.0,
        );
    }

    for (series, color, class) in [(ma50, MA50_COLOR, "ma50"), (ma200, MA200_COLOR, "ma200")] {
        for run in overlay_runs(series) {
            if run.len() < 2 {
                continue;
            }
            let points: Vec<String> = run
                .iter()
                .map(|(i, v)| format!("{:.2},{:.2}", x_center(*i), y(*v)))
                .collect();
            let _ = write!(
                svg,
                r#"<polyline class="{class}" fill="none" stroke="{color}" stroke-width="1.5" points="{}"/>"#,
                points.join(" ")
            );
        }
    }

    svg.push_str("</svg>");
    svg
}

/// Contiguous stretches of defined points
fn overlay_runs(series: &[Option<f64>]) -> Vec<Vec<(usize, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for (i, value) in series.iter().enumerate() {
        match value {
            Some(v) => current.push((i, *v)),
            None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}
