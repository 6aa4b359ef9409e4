//! Plain-text rendering of the stock screen for terminals

use super::{backend::StockBackend, view::ClientView};
use crate::{
    models::{Algorithm, HistorySummary, PredictionResult, PricePoint, Trend},
    utils::{format_count, format_percentage_with_sign, format_price},
};
use std::fmt::Write;

pub const CURRENCY: &str = "₹";
pub const CHART_HEIGHT: usize = 10;

pub fn render_summary(symbol: &str, summary: &HistorySummary) -> String {
    let arrow = if summary.day_change_percent >= 0.0 { "▲" } else { "▼" };
    format!(
        "{symbol}\n  Latest Price    {CURRENCY}{}  {arrow} {}\n  Trading Volume  {} shares\n",
        format_price(summary.latest_close),
        format_percentage_with_sign(summary.day_change_percent),
        format_count(summary.volume),
    )
}

/// Close prices as a column chart, oldest on the left. `points` is
/// most-recent-first, as the history endpoint returns it.
pub fn render_chart(points: &[PricePoint], height: usize) -> String {
    if points.is_empty() || height == 0 {
        return String::new();
    }

    let chronological: Vec<&PricePoint> = points.iter().rev().collect();
    let (min, max) = chronological
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.close), hi.max(p.close))
        });
    let span = max - min;

    // Row each close reaches, 1..=height
    let levels: Vec<usize> = chronological
        .iter()
        .map(|p| {
            if span == 0.0 {
                height
            } else {
                1 + (((p.close - min) / span) * (height - 1) as f64).round() as usize
            }
        })
        .collect();

    let max_label = format_price(max);
    let min_label = format_price(min);
    let width = max_label.len().max(min_label.len());

    let mut out = String::new();
    for row in (1..=height).rev() {
        let label = match row {
            r if r == height => max_label.as_str(),
            1 => min_label.as_str(),
            _ => "",
        };
        let bars: String = levels
            .iter()
            .map(|&level| if level >= row { '█' } else { ' ' })
            .collect();
        let _ = writeln!(out, "{label:>width$} │{}", bars.trim_end());
    }

    let first = chronological[0].date.format("%b %-d").to_string();
    let last = chronological[chronological.len() - 1].date.format("%b %-d").to_string();
    let _ = writeln!(out, "{:>width$} └{}", "", "─".repeat(levels.len()));
    let gap = levels.len().saturating_sub(first.len() + last.len()).max(1);
    let _ = writeln!(out, "{:>width$}  {first}{}{last}", "", " ".repeat(gap));
    out
}

pub fn render_prediction(algorithm: &Algorithm, result: &PredictionResult) -> String {
    let arrow = match result.trend {
        Trend::Up => "▲",
        Trend::Down => "▼",
        Trend::Other(_) => "•",
    };
    let mut out = format!(
        "Local Model ({}) Results\n  Predicted Trend  {arrow} {}\n",
        algorithm.label(),
        result.trend
    );
    for (key, value) in &result.extra {
        let _ = writeln!(out, "  {key}  {value}");
    }
    out
}

/// The whole screen in its current state
pub fn render_view<B: StockBackend>(view: &ClientView<B>) -> String {
    let mut out = String::new();

    if !view.suggestions().is_empty() {
        let _ = writeln!(out, "Suggestions: {}\n", view.suggestions().join(", "));
    }
    if let Some(error) = view.error() {
        let _ = writeln!(out, "Error: {error}\n");
    }

    if let (Some(symbol), Some(history)) = (view.selected(), view.history()) {
        out.push_str(&render_summary(symbol, &history.info));
        out.push('\n');
        out.push_str(&render_chart(&history.data, CHART_HEIGHT));
        out.push('\n');
    }

    if view.is_loading() {
        out.push_str("Analyzing...\n");
    } else if let Some(prediction) = view.prediction() {
        out.push_str(&render_prediction(view.algorithm(), prediction));
    }
    out
}
