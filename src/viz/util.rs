//! Colours, axis ranges and tick formatting shared by the renderer.

use crate::present::{ChartKind, ChartSpec};
use plotters::prelude::*;

use super::text::estimate_text_width_px;

/// Colour of regular points and bars (Office blue, #4472C4).
pub const BASE_COLOR: RGBColor = RGBColor(68, 114, 196);
/// Colour of the queried entity.
pub const HIGHLIGHT_COLOR: RGBColor = RGBColor(200, 30, 30);
/// Colour of reference lines (Office gray, #A5A5A5).
pub const REFERENCE_COLOR: RGBColor = RGBColor(165, 165, 165);

/// Colour for point `idx` of `spec`.
pub fn point_color(spec: &ChartSpec, idx: usize) -> RGBColor {
    if spec.highlight == Some(idx) {
        HIGHLIGHT_COLOR
    } else {
        BASE_COLOR
    }
}

/// Tick label with precision that shrinks as magnitude grows.
pub fn format_y_label(v: f64) -> String {
    let a = v.abs();
    let prec = if a >= 100.0 {
        0
    } else if a >= 10.0 {
        1
    } else {
        2
    };
    format!("{:.*}", prec, v)
}

/// X range in data coordinates: calendar years for trends, category indices otherwise.
pub fn x_range(spec: &ChartSpec) -> (f64, f64) {
    let xs = spec.points.iter().map(|p| p.x);
    let min = xs.clone().fold(f64::INFINITY, f64::min);
    let max = xs.fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return (-0.5, 0.5);
    }
    (min - 0.5, max + 0.5)
}

/// Y range including the reference line. Bars start at zero; everything else gets
/// a margin around the data.
pub fn y_range(spec: &ChartSpec) -> (f64, f64) {
    let mut values: Vec<f64> = spec.points.iter().map(|p| p.y).collect();
    if let Some((r, _)) = &spec.reference {
        values.push(*r);
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    match spec.kind {
        ChartKind::SystolicBar | ChartKind::DiastolicBar | ChartKind::CountryPrevalence => {
            (0.0, (max * 1.15).max(1.0))
        }
        ChartKind::YearTrend | ChartKind::NearestCountries => {
            let span = max - min;
            let pad = if span.abs() < f64::EPSILON { 1.0 } else { span * 0.1 };
            (min - pad, max + pad)
        }
    }
}

/// Width of the left label area for the Y axis, from the widest tick label.
pub fn compute_left_label_area_px(ymin: f64, ymax: f64, ticks: usize, font_px: u32) -> u32 {
    let widest = (0..=ticks)
        .map(|i| {
            let t = if ticks == 0 { 0.0 } else { i as f64 / ticks as f64 };
            estimate_text_width_px(&format_y_label(ymin + (ymax - ymin) * t), font_px)
        })
        .max()
        .unwrap_or(0);
    // room for tick marks and the rotated axis description
    widest.saturating_add(36).clamp(56, 160)
}
