//! Chart rendering: draw a [`ChartSpec`] to **PNG** or **SVG** with plotters.
//!
//! - Blue for regular points and bars, red for the highlighted entity
//! - Optional grey reference line (BP limit, yearly average) with an inside legend
//! - Wrapped title band, truncated category labels
//!
//! Query code never depends on plotters directly; it goes through [`ChartSink`].

pub mod text;
pub mod util;

use crate::present::{ChartKind, ChartSpec};
use anyhow::{Context, Result, anyhow};
use log::{debug, warn};

use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use plotters::series::LineSeries;
use plotters::style::FontFamily;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use text::{truncate_to_width, wrap_text_to_width};
use util::{
    REFERENCE_COLOR, compute_left_label_area_px, format_y_label, point_color, x_range, y_range,
};

/// Anything that can turn a chart specification into an image file.
pub trait ChartSink {
    fn render(&self, spec: &ChartSpec, path: &Path) -> Result<()>;
}

/// Places the `ab_glyph` text path looks for a TrueType font when none is configured.
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// First readable font from the well-known system locations.
pub fn find_system_font() -> Option<PathBuf> {
    FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
}

/// One-time registration of a "sans-serif" font. `ab_glyph` does not discover
/// OS fonts, so the bytes are loaded here and kept for the process lifetime.
static FONTS: OnceLock<std::result::Result<PathBuf, String>> = OnceLock::new();

fn ensure_fonts_registered(explicit: Option<&Path>) -> Result<()> {
    let outcome = FONTS.get_or_init(|| {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(find_system_font)
            .ok_or_else(|| "no TrueType font found; pass --font".to_string())?;
        let bytes = std::fs::read(&path).map_err(|e| format!("{}: {e}", path.display()))?;
        let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
        plotters::style::register_font("sans-serif", plotters::style::FontStyle::Normal, bytes)
            .map_err(|_| format!("{}: invalid font data", path.display()))?;
        debug!("registered chart font {}", path.display());
        Ok(path)
    });
    outcome.as_ref().map(|_| ()).map_err(|e| anyhow!("{e}"))
}

/// [`ChartSink`] backed by plotters. The output format follows the file
/// extension: `.svg` is vector, anything else is a PNG bitmap.
#[derive(Debug, Clone)]
pub struct PlottersRenderer {
    pub width: u32,
    pub height: u32,
    pub font_path: Option<PathBuf>,
}

impl Default for PlottersRenderer {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 600,
            font_path: None,
        }
    }
}

impl PlottersRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            font_path: None,
        }
    }

    /// Use `path` for chart text.
    ///
    /// Fonts are registered once per process: the first renderer to draw decides
    /// the font, and a different path given to a later renderer is ignored.
    pub fn with_font<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.font_path = Some(path.as_ref().to_path_buf());
        self
    }
}

impl ChartSink for PlottersRenderer {
    fn render(&self, spec: &ChartSpec, path: &Path) -> Result<()> {
        if spec.points.is_empty() {
            return Err(anyhow!("no data to plot"));
        }
        ensure_fonts_registered(self.font_path.as_deref())?;
        let path_string = path.to_string_lossy().into_owned();
        let size = (self.width, self.height);

        let drawn = if path.extension().and_then(|s| s.to_str()) == Some("svg") {
            let root = SVGBackend::new(path_string.as_str(), size).into_drawing_area();
            draw_chart(root, spec)
        } else {
            let root = BitMapBackend::new(path_string.as_str(), size).into_drawing_area();
            draw_chart(root, spec)
        };
        drawn.with_context(|| format!("rendering {}", path.display()))
    }
}

/// Render every spec into `out_dir` and return the file names that were written.
/// Failures are logged and skipped so a missing font never hides a query result.
pub fn render_all(sink: &dyn ChartSink, specs: &[ChartSpec], out_dir: &Path) -> Vec<String> {
    if let Err(e) = std::fs::create_dir_all(out_dir) {
        warn!("cannot create {}: {e}", out_dir.display());
        return Vec::new();
    }
    let mut written = Vec::new();
    for spec in specs {
        let path = out_dir.join(&spec.file_name);
        match sink.render(spec, &path) {
            Ok(()) => written.push(spec.file_name.clone()),
            Err(e) => warn!("chart {} not written: {e:#}", spec.file_name),
        }
    }
    written
}

const MARGIN: u32 = 16;
const TITLE_FONT_PX: u32 = 18;
const LABEL_FONT_PX: u32 = 12;

fn draw_chart<DB>(root: DrawingArea<DB, Shift>, spec: &ChartSpec) -> Result<()>
where
    DB: DrawingBackend,
{
    root.fill(&WHITE).map_err(|e| anyhow!("{:?}", e))?;
    let (root_w, root_h) = root.dim_in_pixel();

    // Title band
    let title_lines = wrap_text_to_width(
        &spec.title,
        TITLE_FONT_PX,
        root_w.saturating_sub(2 * MARGIN),
    );
    let line_h = TITLE_FONT_PX + 6;
    let band_h = (title_lines.len() as u32 * line_h + MARGIN).min(root_h / 3);
    let (title_area, plot_area) = root.split_vertically(band_h);

    let title_style = TextStyle::from((FontFamily::SansSerif, TITLE_FONT_PX))
        .pos(Pos::new(HPos::Center, VPos::Top));
    for (i, line) in title_lines.iter().enumerate() {
        title_area
            .draw(&Text::new(
                line.clone(),
                ((root_w / 2) as i32, (MARGIN / 2 + i as u32 * line_h) as i32),
                title_style.clone(),
            ))
            .map_err(|e| anyhow!("{:?}", e))?;
    }

    let (x_min, x_max) = x_range(spec);
    let (y_min, y_max) = y_range(spec);
    let y_label_count = 10usize;
    let left_px = compute_left_label_area_px(y_min, y_max, y_label_count, LABEL_FONT_PX);

    let mut chart = ChartBuilder::on(&plot_area)
        .margin(MARGIN)
        .set_label_area_size(LabelAreaPosition::Left, left_px)
        .set_label_area_size(LabelAreaPosition::Bottom, 56)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(|e| anyhow!("{:?}", e))?;

    // Category charts label integer positions with the (shortened) point label.
    let is_trend = spec.kind == ChartKind::YearTrend;
    let n = spec.points.len();
    let plot_w = root_w.saturating_sub(left_px + 2 * MARGIN);
    let slot_px = (plot_w / n.max(1) as u32).max(24);
    let x_label_fmt = |x: &f64| {
        if is_trend {
            return (x.round() as i32).to_string();
        }
        let idx = x.round();
        if (x - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        spec.points
            .get(idx as usize)
            .map(|p| truncate_to_width(&p.label, LABEL_FONT_PX, slot_px))
            .unwrap_or_default()
    };
    let y_label_fmt = |v: &f64| format_y_label(*v);
    let x_label_count = if is_trend { n.min(12) } else { n + 1 };

    chart
        .configure_mesh()
        .x_desc(spec.x_label.as_str())
        .y_desc(spec.y_label.as_str())
        .x_labels(x_label_count)
        .y_labels(y_label_count)
        .x_label_formatter(&x_label_fmt)
        .y_label_formatter(&y_label_fmt)
        .disable_x_mesh()
        .label_style((FontFamily::SansSerif, LABEL_FONT_PX))
        .axis_desc_style((FontFamily::SansSerif, 14))
        .draw()
        .map_err(|e| anyhow!("{:?}", e))?;

    match spec.kind {
        ChartKind::SystolicBar | ChartKind::DiastolicBar => {
            chart
                .draw_series(spec.points.iter().enumerate().map(|(i, p)| {
                    Rectangle::new(
                        [(p.x - 0.3, 0.0), (p.x + 0.3, p.y)],
                        point_color(spec, i).filled(),
                    )
                }))
                .map_err(|e| anyhow!("{:?}", e))?;
        }
        ChartKind::YearTrend => {
            let line: Vec<(f64, f64)> = spec.points.iter().map(|p| (p.x, p.y)).collect();
            chart
                .draw_series(LineSeries::new(line, util::BASE_COLOR.stroke_width(2)))
                .map_err(|e| anyhow!("{:?}", e))?;
            draw_markers(&mut chart, spec)?;
        }
        ChartKind::CountryPrevalence | ChartKind::NearestCountries => {
            draw_markers(&mut chart, spec)?;
        }
    }

    if let Some((value, label)) = &spec.reference {
        chart
            .draw_series(LineSeries::new(
                vec![(x_min, *value), (x_max, *value)],
                REFERENCE_COLOR.stroke_width(2),
            ))
            .map_err(|e| anyhow!("{:?}", e))?
            .label(label.clone())
            .legend(|(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], REFERENCE_COLOR.stroke_width(2))
            });
        chart
            .configure_series_labels()
            .border_style(BLACK)
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.85))
            .label_font((FontFamily::SansSerif, LABEL_FONT_PX))
            .draw()
            .map_err(|e| anyhow!("{:?}", e))?;
    }

    debug!("drew {:?} with {n} point(s)", spec.kind);
    root.present().map_err(|e| anyhow!("{:?}", e))?;
    Ok(())
}

fn draw_markers<DB>(
    chart: &mut ChartContext<'_, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    spec: &ChartSpec,
) -> Result<()>
where
    DB: DrawingBackend,
{
    chart
        .draw_series(spec.points.iter().enumerate().map(|(i, p)| {
            let size = if spec.highlight == Some(i) { 8 } else { 5 };
            Circle::new((p.x, p.y), size, point_color(spec, i).filled())
        }))
        .map_err(|e| anyhow!("{:?}", e))?;
    Ok(())
}
