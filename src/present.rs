//! Turn query results into chart specifications.
//!
//! A [`ChartSpec`] is plain data: labelled points, axis text, which point to
//! highlight, and the file name the image should get. Rendering happens elsewhere
//! (see [`crate::viz`]).

use crate::models::{
    CountryRanking, DIASTOLIC_LIMIT, Gender, SYSTOLIC_LIMIT, YearRanking,
};
use serde::Serialize;

/// Ranked entries shown on each side of the queried country.
pub const NEIGHBOR_WINDOW: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// Single bar with the systolic reading.
    SystolicBar,
    /// Single bar with the diastolic reading.
    DiastolicBar,
    /// One country's prevalence against the average for that year.
    CountryPrevalence,
    /// Line over all years.
    YearTrend,
    /// Point strip of countries ranked next to the queried one.
    NearestCountries,
}

/// One labelled value. `x` is numeric for year trends and the category index otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<ChartPoint>,
    /// Index into `points` drawn in the highlight colour.
    pub highlight: Option<usize>,
    /// Optional horizontal reference line (value, label).
    pub reference: Option<(f64, String)>,
    pub file_name: String,
}

/// Replace anything outside `[A-Za-z0-9_-]` so names are safe on every filesystem.
pub fn sanitize_component(raw: &str) -> String {
    let s: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if s.is_empty() { "_".to_string() } else { s }
}

fn categorical(labels_values: impl IntoIterator<Item = (String, f64)>) -> Vec<ChartPoint> {
    labels_values
        .into_iter()
        .enumerate()
        .map(|(i, (label, y))| ChartPoint {
            label,
            x: i as f64,
            y,
        })
        .collect()
}

fn bp_chart(kind: ChartKind, country: &str, gender: Gender, value: f64) -> ChartSpec {
    let (word, limit, suffix) = match kind {
        ChartKind::DiastolicBar => ("Diastolic", DIASTOLIC_LIMIT, "diastolic"),
        _ => ("Systolic", SYSTOLIC_LIMIT, "systolic"),
    };
    let high = value > limit;
    let mut stem = format!(
        "{}_{}_{}",
        sanitize_component(country),
        gender.as_str(),
        suffix
    );
    if high {
        stem.push_str("_high");
    }
    ChartSpec {
        kind,
        title: format!("Average {word} Blood Pressure for {country} {gender}"),
        x_label: "Country".into(),
        y_label: format!("Average {word} Blood Pressure (mmHg)"),
        points: categorical([(country.to_string(), value)]),
        highlight: high.then_some(0),
        reference: Some((limit, format!("{limit:.0} mmHg"))),
        file_name: format!("{stem}.png"),
    }
}

/// Bar for query (1); red when above 120 mmHg.
pub fn systolic_chart(country: &str, gender: Gender, value: f64) -> ChartSpec {
    bp_chart(ChartKind::SystolicBar, country, gender, value)
}

/// Bar for query (4); red when above 80 mmHg.
pub fn diastolic_chart(country: &str, gender: Gender, value: f64) -> ChartSpec {
    bp_chart(ChartKind::DiastolicBar, country, gender, value)
}

/// Point for query (2), drawn against the average of all countries that year.
/// `national_average` is in percent; the point is red when above it.
pub fn country_prevalence_chart(
    country: &str,
    year: i32,
    prevalence: f64,
    national_average: f64,
) -> ChartSpec {
    ChartSpec {
        kind: ChartKind::CountryPrevalence,
        title: format!(
            "Prevalence of high blood pressure for {country} in {year} (yearly average {national_average:.2} %)"
        ),
        x_label: "Country".into(),
        y_label: "Prevalence (%)".into(),
        points: categorical([(country.to_string(), prevalence)]),
        highlight: (prevalence > national_average).then_some(0),
        reference: Some((national_average, "yearly average".into())),
        file_name: format!("{}_{year}.png", sanitize_component(country)),
    }
}

/// Line for query (3) over all years in calendar order, queried year highlighted.
pub fn year_trend_chart(ranking: &YearRanking) -> ChartSpec {
    let mut by_year = ranking.entries.clone();
    by_year.sort_by_key(|e| e.year);
    let highlight = by_year.iter().position(|e| e.year == ranking.year);
    let points = by_year
        .iter()
        .map(|e| ChartPoint {
            label: e.year.to_string(),
            x: e.year as f64,
            y: e.prevalence,
        })
        .collect();
    ChartSpec {
        kind: ChartKind::YearTrend,
        title: format!(
            "Average prevalence of high blood pressure by year ({}): rank {} of {} (1 = least prevalent)",
            ranking.year,
            ranking.rank,
            ranking.entries.len()
        ),
        x_label: "Year".into(),
        y_label: "Prevalence (%)".into(),
        points,
        highlight,
        reference: None,
        file_name: format!("{}.png", ranking.year),
    }
}

/// Index range `[start, end)` of the ±`radius` window around `position`,
/// clamped to `0..len`.
pub fn neighbor_window(position: usize, len: usize, radius: usize) -> (usize, usize) {
    if len == 0 {
        return (0, 0);
    }
    let position = position.min(len - 1);
    let start = position.saturating_sub(radius);
    let end = (position + radius + 1).min(len);
    (start, end)
}

/// Strip for query (5): the queried country and its ranked neighbours.
pub fn nearest_countries_chart(ranking: &CountryRanking) -> ChartSpec {
    let pos = ranking.position();
    let (start, end) = neighbor_window(pos, ranking.entries.len(), NEIGHBOR_WINDOW);
    let points = categorical(
        ranking.entries[start..end]
            .iter()
            .map(|e| (e.country.clone(), e.prevalence)),
    );
    ChartSpec {
        kind: ChartKind::NearestCountries,
        title: format!(
            "Average prevalence of raised BP by country (±{NEIGHBOR_WINDOW} nearest), rank {} of {}",
            ranking.rank,
            ranking.entries.len()
        ),
        x_label: "Countries".into(),
        y_label: "Prevalence (%)".into(),
        points,
        highlight: Some(pos - start),
        reference: None,
        file_name: format!(
            "{}_{}_nearest.png",
            sanitize_component(&ranking.country),
            ranking.gender.as_str()
        ),
    }
}
