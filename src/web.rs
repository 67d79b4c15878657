//! Web form contract: one endpoint, a menu selector plus country/gender/year fields.
//!
//! [`handle_form`] is what an HTTP handler calls with the decoded form. It never
//! fails: bad input or a failed lookup turns into [`ResponseView::Error`].

use crate::dispatch::{MenuChoice, Query, QueryOutcome, RawFields, execute};
use crate::error::Error;
use crate::query::QueryEngine;
use crate::validate::{parse_year_text, text_input};
use crate::viz::{ChartSink, render_all};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

pub const ERROR_TEMPLATE: &str = "error_template.html";

/// Decoded form fields. Every field is optional; which ones are required depends on
/// the selector.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FormRequest {
    pub menu: Value,
    pub country: Value,
    pub gender: Value,
    pub year: Value,
}

impl FormRequest {
    /// Text fields are trimmed the same way the menu trims typed input. Forms
    /// submit the year as text; digit-only text counts as an integer.
    fn raw_fields(&self) -> RawFields {
        let text = |v: &Value| match v {
            Value::String(s) => text_input(s),
            other => other.clone(),
        };
        let year = match &self.year {
            Value::String(s) => parse_year_text(s),
            other => other.clone(),
        };
        RawFields {
            country: text(&self.country),
            gender: text(&self.gender),
            year,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    /// Template the response is bound into, e.g. `results_template3.html`.
    pub template: String,
    pub menu: String,
    /// Chart file names written to the output directory.
    pub images: Vec<String>,
    pub summary: String,
    pub outcome: QueryOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResponseView {
    Results(ResultView),
    Error { template: String, message: String },
}

impl ResponseView {
    fn error(message: impl Into<String>) -> Self {
        ResponseView::Error {
            template: ERROR_TEMPLATE.to_string(),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ResponseView::Error { .. })
    }
}

fn selector(menu: &Value) -> Result<MenuChoice, Error> {
    match menu {
        Value::String(s) => s.parse(),
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u8::try_from(n).ok())
            .and_then(MenuChoice::from_number)
            .ok_or_else(|| Error::InvalidDomainValue {
                field: "menu",
                value: n.to_string(),
            }),
        Value::Null => Err(Error::MissingValue { field: "menu" }),
        _ => Err(Error::WrongType {
            field: "menu",
            expected: "a menu number",
            found: "another type",
        }),
    }
}

/// Validate, query, render, and bind the result into a view.
pub fn handle_form(
    engine: &QueryEngine<'_>,
    sink: Option<&dyn ChartSink>,
    out_dir: &Path,
    request: &FormRequest,
) -> ResponseView {
    let choice = match selector(&request.menu) {
        Ok(c) => c,
        Err(e) => {
            warn!("form rejected: {e}");
            return ResponseView::error("Invalid query type");
        }
    };

    let outcome = Query::from_raw(choice, engine.dataset(), &request.raw_fields())
        .and_then(|q| execute(engine, &q));
    let outcome = match outcome {
        Ok(o) => o,
        Err(e) => {
            warn!("form {choice} failed: {e}");
            let message = if e.is_validation() {
                format!("Invalid input: {e}")
            } else {
                format!("No result: {e}")
            };
            return ResponseView::error(message);
        }
    };

    let images = match sink {
        Some(sink) => render_all(sink, &outcome.charts(), out_dir),
        None => Vec::new(),
    };
    info!("form {choice} answered with {} image(s)", images.len());

    ResponseView::Results(ResultView {
        template: format!("results_template{}.html", choice.number()),
        menu: choice.to_string(),
        images,
        summary: outcome.summary(),
        outcome,
    })
}
