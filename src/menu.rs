//! Numbered interactive menu (1-6, 0 exits) over any reader/writer pair.
//!
//! Invalid input never ends the session: a bad menu number re-shows the menu and a
//! bad field value re-prompts for that field.

use crate::dispatch::{MenuChoice, Query, RawFields, execute};
use crate::error::Error;
use crate::models::{YEAR_MAX, YEAR_MIN};
use crate::query::QueryEngine;
use crate::validate::{parse_year_text, text_input, validate_country, validate_gender, validate_year};
use crate::viz::{ChartSink, render_all};
use anyhow::Result;
use serde_json::Value;
use std::io::{BufRead, Write};
use std::path::Path;

/// Where (and whether) charts go after each answer.
pub struct ChartOutput<'a> {
    pub sink: &'a dyn ChartSink,
    pub out_dir: &'a Path,
}

enum Input {
    Line(String),
    Eof,
}

fn read_line<R: BufRead>(input: &mut R) -> Result<Input> {
    let mut buf = String::new();
    if input.read_line(&mut buf)? == 0 {
        return Ok(Input::Eof);
    }
    Ok(Input::Line(buf.trim().to_string()))
}

/// Prompt until `check` accepts the answer. `None` means input ended.
fn prompt_until<R, W, T, F>(
    input: &mut R,
    out: &mut W,
    prompt: &str,
    to_value: fn(&str) -> Value,
    check: F,
) -> Result<Option<T>>
where
    R: BufRead,
    W: Write,
    F: Fn(&Value) -> Result<T, Error>,
{
    loop {
        write!(out, "{prompt}: ")?;
        out.flush()?;
        let line = match read_line(input)? {
            Input::Line(l) => l,
            Input::Eof => return Ok(None),
        };
        match check(&to_value(&line)) {
            Ok(v) => return Ok(Some(v)),
            Err(e) => writeln!(out, "{e}. Please try again.")?,
        }
    }
}

fn print_menu<W: Write>(out: &mut W) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "Please select from the following choices:")?;
    for c in MenuChoice::ALL {
        writeln!(out, "{c} : {}", c.description())?;
    }
    writeln!(out, "(0) : Exit the program")?;
    Ok(())
}

/// Run the menu until `0` or end of input.
pub fn run_menu<R: BufRead, W: Write>(
    engine: &QueryEngine<'_>,
    charts: Option<&ChartOutput<'_>>,
    input: &mut R,
    out: &mut W,
) -> Result<()> {
    let dataset = engine.dataset();
    writeln!(
        out,
        "Welcome to the High Blood Pressure Predictor! Enter full country names, \
         gender as Male or Female, and years between {YEAR_MIN} and {YEAR_MAX}."
    )?;

    loop {
        print_menu(out)?;
        write!(out, "Make your selection: ")?;
        out.flush()?;
        let line = match read_line(input)? {
            Input::Line(l) => l,
            Input::Eof => break,
        };
        if line == "0" {
            break;
        }
        let choice = match line.parse::<MenuChoice>() {
            Ok(c) => c,
            Err(_) => {
                writeln!(out, "Invalid input. Please enter a valid choice.")?;
                continue;
            }
        };

        let mut raw = RawFields::default();
        if choice.needs_country() {
            match prompt_until(input, out, "Select your country", text_input, |v| {
                validate_country(dataset, v)
            })? {
                Some(c) => raw.country = Value::String(c.to_string()),
                None => break,
            }
        }
        if choice.needs_gender() {
            match prompt_until(input, out, "Select your gender", text_input, validate_gender)? {
                Some(g) => raw.gender = Value::String(g.to_string()),
                None => break,
            }
        }
        if choice.needs_year() {
            match prompt_until(input, out, "Select your year", parse_year_text, validate_year)? {
                Some(y) => raw.year = Value::from(y.get()),
                None => break,
            }
        }

        let answer = Query::from_raw(choice, dataset, &raw).and_then(|q| execute(engine, &q));
        match answer {
            Ok(outcome) => {
                writeln!(out, "{}", outcome.summary())?;
                if let Some(c) = charts {
                    for name in render_all(c.sink, &outcome.charts(), c.out_dir) {
                        writeln!(out, "Chart written to {}", c.out_dir.join(name).display())?;
                    }
                }
            }
            Err(e) => writeln!(out, "{e}")?,
        }
    }

    writeln!(out, "Thanks for using the HBP predictor")?;
    Ok(())
}
