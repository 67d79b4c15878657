//! Loading the dataset into memory, and exporting query results.
//!
//! The [`Dataset`] is the read-only context every query borrows. It is built once at
//! startup from a [`DataSource`] and never mutated afterwards.

use crate::error::{Error, Result};
use crate::models::{
    CountryRanking, Gender, Record, RecordKey, YEAR_MAX, YEAR_MIN, YearRanking,
};
use ahash::AHashMap;
use csv::{ReaderBuilder, Trim, WriterBuilder};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Anything that can produce the full set of rows at startup.
pub trait DataSource {
    /// Human-readable location, used in error messages.
    fn location(&self) -> PathBuf;
    fn read_records(&self) -> Result<Vec<Record>>;
}

/// CSV file with the distributed header names (or their snake_case aliases).
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl DataSource for CsvSource {
    fn location(&self) -> PathBuf {
        self.path.clone()
    }

    fn read_records(&self) -> Result<Vec<Record>> {
        let file = File::open(&self.path)?;
        read_csv(file)
    }
}

/// Parse records from any CSV reader.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<Record>> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let mut out = Vec::new();
    for row in rdr.deserialize::<Record>() {
        out.push(row?);
    }
    Ok(out)
}

/// In-memory, indexed view of the dataset.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<Record>,
    index: AHashMap<RecordKey, Vec<usize>>,
    countries: BTreeSet<String>,
    years: BTreeSet<i32>,
}

impl Dataset {
    /// Load everything from `source`. Any failure is reported as
    /// [`Error::DataSourceUnavailable`]; callers treat it as fatal.
    pub fn load<S: DataSource + ?Sized>(source: &S) -> Result<Self> {
        let path = source.location();
        let records = source
            .read_records()
            .map_err(|e| Error::DataSourceUnavailable {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        Self::from_records(records).map_err(|e| match e {
            Error::DataSourceUnavailable { reason, .. } => {
                Error::DataSourceUnavailable { path, reason }
            }
            other => other,
        })
    }

    /// Convenience for the common case of a CSV file on disk.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load(&CsvSource::new(path))
    }

    /// Build and index a dataset from already-parsed rows.
    pub fn from_records(records: Vec<Record>) -> Result<Self> {
        if records.is_empty() {
            return Err(unavailable("dataset contains no rows"));
        }

        let mut index: AHashMap<RecordKey, Vec<usize>> = AHashMap::with_capacity(records.len());
        let mut countries = BTreeSet::new();
        let mut years = BTreeSet::new();
        let mut duplicates = 0usize;

        for (i, r) in records.iter().enumerate() {
            // +2: header line plus 1-based numbering
            let line = i + 2;
            if !(YEAR_MIN..=YEAR_MAX).contains(&r.year) {
                return Err(unavailable(format!(
                    "line {line}: year {} outside {YEAR_MIN}..={YEAR_MAX}",
                    r.year
                )));
            }
            if !r.prevalence_raised_bp.is_finite() || !(0.0..=1.0).contains(&r.prevalence_raised_bp)
            {
                return Err(unavailable(format!(
                    "line {line}: prevalence {} is not a fraction in [0, 1]",
                    r.prevalence_raised_bp
                )));
            }
            if !r.mean_systolic_bp.is_finite() || !r.mean_diastolic_bp.is_finite() {
                return Err(unavailable(format!("line {line}: non-numeric blood pressure")));
            }
            if r.country.trim().is_empty() {
                return Err(unavailable(format!("line {line}: empty country name")));
            }

            let slot = index.entry(RecordKey::from(r)).or_default();
            if !slot.is_empty() {
                duplicates += 1;
            }
            slot.push(i);
            countries.insert(r.country.clone());
            years.insert(r.year);
        }

        if duplicates > 0 {
            warn!("dataset has {duplicates} duplicate (country, sex, year) rows");
        }
        info!(
            "loaded {} rows: {} countries, {} years",
            records.len(),
            countries.len(),
            years.len()
        );

        Ok(Self {
            records,
            index,
            countries,
            years,
        })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct country names, sorted.
    pub fn countries(&self) -> &BTreeSet<String> {
        &self.countries
    }

    /// Distinct years present, sorted.
    pub fn years(&self) -> &BTreeSet<i32> {
        &self.years
    }

    pub fn has_country(&self, name: &str) -> bool {
        self.countries.contains(name)
    }

    /// All rows stored under one key (normally exactly one).
    pub fn rows_for(&self, country: &str, sex: Gender, year: i32) -> Vec<&Record> {
        let key = RecordKey {
            country: country.to_string(),
            sex,
            year,
        };
        let rows: Vec<&Record> = self
            .index
            .get(&key)
            .map(|ids| ids.iter().map(|&i| &self.records[i]).collect())
            .unwrap_or_default();
        debug!("lookup {country}/{sex}/{year}: {} row(s)", rows.len());
        rows
    }
}

fn unavailable(reason: impl Into<String>) -> Error {
    Error::DataSourceUnavailable {
        path: PathBuf::new(),
        reason: reason.into(),
    }
}

/// Prefix cells that spreadsheet tools would interpret as formulas.
fn csv_safe(cell: &str) -> String {
    match cell.chars().next() {
        Some('=' | '+' | '-' | '@' | '\t' | '\r') => format!("'{cell}"),
        _ => cell.to_string(),
    }
}

/// Save a country ranking as CSV (`rank,country,sex,prevalence_pct`).
pub fn save_country_ranking_csv<P: AsRef<Path>>(ranking: &CountryRanking, path: P) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    wtr.write_record(["rank", "country", "sex", "prevalence_pct"])?;
    for (i, e) in ranking.entries.iter().enumerate() {
        wtr.serialize((
            i + 1,
            csv_safe(&e.country),
            ranking.gender.as_str(),
            e.prevalence,
        ))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save a year ranking as CSV (`rank,year,prevalence_pct`).
pub fn save_year_ranking_csv<P: AsRef<Path>>(ranking: &YearRanking, path: P) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    wtr.write_record(["rank", "year", "prevalence_pct"])?;
    for (i, e) in ranking.entries.iter().enumerate() {
        wtr.serialize((i + 1, e.year, e.prevalence))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save any result as pretty JSON.
pub fn save_json<T: Serialize + ?Sized, P: AsRef<Path>>(value: &T, path: P) -> Result<()> {
    let mut f = File::create(path)?;
    let s = serde_json::to_string_pretty(value)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}
