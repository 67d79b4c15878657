//! Error kinds shared by the loader, validators, and query engine.

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong between reading the dataset and answering a query.
#[derive(Debug, Error)]
pub enum Error {
    /// Right type, but not a member of the allowed set (e.g. gender `"Other"`).
    #[error("invalid value for {field}: {value:?}")]
    InvalidDomainValue { field: &'static str, value: String },

    /// No value supplied at all.
    #[error("missing value for {field}")]
    MissingValue { field: &'static str },

    /// Value of the wrong kind (bool, float, array, ...).
    #[error("{field} must be {expected}, got {found}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("unknown country: {0:?}")]
    UnknownCountry(String),

    #[error("year {0} is outside 1975..=2015")]
    YearOutOfRange(i128),

    /// Inputs were valid but the dataset has no matching row.
    #[error("no record found for {}", describe_key(.country, .gender, .year))]
    RecordNotFound {
        country: Option<String>,
        gender: Option<String>,
        year: Option<i32>,
    },

    /// The dataset could not be loaded. Fatal at startup.
    #[error("data source unavailable ({}): {reason}", .path.display())]
    DataSourceUnavailable { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for failures caused by user input rather than by the data or the system.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidDomainValue { .. }
                | Error::MissingValue { .. }
                | Error::WrongType { .. }
                | Error::UnknownCountry(_)
                | Error::YearOutOfRange(_)
        )
    }

    pub(crate) fn not_found(country: Option<&str>, gender: Option<&str>, year: Option<i32>) -> Self {
        Error::RecordNotFound {
            country: country.map(str::to_string),
            gender: gender.map(str::to_string),
            year,
        }
    }
}

fn describe_key(country: &Option<String>, gender: &Option<String>, year: &Option<i32>) -> String {
    let mut parts = Vec::new();
    if let Some(c) = country {
        parts.push(format!("country={c}"));
    }
    if let Some(g) = gender {
        parts.push(format!("sex={g}"));
    }
    if let Some(y) = year {
        parts.push(format!("year={y}"));
    }
    if parts.is_empty() {
        "empty key".to_string()
    } else {
        parts.join(", ")
    }
}

pub type Result<T> = std::result::Result<T, Error>;
