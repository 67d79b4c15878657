use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// First year covered by the dataset.
pub const YEAR_MIN: i32 = 1975;
/// Last year covered by the dataset; also the year used for mean BP lookups.
pub const YEAR_MAX: i32 = 2015;
/// Year used by the mean systolic/diastolic lookups.
pub const LATEST_YEAR: i32 = YEAR_MAX;
/// Number of sex partitions in the dataset.
pub const GENDER_COUNT: usize = 2;

/// Systolic reading above which blood pressure counts as raised (mmHg).
pub const SYSTOLIC_LIMIT: f64 = 120.0;
/// Diastolic reading above which blood pressure counts as raised (mmHg).
pub const DIASTOLIC_LIMIT: f64 = 80.0;

/// Sex partition. Only the `Male`/`Female` vocabulary is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = ();

    /// Exact, case-sensitive match against the two labels.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Male" => Ok(Gender::Male),
            "Female" => Ok(Gender::Female),
            _ => Err(()),
        }
    }
}

/// A country name known to be present in the loaded dataset.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Country(pub(crate) String);

impl Country {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A year inside `YEAR_MIN..=YEAR_MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Year(pub(crate) i32);

impl Year {
    pub fn get(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One row of the dataset (one observation per country, sex and year).
///
/// Header names follow the distributed data file; the snake_case aliases are
/// accepted as well so hand-written fixtures stay readable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    #[serde(rename = "Country", alias = "country")]
    pub country: String,
    #[serde(rename = "Sex", alias = "sex")]
    pub sex: Gender,
    #[serde(rename = "Year", alias = "year")]
    pub year: i32,
    #[serde(
        rename = "Mean systolic blood pressure (mmHg)",
        alias = "mean_systolic_bp"
    )]
    pub mean_systolic_bp: f64,
    #[serde(
        rename = "Mean diastolic blood pressure (mmHg)",
        alias = "mean_diastolic_bp"
    )]
    pub mean_diastolic_bp: f64,
    /// Fraction in `[0, 1]`.
    #[serde(
        rename = "Prevalence of raised blood pressure",
        alias = "prevalence_raised_bp"
    )]
    pub prevalence_raised_bp: f64,
}

/// Lookup key for the row index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordKey {
    pub country: String,
    pub sex: Gender,
    pub year: i32,
}

impl From<&Record> for RecordKey {
    fn from(r: &Record) -> Self {
        Self {
            country: r.country.clone(),
            sex: r.sex,
            year: r.year,
        }
    }
}

/// Normalized prevalence of one year, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearPrevalence {
    pub year: i32,
    pub prevalence: f64,
}

/// All years ordered from least to most prevalent, plus the queried year's rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearRanking {
    pub year: i32,
    /// 1-based; 1 = least prevalent.
    pub rank: usize,
    pub entries: Vec<YearPrevalence>,
}

impl YearRanking {
    pub fn years(&self) -> Vec<i32> {
        self.entries.iter().map(|e| e.year).collect()
    }

    pub fn prevalences(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.prevalence).collect()
    }
}

/// Average prevalence of one country for one sex, in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryPrevalence {
    pub country: String,
    pub prevalence: f64,
}

/// Countries of one sex ordered from most to least prevalent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryRanking {
    pub country: String,
    pub gender: Gender,
    /// 1-based; 1 = most prevalent.
    pub rank: usize,
    pub in_top_five: bool,
    pub entries: Vec<CountryPrevalence>,
}

impl CountryRanking {
    /// Zero-based position of the queried country in `entries`. A rank of 0 (never
    /// produced by the engine) maps to the first entry.
    pub fn position(&self) -> usize {
        self.rank.saturating_sub(1)
    }
}

/// Qualitative risk classification from the two independent indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLabel {
    NoIndicators,
    DemographicOnly,
    BpOnly,
    TwoIndicators,
}

impl RiskLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLabel::NoIndicators => "no indicators",
            RiskLabel::DemographicOnly => "demographic-only indicator",
            RiskLabel::BpOnly => "BP-only indicator",
            RiskLabel::TwoIndicators => "two indicators",
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub country: String,
    pub gender: Gender,
    pub systolic: f64,
    pub diastolic: f64,
    /// Average prevalence for the demographic, in percent.
    pub prevalence_indicator: f64,
    /// Threshold the indicator was compared against, in percent.
    pub threshold: f64,
    pub label: RiskLabel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gender_accepts_only_the_two_labels() {
        assert_eq!("Male".parse::<Gender>(), Ok(Gender::Male));
        assert_eq!("Female".parse::<Gender>(), Ok(Gender::Female));
        assert!("Men".parse::<Gender>().is_err());
        assert!("female".parse::<Gender>().is_err());
    }

    #[test]
    fn ranking_position_never_underflows() {
        let mut r = CountryRanking {
            country: "Chad".into(),
            gender: Gender::Male,
            rank: 3,
            in_top_five: true,
            entries: Vec::new(),
        };
        assert_eq!(r.position(), 2);
        r.rank = 0;
        assert_eq!(r.position(), 0);
    }
}
