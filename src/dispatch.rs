//! Query dispatch surface shared by the interactive menu and the web form.
//!
//! Callers pick a [`MenuChoice`], hand over raw field values, and get back a
//! [`QueryOutcome`]: plain data that can be printed, serialized, or charted.

use crate::error::{Error, Result};
use crate::models::{
    Country, CountryRanking, GENDER_COUNT, Gender, LATEST_YEAR, RiskAssessment, Year,
    YearRanking,
};
use crate::present::{self, ChartSpec};
use crate::query::{QueryEngine, TOP_N};
use crate::storage::Dataset;
use crate::validate::{validate_country, validate_gender, validate_year};
use num_format::{Locale, ToFormattedString};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// The six supported lookups, numbered as in the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuChoice {
    MeanSystolic = 1,
    CountryPrevalence = 2,
    YearRanking = 3,
    MeanDiastolic = 4,
    CountryRanking = 5,
    RiskAssessment = 6,
}

impl MenuChoice {
    pub const ALL: [MenuChoice; 6] = [
        MenuChoice::MeanSystolic,
        MenuChoice::CountryPrevalence,
        MenuChoice::YearRanking,
        MenuChoice::MeanDiastolic,
        MenuChoice::CountryRanking,
        MenuChoice::RiskAssessment,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.number() == n)
    }

    pub fn needs_country(self) -> bool {
        !matches!(self, MenuChoice::YearRanking)
    }

    pub fn needs_gender(self) -> bool {
        !matches!(self, MenuChoice::CountryPrevalence | MenuChoice::YearRanking)
    }

    pub fn needs_year(self) -> bool {
        matches!(self, MenuChoice::CountryPrevalence | MenuChoice::YearRanking)
    }

    pub fn description(self) -> &'static str {
        match self {
            MenuChoice::MeanSystolic => "Mean systolic blood pressure for a country and gender",
            MenuChoice::CountryPrevalence => {
                "Prevalence of raised blood pressure for a country in a given year"
            }
            MenuChoice::YearRanking => "Ranking of a year among all years by prevalence",
            MenuChoice::MeanDiastolic => "Mean diastolic blood pressure for a country and gender",
            MenuChoice::CountryRanking => {
                "Ranking of a country among all countries by average prevalence"
            }
            MenuChoice::RiskAssessment => {
                "Blood pressure of a demographic and whether it indicates risk"
            }
        }
    }
}

impl fmt::Display for MenuChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.number())
    }
}

impl FromStr for MenuChoice {
    type Err = Error;

    /// Accepts `"3"` as typed in the menu and `"(3)"` as sent by the form.
    fn from_str(s: &str) -> Result<Self> {
        let t = s.trim();
        let inner = t
            .strip_prefix('(')
            .and_then(|r| r.strip_suffix(')'))
            .unwrap_or(t);
        inner
            .parse::<u8>()
            .ok()
            .and_then(MenuChoice::from_number)
            .ok_or_else(|| Error::InvalidDomainValue {
                field: "menu",
                value: s.to_string(),
            })
    }
}

/// A lookup with validated arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    MeanSystolic { country: Country, gender: Gender },
    CountryPrevalence { country: Country, year: Year },
    YearRanking { year: Year },
    MeanDiastolic { country: Country, gender: Gender },
    CountryRanking { country: Country, gender: Gender },
    RiskAssessment { country: Country, gender: Gender },
}

/// Raw field values as collected from a prompt or a form. Unused fields are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFields {
    pub country: Value,
    pub gender: Value,
    pub year: Value,
}

impl Query {
    /// Validate exactly the fields `choice` needs.
    pub fn from_raw(choice: MenuChoice, dataset: &Dataset, raw: &RawFields) -> Result<Self> {
        let country = || validate_country(dataset, &raw.country);
        let gender = || validate_gender(&raw.gender);
        let year = || validate_year(&raw.year);
        Ok(match choice {
            MenuChoice::MeanSystolic => Query::MeanSystolic {
                country: country()?,
                gender: gender()?,
            },
            MenuChoice::CountryPrevalence => Query::CountryPrevalence {
                country: country()?,
                year: year()?,
            },
            MenuChoice::YearRanking => Query::YearRanking { year: year()? },
            MenuChoice::MeanDiastolic => Query::MeanDiastolic {
                country: country()?,
                gender: gender()?,
            },
            MenuChoice::CountryRanking => Query::CountryRanking {
                country: country()?,
                gender: gender()?,
            },
            MenuChoice::RiskAssessment => Query::RiskAssessment {
                country: country()?,
                gender: gender()?,
            },
        })
    }

    pub fn choice(&self) -> MenuChoice {
        match self {
            Query::MeanSystolic { .. } => MenuChoice::MeanSystolic,
            Query::CountryPrevalence { .. } => MenuChoice::CountryPrevalence,
            Query::YearRanking { .. } => MenuChoice::YearRanking,
            Query::MeanDiastolic { .. } => MenuChoice::MeanDiastolic,
            Query::CountryRanking { .. } => MenuChoice::CountryRanking,
            Query::RiskAssessment { .. } => MenuChoice::RiskAssessment,
        }
    }
}

/// Plain-data result of one lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "query", rename_all = "snake_case")]
pub enum QueryOutcome {
    MeanSystolic {
        country: String,
        gender: Gender,
        year: i32,
        mmhg: f64,
    },
    CountryPrevalence {
        country: String,
        year: i32,
        prevalence: f64,
        /// Average of the same per-country sum over all countries that year.
        yearly_average: f64,
    },
    YearRanking(YearRanking),
    MeanDiastolic {
        country: String,
        gender: Gender,
        year: i32,
        mmhg: f64,
    },
    CountryRanking(CountryRanking),
    RiskAssessment(RiskAssessment),
}

/// Run a validated query.
pub fn execute(engine: &QueryEngine<'_>, query: &Query) -> Result<QueryOutcome> {
    Ok(match query {
        Query::MeanSystolic { country, gender } => QueryOutcome::MeanSystolic {
            country: country.to_string(),
            gender: *gender,
            year: LATEST_YEAR,
            mmhg: engine.mean_systolic_bp(country, *gender)?,
        },
        Query::CountryPrevalence { country, year } => QueryOutcome::CountryPrevalence {
            country: country.to_string(),
            year: year.get(),
            prevalence: engine.country_prevalence(country, *year)?,
            yearly_average: engine.yearly_average_prevalence(*year)? * GENDER_COUNT as f64,
        },
        Query::YearRanking { year } => QueryOutcome::YearRanking(engine.year_ranking(*year)?),
        Query::MeanDiastolic { country, gender } => QueryOutcome::MeanDiastolic {
            country: country.to_string(),
            gender: *gender,
            year: LATEST_YEAR,
            mmhg: engine.mean_diastolic_bp(country, *gender)?,
        },
        Query::CountryRanking { country, gender } => {
            QueryOutcome::CountryRanking(engine.country_ranking(country, *gender)?)
        }
        Query::RiskAssessment { country, gender } => {
            QueryOutcome::RiskAssessment(engine.risk_assessment(country, *gender)?)
        }
    })
}

fn count(n: usize) -> String {
    n.to_formatted_string(&Locale::en)
}

impl QueryOutcome {
    pub fn choice(&self) -> MenuChoice {
        match self {
            QueryOutcome::MeanSystolic { .. } => MenuChoice::MeanSystolic,
            QueryOutcome::CountryPrevalence { .. } => MenuChoice::CountryPrevalence,
            QueryOutcome::YearRanking(_) => MenuChoice::YearRanking,
            QueryOutcome::MeanDiastolic { .. } => MenuChoice::MeanDiastolic,
            QueryOutcome::CountryRanking(_) => MenuChoice::CountryRanking,
            QueryOutcome::RiskAssessment(_) => MenuChoice::RiskAssessment,
        }
    }

    /// One-paragraph text for the terminal.
    pub fn summary(&self) -> String {
        match self {
            QueryOutcome::MeanSystolic { country, gender, year, mmhg } => format!(
                "The mean systolic blood pressure for {country} ({gender}) in {year} is {mmhg:.2} mmHg."
            ),
            QueryOutcome::MeanDiastolic { country, gender, year, mmhg } => format!(
                "The mean diastolic blood pressure for {country} ({gender}) in {year} is {mmhg:.2} mmHg."
            ),
            QueryOutcome::CountryPrevalence { country, year, prevalence, yearly_average } => {
                let cmp = if prevalence > yearly_average { "above" } else { "at or below" };
                format!(
                    "The prevalence of raised blood pressure for {country} in {year} is {prevalence:.2} %, \
                     {cmp} the average of {yearly_average:.2} % across countries."
                )
            }
            QueryOutcome::YearRanking(r) => {
                let value = r
                    .entries
                    .iter()
                    .find(|e| e.year == r.year)
                    .map(|e| e.prevalence)
                    .unwrap_or_default();
                format!(
                    "{} ranks {} of {} years for prevalence of raised blood pressure \
                     (1 = least prevalent), with an average of {value:.2} %.",
                    r.year,
                    r.rank,
                    count(r.entries.len())
                )
            }
            QueryOutcome::CountryRanking(r) => {
                let value = r
                    .entries
                    .get(r.position())
                    .map(|e| e.prevalence)
                    .unwrap_or_default();
                let top = if r.in_top_five {
                    format!("in the top {TOP_N}")
                } else {
                    format!("not in the top {TOP_N}")
                };
                format!(
                    "{} ({}) ranks {} of {} countries by average prevalence of raised blood \
                     pressure (1 = most prevalent) at {value:.2} %, {top}.",
                    r.country,
                    r.gender,
                    r.rank,
                    count(r.entries.len())
                )
            }
            QueryOutcome::RiskAssessment(a) => format!(
                "{} ({}): systolic {:.2} mmHg, diastolic {:.2} mmHg, average prevalence {:.2} % \
                 (threshold {:.2} %). Result: {}.",
                a.country,
                a.gender,
                a.systolic,
                a.diastolic,
                a.prevalence_indicator,
                a.threshold,
                a.label
            ),
        }
    }

    /// Charts for this outcome, in display order.
    pub fn charts(&self) -> Vec<ChartSpec> {
        match self {
            QueryOutcome::MeanSystolic { country, gender, mmhg, .. } => {
                vec![present::systolic_chart(country, *gender, *mmhg)]
            }
            QueryOutcome::MeanDiastolic { country, gender, mmhg, .. } => {
                vec![present::diastolic_chart(country, *gender, *mmhg)]
            }
            QueryOutcome::CountryPrevalence { country, year, prevalence, yearly_average } => {
                vec![present::country_prevalence_chart(
                    country,
                    *year,
                    *prevalence,
                    *yearly_average,
                )]
            }
            QueryOutcome::YearRanking(r) => vec![present::year_trend_chart(r)],
            QueryOutcome::CountryRanking(r) => vec![present::nearest_countries_chart(r)],
            QueryOutcome::RiskAssessment(a) => vec![
                present::systolic_chart(&a.country, a.gender, a.systolic),
                present::diastolic_chart(&a.country, a.gender, a.diastolic),
            ],
        }
    }
}
