//! The six analytical queries and their aggregation helpers.
//!
//! Normalization used throughout (all reported values are percentages):
//!
//! - per-year prevalence = `sum(prevalence that year) / (countries × 2) × 100`
//! - per-country prevalence = `sum(prevalence for country and sex) / years × 100`
//!
//! where `countries` and `years` are the distinct counts present in the loaded
//! dataset (200 and 41 for the full data file).

use crate::error::{Error, Result};
use crate::models::{
    Country, CountryPrevalence, CountryRanking, DIASTOLIC_LIMIT, GENDER_COUNT, Gender,
    LATEST_YEAR, Record, RiskAssessment, RiskLabel, SYSTOLIC_LIMIT, Year, YearPrevalence,
    YearRanking,
};
use crate::storage::Dataset;
use ahash::AHashMap;
use log::debug;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Default demographic threshold, percentage scale.
pub const DEFAULT_RISK_THRESHOLD: f64 = 30.0;

/// How many of the top-ranked countries count as "top five".
pub const TOP_N: usize = 5;

/// Row index: `[demographic indicator][BP indicator]`.
const RISK_TABLE: [[RiskLabel; 2]; 2] = [
    [RiskLabel::NoIndicators, RiskLabel::BpOnly],
    [RiskLabel::DemographicOnly, RiskLabel::TwoIndicators],
];

/// Pick the risk label from the two independent indicators.
pub fn classify_risk(prevalence_pct: f64, threshold_pct: f64, systolic: f64, diastolic: f64) -> RiskLabel {
    let demographic = prevalence_pct >= threshold_pct;
    let bp = systolic > SYSTOLIC_LIMIT || diastolic > DIASTOLIC_LIMIT;
    RISK_TABLE[demographic as usize][bp as usize]
}

/// Read-only query surface over a borrowed [`Dataset`].
#[derive(Debug, Clone, Copy)]
pub struct QueryEngine<'a> {
    data: &'a Dataset,
    risk_threshold: f64,
}

impl<'a> QueryEngine<'a> {
    pub fn new(data: &'a Dataset) -> Self {
        Self {
            data,
            risk_threshold: DEFAULT_RISK_THRESHOLD,
        }
    }

    /// Override the demographic risk threshold (percentage scale).
    pub fn with_risk_threshold(mut self, threshold_pct: f64) -> Self {
        self.risk_threshold = threshold_pct;
        self
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.data
    }

    pub fn risk_threshold(&self) -> f64 {
        self.risk_threshold
    }

    fn latest_row(&self, country: &Country, gender: Gender) -> Result<&'a Record> {
        let rows = self.data.rows_for(country.as_str(), gender, LATEST_YEAR);
        match rows.first() {
            Some(row) => Ok(*row),
            None => Err(Error::not_found(
                Some(country.as_str()),
                Some(gender.as_str()),
                Some(LATEST_YEAR),
            )),
        }
    }

    /// (1) Mean systolic blood pressure in the latest year, mmHg.
    pub fn mean_systolic_bp(&self, country: &Country, gender: Gender) -> Result<f64> {
        Ok(self.latest_row(country, gender)?.mean_systolic_bp)
    }

    /// (4) Mean diastolic blood pressure in the latest year, mmHg.
    pub fn mean_diastolic_bp(&self, country: &Country, gender: Gender) -> Result<f64> {
        Ok(self.latest_row(country, gender)?.mean_diastolic_bp)
    }

    /// (2) Prevalence of raised BP for a country and year, summed over the matching
    /// rows, in percent.
    pub fn country_prevalence(&self, country: &Country, year: Year) -> Result<f64> {
        let mut matched = 0usize;
        let mut sum = 0.0;
        for gender in Gender::ALL {
            for row in self.data.rows_for(country.as_str(), gender, year.get()) {
                matched += 1;
                sum += row.prevalence_raised_bp;
            }
        }
        if matched == 0 {
            return Err(Error::not_found(Some(country.as_str()), None, Some(year.get())));
        }
        Ok(sum * 100.0)
    }

    /// Normalized prevalence for every year present, unsorted, in percent.
    fn yearly_prevalences(&self) -> BTreeMap<i32, f64> {
        let divisor = (self.data.countries().len() * GENDER_COUNT) as f64;
        let mut sums: BTreeMap<i32, f64> = BTreeMap::new();
        for r in self.data.records() {
            *sums.entry(r.year).or_default() += r.prevalence_raised_bp;
        }
        sums.into_iter()
            .map(|(year, sum)| (year, sum / divisor * 100.0))
            .collect()
    }

    /// Average prevalence across all countries for one year, in percent.
    pub fn yearly_average_prevalence(&self, year: Year) -> Result<f64> {
        self.yearly_prevalences()
            .get(&year.get())
            .copied()
            .ok_or_else(|| Error::not_found(None, None, Some(year.get())))
    }

    /// (3) Years ordered from least to most prevalent, with the rank of `year`.
    pub fn year_ranking(&self, year: Year) -> Result<YearRanking> {
        let mut entries: Vec<YearPrevalence> = self
            .yearly_prevalences()
            .into_iter()
            .map(|(year, prevalence)| YearPrevalence { year, prevalence })
            .collect();
        entries.sort_by(|a, b| {
            a.prevalence
                .total_cmp(&b.prevalence)
                .then(a.year.cmp(&b.year))
        });

        let rank = entries
            .iter()
            .position(|e| e.year == year.get())
            .ok_or_else(|| Error::not_found(None, None, Some(year.get())))?
            + 1;
        debug!("year {year} ranks {rank} of {}", entries.len());
        Ok(YearRanking {
            year: year.get(),
            rank,
            entries,
        })
    }

    /// Average prevalence of every country for one sex, unsorted, in percent.
    fn country_prevalences(&self, gender: Gender) -> AHashMap<&'a str, f64> {
        let divisor = self.data.years().len() as f64;
        let mut sums: AHashMap<&'a str, f64> = AHashMap::new();
        for r in self.data.records().iter().filter(|r| r.sex == gender) {
            *sums.entry(r.country.as_str()).or_default() += r.prevalence_raised_bp;
        }
        for v in sums.values_mut() {
            *v = *v / divisor * 100.0;
        }
        sums
    }

    /// Average prevalence of a single demographic across all years, in percent.
    pub fn demographic_prevalence(&self, country: &Country, gender: Gender) -> Result<f64> {
        let divisor = self.data.years().len() as f64;
        let rows: Vec<&Record> = self
            .data
            .records()
            .iter()
            .filter(|r| r.sex == gender && r.country == country.as_str())
            .collect();
        if rows.is_empty() {
            return Err(Error::not_found(Some(country.as_str()), Some(gender.as_str()), None));
        }
        let sum: f64 = rows.iter().map(|r| r.prevalence_raised_bp).sum();
        Ok(sum / divisor * 100.0)
    }

    /// (5) Countries of one sex ordered from most to least prevalent, with the rank
    /// of `country`.
    pub fn country_ranking(&self, country: &Country, gender: Gender) -> Result<CountryRanking> {
        let mut entries: Vec<CountryPrevalence> = self
            .country_prevalences(gender)
            .into_iter()
            .map(|(c, prevalence)| CountryPrevalence {
                country: c.to_string(),
                prevalence,
            })
            .collect();
        entries.sort_by(|a, b| match b.prevalence.total_cmp(&a.prevalence) {
            Ordering::Equal => a.country.cmp(&b.country),
            other => other,
        });

        let rank = entries
            .iter()
            .position(|e| e.country == country.as_str())
            .ok_or_else(|| {
                Error::not_found(Some(country.as_str()), Some(gender.as_str()), None)
            })?
            + 1;
        debug!("{country}/{gender} ranks {rank} of {}", entries.len());
        Ok(CountryRanking {
            country: country.to_string(),
            gender,
            rank,
            in_top_five: rank <= TOP_N,
            entries,
        })
    }

    /// (6) Latest BP readings plus the risk label for one demographic.
    pub fn risk_assessment(&self, country: &Country, gender: Gender) -> Result<RiskAssessment> {
        let systolic = self.mean_systolic_bp(country, gender)?;
        let diastolic = self.mean_diastolic_bp(country, gender)?;
        let prevalence_indicator = self.demographic_prevalence(country, gender)?;
        let label = classify_risk(prevalence_indicator, self.risk_threshold, systolic, diastolic);
        Ok(RiskAssessment {
            country: country.to_string(),
            gender,
            systolic,
            diastolic,
            prevalence_indicator,
            threshold: self.risk_threshold,
            label,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_table_quadrants() {
        assert_eq!(classify_risk(20.0, 30.0, 115.0, 75.0), RiskLabel::NoIndicators);
        assert_eq!(classify_risk(40.0, 30.0, 130.0, 85.0), RiskLabel::TwoIndicators);
        assert_eq!(classify_risk(40.0, 30.0, 110.0, 70.0), RiskLabel::DemographicOnly);
        assert_eq!(classify_risk(20.0, 30.0, 118.0, 81.0), RiskLabel::BpOnly);
    }

    #[test]
    fn risk_table_boundaries() {
        // threshold is inclusive, BP limits are strict
        assert_eq!(classify_risk(30.0, 30.0, 120.0, 80.0), RiskLabel::DemographicOnly);
        assert_eq!(classify_risk(29.99, 30.0, 120.01, 80.0), RiskLabel::BpOnly);
    }
}
