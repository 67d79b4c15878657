//! Input validation for country, gender and year values.
//!
//! Raw input arrives as a [`serde_json::Value`], which is what both the form
//! handler and the interactive menu hand over. Type problems (missing value, bool,
//! float, ...) are reported separately from domain mismatches, so callers can tell
//! "that is not a year" from "that year is not covered".

use crate::error::{Error, Result};
use crate::models::{Country, Gender, YEAR_MAX, YEAR_MIN, Year};
use crate::storage::Dataset;
use serde_json::Value;

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "nothing",
        Value::Bool(_) => "a boolean",
        Value::Number(n) if n.is_f64() => "a float",
        Value::Number(_) => "an integer",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn expect_text<'a>(field: &'static str, input: &'a Value) -> Result<&'a str> {
    match input {
        Value::Null => Err(Error::MissingValue { field }),
        Value::String(s) if s.trim().is_empty() => Err(Error::MissingValue { field }),
        Value::String(s) => Ok(s.as_str()),
        other => Err(Error::WrongType {
            field,
            expected: "a string",
            found: kind_of(other),
        }),
    }
}

/// Accept exactly `"Male"` or `"Female"`.
pub fn validate_gender(input: &Value) -> Result<Gender> {
    let s = expect_text("gender", input)?;
    s.parse::<Gender>().map_err(|_| Error::InvalidDomainValue {
        field: "gender",
        value: s.to_string(),
    })
}

/// Accept any country present in the loaded dataset (exact spelling).
pub fn validate_country(dataset: &Dataset, input: &Value) -> Result<Country> {
    let s = expect_text("country", input)?;
    if dataset.has_country(s) {
        Ok(Country(s.to_string()))
    } else {
        Err(Error::UnknownCountry(s.to_string()))
    }
}

/// Accept an integer in `YEAR_MIN..=YEAR_MAX`.
pub fn validate_year(input: &Value) -> Result<Year> {
    let n = match input {
        Value::Null => return Err(Error::MissingValue { field: "year" }),
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
            .ok_or(Error::WrongType {
                field: "year",
                expected: "an integer",
                found: kind_of(input),
            })?,
        other => {
            return Err(Error::WrongType {
                field: "year",
                expected: "an integer",
                found: kind_of(other),
            });
        }
    };
    if (i128::from(YEAR_MIN)..=i128::from(YEAR_MAX)).contains(&n) {
        Ok(Year(n as i32))
    } else {
        Err(Error::YearOutOfRange(n))
    }
}

/// Turn typed-in text into a year input: digit-only text becomes an integer,
/// blank text becomes a missing value, anything else stays a string (and is
/// then rejected by [`validate_year`] as the wrong type).
pub fn parse_year_text(text: &str) -> Value {
    let t = text.trim();
    if t.is_empty() {
        Value::Null
    } else if t.chars().all(|c| c.is_ascii_digit()) {
        t.parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(t.to_string()))
    } else {
        Value::String(t.to_string())
    }
}

/// Plain text (from a prompt or a form field) as a validator input.
pub fn text_input(text: &str) -> Value {
    let t = text.trim();
    if t.is_empty() {
        Value::Null
    } else {
        Value::String(t.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn gender_exact_match_only() {
        assert_eq!(validate_gender(&json!("Male")).unwrap(), Gender::Male);
        assert_eq!(validate_gender(&json!("Female")).unwrap(), Gender::Female);
        for bad in ["male", "Men", "Women", "Other", "Hello"] {
            assert!(matches!(
                validate_gender(&json!(bad)),
                Err(Error::InvalidDomainValue { field: "gender", .. })
            ));
        }
    }

    #[test]
    fn gender_wrong_types_are_distinct() {
        assert!(matches!(
            validate_gender(&json!(21)),
            Err(Error::WrongType { found: "an integer", .. })
        ));
        assert!(matches!(
            validate_gender(&json!(34.123)),
            Err(Error::WrongType { found: "a float", .. })
        ));
        assert!(matches!(
            validate_gender(&json!(false)),
            Err(Error::WrongType { found: "a boolean", .. })
        ));
        assert!(matches!(
            validate_gender(&Value::Null),
            Err(Error::MissingValue { .. })
        ));
    }

    #[test]
    fn year_bounds_and_types() {
        assert_eq!(validate_year(&json!(1975)).unwrap().get(), 1975);
        assert_eq!(validate_year(&json!(2015)).unwrap().get(), 2015);
        assert!(matches!(validate_year(&json!(1974)), Err(Error::YearOutOfRange(1974))));
        assert!(matches!(validate_year(&json!(1800)), Err(Error::YearOutOfRange(1800))));
        assert!(matches!(validate_year(&json!(-3)), Err(Error::YearOutOfRange(-3))));
        assert!(matches!(validate_year(&json!(2000.5)), Err(Error::WrongType { .. })));
        assert!(matches!(validate_year(&json!("2000")), Err(Error::WrongType { .. })));
        assert!(matches!(validate_year(&json!(true)), Err(Error::WrongType { .. })));
    }

    #[test]
    fn huge_integer_year_is_out_of_range() {
        let err = validate_year(&json!(u64::MAX)).unwrap_err();
        assert!(matches!(err, Error::YearOutOfRange(n) if n == i128::from(u64::MAX)));
        assert_eq!(err.to_string(), format!("year {} is outside 1975..=2015", u64::MAX));
        assert!(matches!(
            validate_year(&json!(i64::MIN)),
            Err(Error::YearOutOfRange(n)) if n == i128::from(i64::MIN)
        ));
    }

    #[test]
    fn year_text_parsing() {
        assert_eq!(parse_year_text(" 1999 "), json!(1999));
        assert_eq!(parse_year_text(""), Value::Null);
        assert_eq!(parse_year_text("19x9"), json!("19x9"));
        assert_eq!(parse_year_text("-5"), json!("-5"));
        assert!(validate_year(&parse_year_text("2001")).is_ok());
    }
}
