use hbp_rs::error::Error;
use hbp_rs::models::{Gender, RiskLabel};
use hbp_rs::storage::Dataset;
use hbp_rs::validate::{validate_country, validate_gender, validate_year};
use hbp_rs::{Record, QueryEngine};
use serde_json::json;

const COUNTRIES: [&str; 7] = [
    "Algeria", "Brazil", "Chad", "Denmark", "Egypt", "France", "Ghana",
];

// Prevalence grows with the country index and with the year, so both rankings
// have a known order. Females sit one point above males.
fn sample() -> Vec<Record> {
    let mut out = Vec::new();
    for (i, c) in COUNTRIES.iter().enumerate() {
        for year in 1975..=2015 {
            for sex in Gender::ALL {
                let bump = if sex == Gender::Female { 0.01 } else { 0.0 };
                out.push(Record {
                    country: c.to_string(),
                    sex,
                    year,
                    mean_systolic_bp: 110.0 + 3.0 * i as f64,
                    mean_diastolic_bp: 70.0 + 2.0 * i as f64,
                    prevalence_raised_bp: 0.10
                        + 0.05 * i as f64
                        + 0.002 * (year - 1975) as f64
                        + bump,
                });
            }
        }
    }
    out
}

fn dataset() -> Dataset {
    Dataset::from_records(sample()).unwrap()
}

#[test]
fn mean_bp_reads_latest_year() {
    let data = dataset();
    let engine = QueryEngine::new(&data);
    let chad = validate_country(&data, &json!("Chad")).unwrap();
    let sys = engine.mean_systolic_bp(&chad, Gender::Male).unwrap();
    let dia = engine.mean_diastolic_bp(&chad, Gender::Female).unwrap();
    assert!((sys - 116.0).abs() < 1e-9);
    assert!((dia - 74.0).abs() < 1e-9);
    // same inputs, same answer
    assert_eq!(sys, engine.mean_systolic_bp(&chad, Gender::Male).unwrap());
}

#[test]
fn mean_bp_missing_latest_row_is_not_found() {
    let rows: Vec<Record> = sample()
        .into_iter()
        .filter(|r| !(r.country == "Brazil" && r.sex == Gender::Female && r.year == 2015))
        .collect();
    let data = Dataset::from_records(rows).unwrap();
    let engine = QueryEngine::new(&data);
    let brazil = validate_country(&data, &json!("Brazil")).unwrap();
    let err = engine.mean_systolic_bp(&brazil, Gender::Female).unwrap_err();
    assert!(matches!(err, Error::RecordNotFound { .. }), "{err:?}");
    assert!(err.to_string().contains("Brazil"));
    assert!(engine.mean_systolic_bp(&brazil, Gender::Male).is_ok());
}

#[test]
fn country_prevalence_sums_both_sexes() {
    let data = dataset();
    let engine = QueryEngine::new(&data);
    let algeria = validate_country(&data, &json!("Algeria")).unwrap();
    let year = validate_year(&json!(1975)).unwrap();
    let p = engine.country_prevalence(&algeria, year).unwrap();
    assert!((p - 21.0).abs() < 1e-9, "got {p}");
}

#[test]
fn year_ranking_is_a_permutation_of_all_years() {
    let data = dataset();
    let engine = QueryEngine::new(&data);
    let ranking = engine.year_ranking(validate_year(&json!(1975)).unwrap()).unwrap();

    assert_eq!(ranking.entries.len(), 41);
    let mut years = ranking.years();
    years.sort();
    assert_eq!(years, (1975..=2015).collect::<Vec<_>>());

    // ascending, least prevalent first
    let values = ranking.prevalences();
    assert!(values.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(ranking.rank, 1);
    // 7 countries x 2 sexes: (2 * 1.75 + 0.07) / 14
    assert!((values[0] - 25.5).abs() < 1e-9, "got {}", values[0]);

    let last = engine.year_ranking(validate_year(&json!(2015)).unwrap()).unwrap();
    assert_eq!(last.rank, 41);
    assert_eq!(last.entries, ranking.entries);
}

#[test]
fn country_ranking_orders_descending_and_flags_top_five() {
    let data = dataset();
    let engine = QueryEngine::new(&data);

    let ghana = validate_country(&data, &json!("Ghana")).unwrap();
    let r = engine.country_ranking(&ghana, Gender::Male).unwrap();
    assert_eq!(r.rank, 1);
    assert!(r.in_top_five);
    assert_eq!(r.entries.len(), COUNTRIES.len());
    assert!(r.entries.windows(2).all(|w| w[0].prevalence >= w[1].prevalence));

    let chad = validate_country(&data, &json!("Chad")).unwrap();
    let r = engine.country_ranking(&chad, Gender::Male).unwrap();
    assert_eq!(r.rank, 5);
    assert!(r.in_top_five);

    let algeria = validate_country(&data, &json!("Algeria")).unwrap();
    let r = engine.country_ranking(&algeria, Gender::Female).unwrap();
    assert_eq!(r.rank, 7);
    assert!(!r.in_top_five);
    assert_eq!(r.entries[r.position()].country, "Algeria");
}

#[test]
fn country_ranking_is_the_same_list_for_every_country() {
    let data = dataset();
    let engine = QueryEngine::new(&data);
    let a = validate_country(&data, &json!("Brazil")).unwrap();
    let b = validate_country(&data, &json!("Egypt")).unwrap();
    let ra = engine.country_ranking(&a, Gender::Female).unwrap();
    let rb = engine.country_ranking(&b, Gender::Female).unwrap();
    assert_eq!(ra.entries, rb.entries);
    assert!(ra.rank > rb.rank);
}

#[test]
fn risk_labels_cover_the_quadrants() {
    let data = dataset();
    let engine = QueryEngine::new(&data);

    // Algeria: 14 % average, 110/70 mmHg
    let algeria = validate_country(&data, &json!("Algeria")).unwrap();
    let a = engine.risk_assessment(&algeria, Gender::Male).unwrap();
    assert_eq!(a.label, RiskLabel::NoIndicators);
    assert!((a.prevalence_indicator - 14.0).abs() < 1e-9);

    // Ghana: 44 % average, 128/82 mmHg
    let ghana = validate_country(&data, &json!("Ghana")).unwrap();
    let g = engine.risk_assessment(&ghana, Gender::Male).unwrap();
    assert_eq!(g.label, RiskLabel::TwoIndicators);

    // Denmark: 29 % male, 30 % female, 119/76 mmHg
    let denmark = validate_country(&data, &json!("Denmark")).unwrap();
    let strict = QueryEngine::new(&data).with_risk_threshold(29.5);
    assert_eq!(
        strict.risk_assessment(&denmark, Gender::Male).unwrap().label,
        RiskLabel::NoIndicators
    );
    assert_eq!(
        strict.risk_assessment(&denmark, Gender::Female).unwrap().label,
        RiskLabel::DemographicOnly
    );

    // France: 39 %, 125/80 mmHg; high systolic alone is enough
    let france = validate_country(&data, &json!("France")).unwrap();
    let lax = QueryEngine::new(&data).with_risk_threshold(90.0);
    assert_eq!(lax.risk_assessment(&france, Gender::Male).unwrap().label, RiskLabel::BpOnly);
}

#[test]
fn validated_values_survive_revalidation() {
    let data = dataset();
    let c = validate_country(&data, &json!("Egypt")).unwrap();
    let g = validate_gender(&json!("Female")).unwrap();
    let y = validate_year(&json!(1999)).unwrap();
    assert_eq!(validate_country(&data, &json!(c.as_str())).unwrap(), c);
    assert_eq!(validate_gender(&json!(g.as_str())).unwrap(), g);
    assert_eq!(validate_year(&json!(y.get())).unwrap(), y);
}

#[test]
fn validation_errors_are_typed() {
    let data = dataset();
    assert!(matches!(
        validate_country(&data, &json!("Atlantis")),
        Err(Error::UnknownCountry(_))
    ));
    assert!(matches!(
        validate_gender(&json!("Men")),
        Err(Error::InvalidDomainValue { field: "gender", .. })
    ));
    assert!(matches!(validate_year(&json!(1974)), Err(Error::YearOutOfRange(1974))));
    assert!(matches!(validate_year(&json!(2016)), Err(Error::YearOutOfRange(2016))));
    assert!(matches!(validate_year(&json!("1990")), Err(Error::WrongType { .. })));
    assert!(matches!(validate_year(&json!(1990.5)), Err(Error::WrongType { .. })));
    assert!(matches!(validate_gender(&json!(null)), Err(Error::MissingValue { .. })));
}

fn row(country: &str, sex: Gender, year: i32, prevalence: f64) -> Record {
    Record {
        country: country.to_string(),
        sex,
        year,
        mean_systolic_bp: 120.0,
        mean_diastolic_bp: 80.0,
        prevalence_raised_bp: prevalence,
    }
}

#[test]
fn ties_are_broken_by_name_and_year() {
    // equal prevalence everywhere except Peru, listed out of alphabetical order
    let mut rows = Vec::new();
    for c in ["Zimbabwe", "Albania", "Peru", "Mali", "Chad"] {
        let p = if c == "Peru" { 0.5 } else { 0.25 };
        for year in 1975..=2015 {
            for sex in Gender::ALL {
                rows.push(row(c, sex, year, p));
            }
        }
    }
    let data = Dataset::from_records(rows).unwrap();
    let engine = QueryEngine::new(&data);

    let mali = validate_country(&data, &json!("Mali")).unwrap();
    let r = engine.country_ranking(&mali, Gender::Male).unwrap();
    let order: Vec<&str> = r.entries.iter().map(|e| e.country.as_str()).collect();
    assert_eq!(order, ["Peru", "Albania", "Chad", "Mali", "Zimbabwe"]);
    assert_eq!(r.rank, 4);
    assert!(r.in_top_five);

    let years = engine.year_ranking(validate_year(&json!(1990)).unwrap()).unwrap();
    assert_eq!(years.years(), (1975..=2015).collect::<Vec<_>>());
    assert_eq!(years.rank, 16);
}

#[test]
fn country_prevalence_adds_repeated_rows() {
    let rows = vec![
        row("Chad", Gender::Male, 2000, 0.2),
        row("Chad", Gender::Male, 2000, 0.3),
        row("Chad", Gender::Female, 2000, 0.1),
        row("Chad", Gender::Male, 2001, 0.4),
    ];
    let data = Dataset::from_records(rows).unwrap();
    let engine = QueryEngine::new(&data);
    let chad = validate_country(&data, &json!("Chad")).unwrap();

    let p = engine
        .country_prevalence(&chad, validate_year(&json!(2000)).unwrap())
        .unwrap();
    assert!((p - 60.0).abs() < 1e-9, "got {p}");
    // one sex missing is still a match
    let p = engine
        .country_prevalence(&chad, validate_year(&json!(2001)).unwrap())
        .unwrap();
    assert!((p - 40.0).abs() < 1e-9, "got {p}");
}

#[test]
fn country_prevalence_without_rows_is_not_found() {
    let data = dataset();
    let engine = QueryEngine::new(&data);
    let rows: Vec<Record> = sample().into_iter().filter(|r| r.year != 1999).collect();
    let gappy = Dataset::from_records(rows).unwrap();
    let gappy_engine = QueryEngine::new(&gappy);

    let chad = validate_country(&gappy, &json!("Chad")).unwrap();
    let year = validate_year(&json!(1999)).unwrap();
    let err = gappy_engine.country_prevalence(&chad, year).unwrap_err();
    assert!(
        matches!(&err, Error::RecordNotFound { country: Some(c), gender: None, year: Some(1999) } if c == "Chad"),
        "{err:?}"
    );
    assert_eq!(err.to_string(), "no record found for country=Chad, year=1999");
    assert!(engine.country_prevalence(&chad, year).is_ok());
}
