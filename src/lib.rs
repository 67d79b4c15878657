//! hbp_rs
//!
//! A small Rust library for answering fixed questions about national blood-pressure
//! statistics (country, sex, year, mean systolic/diastolic pressure, prevalence of
//! raised blood pressure). Pairs with the `hbp` CLI.
//!
//! ### Features
//! - Load the dataset from CSV into a read-only, indexed [`Dataset`]
//! - Validate country / gender / year input against the data
//! - Six lookups: mean systolic and diastolic BP, country prevalence, year ranking,
//!   country ranking, and a two-indicator risk label
//! - Chart specifications for every result, rendered to PNG/SVG with plotters
//! - A form handler for web front ends and an interactive numbered menu
//!
//! ### Example
//! ```no_run
//! use hbp_rs::{Dataset, QueryEngine};
//! use hbp_rs::validate::{validate_country, validate_gender};
//! use serde_json::json;
//!
//! let data = Dataset::from_csv_path("HBPdata.csv")?;
//! let engine = QueryEngine::new(&data);
//! let country = validate_country(&data, &json!("Algeria"))?;
//! let gender = validate_gender(&json!("Male"))?;
//! println!("{} mmHg", engine.mean_systolic_bp(&country, gender)?);
//! let ranking = engine.country_ranking(&country, gender)?;
//! println!("rank {} of {}", ranking.rank, ranking.entries.len());
//! # Ok::<(), hbp_rs::Error>(())
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod menu;
pub mod models;
pub mod present;
pub mod query;
pub mod storage;
pub mod validate;
pub mod viz;
pub mod web;

pub use config::Config;
pub use error::{Error, Result};
pub use models::{Country, Gender, Record, Year};
pub use query::QueryEngine;
pub use storage::Dataset;
