//! Runtime settings: defaults, optionally overlaid by a JSON file, then by CLI flags.

use crate::query::DEFAULT_RISK_THRESHOLD;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// CSV file with the blood-pressure table.
    pub data_path: PathBuf,
    /// Directory chart images are written to.
    pub out_dir: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Demographic risk threshold, percentage scale (30.0 = 30 %).
    pub risk_threshold: f64,
    /// TrueType font for chart text; system locations are searched when unset.
    pub font_path: Option<PathBuf>,
    /// Whether to render charts at all.
    pub plots: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("HBPdata.csv"),
            out_dir: PathBuf::from("static"),
            width: 1000,
            height: 600,
            risk_threshold: DEFAULT_RISK_THRESHOLD,
            font_path: None,
            plots: true,
        }
    }
}

impl Config {
    /// Read a JSON config file. Missing keys keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let txt = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let cfg: Config = serde_json::from_str(&txt)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            bail!("chart size must be non-zero, got {}x{}", self.width, self.height);
        }
        if !self.risk_threshold.is_finite() || self.risk_threshold < 0.0 {
            bail!("risk threshold must be a non-negative percentage, got {}", self.risk_threshold);
        }
        if self.risk_threshold > 100.0 {
            bail!(
                "risk threshold is a percentage (0-100), got {}",
                self.risk_threshold
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, r#"{{ "risk_threshold": 35.0, "out_dir": "charts" }}"#).unwrap();
        let cfg = Config::from_json_file(f.path()).unwrap();
        assert_eq!(cfg.risk_threshold, 35.0);
        assert_eq!(cfg.out_dir, PathBuf::from("charts"));
        assert_eq!(cfg.width, 1000);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn unknown_keys_and_bad_values_are_rejected() {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, r#"{{ "treshold": 35.0 }}"#).unwrap();
        assert!(Config::from_json_file(f.path()).is_err());

        let cfg = Config { risk_threshold: 0.35 * 1000.0, ..Config::default() };
        assert!(cfg.validate().is_err());
        let cfg = Config { width: 0, ..Config::default() };
        assert!(cfg.validate().is_err());
    }
}
