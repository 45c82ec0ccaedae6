//! CSV-based assumption loader
//!
//! Loads fiscal assumptions from CSV files in data/assumptions/

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default path to assumptions directory
pub const DEFAULT_ASSUMPTIONS_PATH: &str = "data/assumptions";

const BRACKETS_FILE: &str = "income_tax_brackets.csv";
const PINEL_FILE: &str = "pinel_rates.csv";
const CAPITAL_GAINS_FILE: &str = "capital_gains_parameters.csv";

#[derive(Debug, Error)]
pub enum AssumptionsError {
    #[error("cannot open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {file}: {source}")]
    Csv {
        file: &'static str,
        #[source]
        source: csv::Error,
    },

    #[error("{file} line {line}: cannot parse '{value}'")]
    Parse {
        file: &'static str,
        line: usize,
        value: String,
    },

    #[error("{0} contains no rows")]
    Empty(&'static str),
}

pub type Result<T> = std::result::Result<T, AssumptionsError>;

fn open(path: &Path, file: &'static str) -> Result<csv::Reader<File>> {
    let full = path.join(file);
    let handle = File::open(&full).map_err(|source| AssumptionsError::Io { path: full, source })?;
    Ok(csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(handle))
}

fn field<T: std::str::FromStr>(record: &csv::StringRecord, index: usize, file: &'static str, line: usize) -> Result<T> {
    let value = record.get(index).unwrap_or("");
    value.parse().map_err(|_| AssumptionsError::Parse {
        file,
        line,
        value: value.to_string(),
    })
}

fn records(path: &Path, file: &'static str) -> Result<Vec<(usize, csv::StringRecord)>> {
    let mut reader = open(path, file)?;
    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result.map_err(|source| AssumptionsError::Csv { file, source })?;
        // header is line 1
        rows.push((index + 2, record));
    }
    if rows.is_empty() {
        return Err(AssumptionsError::Empty(file));
    }
    Ok(rows)
}

/// Load the progressive income-tax scale
/// Returns Vec<(lower, upper, rate)>; an empty upper bound means unbounded
pub fn load_income_tax_brackets(path: &Path) -> Result<Vec<(f64, f64, f64)>> {
    records(path, BRACKETS_FILE)?
        .into_iter()
        .map(|(line, record)| {
            let lower: f64 = field(&record, 0, BRACKETS_FILE, line)?;
            let upper = match record.get(1).unwrap_or("") {
                "" => f64::INFINITY,
                _ => field(&record, 1, BRACKETS_FILE, line)?,
            };
            let rate: f64 = field(&record, 2, BRACKETS_FILE, line)?;
            Ok((lower, upper, rate))
        })
        .collect()
}

/// Load Pinel total reduction rates
/// Returns Vec<(scheme, commitment_years, total_rate)>
pub fn load_pinel_rates(path: &Path) -> Result<Vec<(String, u32, f64)>> {
    records(path, PINEL_FILE)?
        .into_iter()
        .map(|(line, record)| {
            let scheme = record.get(0).unwrap_or("").to_string();
            let years: u32 = field(&record, 1, PINEL_FILE, line)?;
            let rate: f64 = field(&record, 2, PINEL_FILE, line)?;
            Ok((scheme, years, rate))
        })
        .collect()
}

/// Load capital-gains parameters
/// Returns HashMap<parameter_name, value>
pub fn load_capital_gains_parameters(path: &Path) -> Result<HashMap<String, f64>> {
    records(path, CAPITAL_GAINS_FILE)?
        .into_iter()
        .map(|(line, record)| {
            let name = record.get(0).unwrap_or("").to_string();
            let value: f64 = field(&record, 1, CAPITAL_GAINS_FILE, line)?;
            Ok((name, value))
        })
        .collect()
}

/// Load all assumptions from the given directory
pub struct LoadedAssumptions {
    pub income_tax_brackets: Vec<(f64, f64, f64)>,
    pub pinel_rates: Vec<(String, u32, f64)>,
    pub capital_gains: HashMap<String, f64>,
}

impl LoadedAssumptions {
    /// Load all assumptions from the default path
    pub fn load_default() -> Result<Self> {
        Self::load_from(Path::new(DEFAULT_ASSUMPTIONS_PATH))
    }

    /// Load all assumptions from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        Ok(Self {
            income_tax_brackets: load_income_tax_brackets(path)?,
            pinel_rates: load_pinel_rates(path)?,
            capital_gains: load_capital_gains_parameters(path)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_ASSUMPTIONS_PATH)
    }

    #[test]
    fn test_load_default_assumptions() {
        let result = LoadedAssumptions::load_from(&data_dir());
        assert!(result.is_ok(), "Failed to load assumptions: {:?}", result.err());

        let assumptions = result.unwrap();

        assert_eq!(assumptions.income_tax_brackets.len(), 5);
        assert!(assumptions.income_tax_brackets[4].1.is_infinite());
        assert_eq!(assumptions.pinel_rates.len(), 12);
        assert_eq!(assumptions.capital_gains.get("income_tax_rate"), Some(&0.19));
    }

    #[test]
    fn test_missing_directory() {
        let err = LoadedAssumptions::load_from(Path::new("/nonexistent/assumptions"))
            .err()
            .unwrap();
        assert!(matches!(err, AssumptionsError::Io { .. }));
    }
}
