//! Load and save the household JSON save file
//!
//! Loading is all-or-nothing: the file is parsed into raw rows, every row is
//! converted and the whole household is validated before anything is returned.
//! Out-of-range numbers are coerced: ages to `MAX_AGE`, birth years to within
//! `MAX_AGE` of the reference year, terms to `MAX_TERM_YEARS`.

use super::{
    year_span, Adult, Asset, AssetCategory, AssetId, Child, EconomicHypotheses, ExpenseLine, Household,
    IncomeLine, Loan, LoanId, PensionHypothesis, SaleEvent, TaxIncentive, MAX_AGE,
};
use crate::loans::MAX_TERM_YEARS;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HouseholdError {
    #[error("cannot read household file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed household file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{kind} '{name}' has neither an age nor a birth year")]
    MissingBirth { kind: &'static str, name: String },

    #[error("duplicate adult name '{0}'")]
    DuplicateAdult(String),

    #[error("duplicate asset id {0}")]
    DuplicateAsset(AssetId),

    #[error("duplicate loan id {0}")]
    DuplicateLoan(LoanId),

    #[error("loan {loan} references unknown asset {asset}")]
    UnknownLoanAsset { loan: LoanId, asset: AssetId },

    #[error("pension hypothesis references unknown adult '{0}'")]
    UnknownPensionAdult(String),

    #[error("unknown asset category '{0}'")]
    UnknownCategory(String),

    #[error("invalid date '{value}' for {field}")]
    InvalidDate { field: String, value: String },
}

pub type Result<T> = std::result::Result<T, HouseholdError>;

/// Replace missing or non-finite numbers with 0
fn num(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value.trim(), "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| HouseholdError::InvalidDate {
            field: field.to_string(),
            value: value.to_string(),
        })
}

fn resolve_birth_year(
    kind: &'static str,
    name: &str,
    birth_year: Option<i32>,
    age: Option<f64>,
    reference_year: i32,
) -> Result<i32> {
    let span = year_span(MAX_AGE);
    match (birth_year, age.filter(|a| a.is_finite() && *a >= 0.0)) {
        (Some(year), _) => Ok(year.clamp(reference_year.saturating_sub(span), reference_year.saturating_add(span))),
        (None, Some(age)) => Ok(reference_year.saturating_sub(age.min(MAX_AGE as f64) as i32)),
        (None, None) => Err(HouseholdError::MissingBirth {
            kind,
            name: name.to_string(),
        }),
    }
}

#[derive(Debug, Deserialize)]
struct RawAdult {
    name: String,
    birth_year: Option<i32>,
    age: Option<f64>,
    annual_salary: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawChild {
    name: String,
    birth_year: Option<i32>,
    age: Option<f64>,
    study_start_age: Option<u32>,
    study_duration_years: Option<u32>,
    annual_study_cost: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawPension {
    adult: String,
    retirement_age: u32,
    annual_pension: Option<f64>,
    #[serde(default)]
    active: bool,
}

#[derive(Debug, Deserialize)]
struct RawAsset {
    id: u32,
    name: String,
    category: String,
    gross_value: Option<f64>,
    appreciation_rate_pct: Option<f64>,
    purchase_price: Option<f64>,
    purchase_date: String,
    acquisition_costs: Option<f64>,
    works_costs: Option<f64>,
    monthly_rent: Option<f64>,
    annual_charges: Option<f64>,
    property_tax: Option<f64>,
    incentive: Option<TaxIncentive>,
}

#[derive(Debug, Deserialize)]
struct RawLoan {
    id: u32,
    #[serde(default)]
    name: String,
    principal: Option<f64>,
    annual_rate_pct: Option<f64>,
    insurance_rate_pct: Option<f64>,
    term_years: u32,
    start_date: String,
    asset: u32,
}

/// Income or expense line
#[derive(Debug, Deserialize)]
struct RawLine {
    #[serde(default)]
    label: String,
    annual_amount: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawHousehold {
    #[serde(default)]
    adults: Vec<RawAdult>,
    #[serde(default)]
    children: Vec<RawChild>,
    #[serde(default)]
    pensions: Vec<RawPension>,
    #[serde(default)]
    assets: Vec<RawAsset>,
    #[serde(default)]
    loans: Vec<RawLoan>,
    #[serde(default)]
    incomes: Vec<RawLine>,
    #[serde(default)]
    expenses: Vec<RawLine>,
    #[serde(default)]
    economics: EconomicHypotheses,
    #[serde(default)]
    single_parent: bool,
    #[serde(default)]
    sales: Vec<SaleEvent>,
}

fn parse_category(value: &str) -> Result<AssetCategory> {
    match value {
        "OwnerOccupied" | "Immobilier de jouissance" => Ok(AssetCategory::OwnerOccupied),
        "IncomeProperty" | "Immobilier productif" => Ok(AssetCategory::IncomeProperty),
        "Financial" | "Financier" => Ok(AssetCategory::Financial),
        other => Err(HouseholdError::UnknownCategory(other.to_string())),
    }
}

impl RawHousehold {
    fn into_household(self, reference_year: i32) -> Result<Household> {
        let adults = self
            .adults
            .into_iter()
            .map(|a| {
                let birth_year = resolve_birth_year("adult", &a.name, a.birth_year, a.age, reference_year)?;
                Ok(Adult::new(a.name, birth_year, num(a.annual_salary)))
            })
            .collect::<Result<Vec<_>>>()?;

        let children = self
            .children
            .into_iter()
            .map(|c| {
                let birth_year = resolve_birth_year("child", &c.name, c.birth_year, c.age, reference_year)?;
                Ok(Child::new(
                    c.name,
                    birth_year,
                    c.study_start_age.unwrap_or(18).min(MAX_AGE),
                    c.study_duration_years.unwrap_or(5).min(MAX_AGE),
                    num(c.annual_study_cost),
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        let pensions = self
            .pensions
            .into_iter()
            .map(|p| PensionHypothesis::new(p.adult, p.retirement_age.min(MAX_AGE), num(p.annual_pension), p.active))
            .collect();

        let assets = self
            .assets
            .into_iter()
            .map(|a| {
                Ok(Asset {
                    id: AssetId(a.id),
                    category: parse_category(&a.category)?,
                    purchase_date: parse_date(&format!("asset '{}' purchase_date", a.name), &a.purchase_date)?,
                    name: a.name,
                    gross_value: num(a.gross_value),
                    appreciation_rate_pct: num(a.appreciation_rate_pct),
                    purchase_price: num(a.purchase_price),
                    acquisition_costs: num(a.acquisition_costs),
                    works_costs: num(a.works_costs),
                    monthly_rent: num(a.monthly_rent),
                    annual_charges: num(a.annual_charges),
                    property_tax: num(a.property_tax),
                    incentive: a.incentive.map(|i| TaxIncentive {
                        duration_years: i.duration_years.min(MAX_TERM_YEARS),
                        ..i
                    }),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let loans = self
            .loans
            .into_iter()
            .map(|l| {
                Ok(Loan {
                    id: LoanId(l.id),
                    start_date: parse_date(&format!("loan {} start_date", l.id), &l.start_date)?,
                    name: l.name,
                    principal: num(l.principal),
                    annual_rate_pct: num(l.annual_rate_pct),
                    insurance_rate_pct: num(l.insurance_rate_pct),
                    term_years: l.term_years.min(MAX_TERM_YEARS),
                    asset: AssetId(l.asset),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let economics = EconomicHypotheses {
            inflation_pct: num(Some(self.economics.inflation_pct)),
            wage_growth_pct: num(Some(self.economics.wage_growth_pct)),
        };

        let household = Household {
            adults,
            children,
            pensions,
            assets,
            loans,
            incomes: self
                .incomes
                .into_iter()
                .map(|l| IncomeLine {
                    label: l.label,
                    annual_amount: num(l.annual_amount),
                })
                .collect(),
            expenses: self
                .expenses
                .into_iter()
                .map(|l| ExpenseLine {
                    label: l.label,
                    annual_amount: num(l.annual_amount),
                })
                .collect(),
            economics,
            single_parent: self.single_parent,
            sales: self.sales,
        };
        validate(&household)?;
        Ok(household)
    }
}

/// Check the structural invariants of a household
///
/// Sale events are not checked here: a sale of an unknown asset is an input
/// anomaly that the projection tolerates.
pub fn validate(household: &Household) -> Result<()> {
    let mut names = HashSet::new();
    for adult in &household.adults {
        if !names.insert(adult.name.as_str()) {
            return Err(HouseholdError::DuplicateAdult(adult.name.clone()));
        }
    }

    let mut asset_ids = HashSet::new();
    for asset in &household.assets {
        if !asset_ids.insert(asset.id) {
            return Err(HouseholdError::DuplicateAsset(asset.id));
        }
    }

    let mut loan_ids = HashSet::new();
    for loan in &household.loans {
        if !loan_ids.insert(loan.id) {
            return Err(HouseholdError::DuplicateLoan(loan.id));
        }
        if !asset_ids.contains(&loan.asset) {
            return Err(HouseholdError::UnknownLoanAsset {
                loan: loan.id,
                asset: loan.asset,
            });
        }
    }

    for pension in &household.pensions {
        if !names.contains(pension.adult.as_str()) {
            return Err(HouseholdError::UnknownPensionAdult(pension.adult.clone()));
        }
    }

    Ok(())
}

/// Load a household from any reader
pub fn load_household_from_reader<R: Read>(reader: R, reference_year: i32) -> Result<Household> {
    let raw: RawHousehold = serde_json::from_reader(reader)?;
    raw.into_household(reference_year)
}

/// Load a household save file
pub fn load_household<P: AsRef<Path>>(path: P, reference_year: i32) -> Result<Household> {
    let file = File::open(path)?;
    load_household_from_reader(BufReader::new(file), reference_year)
}

/// Write a household save file (birth years, ISO dates)
pub fn save_household<P: AsRef<Path>>(path: P, household: &Household) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, household)?;
    writer.flush()?;
    Ok(())
}
