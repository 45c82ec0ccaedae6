//! Household data structures: people, assets, loans and scheduled events

use crate::loans::{amortize, LoanStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound on any age or age-based duration read from a save file
pub const MAX_AGE: u32 = 150;

/// A count of years as a signed calendar offset, saturating at `i32::MAX`
pub(crate) fn year_span(years: u32) -> i32 {
    i32::try_from(years).unwrap_or(i32::MAX)
}

/// Opaque identifier of an asset line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u32);

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque identifier of a loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LoanId(pub u32);

impl fmt::Display for LoanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Category of an asset line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetCategory {
    /// Main residence or any property the household lives in
    OwnerOccupied,
    /// Rental property producing income
    IncomeProperty,
    /// Savings accounts, life insurance, securities
    Financial,
}

impl AssetCategory {
    pub fn is_real_estate(&self) -> bool {
        matches!(self, AssetCategory::OwnerOccupied | AssetCategory::IncomeProperty)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetCategory::OwnerOccupied => "Owner-occupied real estate",
            AssetCategory::IncomeProperty => "Income real estate",
            AssetCategory::Financial => "Financial",
        }
    }
}

/// Adult member of the household
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adult {
    /// First name, unique within the household
    pub name: String,

    pub birth_year: i32,

    /// Gross annual salary at the start of the projection
    #[serde(default)]
    pub annual_salary: f64,
}

impl Adult {
    pub fn new(name: impl Into<String>, birth_year: i32, annual_salary: f64) -> Self {
        Self {
            name: name.into(),
            birth_year,
            annual_salary,
        }
    }

    /// Build from a current age relative to a reference year
    pub fn from_age(name: impl Into<String>, age: u32, reference_year: i32, annual_salary: f64) -> Self {
        Self::new(name, reference_year.saturating_sub(year_span(age)), annual_salary)
    }

    pub fn age_in(&self, year: i32) -> i32 {
        year.saturating_sub(self.birth_year)
    }
}

/// Child of the household
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Child {
    pub name: String,

    pub birth_year: i32,

    /// Age at which higher education starts
    #[serde(default = "default_study_start_age")]
    pub study_start_age: u32,

    /// Length of higher education in years
    #[serde(default = "default_study_duration")]
    pub study_duration_years: u32,

    /// Annual cost while a student (in start-year money)
    #[serde(default)]
    pub annual_study_cost: f64,
}

fn default_study_start_age() -> u32 {
    18
}

fn default_study_duration() -> u32 {
    5
}

impl Child {
    pub fn new(
        name: impl Into<String>,
        birth_year: i32,
        study_start_age: u32,
        study_duration_years: u32,
        annual_study_cost: f64,
    ) -> Self {
        Self {
            name: name.into(),
            birth_year,
            study_start_age,
            study_duration_years,
            annual_study_cost,
        }
    }

    pub fn age_in(&self, year: i32) -> i32 {
        year.saturating_sub(self.birth_year)
    }

    /// First year the child no longer studies
    pub fn end_of_studies_year(&self) -> i32 {
        self.birth_year
            .saturating_add(year_span(self.study_start_age.saturating_add(self.study_duration_years)))
    }
}

/// Retirement hypothesis for one adult
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PensionHypothesis {
    /// Name of the adult this hypothesis applies to
    pub adult: String,

    pub retirement_age: u32,

    /// Annual pension once retired (not re-indexed)
    #[serde(default)]
    pub annual_pension: f64,

    #[serde(default)]
    pub active: bool,
}

impl PensionHypothesis {
    pub fn new(adult: impl Into<String>, retirement_age: u32, annual_pension: f64, active: bool) -> Self {
        Self {
            adult: adult.into(),
            retirement_age,
            annual_pension,
            active,
        }
    }

    /// Calendar year in which the adult retires
    pub fn retirement_year(&self, birth_year: i32) -> i32 {
        birth_year.saturating_add(year_span(self.retirement_age))
    }
}

/// Tax-incentive scheme attached to a rental property (Pinel-style)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxIncentive {
    /// Scheme name, e.g. "Pinel Classique (2023)"
    pub scheme: String,

    /// Commitment period in years
    pub duration_years: u32,
}

/// One line of patrimony
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,

    pub name: String,

    pub category: AssetCategory,

    /// Current market value
    pub gross_value: f64,

    /// Annual appreciation (percent)
    #[serde(default)]
    pub appreciation_rate_pct: f64,

    #[serde(default)]
    pub purchase_price: f64,

    pub purchase_date: NaiveDate,

    /// Actual notary/agency fees paid at purchase
    #[serde(default)]
    pub acquisition_costs: f64,

    /// Deductible renovation works
    #[serde(default)]
    pub works_costs: f64,

    /// Gross monthly rent (income properties only)
    #[serde(default)]
    pub monthly_rent: f64,

    /// Annual co-ownership and running charges
    #[serde(default)]
    pub annual_charges: f64,

    /// Annual property tax
    #[serde(default)]
    pub property_tax: f64,

    #[serde(default)]
    pub incentive: Option<TaxIncentive>,
}

impl Asset {
    /// Create an asset with no rental or incentive data
    pub fn new(
        id: AssetId,
        name: impl Into<String>,
        category: AssetCategory,
        gross_value: f64,
        appreciation_rate_pct: f64,
        purchase_price: f64,
        purchase_date: NaiveDate,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            category,
            gross_value,
            appreciation_rate_pct,
            purchase_price,
            purchase_date,
            acquisition_costs: 0.0,
            works_costs: 0.0,
            monthly_rent: 0.0,
            annual_charges: 0.0,
            property_tax: 0.0,
            incentive: None,
        }
    }

    pub fn with_rent(mut self, monthly_rent: f64, annual_charges: f64, property_tax: f64) -> Self {
        self.monthly_rent = monthly_rent;
        self.annual_charges = annual_charges;
        self.property_tax = property_tax;
        self
    }

    pub fn with_incentive(mut self, scheme: impl Into<String>, duration_years: u32) -> Self {
        self.incentive = Some(TaxIncentive {
            scheme: scheme.into(),
            duration_years,
        });
        self
    }

    pub fn is_income_property(&self) -> bool {
        self.category == AssetCategory::IncomeProperty
    }

    /// Annual gross rent before indexing
    pub fn annual_rent(&self) -> f64 {
        if self.is_income_property() {
            self.monthly_rent * 12.0
        } else {
            0.0
        }
    }

    /// Annual running costs (charges + property tax) of an income property
    pub fn annual_running_costs(&self) -> f64 {
        if self.is_income_property() {
            self.annual_charges + self.property_tax
        } else {
            0.0
        }
    }
}

/// Mortgage or consumer loan attached to an asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,

    pub name: String,

    pub principal: f64,

    /// Nominal annual rate (percent)
    #[serde(default)]
    pub annual_rate_pct: f64,

    /// Annual borrower insurance on the original principal (percent)
    #[serde(default)]
    pub insurance_rate_pct: f64,

    pub term_years: u32,

    pub start_date: NaiveDate,

    /// Asset financed by this loan
    pub asset: AssetId,
}

impl Loan {
    pub fn new(
        id: LoanId,
        name: impl Into<String>,
        principal: f64,
        annual_rate_pct: f64,
        term_years: u32,
        start_date: NaiveDate,
        asset: AssetId,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            principal,
            annual_rate_pct,
            insurance_rate_pct: 0.0,
            term_years,
            start_date,
            asset,
        }
    }

    pub fn with_insurance(mut self, insurance_rate_pct: f64) -> Self {
        self.insurance_rate_pct = insurance_rate_pct;
        self
    }
}

/// Recurring non-salary income (dividends, allowances, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeLine {
    pub label: String,
    pub annual_amount: f64,
}

/// Recurring household expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseLine {
    pub label: String,
    pub annual_amount: f64,
}

/// Indexing assumptions (percent per year)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EconomicHypotheses {
    #[serde(default)]
    pub inflation_pct: f64,

    #[serde(default)]
    pub wage_growth_pct: f64,
}

impl EconomicHypotheses {
    pub fn inflation_factor(&self) -> f64 {
        1.0 + self.inflation_pct / 100.0
    }

    pub fn wage_growth_factor(&self) -> f64 {
        1.0 + self.wage_growth_pct / 100.0
    }
}

/// Scheduled disposal of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleEvent {
    pub asset: AssetId,
    pub year: i32,
}

/// Complete projection input
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Household {
    #[serde(default)]
    pub adults: Vec<Adult>,

    #[serde(default)]
    pub children: Vec<Child>,

    #[serde(default)]
    pub pensions: Vec<PensionHypothesis>,

    #[serde(default)]
    pub assets: Vec<Asset>,

    #[serde(default)]
    pub loans: Vec<Loan>,

    #[serde(default)]
    pub incomes: Vec<IncomeLine>,

    #[serde(default)]
    pub expenses: Vec<ExpenseLine>,

    #[serde(default)]
    pub economics: EconomicHypotheses,

    /// Single parent raising dependents alone ("case T")
    #[serde(default)]
    pub single_parent: bool,

    #[serde(default)]
    pub sales: Vec<SaleEvent>,
}

impl Household {
    pub fn asset(&self, id: AssetId) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == id)
    }

    pub fn adult(&self, name: &str) -> Option<&Adult> {
        self.adults.iter().find(|a| a.name == name)
    }

    /// Loans financing the given asset
    pub fn loans_for(&self, id: AssetId) -> impl Iterator<Item = &Loan> {
        self.loans.iter().filter(move |l| l.asset == id)
    }

    /// Gross value minus the balance of the asset's loans at the end of `year`
    pub fn net_value_of(&self, id: AssetId, year: i32) -> Option<f64> {
        let asset = self.asset(id)?;
        let debt: f64 = self
            .loans_for(id)
            .map(|l| {
                let schedule = amortize(l.principal, l.annual_rate_pct, l.term_years, l.start_date, l.insurance_rate_pct);
                match schedule.status_in(year) {
                    LoanStatus::Amortizing => schedule.balance_at_end_of(year),
                    _ => 0.0,
                }
            })
            .sum();
        Some(asset.gross_value - debt)
    }

    /// Next free asset identifier
    pub fn next_asset_id(&self) -> AssetId {
        AssetId(self.assets.iter().map(|a| a.id.0.saturating_add(1)).max().unwrap_or(1))
    }

    /// Default household shown to a new user
    pub fn sample(reference_year: i32) -> Self {
        let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default();

        let residence = AssetId(1);
        let rental = AssetId(2);

        Self {
            adults: vec![Adult::from_age("Jean", 40, reference_year, 60_000.0)],
            children: vec![Child::new("Léo", reference_year - 12, 18, 5, 8_000.0)],
            pensions: vec![PensionHypothesis::new("Jean", 64, 30_000.0, true)],
            assets: vec![
                Asset::new(residence, "Résidence Principale", AssetCategory::OwnerOccupied,
                    350_000.0, 2.0, 220_000.0, date(2015, 6, 15)),
                Asset::new(rental, "Immo Locatif (meublé)", AssetCategory::IncomeProperty,
                    120_000.0, 4.5, 90_000.0, date(2018, 9, 1))
                    .with_rent(650.0, 600.0, 900.0),
                Asset::new(AssetId(3), "Assurance Vie", AssetCategory::Financial,
                    50_000.0, 3.5, 50_000.0, date(2019, 1, 1)),
                Asset::new(AssetId(4), "Livret bancaire", AssetCategory::Financial,
                    15_000.0, 3.0, 15_000.0, date(2019, 1, 1)),
            ],
            loans: vec![
                Loan::new(LoanId(1), "Prêt RP", 150_000.0, 1.5, 25, date(2020, 1, 1), residence)
                    .with_insurance(0.36),
                Loan::new(LoanId(2), "Prêt Locatif", 40_000.0, 2.0, 20, date(2022, 1, 1), rental),
            ],
            incomes: Vec::new(),
            expenses: vec![ExpenseLine {
                label: "Dépenses courantes".to_string(),
                annual_amount: 25_000.0,
            }],
            economics: EconomicHypotheses {
                inflation_pct: 2.0,
                wage_growth_pct: 1.5,
            },
            single_parent: true,
            sales: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_end_of_studies() {
        let child = Child::new("Léo", 2014, 18, 5, 8_000.0);
        assert_eq!(child.end_of_studies_year(), 2037);
        assert_eq!(child.age_in(2026), 12);
    }

    #[test]
    fn test_extreme_ages_saturate() {
        let child = Child::new("Léo", 2014, u32::MAX, u32::MAX, 0.0);
        assert_eq!(child.end_of_studies_year(), i32::MAX);

        let pension = PensionHypothesis::new("Jean", u32::MAX, 0.0, true);
        assert_eq!(pension.retirement_year(1986), i32::MAX);

        let adult = Adult::new("Jean", i32::MIN, 0.0);
        assert_eq!(adult.age_in(2026), i32::MAX);
    }

    #[test]
    fn test_rent_only_for_income_property() {
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let flat = Asset::new(AssetId(1), "Flat", AssetCategory::IncomeProperty, 100.0, 0.0, 100.0, date)
            .with_rent(500.0, 100.0, 50.0);
        let home = Asset::new(AssetId(2), "Home", AssetCategory::OwnerOccupied, 100.0, 0.0, 100.0, date)
            .with_rent(500.0, 100.0, 50.0);

        assert_eq!(flat.annual_rent(), 6_000.0);
        assert_eq!(flat.annual_running_costs(), 150.0);
        assert_eq!(home.annual_rent(), 0.0);
        assert_eq!(home.annual_running_costs(), 0.0);
    }

    #[test]
    fn test_sample_household_is_consistent() {
        let household = Household::sample(2026);
        assert_eq!(household.adults[0].birth_year, 1986);
        for loan in &household.loans {
            assert!(household.asset(loan.asset).is_some());
        }
        assert_eq!(household.next_asset_id(), AssetId(5));
    }

    #[test]
    fn test_net_value_subtracts_running_loans() {
        let household = Household::sample(2026);
        let residence = AssetId(1);
        let net = household.net_value_of(residence, 2026).unwrap();
        assert!(net > 350_000.0 - 150_000.0);
        assert!(net < 350_000.0);
        assert_eq!(household.net_value_of(AssetId(3), 2026), Some(50_000.0));
        assert_eq!(household.net_value_of(AssetId(42), 2026), None);
    }
}
