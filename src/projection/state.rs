//! Rolling simulation state carried from one projected year to the next

use crate::household::{Asset, AssetId, EconomicHypotheses, Household, Loan};
use crate::loans::{amortize, AmortizationSchedule, LoanStatus, YearlyInstallment};
use super::timeline::{PersonStatus, Timeline};
use std::collections::BTreeMap;

/// A live loan and its precomputed schedule
#[derive(Debug, Clone)]
pub struct LoanState {
    pub loan: Loan,
    pub schedule: AmortizationSchedule,
}

impl LoanState {
    pub fn new(loan: Loan) -> Self {
        let schedule = amortize(
            loan.principal,
            loan.annual_rate_pct,
            loan.term_years,
            loan.start_date,
            loan.insurance_rate_pct,
        );
        Self { loan, schedule }
    }

    pub fn status_in(&self, year: i32) -> LoanStatus {
        self.schedule.status_in(year)
    }

    /// Capital still owed at the end of `year`, only while repayments run
    pub fn outstanding_at_end_of(&self, year: i32) -> f64 {
        match self.status_in(year) {
            LoanStatus::Amortizing => self.schedule.balance_at_end_of(year),
            _ => 0.0,
        }
    }
}

/// Loan outflows of one year, summed over live loans
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoanPayments {
    pub interest: f64,
    pub principal: f64,
    pub insurance: f64,
}

impl LoanPayments {
    pub fn total(&self) -> f64 {
        self.interest + self.principal + self.insurance
    }

    /// Sum the schedule rows of `year` over some loans
    pub fn due_in<'a>(loans: impl IntoIterator<Item = &'a LoanState>, year: i32) -> Self {
        loans
            .into_iter()
            .filter_map(|l| l.schedule.year(year))
            .fold(Self::default(), |acc, row| acc + row)
    }
}

impl std::ops::Add<&YearlyInstallment> for LoanPayments {
    type Output = Self;

    fn add(self, row: &YearlyInstallment) -> Self {
        Self {
            interest: self.interest + row.interest,
            principal: self.principal + row.principal,
            insurance: self.insurance + row.insurance,
        }
    }
}

impl std::ops::Add for LoanPayments {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            interest: self.interest + other.interest,
            principal: self.principal + other.principal,
            insurance: self.insurance + other.insurance,
        }
    }
}

/// State of the household at the start of a projected year
#[derive(Debug, Clone)]
pub struct SimulationState {
    /// Year about to be projected
    pub year: i32,

    /// Years already projected
    pub years_elapsed: u32,

    /// Assets still held, revalued each year
    pub assets: Vec<Asset>,

    /// Loans whose asset is still held
    pub loans: Vec<LoanState>,

    /// Current indexed salary per adult
    pub salaries: BTreeMap<String, f64>,

    /// Cumulative inflation applied to non-salary amounts
    pub inflation_index: f64,

    pub economics: EconomicHypotheses,

    /// Highest asset identifier seen in the run, sold assets included
    last_asset_id: u32,
}

impl SimulationState {
    /// Initialize state from a household at projection start
    pub fn from_household(household: &Household, start_year: i32, economics: EconomicHypotheses) -> Self {
        Self {
            year: start_year,
            years_elapsed: 0,
            assets: household.assets.clone(),
            loans: household.loans.iter().cloned().map(LoanState::new).collect(),
            salaries: household
                .adults
                .iter()
                .map(|a| (a.name.clone(), a.annual_salary))
                .collect(),
            inflation_index: 1.0,
            economics,
            last_asset_id: household
                .assets
                .iter()
                .map(|a| a.id.0)
                .chain(household.loans.iter().map(|l| l.asset.0))
                .chain(household.sales.iter().map(|s| s.asset.0))
                .max()
                .unwrap_or(0),
        }
    }

    pub fn asset(&self, id: AssetId) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == id)
    }

    pub fn holds(&self, id: AssetId) -> bool {
        self.asset(id).is_some()
    }

    pub fn salary_of(&self, adult: &str) -> f64 {
        self.salaries.get(adult).copied().unwrap_or(0.0)
    }

    /// Identifier never used by any asset, loan or sale of this run
    pub fn next_asset_id(&self) -> AssetId {
        let highest_held = self.assets.iter().map(|a| a.id.0).max().unwrap_or(0);
        AssetId(self.last_asset_id.max(highest_held).saturating_add(1))
    }

    /// Repayments due on live loans during `year`
    pub fn loan_payments(&self, year: i32) -> LoanPayments {
        LoanPayments::due_in(&self.loans, year)
    }

    /// Outstanding capital at the end of `year`, grouped by financed asset
    pub fn liabilities_by_asset(&self, year: i32) -> BTreeMap<AssetId, f64> {
        let mut by_asset = BTreeMap::new();
        for loan in &self.loans {
            let outstanding = loan.outstanding_at_end_of(year);
            if outstanding > 0.0 {
                *by_asset.entry(loan.loan.asset).or_insert(0.0) += outstanding;
            }
        }
        by_asset
    }

    /// Remove an asset and every loan financing it
    ///
    /// Returns the removed asset and loans, or None when the asset is not held.
    pub fn remove_asset(&mut self, id: AssetId) -> Option<(Asset, Vec<LoanState>)> {
        let index = self.assets.iter().position(|a| a.id == id)?;
        let asset = self.assets.remove(index);
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.loans)
            .into_iter()
            .partition(|l| l.loan.asset == id);
        self.loans = kept;
        Some((asset, removed))
    }

    /// Advance indices to the next year
    ///
    /// Salaries of adults still active this year grow with wages; retired
    /// adults keep their last salary frozen. Inflation compounds once.
    pub fn close_year(&mut self, timeline: &Timeline) {
        let wage_factor = self.economics.wage_growth_factor();
        for adult in &timeline.adults {
            if adult.status == PersonStatus::Active {
                if let Some(salary) = self.salaries.get_mut(&adult.name) {
                    *salary *= wage_factor;
                }
            }
        }
        self.inflation_index *= self.economics.inflation_factor();
        self.year += 1;
        self.years_elapsed += 1;
    }
}
