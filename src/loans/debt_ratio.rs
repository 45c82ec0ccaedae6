//! Household debt ratio (taux d'endettement)
//!
//! Monthly loan charges divided by monthly income, where gross rents only count
//! for a fraction of their amount as lenders usually do.

use super::amortization::{monthly_payment, MAX_TERM_YEARS};
use crate::household::{Household, LoanId};
use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Share of gross rents counted as income
pub const RENT_WEIGHTING: f64 = 0.70;

/// Default acceptable debt ratio (percent)
pub const DEFAULT_TARGET_PCT: f64 = 35.0;

/// Points above the target still considered a warning rather than an excess
pub const VIGILANCE_MARGIN_PCT: f64 = 5.0;

/// Position of the ratio relative to the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DebtLevel {
    WithinTarget,
    Vigilance,
    Excessive,
}

impl DebtLevel {
    pub fn describe(&self) -> &'static str {
        match self {
            DebtLevel::WithinTarget => "within target",
            DebtLevel::Vigilance => "above target, within the vigilance margin",
            DebtLevel::Excessive => "well above target",
        }
    }
}

/// Why a loan is (or is not) counted in the ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargeStatus {
    Active,
    NotStarted,
    Repaid,
    NoPrincipal,
    NoTerm,
}

impl ChargeStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, ChargeStatus::Active)
    }

    pub fn describe(&self) -> &'static str {
        match self {
            ChargeStatus::Active => "active, included",
            ChargeStatus::NotStarted => "future loan",
            ChargeStatus::Repaid => "already repaid",
            ChargeStatus::NoPrincipal => "zero or missing principal",
            ChargeStatus::NoTerm => "zero or missing term",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanCharge {
    pub loan: LoanId,
    pub description: String,
    /// Instalment including insurance (0 when not computable)
    pub monthly_payment: f64,
    pub status: ChargeStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtRatioReport {
    pub as_of: NaiveDate,
    pub charges: Vec<LoanCharge>,
    /// Sum of instalments of active loans
    pub monthly_charges: f64,
    /// Salaries + other incomes + weighted rents, per month
    pub monthly_income: f64,
    /// Debt ratio in percent, None when there is no income
    pub ratio_pct: Option<f64>,
    pub target_pct: f64,
}

impl DebtRatioReport {
    pub fn level(&self) -> DebtLevel {
        match self.ratio_pct {
            Some(ratio) if ratio <= self.target_pct => DebtLevel::WithinTarget,
            Some(ratio) if ratio <= self.target_pct + VIGILANCE_MARGIN_PCT => DebtLevel::Vigilance,
            Some(_) => DebtLevel::Excessive,
            None if self.monthly_charges <= 0.0 => DebtLevel::WithinTarget,
            None => DebtLevel::Excessive,
        }
    }

    pub fn within_target(&self) -> bool {
        self.level() == DebtLevel::WithinTarget
    }

    /// Extra monthly instalment still acceptable under the target
    ///
    /// Negative when the target is already exceeded.
    pub fn remaining_capacity(&self) -> f64 {
        self.monthly_income.max(0.0) * self.target_pct / 100.0 - self.monthly_charges
    }
}

fn charge_status(principal: f64, term_years: u32, start: NaiveDate, as_of: NaiveDate) -> ChargeStatus {
    let end = start
        .checked_add_months(Months::new(term_years.min(MAX_TERM_YEARS) * 12))
        .unwrap_or(NaiveDate::MAX);
    if !(principal > 0.0) {
        ChargeStatus::NoPrincipal
    } else if term_years == 0 {
        ChargeStatus::NoTerm
    } else if start >= as_of {
        ChargeStatus::NotStarted
    } else if end <= as_of {
        ChargeStatus::Repaid
    } else {
        ChargeStatus::Active
    }
}

/// Analyse the debt ratio of a household at a given date
pub fn analyze(household: &Household, as_of: NaiveDate, target_pct: f64) -> DebtRatioReport {
    let charges: Vec<LoanCharge> = household
        .loans
        .iter()
        .map(|loan| {
            let asset_name = household
                .asset(loan.asset)
                .map(|a| a.name.as_str())
                .unwrap_or("N/A");
            LoanCharge {
                loan: loan.id,
                description: format!("{} ({})", loan.name, asset_name),
                monthly_payment: monthly_payment(
                    loan.principal,
                    loan.annual_rate_pct,
                    loan.term_years,
                    loan.insurance_rate_pct,
                ),
                status: charge_status(loan.principal, loan.term_years, loan.start_date, as_of),
            }
        })
        .collect();

    let monthly_charges: f64 = charges
        .iter()
        .filter(|c| c.status.is_active())
        .map(|c| c.monthly_payment)
        .sum();

    let salaries: f64 = household.adults.iter().map(|a| a.annual_salary).sum();
    let other_incomes: f64 = household.incomes.iter().map(|i| i.annual_amount).sum();
    let rents: f64 = household.assets.iter().map(|a| a.annual_rent()).sum();
    let monthly_income = (salaries + other_incomes + RENT_WEIGHTING * rents) / 12.0;

    let ratio_pct = if monthly_income > 0.0 {
        Some(monthly_charges / monthly_income * 100.0)
    } else {
        None
    };

    DebtRatioReport {
        as_of,
        charges,
        monthly_charges,
        monthly_income,
        ratio_pct,
        target_pct,
    }
}
