//! Income tax for a projected year
//!
//! The base tax comes from a pluggable [`TaxEngine`] selected through
//! [`TaxMethod`]; active rental incentives are then deducted, never taking the
//! tax below zero.

use crate::assumptions::{household_parts, incentive_active, Assumptions, IncentiveRates, TaxBrackets};
use crate::household::Asset;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Flat rate used by [`FlatRateTaxEngine`] when none is configured
pub const DEFAULT_FLAT_RATE: f64 = 0.15;

#[derive(Debug, Error, PartialEq)]
pub enum TaxError {
    #[error("taxable income is not a finite number ({0})")]
    InvalidIncome(f64),

    #[error("invalid number of fiscal parts ({0})")]
    InvalidParts(f64),

    #[error("income tax scale has no brackets")]
    EmptyScale,
}

/// Household composition relevant to the quotient familial
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxComposition {
    pub adults: usize,
    pub dependents: usize,
    pub single_parent: bool,
}

impl TaxComposition {
    pub fn parts(&self) -> f64 {
        household_parts(self.adults, self.dependents, self.single_parent)
    }
}

/// Computes the income tax due before incentive reductions
pub trait TaxEngine: Send + Sync {
    fn name(&self) -> &'static str;

    fn base_tax(&self, year: i32, taxable_income: f64, composition: &TaxComposition) -> Result<f64, TaxError>;
}

/// Progressive scale applied through the quotient familial
#[derive(Debug, Clone)]
pub struct BracketTaxEngine {
    brackets: TaxBrackets,
}

impl BracketTaxEngine {
    pub fn new(brackets: TaxBrackets) -> Self {
        Self { brackets }
    }
}

impl TaxEngine for BracketTaxEngine {
    fn name(&self) -> &'static str {
        "progressive brackets"
    }

    fn base_tax(&self, _year: i32, taxable_income: f64, composition: &TaxComposition) -> Result<f64, TaxError> {
        if !taxable_income.is_finite() {
            return Err(TaxError::InvalidIncome(taxable_income));
        }
        if self.brackets.brackets().is_empty() {
            return Err(TaxError::EmptyScale);
        }
        let parts = composition.parts();
        if !(parts > 0.0) {
            return Err(TaxError::InvalidParts(parts));
        }
        Ok(self.brackets.household_tax(taxable_income, parts))
    }
}

/// Single rate on the whole income
///
/// Ignores household composition, so it over-taxes families. Only meant as an
/// approximation when no bracket table is available.
#[derive(Debug, Clone, Copy)]
pub struct FlatRateTaxEngine {
    rate: f64,
}

impl FlatRateTaxEngine {
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }
}

impl Default for FlatRateTaxEngine {
    fn default() -> Self {
        Self::new(DEFAULT_FLAT_RATE)
    }
}

impl TaxEngine for FlatRateTaxEngine {
    fn name(&self) -> &'static str {
        "flat rate"
    }

    fn base_tax(&self, _year: i32, taxable_income: f64, _composition: &TaxComposition) -> Result<f64, TaxError> {
        if !taxable_income.is_finite() {
            return Err(TaxError::InvalidIncome(taxable_income));
        }
        Ok((taxable_income * self.rate).max(0.0))
    }
}

/// How the base income tax is computed
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum TaxMethod {
    #[default]
    Brackets,
    /// Flat rate as a decimal
    FlatRate(f64),
}

impl TaxMethod {
    pub fn engine(&self, assumptions: &Assumptions) -> Box<dyn TaxEngine> {
        match *self {
            TaxMethod::Brackets => Box::new(BracketTaxEngine::new(assumptions.tax_brackets.clone())),
            TaxMethod::FlatRate(rate) => Box::new(FlatRateTaxEngine::new(rate)),
        }
    }
}

/// Outcome of the tax computation for one year
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncomeTax {
    /// Tax before incentives
    pub base_tax: f64,
    /// Incentive reduction available this year
    pub reduction: f64,
    /// Tax actually due
    pub tax: f64,
    /// Engine failure, the year's tax is then 0
    pub error: Option<String>,
}

/// Compute the tax due for a year
pub fn compute_income_tax(
    year: i32,
    taxable_income: f64,
    composition: &TaxComposition,
    engine: &dyn TaxEngine,
    reduction: f64,
) -> IncomeTax {
    match engine.base_tax(year, taxable_income, composition) {
        Ok(base_tax) => IncomeTax {
            base_tax,
            reduction,
            tax: (base_tax - reduction).max(0.0),
            error: None,
        },
        Err(err) => {
            log::error!("{} tax engine failed for {}: {}", engine.name(), year, err);
            IncomeTax {
                reduction,
                error: Some(format!("{}: income tax set to 0 ({})", year, err)),
                ..Default::default()
            }
        }
    }
}

/// Sum of incentive reductions active in `year` over held assets
///
/// An incentive runs from the purchase year for its commitment period.
pub fn incentive_reductions(year: i32, assets: &[Asset], rates: &IncentiveRates) -> f64 {
    assets
        .iter()
        .filter_map(|asset| {
            let incentive = asset.incentive.as_ref()?;
            incentive_active(incentive, asset.purchase_date.year(), year)
                .then(|| rates.annual_reduction(incentive, asset.purchase_price))
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::household::{AssetCategory, AssetId};
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    fn single() -> TaxComposition {
        TaxComposition {
            adults: 1,
            dependents: 0,
            single_parent: false,
        }
    }

    struct FailingEngine;

    impl TaxEngine for FailingEngine {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn base_tax(&self, _year: i32, _income: f64, _composition: &TaxComposition) -> Result<f64, TaxError> {
            Err(TaxError::EmptyScale)
        }
    }

    #[test]
    fn test_reduction_floored_at_zero() {
        let engine = BracketTaxEngine::new(TaxBrackets::france_2024());
        let tax = compute_income_tax(2025, 30_000.0, &single(), &engine, 10_000.0);
        assert!(tax.base_tax > 0.0 && tax.base_tax < 10_000.0);
        assert_eq!(tax.tax, 0.0);

        let partial = compute_income_tax(2025, 30_000.0, &single(), &engine, 1_000.0);
        assert_abs_diff_eq!(partial.tax, partial.base_tax - 1_000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_never_negative() {
        let engine = BracketTaxEngine::new(TaxBrackets::france_2024());
        for income in [-10_000.0, 0.0, 5_000.0, 50_000.0, 500_000.0] {
            for reduction in [0.0, 3_000.0, 1e9] {
                let tax = compute_income_tax(2025, income, &single(), &engine, reduction);
                assert!(tax.tax >= 0.0);
            }
        }
    }

    #[test]
    fn test_flat_rate_engine() {
        let engine = FlatRateTaxEngine::default();
        let tax = compute_income_tax(2025, 40_000.0, &single(), &engine, 0.0);
        assert_abs_diff_eq!(tax.tax, 6_000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_engine_failure_degrades_to_zero() {
        let tax = compute_income_tax(2025, 40_000.0, &single(), &FailingEngine, 500.0);
        assert_eq!(tax.tax, 0.0);
        assert!(tax.error.is_some());

        let engine = BracketTaxEngine::new(TaxBrackets::france_2024());
        let nan = compute_income_tax(2025, f64::NAN, &single(), &engine, 0.0);
        assert_eq!(nan.tax, 0.0);
        assert!(nan.error.unwrap().contains("2025"));
    }

    #[test]
    fn test_method_selects_engine() {
        let assumptions = Assumptions::default_2024();
        assert_eq!(TaxMethod::Brackets.engine(&assumptions).name(), "progressive brackets");
        assert_eq!(TaxMethod::FlatRate(0.2).engine(&assumptions).name(), "flat rate");
        assert_eq!(TaxMethod::default(), TaxMethod::Brackets);
    }

    #[test]
    fn test_incentive_window() {
        let purchase = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let assets = vec![
            crate::household::Asset::new(AssetId(1), "Studio Pinel", AssetCategory::IncomeProperty,
                200_000.0, 1.0, 200_000.0, purchase)
                .with_rent(700.0, 500.0, 600.0)
                .with_incentive("Pinel Classique (2024)", 6),
        ];
        let rates = IncentiveRates::default();

        let annual = 200_000.0 * 0.09 / 6.0;
        assert_eq!(incentive_reductions(2023, &assets, &rates), 0.0);
        assert_abs_diff_eq!(incentive_reductions(2024, &assets, &rates), annual, epsilon = 1e-9);
        assert_abs_diff_eq!(incentive_reductions(2029, &assets, &rates), annual, epsilon = 1e-9);
        assert_eq!(incentive_reductions(2030, &assets, &rates), 0.0);
    }
}
