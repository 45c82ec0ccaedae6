//! Fiscal assumptions: income-tax scale, capital gains, rental incentives

mod capital_gains;
mod incentives;
mod tax_brackets;
pub mod loader;

pub use capital_gains::{CapitalGainsRules, CapitalGainsTax};
pub use incentives::{incentive_active, IncentiveRates, OTHER_SCHEME_RATE, PINEL_PRICE_CAP};
pub use loader::{AssumptionsError, LoadedAssumptions};
pub use tax_brackets::{household_parts, TaxBracket, TaxBrackets};

use std::path::Path;

/// Container for all projection assumptions
#[derive(Debug, Clone, PartialEq)]
pub struct Assumptions {
    pub tax_brackets: TaxBrackets,
    pub capital_gains: CapitalGainsRules,
    pub incentives: IncentiveRates,
}

impl Assumptions {
    /// French rules applicable to 2024 income
    pub fn default_2024() -> Self {
        Self {
            tax_brackets: TaxBrackets::france_2024(),
            capital_gains: CapitalGainsRules::default(),
            incentives: IncentiveRates::pinel_defaults(),
        }
    }

    /// Load assumptions from CSV files in the default location (data/assumptions/)
    pub fn from_csv() -> loader::Result<Self> {
        Self::from_csv_path(Path::new(loader::DEFAULT_ASSUMPTIONS_PATH))
    }

    /// Load assumptions from CSV files in a specific directory
    pub fn from_csv_path(path: &Path) -> loader::Result<Self> {
        let loaded = LoadedAssumptions::load_from(path)?;

        Ok(Self {
            tax_brackets: TaxBrackets::from_loaded(&loaded.income_tax_brackets),
            capital_gains: CapitalGainsRules::from_loaded(&loaded.capital_gains),
            incentives: IncentiveRates::from_loaded(&loaded.pinel_rates),
        })
    }
}

impl Default for Assumptions {
    fn default() -> Self {
        Self::default_2024()
    }
}
