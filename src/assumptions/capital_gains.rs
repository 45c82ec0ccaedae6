//! Capital-gains tax on real-estate disposals
//!
//! The gross gain is taxed twice: an income-tax part and a social-levy part,
//! each with its own holding-period allowance schedule.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Capital-gains parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalGainsRules {
    /// Flat acquisition-cost allowance on the purchase price
    pub flat_acquisition_rate: f64,
    pub income_tax_rate: f64,
    pub social_levy_rate: f64,
    /// Holding years with no allowance at all
    pub allowance_free_years: u32,
    /// Income-tax allowance per year held, years 6 to 21
    pub income_tax_yearly_allowance: f64,
    /// Income-tax allowance for the 22nd year
    pub income_tax_final_allowance: f64,
    /// Social-levy allowance per year held, years 6 to 21
    pub social_levy_yearly_allowance: f64,
    /// Social-levy allowance for the 22nd year
    pub social_levy_year22_allowance: f64,
    /// Social-levy allowance per year held, years 23 to 30
    pub social_levy_late_allowance: f64,
}

impl Default for CapitalGainsRules {
    fn default() -> Self {
        Self {
            flat_acquisition_rate: 0.075,
            income_tax_rate: 0.19,
            social_levy_rate: 0.172,
            allowance_free_years: 5,
            income_tax_yearly_allowance: 0.06,
            income_tax_final_allowance: 0.04,
            social_levy_yearly_allowance: 0.0165,
            social_levy_year22_allowance: 0.016,
            social_levy_late_allowance: 0.09,
        }
    }
}

/// Result of a capital-gains assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalGainsTax {
    pub sale_price: f64,
    /// Purchase price + acquisition allowance + works
    pub cost_basis: f64,
    /// Sale price - cost basis (may be negative)
    pub gross_gain: f64,
    pub holding_years: u32,
    pub income_tax: f64,
    pub social_levies: f64,
    /// Main residence exemption applied
    pub exempt: bool,
}

impl CapitalGainsTax {
    pub fn total(&self) -> f64 {
        self.income_tax + self.social_levies
    }

    /// Human-readable breakdown for the event log
    pub fn describe(&self) -> String {
        if self.exempt {
            "Main residence, exempt from capital-gains tax".to_string()
        } else if self.gross_gain <= 0.0 {
            format!("No taxable gain (gross {:.0})", self.gross_gain)
        } else {
            format!(
                "Gross gain {:.0} after {} years, income tax {:.0}, social levies {:.0}",
                self.gross_gain, self.holding_years, self.income_tax, self.social_levies
            )
        }
    }
}

impl CapitalGainsRules {
    /// Create from loaded CSV parameters, keeping defaults for missing names
    pub fn from_loaded(parameters: &HashMap<String, f64>) -> Self {
        let defaults = Self::default();
        let get = |name: &str, default: f64| parameters.get(name).copied().unwrap_or(default);
        Self {
            flat_acquisition_rate: get("flat_acquisition_rate", defaults.flat_acquisition_rate),
            income_tax_rate: get("income_tax_rate", defaults.income_tax_rate),
            social_levy_rate: get("social_levy_rate", defaults.social_levy_rate),
            allowance_free_years: get("allowance_free_years", defaults.allowance_free_years as f64) as u32,
            income_tax_yearly_allowance: get("income_tax_yearly_allowance", defaults.income_tax_yearly_allowance),
            income_tax_final_allowance: get("income_tax_final_allowance", defaults.income_tax_final_allowance),
            social_levy_yearly_allowance: get("social_levy_yearly_allowance", defaults.social_levy_yearly_allowance),
            social_levy_year22_allowance: get("social_levy_year22_allowance", defaults.social_levy_year22_allowance),
            social_levy_late_allowance: get("social_levy_late_allowance", defaults.social_levy_late_allowance),
        }
    }

    /// Share of the gain exempt from the income-tax part
    pub fn income_tax_allowance(&self, holding_years: u32) -> f64 {
        if holding_years <= self.allowance_free_years {
            return 0.0;
        }
        let standard_years = holding_years.min(21).saturating_sub(self.allowance_free_years);
        let mut allowance = self.income_tax_yearly_allowance * standard_years as f64;
        if holding_years >= 22 {
            allowance += self.income_tax_final_allowance;
        }
        allowance.min(1.0)
    }

    /// Share of the gain exempt from social levies
    pub fn social_levy_allowance(&self, holding_years: u32) -> f64 {
        if holding_years <= self.allowance_free_years {
            return 0.0;
        }
        let standard_years = holding_years.min(21).saturating_sub(self.allowance_free_years);
        let mut allowance = self.social_levy_yearly_allowance * standard_years as f64;
        if holding_years >= 22 {
            allowance += self.social_levy_year22_allowance;
        }
        allowance += self.social_levy_late_allowance * holding_years.min(30).saturating_sub(22) as f64;
        allowance.min(1.0)
    }

    /// Assess the tax due on the sale of a property
    #[allow(clippy::too_many_arguments)]
    pub fn assess(
        &self,
        sale_price: f64,
        purchase_price: f64,
        acquisition_costs: f64,
        works_costs: f64,
        purchase_date: NaiveDate,
        sale_date: NaiveDate,
        main_residence: bool,
    ) -> CapitalGainsTax {
        let acquisition = acquisition_costs.max(purchase_price * self.flat_acquisition_rate);
        let cost_basis = purchase_price + acquisition + works_costs;
        let gross_gain = sale_price - cost_basis;
        let holding_years = sale_date.years_since(purchase_date).unwrap_or(0);

        let mut assessment = CapitalGainsTax {
            sale_price,
            cost_basis,
            gross_gain,
            holding_years,
            income_tax: 0.0,
            social_levies: 0.0,
            exempt: main_residence,
        };
        if main_residence || gross_gain <= 0.0 {
            return assessment;
        }

        let income_tax_base = gross_gain * (1.0 - self.income_tax_allowance(holding_years));
        let social_levy_base = gross_gain * (1.0 - self.social_levy_allowance(holding_years));
        assessment.income_tax = income_tax_base.max(0.0) * self.income_tax_rate;
        assessment.social_levies = social_levy_base.max(0.0) * self.social_levy_rate;
        assessment
    }
}
