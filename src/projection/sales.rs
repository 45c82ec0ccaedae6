//! Scheduled property disposals
//!
//! The property leaves the simulation at the start of its sale year, at the
//! value it carried into the year: it neither appreciates nor earns rent that
//! year. The deed is dated 31 December, which sets the holding period. Its
//! loans are serviced through the year and their year-end balance is repaid
//! from the proceeds.

use crate::assumptions::{CapitalGainsRules, CapitalGainsTax};
use crate::household::{AssetCategory, AssetId, SaleEvent};
use chrono::NaiveDate;
use super::state::{LoanPayments, SimulationState};

/// A completed sale
#[derive(Debug, Clone, PartialEq)]
pub struct SaleRecord {
    pub asset: AssetId,
    pub name: String,
    pub sale_price: f64,
    pub capital_gains: CapitalGainsTax,
    /// Outstanding capital of the asset's loans repaid at closing
    pub loan_payoff: f64,
    pub net_proceeds: f64,
}

/// Sales processed for one year
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaleOutcome {
    pub sales: Vec<SaleRecord>,
    /// Sum of net proceeds, added to the year's cash flow
    pub net_cash: f64,
    /// Instalments still due this year on the loans repaid at closing
    pub loan_payments: LoanPayments,
    /// One narration per sale or skipped event
    pub log: Vec<String>,
}

/// Apply the sales scheduled for `year`
///
/// Events for assets not held (never existed or already sold) and for
/// non-real-estate assets are skipped with a warning.
pub fn process_sales(
    year: i32,
    sales: &[SaleEvent],
    state: &mut SimulationState,
    rules: &CapitalGainsRules,
) -> SaleOutcome {
    let mut outcome = SaleOutcome::default();
    let Some(closing) = NaiveDate::from_ymd_opt(year, 12, 31) else {
        return outcome;
    };

    for event in sales.iter().filter(|e| e.year == year) {
        let category = match state.asset(event.asset) {
            Some(asset) => asset.category,
            None => {
                let message = format!("{}: sale of asset {} skipped, asset not held", year, event.asset);
                log::warn!("{}", message);
                outcome.log.push(message);
                continue;
            }
        };
        if !category.is_real_estate() {
            let message = format!(
                "{}: sale of asset {} skipped, {} assets cannot be sold",
                year,
                event.asset,
                category.as_str()
            );
            log::warn!("{}", message);
            outcome.log.push(message);
            continue;
        }

        let Some((asset, loans)) = state.remove_asset(event.asset) else {
            continue;
        };

        let loan_payoff: f64 = loans.iter().map(|l| l.schedule.balance_at_end_of(year)).sum();
        outcome.loan_payments = outcome.loan_payments + LoanPayments::due_in(&loans, year);
        let capital_gains = rules.assess(
            asset.gross_value,
            asset.purchase_price,
            asset.acquisition_costs,
            asset.works_costs,
            asset.purchase_date,
            closing,
            asset.category == AssetCategory::OwnerOccupied,
        );
        let net_proceeds = asset.gross_value - capital_gains.total() - loan_payoff;

        let mut message = format!(
            "{}: sold {} for {:.0}. {}. Net proceeds {:.0}",
            year,
            asset.name,
            asset.gross_value,
            capital_gains.describe(),
            net_proceeds
        );
        if !loans.is_empty() {
            let names: Vec<&str> = loans.iter().map(|l| l.loan.name.as_str()).collect();
            message.push_str(&format!(", after repaying {:.0} on {}", loan_payoff, names.join(", ")));
        }
        log::info!("{}", message);
        outcome.log.push(message);

        outcome.net_cash += net_proceeds;
        outcome.sales.push(SaleRecord {
            asset: asset.id,
            name: asset.name,
            sale_price: asset.gross_value,
            capital_gains,
            loan_payoff,
            net_proceeds,
        });
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::household::Household;
    use approx::assert_abs_diff_eq;

    fn state() -> (Household, SimulationState) {
        let household = Household::sample(2025);
        let state = SimulationState::from_household(&household, 2025, household.economics);
        (household, state)
    }

    #[test]
    fn test_sale_repays_loan_and_taxes_gain() {
        let (_, mut state) = state();
        let rules = CapitalGainsRules::default();
        let balance = state.loans[1].schedule.balance_at_end_of(2030);
        let instalments = state.loans[1].schedule.payments_in(2030);
        let sales = [SaleEvent { asset: AssetId(2), year: 2030 }];

        let outcome = process_sales(2030, &sales, &mut state, &rules);

        assert_eq!(outcome.sales.len(), 1);
        let sale = &outcome.sales[0];
        assert_abs_diff_eq!(sale.loan_payoff, balance, epsilon = 1e-9);
        assert_abs_diff_eq!(outcome.loan_payments.total(), instalments, epsilon = 1e-9);
        // 120k vs basis 90k + 7.5%, bought 1 Sep 2018, held 12 full years on 31 Dec 2030
        assert_eq!(sale.capital_gains.holding_years, 12);
        assert!(sale.capital_gains.total() > 0.0);
        assert_abs_diff_eq!(
            sale.net_proceeds,
            120_000.0 - sale.capital_gains.total() - balance,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(outcome.net_cash, sale.net_proceeds, epsilon = 1e-9);
        assert!(!state.holds(AssetId(2)));
        assert_eq!(state.loans.len(), 1);
        assert_eq!(outcome.log.len(), 1);
    }

    #[test]
    fn test_main_residence_exempt() {
        let (_, mut state) = state();
        let sales = [SaleEvent { asset: AssetId(1), year: 2026 }];
        let outcome = process_sales(2026, &sales, &mut state, &CapitalGainsRules::default());
        assert_eq!(outcome.sales[0].capital_gains.total(), 0.0);
    }

    #[test]
    fn test_invalid_sales_are_noops() {
        let (_, mut state) = state();
        let rules = CapitalGainsRules::default();
        let sales = [
            SaleEvent { asset: AssetId(99), year: 2026 },
            SaleEvent { asset: AssetId(3), year: 2026 },
            SaleEvent { asset: AssetId(2), year: 2027 },
        ];

        let outcome = process_sales(2026, &sales, &mut state, &rules);
        assert!(outcome.sales.is_empty());
        assert_eq!(outcome.net_cash, 0.0);
        assert_eq!(outcome.log.len(), 2);
        assert_eq!(state.assets.len(), 4);

        // Selling twice: the second event finds nothing
        let twice = [
            SaleEvent { asset: AssetId(2), year: 2027 },
            SaleEvent { asset: AssetId(2), year: 2027 },
        ];
        let outcome = process_sales(2027, &twice, &mut state, &rules);
        assert_eq!(outcome.sales.len(), 1);
        assert!(outcome.log[1].contains("not held"));
    }

    #[test]
    fn test_sale_before_loan_start_repays_principal() {
        let (mut household, _) = state();
        household.loans[1].start_date = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        let mut state = SimulationState::from_household(&household, 2025, household.economics);

        let sales = [SaleEvent { asset: AssetId(2), year: 2026 }];
        let outcome = process_sales(2026, &sales, &mut state, &CapitalGainsRules::default());
        assert_eq!(outcome.sales[0].loan_payoff, 40_000.0);
        assert_eq!(outcome.loan_payments, LoanPayments::default());
    }

    #[test]
    fn test_holding_period_runs_to_year_end() {
        let (_, mut state) = state();
        let sales = [SaleEvent { asset: AssetId(2), year: 2024 }];
        let outcome = process_sales(2024, &sales, &mut state, &CapitalGainsRules::default());

        // Bought 1 Sep 2018: a sixth year is complete by 31 Dec 2024
        let gains = &outcome.sales[0].capital_gains;
        assert_eq!(gains.holding_years, 6);
        let gain = 120_000.0 - 90_000.0 * 1.075;
        assert_abs_diff_eq!(gains.income_tax, gain * 0.94 * 0.19, epsilon = 1e-6);
        assert_abs_diff_eq!(gains.social_levies, gain * (1.0 - 0.0165) * 0.172, epsilon = 1e-6);
    }
}
