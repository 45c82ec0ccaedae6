//! Core projection engine for yearly household wealth projections

use crate::assumptions::Assumptions;
use crate::household::{year_span, EconomicHypotheses, Household};
use chrono::Datelike;
use super::flows::compute_flows;
use super::patrimony::{advance_patrimony, CASH_RESERVE_NAME};
use super::rows::{ProjectionResult, ProjectionRow};
use super::sales::process_sales;
use super::state::SimulationState;
use super::tax::{compute_income_tax, incentive_reductions, TaxComposition, TaxEngine, TaxMethod};
use super::timeline::{pension_diagnostics, resolve_statuses};

/// Configuration for a projection run
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionConfig {
    /// Number of years to project
    pub duration_years: u32,

    /// First projected year
    pub start_year: i32,

    /// How the base income tax is computed
    pub tax_method: TaxMethod,

    /// Replaces the household's own inflation and wage growth
    pub economics_override: Option<EconomicHypotheses>,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            duration_years: 25,
            start_year: chrono::Local::now().year(),
            tax_method: TaxMethod::Brackets,
            economics_override: None,
        }
    }
}

/// Main projection engine
pub struct ProjectionEngine {
    assumptions: Assumptions,
    config: ProjectionConfig,
    tax_engine: Box<dyn TaxEngine>,
}

impl ProjectionEngine {
    /// Create a new projection engine with given assumptions and config
    pub fn new(assumptions: Assumptions, config: ProjectionConfig) -> Self {
        let tax_engine = config.tax_method.engine(&assumptions);
        Self::with_tax_engine(assumptions, config, tax_engine)
    }

    /// Create an engine using a custom tax engine instead of the configured method
    pub fn with_tax_engine(assumptions: Assumptions, config: ProjectionConfig, tax_engine: Box<dyn TaxEngine>) -> Self {
        Self {
            assumptions,
            config,
            tax_engine,
        }
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// Run the projection for a household
    ///
    /// Always produces one row per configured year. Input anomalies and
    /// per-year failures are recorded in the event log instead of aborting.
    pub fn project_household(&self, household: &Household) -> ProjectionResult {
        let mut result = ProjectionResult::new();
        let economics = self.config.economics_override.unwrap_or(household.economics);
        let mut state = SimulationState::from_household(household, self.config.start_year, economics);

        self.check_inputs(household, &mut result);

        for _year in 0..self.config.duration_years {
            let row = self.project_year(household, &mut state, &mut result);
            result.add_row(row);
        }

        log::debug!(
            "projected {} years from {} with {} events",
            result.rows.len(),
            self.config.start_year,
            result.events.len()
        );
        result
    }

    /// Log anomalies that can be detected before the first year
    fn check_inputs(&self, household: &Household, result: &mut ProjectionResult) {
        for diagnostic in pension_diagnostics(&household.adults, &household.pensions) {
            log::warn!("{}", diagnostic);
            result.log_event(diagnostic);
        }

        for asset in &household.assets {
            if let Some(incentive) = asset.incentive.as_ref().filter(|i| self.assumptions.incentives.unrated(i)) {
                let message = format!(
                    "No rate for '{}' over {} years on {}, no tax reduction applied",
                    incentive.scheme, incentive.duration_years, asset.name
                );
                log::warn!("{}", message);
                result.log_event(message);
            }
        }

        let last_year = self
            .config
            .start_year
            .saturating_add(year_span(self.config.duration_years))
            .saturating_sub(1);
        for sale in &household.sales {
            if sale.year < self.config.start_year || sale.year > last_year {
                let message = format!(
                    "Sale of asset {} in {} is outside the projection ({}-{}) and is ignored",
                    sale.asset, sale.year, self.config.start_year, last_year
                );
                log::warn!("{}", message);
                result.log_event(message);
            }
        }
    }

    /// Project a single year and advance the state to the next one
    fn project_year(&self, household: &Household, state: &mut SimulationState, result: &mut ProjectionResult) -> ProjectionRow {
        let year = state.year;
        let mut row = ProjectionRow::new(year);

        // Sales happen first so sold assets drop out of every later step
        let sales = process_sales(year, &household.sales, state, &self.assumptions.capital_gains);
        row.sale_proceeds = sales.net_cash;
        for line in sales.log {
            result.log_event(line);
        }

        let timeline = resolve_statuses(year, &household.adults, &household.children, &household.pensions);
        row.statuses = timeline.describe();

        let flows = compute_flows(&timeline, state, household);
        row.salaries = flows.salaries;
        row.pensions = flows.pensions;
        row.rents = flows.rents;
        row.other_incomes = flows.other_incomes;
        row.total_income = flows.total_income();
        row.living_expenses = flows.living_expenses;
        row.property_costs = flows.property_costs;
        row.study_costs = flows.study_costs;
        row.total_expenses = flows.total_expenses();

        // Loans repaid at a sale this year are still serviced until closing
        let payments = state.loan_payments(year) + sales.loan_payments;
        row.loan_payments = payments.total();
        row.loan_interest = payments.interest;
        row.loan_insurance = payments.insurance;
        for loan in &state.loans {
            if loan.schedule.last_year() == Some(year) {
                result.log_event(format!("{}: loan {} fully repaid", year, loan.loan.name));
            }
        }

        let composition = TaxComposition {
            adults: household.adults.len(),
            dependents: timeline.dependents(),
            single_parent: household.single_parent,
        };
        let reduction = incentive_reductions(year, &state.assets, &self.assumptions.incentives);
        let tax = compute_income_tax(year, row.total_income, &composition, self.tax_engine.as_ref(), reduction);
        row.tax_before_reduction = tax.base_tax;
        row.tax_reduction = tax.reduction;
        row.income_tax = tax.tax;
        if let Some(error) = tax.error {
            result.log_event(error);
        }

        row.net_cash_flow = row.total_income + row.sale_proceeds - row.total_expenses - row.loan_payments - row.income_tax;

        let liabilities = state.liabilities_by_asset(year);
        let reserve_id = state.next_asset_id();
        let patrimony = advance_patrimony(year, &mut state.assets, row.net_cash_flow, &liabilities, reserve_id);
        if patrimony.reserve_opened {
            result.log_event(format!(
                "{}: no financial asset to hold cash, opened '{}' with {:.0}",
                year, CASH_RESERVE_NAME, row.net_cash_flow
            ));
        }

        row.gross_financial = patrimony.gross.financial;
        row.gross_owner_occupied = patrimony.gross.owner_occupied;
        row.gross_income_property = patrimony.gross.income_property;
        row.net_financial = patrimony.net.financial;
        row.net_owner_occupied = patrimony.net.owner_occupied;
        row.net_income_property = patrimony.net.income_property;
        row.total_assets = patrimony.total_assets;
        row.total_liabilities = patrimony.total_liabilities;
        row.net_worth = patrimony.net_worth;

        let was_solvent = result.rows.last().map_or(true, |r| r.net_worth >= 0.0);
        if row.net_worth < 0.0 && was_solvent {
            result.log_event(format!("{}: net worth turns negative ({:.0})", year, row.net_worth));
        }

        log::debug!(
            "{}: income {:.0}, tax {:.0}, cash flow {:.0}, net worth {:.0}",
            year, row.total_income, row.income_tax, row.net_cash_flow, row.net_worth
        );
        state.close_year(&timeline);
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::CapitalGainsRules;
    use crate::household::{
        Adult, Asset, AssetCategory, AssetId, Child, ExpenseLine, Loan, LoanId, PensionHypothesis, SaleEvent,
    };
    use crate::loans::amortize;
    use crate::projection::tax::TaxError;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    fn jan_first(year: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, 1, 1).unwrap()
    }

    fn config(start_year: i32, duration_years: u32) -> ProjectionConfig {
        ProjectionConfig {
            duration_years,
            start_year,
            ..Default::default()
        }
    }

    fn run(household: &Household, config: ProjectionConfig) -> ProjectionResult {
        ProjectionEngine::new(Assumptions::default_2024(), config).project_household(household)
    }

    /// Single earner with a savings account and nothing else
    fn single_earner(start_year: i32) -> Household {
        Household {
            adults: vec![Adult::from_age("Claire", 40, start_year, 50_000.0)],
            pensions: vec![PensionHypothesis::new("Claire", 65, 30_000.0, true)],
            assets: vec![Asset::new(AssetId(1), "Livret A", AssetCategory::Financial,
                20_000.0, 3.0, 20_000.0, jan_first(start_year))],
            expenses: vec![ExpenseLine {
                label: "Vie courante".to_string(),
                annual_amount: 20_000.0,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_projection_runs() {
        let household = Household::sample(2025);
        let result = run(&household, config(2025, 25));

        assert_eq!(result.rows.len(), 25);
        for (offset, row) in result.rows.iter().enumerate() {
            assert_eq!(row.year, 2025 + offset as i32);
            assert!(!row.statuses.is_empty());
        }
        assert!(result.rows[0].salaries > 0.0);
        assert!(result.rows[0].loan_payments > 0.0);
    }

    #[test]
    fn test_net_worth_identity() {
        let mut household = Household::sample(2025);
        household.sales.push(SaleEvent { asset: AssetId(2), year: 2032 });
        let result = run(&household, config(2025, 30));

        for row in &result.rows {
            assert_eq!(row.net_worth, row.total_assets - row.total_liabilities);
            assert_abs_diff_eq!(
                row.total_assets,
                row.gross_financial + row.gross_owner_occupied + row.gross_income_property,
                epsilon = 1e-6
            );
        }
    }

    #[test]
    fn test_retirement_at_65() {
        let household = single_earner(2025);
        let result = run(&household, config(2025, 30));
        let retirement_year = household.adults[0].birth_year + 65;
        assert_eq!(retirement_year, 2050);

        for row in &result.rows {
            if row.year < retirement_year {
                assert!(row.salaries > 0.0, "year {}", row.year);
                assert_eq!(row.pensions, 0.0);
            } else {
                assert_eq!(row.salaries, 0.0, "year {}", row.year);
                assert_eq!(row.pensions, 30_000.0);
            }
        }
        assert!(result.row(retirement_year).unwrap().statuses.starts_with("Claire: Retired"));
    }

    #[test]
    fn test_salary_growth_stops_at_retirement() {
        let mut household = single_earner(2025);
        household.economics = EconomicHypotheses {
            inflation_pct: 2.0,
            wage_growth_pct: 1.0,
        };
        let result = run(&household, config(2025, 30));

        assert_eq!(result.rows[0].salaries, 50_000.0);
        assert_abs_diff_eq!(result.rows[1].salaries, 50_500.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result.rows[1].living_expenses, 20_400.0, epsilon = 1e-9);
        // Pensions are never re-indexed
        assert_eq!(result.rows[29].pensions, 30_000.0);
    }

    #[test]
    fn test_loan_paid_then_property_sold_in_year_11() {
        let start = 2025;
        let sale_year = start + 10;
        let mut household = single_earner(start);
        household.assets.push(Asset::new(AssetId(2), "Appartement", AssetCategory::IncomeProperty,
            200_000.0, 2.0, 200_000.0, jan_first(start)));
        household.loans.push(Loan::new(LoanId(1), "Prêt appartement", 150_000.0, 1.5, 25, jan_first(start), AssetId(2)));
        household.sales.push(SaleEvent { asset: AssetId(2), year: sale_year });

        let result = run(&household, config(start, 20));

        // Balance left once the eleventh year's instalments are paid
        let schedule = amortize(150_000.0, 1.5, 25, jan_first(start), 0.0);
        let remaining = schedule.balance_at_end_of(sale_year);
        assert_abs_diff_eq!(remaining, 90_854.07, epsilon = 0.01);

        let mut price = 200_000.0;
        for _ in 0..10 {
            price *= 1.02;
        }
        let closing = NaiveDate::from_ymd_opt(sale_year, 12, 31).unwrap();
        let tax = CapitalGainsRules::default().assess(price, 200_000.0, 0.0, 0.0, jan_first(start), closing, false);
        assert_eq!(tax.holding_years, 10);
        assert!(tax.total() > 0.0);

        let sale_row = result.row(sale_year).unwrap();
        assert_abs_diff_eq!(sale_row.sale_proceeds, price - tax.total() - remaining, epsilon = 1e-6);
        assert_abs_diff_eq!(sale_row.sale_proceeds, 144_569.81, epsilon = 0.01);
        assert!(result.events.iter().any(|e| e.contains("sold Appartement")));

        for row in &result.rows {
            if row.year < sale_year {
                assert_abs_diff_eq!(row.loan_payments, schedule.payments_in(row.year), epsilon = 1e-9);
                assert!(row.gross_income_property > 0.0);
            } else if row.year == sale_year {
                assert_abs_diff_eq!(row.loan_payments, schedule.payments_in(sale_year), epsilon = 1e-9);
                assert_eq!(row.gross_income_property, 0.0);
                assert_eq!(row.total_liabilities, 0.0);
            } else {
                assert_eq!(row.loan_payments, 0.0, "year {}", row.year);
                assert_eq!(row.gross_income_property, 0.0);
                assert_eq!(row.total_liabilities, 0.0);
            }
        }
    }

    #[test]
    fn test_scheduled_loan_starts_mid_run() {
        let mut household = single_earner(2025);
        household.assets.push(Asset::new(AssetId(2), "Garage", AssetCategory::IncomeProperty,
            24_000.0, 0.0, 24_000.0, jan_first(2025)));
        household.loans.push(Loan::new(LoanId(1), "Prêt garage", 24_000.0, 0.0, 2, jan_first(2027), AssetId(2)));

        let result = run(&household, config(2025, 5));

        for row in &result.rows[..2] {
            assert_eq!(row.loan_payments, 0.0, "year {}", row.year);
            assert_eq!(row.total_liabilities, 0.0);
            assert_eq!(row.net_income_property, row.gross_income_property);
        }
        assert_abs_diff_eq!(result.rows[2].loan_payments, 12_000.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result.rows[2].total_liabilities, 12_000.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result.rows[3].loan_payments, 12_000.0, epsilon = 1e-9);
        assert_eq!(result.rows[4].loan_payments, 0.0);
    }

    #[test]
    fn test_sale_before_loan_starts_repays_principal() {
        let mut household = single_earner(2025);
        household.assets.push(Asset::new(AssetId(2), "Garage", AssetCategory::IncomeProperty,
            24_000.0, 0.0, 24_000.0, jan_first(2025)));
        household.loans.push(Loan::new(LoanId(1), "Prêt garage", 24_000.0, 0.0, 2, jan_first(2027), AssetId(2)));
        household.sales.push(SaleEvent { asset: AssetId(2), year: 2026 });

        let result = run(&household, config(2025, 5));

        // Sold at cost, no gain: the whole principal eats the price
        assert_eq!(result.row(2026).unwrap().sale_proceeds, 0.0);
        assert!(result.rows.iter().all(|r| r.loan_payments == 0.0));
        assert!(result.events.iter().any(|e| e.contains("after repaying 24000")));
    }

    #[test]
    fn test_sold_asset_no_longer_contributes() {
        let mut household = Household::sample(2025);
        household.sales.push(SaleEvent { asset: AssetId(2), year: 2030 });
        let result = run(&household, config(2025, 15));

        let residence_loan = amortize(150_000.0, 1.5, 25, jan_first(2020), 0.36);
        let rental_loan = amortize(40_000.0, 2.0, 20, jan_first(2022), 0.0);
        for row in result.rows.iter().filter(|r| r.year >= 2030) {
            assert_eq!(row.rents, 0.0);
            assert_eq!(row.property_costs, 0.0);
            assert_eq!(row.gross_income_property, 0.0);
            let mut expected_interest = residence_loan.year(row.year).map(|r| r.interest).unwrap_or(0.0);
            if row.year == 2030 {
                expected_interest += rental_loan.year(2030).map(|r| r.interest).unwrap_or(0.0);
            }
            assert_abs_diff_eq!(row.loan_interest, expected_interest, epsilon = 1e-9);
        }
        assert!(result.rows[0].rents > 0.0);
    }

    #[test]
    fn test_zero_rate_loan_rows() {
        let mut household = single_earner(2025);
        household.assets.push(Asset::new(AssetId(2), "Garage", AssetCategory::IncomeProperty,
            24_000.0, 0.0, 24_000.0, jan_first(2025)));
        household.loans.push(Loan::new(LoanId(1), "Prêt garage", 24_000.0, 0.0, 2, jan_first(2025), AssetId(2)));

        let result = run(&household, config(2025, 4));

        assert_abs_diff_eq!(result.rows[0].loan_payments, 12_000.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result.rows[1].loan_payments, 12_000.0, epsilon = 1e-9);
        assert_eq!(result.rows[0].loan_interest, 0.0);
        assert_eq!(result.rows[2].loan_payments, 0.0);
        assert_abs_diff_eq!(result.rows[0].total_liabilities, 12_000.0, epsilon = 1e-9);
        assert_eq!(result.rows[1].total_liabilities, 0.0);
        assert!(result.events.iter().any(|e| e.contains("Prêt garage fully repaid")));
    }

    #[test]
    fn test_pinel_reduction_window() {
        let start = 2025;
        let mut plain = single_earner(start);
        plain.adults[0].annual_salary = 80_000.0;
        plain.assets.push(
            Asset::new(AssetId(2), "T2 Pinel", AssetCategory::IncomeProperty, 180_000.0, 1.0, 180_000.0, jan_first(start))
                .with_rent(600.0, 400.0, 500.0),
        );
        let mut pinel = plain.clone();
        pinel.assets[1] = pinel.assets[1].clone().with_incentive("Pinel Classique (2024)", 6);

        let without = run(&plain, config(start, 10));
        let with = run(&pinel, config(start, 10));
        let annual = 180_000.0 * 0.09 / 6.0;

        for (base, reduced) in without.rows.iter().zip(&with.rows) {
            assert_abs_diff_eq!(reduced.tax_before_reduction, base.income_tax, epsilon = 1e-9);
            if reduced.year < start + 6 {
                assert_abs_diff_eq!(reduced.tax_reduction, annual, epsilon = 1e-9);
                assert_abs_diff_eq!(reduced.income_tax, (base.income_tax - annual).max(0.0), epsilon = 1e-9);
            } else {
                assert_eq!(reduced.tax_reduction, 0.0);
                assert_eq!(reduced.income_tax, base.income_tax);
            }
        }
    }

    #[test]
    fn test_negative_net_worth_surfaced() {
        let household = Household {
            adults: vec![Adult::new("Marc", 1990, 0.0)],
            expenses: vec![ExpenseLine {
                label: "Loyer".to_string(),
                annual_amount: 12_000.0,
            }],
            ..Default::default()
        };
        let result = run(&household, config(2025, 3));

        assert_eq!(result.rows[0].net_worth, -12_000.0);
        assert_eq!(result.rows[2].net_worth, -36_000.0);
        assert_eq!(result.rows[2].gross_financial, -36_000.0);
        assert_eq!(result.summary().first_negative_year, Some(2025));
        assert_eq!(result.events.iter().filter(|e| e.contains("opened")).count(), 1);
        assert_eq!(result.events.iter().filter(|e| e.contains("turns negative")).count(), 1);
    }

    #[test]
    fn test_input_anomalies_logged_not_fatal() {
        let mut household = single_earner(2025);
        household.pensions.push(PensionHypothesis::new("Claire", 62, 25_000.0, true));
        household.sales.push(SaleEvent { asset: AssetId(9), year: 2026 });
        household.sales.push(SaleEvent { asset: AssetId(1), year: 2020 });

        let result = run(&household, config(2025, 30));

        assert_eq!(result.rows.len(), 30);
        assert!(result.events[0].contains("2 active pension hypotheses"));
        assert!(result.events.iter().any(|e| e.contains("outside the projection")));
        assert!(result.events.iter().any(|e| e.contains("not held")));
        // Lowest age wins: retired at 62 with the smaller pension
        assert_eq!(result.row(2047).unwrap().pensions, 25_000.0);
    }

    #[test]
    fn test_unrated_incentive_reported_once() {
        let mut household = single_earner(2025);
        household.assets.push(
            Asset::new(AssetId(2), "T2", AssetCategory::IncomeProperty, 180_000.0, 0.0, 180_000.0, jan_first(2025))
                .with_incentive("Pinel Classique (2024)", 7),
        );
        let result = run(&household, config(2025, 10));

        assert_eq!(result.events.iter().filter(|e| e.contains("No rate for")).count(), 1);
        assert!(result.rows.iter().all(|r| r.tax_reduction == 0.0));
    }

    #[test]
    fn test_out_of_range_inputs_do_not_abort() {
        let mut household = single_earner(2025);
        household.pensions[0].retirement_age = u32::MAX;
        household.children.push(Child::new("Zoé", 2020, u32::MAX, u32::MAX, 1_000.0));
        household.assets.push(Asset::new(AssetId(2), "Studio", AssetCategory::IncomeProperty,
            90_000.0, 0.0, 90_000.0, jan_first(2025)));
        household.loans.push(Loan::new(LoanId(1), "Prêt studio", 90_000.0, 1.0, u32::MAX, jan_first(2025), AssetId(2)));

        let result = run(&household, config(2025, 5));

        assert_eq!(result.rows.len(), 5);
        assert!(result.rows.iter().all(|r| r.salaries > 0.0 && r.pensions == 0.0));
        assert!(result.rows.iter().all(|r| r.loan_payments > 0.0));
    }

    struct UnavailableEngine;

    impl TaxEngine for UnavailableEngine {
        fn name(&self) -> &'static str {
            "unavailable"
        }

        fn base_tax(&self, _year: i32, _income: f64, _composition: &TaxComposition) -> Result<f64, TaxError> {
            Err(TaxError::EmptyScale)
        }
    }

    #[test]
    fn test_tax_failure_degrades_year() {
        let household = single_earner(2025);
        let engine = ProjectionEngine::with_tax_engine(Assumptions::default_2024(), config(2025, 5), Box::new(UnavailableEngine));
        let result = engine.project_household(&household);

        assert_eq!(result.rows.len(), 5);
        assert!(result.rows.iter().all(|r| r.income_tax == 0.0));
        assert_eq!(result.events.len(), 5);
    }

    #[test]
    fn test_flat_rate_and_economics_override() {
        let household = single_earner(2025);
        let config = ProjectionConfig {
            tax_method: TaxMethod::FlatRate(0.10),
            economics_override: Some(EconomicHypotheses {
                inflation_pct: 10.0,
                wage_growth_pct: 0.0,
            }),
            ..config(2025, 2)
        };
        let result = run(&household, config);

        assert_abs_diff_eq!(result.rows[0].income_tax, 5_000.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result.rows[1].living_expenses, 22_000.0, epsilon = 1e-9);
    }
}
