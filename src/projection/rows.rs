//! Yearly projection output structures

use serde::{Deserialize, Serialize};
use std::io::Write;

/// A single row of projection output for one year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRow {
    pub year: i32,

    // Income
    pub salaries: f64,
    pub pensions: f64,
    pub rents: f64,
    pub other_incomes: f64,
    pub total_income: f64,

    // Expenses
    pub living_expenses: f64,
    pub property_costs: f64,
    pub study_costs: f64,
    pub total_expenses: f64,

    // Loans (instalments + insurance)
    pub loan_payments: f64,
    pub loan_interest: f64,
    pub loan_insurance: f64,

    /// Net proceeds of the year's property sales
    pub sale_proceeds: f64,

    // Income tax
    pub tax_before_reduction: f64,
    pub tax_reduction: f64,
    pub income_tax: f64,

    /// Reste à vivre: income + sales - expenses - loans - tax
    pub net_cash_flow: f64,

    // Patrimony by category
    pub gross_financial: f64,
    pub gross_owner_occupied: f64,
    pub gross_income_property: f64,
    pub net_financial: f64,
    pub net_owner_occupied: f64,
    pub net_income_property: f64,

    // Totals
    pub total_assets: f64,
    pub total_liabilities: f64,
    pub net_worth: f64,

    /// e.g. "Jean: Active (45), Léo: Student (19)"
    pub statuses: String,
}

impl ProjectionRow {
    /// Create a new row with zero amounts
    pub fn new(year: i32) -> Self {
        Self {
            year,
            salaries: 0.0,
            pensions: 0.0,
            rents: 0.0,
            other_incomes: 0.0,
            total_income: 0.0,
            living_expenses: 0.0,
            property_costs: 0.0,
            study_costs: 0.0,
            total_expenses: 0.0,
            loan_payments: 0.0,
            loan_interest: 0.0,
            loan_insurance: 0.0,
            sale_proceeds: 0.0,
            tax_before_reduction: 0.0,
            tax_reduction: 0.0,
            income_tax: 0.0,
            net_cash_flow: 0.0,
            gross_financial: 0.0,
            gross_owner_occupied: 0.0,
            gross_income_property: 0.0,
            net_financial: 0.0,
            net_owner_occupied: 0.0,
            net_income_property: 0.0,
            total_assets: 0.0,
            total_liabilities: 0.0,
            net_worth: 0.0,
            statuses: String::new(),
        }
    }
}

/// Complete projection result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectionResult {
    /// One row per projected year, in order
    pub rows: Vec<ProjectionRow>,

    /// Chronological, human-readable event log
    pub events: Vec<String>,
}

impl ProjectionResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a yearly row
    pub fn add_row(&mut self, row: ProjectionRow) {
        self.rows.push(row);
    }

    pub fn log_event(&mut self, event: impl Into<String>) {
        self.events.push(event.into());
    }

    pub fn row(&self, year: i32) -> Option<&ProjectionRow> {
        self.rows.iter().find(|r| r.year == year)
    }

    /// Write every row as CSV with a header line
    pub fn write_csv<W: Write>(&self, writer: W) -> csv::Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for row in &self.rows {
            csv_writer.serialize(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Get summary statistics
    pub fn summary(&self) -> ProjectionSummary {
        let total_income: f64 = self.rows.iter().map(|r| r.total_income).sum();
        let total_expenses: f64 = self.rows.iter().map(|r| r.total_expenses).sum();
        let total_loan_payments: f64 = self.rows.iter().map(|r| r.loan_payments).sum();
        let total_income_tax: f64 = self.rows.iter().map(|r| r.income_tax).sum();
        let total_sale_proceeds: f64 = self.rows.iter().map(|r| r.sale_proceeds).sum();

        let initial_net_worth = self.rows.first().map(|r| r.net_worth).unwrap_or(0.0);
        let final_net_worth = self.rows.last().map(|r| r.net_worth).unwrap_or(0.0);
        let lowest_net_worth = self
            .rows
            .iter()
            .map(|r| r.net_worth)
            .fold(f64::INFINITY, f64::min);
        let first_negative_year = self.rows.iter().find(|r| r.net_worth < 0.0).map(|r| r.year);

        ProjectionSummary {
            total_years: self.rows.len() as u32,
            first_year: self.rows.first().map(|r| r.year),
            last_year: self.rows.last().map(|r| r.year),
            total_income,
            total_expenses,
            total_loan_payments,
            total_income_tax,
            total_sale_proceeds,
            initial_net_worth,
            final_net_worth,
            lowest_net_worth: if self.rows.is_empty() { 0.0 } else { lowest_net_worth },
            first_negative_year,
        }
    }
}

/// Summary statistics for a projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSummary {
    pub total_years: u32,
    pub first_year: Option<i32>,
    pub last_year: Option<i32>,
    pub total_income: f64,
    pub total_expenses: f64,
    pub total_loan_payments: f64,
    pub total_income_tax: f64,
    pub total_sale_proceeds: f64,
    /// Net worth at the end of the first year
    pub initial_net_worth: f64,
    pub final_net_worth: f64,
    pub lowest_net_worth: f64,
    pub first_negative_year: Option<i32>,
}
