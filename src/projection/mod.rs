//! Yearly projection of a household's income, debt and patrimony

mod engine;
mod flows;
mod patrimony;
mod rows;
mod sales;
mod state;
pub mod tax;
pub mod timeline;

pub use engine::{ProjectionConfig, ProjectionEngine};
pub use flows::{compute_flows, AnnualFlows};
pub use patrimony::{advance_patrimony, CategoryTotals, PatrimonySnapshot, CASH_RESERVE_NAME};
pub use rows::{ProjectionResult, ProjectionRow, ProjectionSummary};
pub use sales::{process_sales, SaleOutcome, SaleRecord};
pub use state::{LoanPayments, LoanState, SimulationState};
pub use tax::{compute_income_tax, BracketTaxEngine, FlatRateTaxEngine, IncomeTax, TaxComposition, TaxEngine, TaxError, TaxMethod};
pub use timeline::{resolve_statuses, PersonStatus, Timeline};
