//! Wealth Projection - Yearly projection engine for household finances
//!
//! This library provides:
//! - Household description with JSON save/reload
//! - Loan amortization schedules and debt-ratio analysis
//! - French income tax (quotient familial, rental incentives) and capital gains
//! - Year-by-year projection of income, cash flow and net worth
//! - Multi-scenario simulation framework

pub mod household;
pub mod loans;
pub mod assumptions;
pub mod projection;
pub mod scenario;

// Re-export commonly used types
pub use household::{Household, HouseholdError};
pub use assumptions::{Assumptions, CapitalGainsRules, IncentiveRates, TaxBrackets};
pub use loans::{amortize, AmortizationSchedule};
pub use projection::{ProjectionConfig, ProjectionEngine, ProjectionResult, ProjectionRow, TaxMethod};
pub use scenario::ScenarioRunner;
