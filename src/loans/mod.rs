//! Loan schedules and debt analysis

mod amortization;
pub mod debt_ratio;

pub use amortization::{amortize, monthly_payment, AmortizationSchedule, LoanStatus, YearlyInstallment, MAX_TERM_YEARS};
pub use debt_ratio::{analyze as analyze_debt_ratio, DebtLevel, DebtRatioReport};
