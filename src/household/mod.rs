//! Household data structures and save-file loading

mod data;
pub mod loader;

pub use data::{
    Adult, Asset, AssetCategory, AssetId, Child, EconomicHypotheses, ExpenseLine, Household,
    IncomeLine, Loan, LoanId, PensionHypothesis, SaleEvent, TaxIncentive, MAX_AGE,
};
pub(crate) use data::year_span;
pub use loader::{load_household, load_household_from_reader, save_household, validate, HouseholdError};
