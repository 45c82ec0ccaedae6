//! Loan amortization schedules
//!
//! Interest is accrued monthly on the start-of-month balance and the monthly
//! rows are aggregated per civil year, so a loan starting mid-year produces a
//! partial first year (and a partial last year).

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Longest term accepted; longer terms are capped
pub const MAX_TERM_YEARS: u32 = 100;

/// Aggregated repayments for one civil year
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearlyInstallment {
    pub year: i32,

    /// Principal + interest paid during the year
    pub payment: f64,

    pub interest: f64,

    pub principal: f64,

    /// Borrower insurance paid during the year
    pub insurance: f64,

    /// Outstanding principal (CRD) at the end of the year
    pub remaining_balance: f64,
}

impl YearlyInstallment {
    fn empty(year: i32) -> Self {
        Self {
            year,
            payment: 0.0,
            interest: 0.0,
            principal: 0.0,
            insurance: 0.0,
            remaining_balance: 0.0,
        }
    }

    /// Everything the borrower pays during the year
    pub fn total_outflow(&self) -> f64 {
        self.payment + self.insurance
    }
}

/// Lifecycle of a loan relative to a simulation year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    /// Start date not reached yet
    Scheduled,
    /// Repayments running
    Amortizing,
    /// Balance fully repaid (at term, or early on sale of the asset)
    PaidOff,
}

/// Year-indexed repayment schedule of a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub principal: f64,
    rows: Vec<YearlyInstallment>,
}

/// Monthly rate and level payment (principal + interest)
///
/// Falls back to straight-line principal / months when the rate is zero or the
/// annuity formula is not finite.
fn level_terms(principal: f64, annual_rate_pct: f64, months: u32) -> (f64, f64) {
    let straight_line = (0.0, principal / months as f64);
    let rate = annual_rate_pct / 100.0 / 12.0;
    if !rate.is_finite() || rate.abs() < 1e-12 {
        return straight_line;
    }

    let payment = principal * rate / (1.0 - (1.0 + rate).powi(-(months as i32)));
    if payment.is_finite() && payment > 0.0 {
        (rate, payment)
    } else {
        straight_line
    }
}

fn monthly_insurance(principal: f64, insurance_rate_pct: f64) -> f64 {
    let insurance = principal * insurance_rate_pct / 100.0 / 12.0;
    if insurance.is_finite() && insurance > 0.0 {
        insurance
    } else {
        0.0
    }
}

/// Monthly instalment including borrower insurance
pub fn monthly_payment(principal: f64, annual_rate_pct: f64, term_years: u32, insurance_rate_pct: f64) -> f64 {
    if !(principal > 0.0) || term_years == 0 {
        return 0.0;
    }
    let (_, payment) = level_terms(principal, annual_rate_pct, term_years.min(MAX_TERM_YEARS) * 12);
    payment + monthly_insurance(principal, insurance_rate_pct)
}

/// Build the amortization schedule of a loan
///
/// Terms above `MAX_TERM_YEARS` are capped.
pub fn amortize(
    principal: f64,
    annual_rate_pct: f64,
    term_years: u32,
    start_date: NaiveDate,
    insurance_rate_pct: f64,
) -> AmortizationSchedule {
    if !(principal > 0.0) || term_years == 0 {
        return AmortizationSchedule {
            principal: principal.max(0.0),
            rows: Vec::new(),
        };
    }

    let term_years = term_years.min(MAX_TERM_YEARS);
    let months = term_years * 12;
    let (rate, payment) = level_terms(principal, annual_rate_pct, months);
    let insurance = monthly_insurance(principal, insurance_rate_pct);

    let mut rows: Vec<YearlyInstallment> = Vec::with_capacity(term_years as usize + 1);
    let mut balance = principal;
    let mut year = start_date.year();
    let mut month = start_date.month();

    for k in 0..months {
        let interest = balance * rate;
        let mut principal_part = payment - interest;
        // Last instalment repays exactly what is left
        if k == months - 1 || principal_part >= balance {
            principal_part = balance;
        }
        balance -= principal_part;

        if rows.last().map(|r| r.year) != Some(year) {
            rows.push(YearlyInstallment::empty(year));
        }
        let last = rows.len() - 1;
        let row = &mut rows[last];
        row.payment += principal_part + interest;
        row.interest += interest;
        row.principal += principal_part;
        row.insurance += insurance;
        row.remaining_balance = balance;

        if balance <= 0.0 {
            break;
        }

        month += 1;
        if month > 12 {
            month = 1;
            year += 1;
        }
    }

    AmortizationSchedule { principal, rows }
}

impl AmortizationSchedule {
    pub fn rows(&self) -> &[YearlyInstallment] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first_year(&self) -> Option<i32> {
        self.rows.first().map(|r| r.year)
    }

    pub fn last_year(&self) -> Option<i32> {
        self.rows.last().map(|r| r.year)
    }

    /// Row for a civil year, if the loan is repaid during that year
    pub fn year(&self, year: i32) -> Option<&YearlyInstallment> {
        self.rows.iter().find(|r| r.year == year)
    }

    /// Total outflow (instalments + insurance) for a civil year
    pub fn payments_in(&self, year: i32) -> f64 {
        self.year(year).map(|r| r.total_outflow()).unwrap_or(0.0)
    }

    /// Outstanding balance at the end of a year
    ///
    /// Full principal before the first row, 0 after the last one.
    pub fn balance_at_end_of(&self, year: i32) -> f64 {
        match (self.first_year(), self.last_year()) {
            (Some(first), _) if year < first => self.principal,
            (Some(_), Some(last)) if year > last => 0.0,
            (Some(_), Some(_)) => self
                .rows
                .iter()
                .rev()
                .find(|r| r.year <= year)
                .map(|r| r.remaining_balance)
                .unwrap_or(self.principal),
            _ => 0.0,
        }
    }

    /// Outstanding balance on 1 January of a year
    pub fn balance_entering(&self, year: i32) -> f64 {
        self.balance_at_end_of(year.saturating_sub(1))
    }

    pub fn status_in(&self, year: i32) -> LoanStatus {
        match (self.first_year(), self.last_year()) {
            (Some(first), _) if year < first => LoanStatus::Scheduled,
            (Some(_), Some(last)) if year <= last => LoanStatus::Amortizing,
            _ => LoanStatus::PaidOff,
        }
    }

    pub fn total_interest(&self) -> f64 {
        self.rows.iter().map(|r| r.interest).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn jan_first(year: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, 1, 1).unwrap()
    }

    #[test]
    fn test_zero_rate_two_years() {
        let schedule = amortize(24_000.0, 0.0, 2, jan_first(2026), 0.0);
        let rows = schedule.rows();

        assert_eq!(rows.len(), 2);
        for row in rows {
            assert_abs_diff_eq!(row.principal, 12_000.0, epsilon = 1e-9);
            assert_eq!(row.interest, 0.0);
        }
        assert_eq!(rows[1].remaining_balance, 0.0);
    }

    #[test]
    fn test_principal_fully_repaid() {
        for &(principal, rate, term) in &[(150_000.0, 1.5, 25), (40_000.0, 2.0, 20), (9_999.0, 7.25, 3)] {
            let schedule = amortize(principal, rate, term, NaiveDate::from_ymd_opt(2021, 7, 15).unwrap(), 0.3);
            let repaid: f64 = schedule.rows().iter().map(|r| r.principal).sum();

            assert_abs_diff_eq!(repaid, principal, epsilon = 1e-6);
            assert_eq!(schedule.rows().last().unwrap().remaining_balance, 0.0);
        }
    }

    #[test]
    fn test_balance_non_increasing() {
        let schedule = amortize(150_000.0, 1.5, 25, jan_first(2020), 0.0);
        let mut previous = schedule.principal;
        for row in schedule.rows() {
            assert!(row.remaining_balance <= previous);
            previous = row.remaining_balance;
        }
    }

    #[test]
    fn test_mid_year_start_gives_partial_years() {
        let schedule = amortize(12_000.0, 0.0, 1, NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(), 0.0);
        let rows = schedule.rows();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].year, 2026);
        assert_abs_diff_eq!(rows[0].principal, 3_000.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rows[1].principal, 9_000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_insurance_is_constant_on_initial_principal() {
        let schedule = amortize(100_000.0, 3.0, 10, jan_first(2026), 0.36);
        for row in schedule.rows() {
            assert_abs_diff_eq!(row.insurance, 360.0, epsilon = 1e-6);
        }
        assert_abs_diff_eq!(schedule.payments_in(2026), schedule.rows()[0].payment + 360.0, epsilon = 1e-9);
    }

    #[test]
    fn test_monthly_payment_matches_annuity_formula() {
        let payment = monthly_payment(150_000.0, 1.5, 25, 0.0);
        assert!((payment - 599.9).abs() < 0.5, "got {}", payment);

        let with_insurance = monthly_payment(150_000.0, 1.5, 25, 0.36);
        assert_abs_diff_eq!(with_insurance - payment, 45.0, epsilon = 1e-9);

        assert_eq!(monthly_payment(0.0, 1.5, 25, 0.0), 0.0);
        assert_eq!(monthly_payment(1_000.0, 0.0, 0, 0.0), 0.0);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(amortize(0.0, 1.0, 10, jan_first(2026), 0.0).is_empty());
        assert!(amortize(-5.0, 1.0, 10, jan_first(2026), 0.0).is_empty());
        assert!(amortize(1_000.0, 1.0, 0, jan_first(2026), 0.0).is_empty());

        let schedule = amortize(1_200.0, f64::NAN, 1, jan_first(2026), f64::INFINITY);
        let row = schedule.rows()[0];
        assert!(row.payment.is_finite() && row.insurance.is_finite());
        assert_abs_diff_eq!(row.principal, 1_200.0, epsilon = 1e-9);
    }

    #[test]
    fn test_huge_term_is_capped() {
        let schedule = amortize(120_000.0, 0.0, 400_000_000, jan_first(2026), 0.0);
        assert_eq!(schedule.rows().len(), MAX_TERM_YEARS as usize);
        assert_eq!(schedule.last_year(), Some(2026 + MAX_TERM_YEARS as i32 - 1));
        assert_abs_diff_eq!(
            monthly_payment(120_000.0, 0.0, u32::MAX, 0.0),
            120_000.0 / (MAX_TERM_YEARS * 12) as f64,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_balance_lookups_and_status() {
        let schedule = amortize(24_000.0, 0.0, 2, jan_first(2026), 0.0);

        assert_eq!(schedule.balance_at_end_of(2025), 24_000.0);
        assert_abs_diff_eq!(schedule.balance_at_end_of(2026), 12_000.0, epsilon = 1e-9);
        assert_abs_diff_eq!(schedule.balance_entering(2027), 12_000.0, epsilon = 1e-9);
        assert_eq!(schedule.balance_at_end_of(2030), 0.0);

        assert_eq!(schedule.status_in(2025), LoanStatus::Scheduled);
        assert_eq!(schedule.status_in(2027), LoanStatus::Amortizing);
        assert_eq!(schedule.status_in(2028), LoanStatus::PaidOff);
    }
}
