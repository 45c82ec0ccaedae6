//! Rental tax-incentive schemes (Pinel and similar)

use crate::household::{year_span, TaxIncentive};
use std::collections::{BTreeMap, HashMap};

/// Purchase price above which the Pinel reduction no longer grows
pub const PINEL_PRICE_CAP: f64 = 300_000.0;

/// Yearly reduction granted by schemes without a rate table, as a share of the purchase price
pub const OTHER_SCHEME_RATE: f64 = 0.02;

/// Total reduction rates by scheme and commitment period
#[derive(Debug, Clone, PartialEq)]
pub struct IncentiveRates {
    /// scheme -> (commitment years -> total reduction rate)
    rates: HashMap<String, BTreeMap<u32, f64>>,
}

impl IncentiveRates {
    /// Create from loaded CSV rows (scheme, years, total rate)
    pub fn from_loaded(rows: &[(String, u32, f64)]) -> Self {
        let mut rates: HashMap<String, BTreeMap<u32, f64>> = HashMap::new();
        for (scheme, years, rate) in rows {
            rates.entry(scheme.clone()).or_default().insert(*years, *rate);
        }
        Self { rates }
    }

    pub fn pinel_defaults() -> Self {
        let rows: Vec<(String, u32, f64)> = [
            ("Pinel Classique (avant 2023)", [0.12, 0.18, 0.21]),
            ("Pinel Classique (2023)", [0.105, 0.15, 0.175]),
            ("Pinel Classique (2024)", [0.09, 0.12, 0.14]),
            ("Pinel + (2023-2024)", [0.12, 0.18, 0.21]),
        ]
        .iter()
        .flat_map(|(scheme, rates)| {
            [6, 9, 12]
                .iter()
                .zip(rates.iter())
                .map(move |(years, rate)| (scheme.to_string(), *years, *rate))
        })
        .collect();
        Self::from_loaded(&rows)
    }

    /// Total rate for a scheme and commitment period, if tabulated
    pub fn total_rate(&self, scheme: &str, years: u32) -> Option<f64> {
        self.rates.get(scheme).and_then(|by_years| by_years.get(&years)).copied()
    }

    /// Annual tax reduction granted by an incentive
    ///
    /// Pinel schemes spread capped price x total rate over the commitment
    /// period; other named schemes grant a flat share of the purchase price.
    /// Unknown Pinel commitment periods grant nothing (see `unrated`).
    pub fn annual_reduction(&self, incentive: &TaxIncentive, purchase_price: f64) -> f64 {
        let scheme = incentive.scheme.trim();
        if incentive.duration_years == 0 || is_no_scheme(scheme) {
            return 0.0;
        }

        if is_pinel(scheme) {
            self.total_rate(scheme, incentive.duration_years)
                .map(|rate| purchase_price.min(PINEL_PRICE_CAP).max(0.0) * rate / incentive.duration_years as f64)
                .unwrap_or(0.0)
        } else {
            purchase_price.max(0.0) * OTHER_SCHEME_RATE
        }
    }

    /// Pinel scheme whose commitment period has no tabulated rate
    pub fn unrated(&self, incentive: &TaxIncentive) -> bool {
        let scheme = incentive.scheme.trim();
        is_pinel(scheme)
            && incentive.duration_years > 0
            && self.total_rate(scheme, incentive.duration_years).is_none()
    }
}

fn is_no_scheme(scheme: &str) -> bool {
    scheme.is_empty() || scheme.eq_ignore_ascii_case("aucun") || scheme.eq_ignore_ascii_case("none")
}

fn is_pinel(scheme: &str) -> bool {
    scheme.contains("Pinel")
}

impl Default for IncentiveRates {
    fn default() -> Self {
        Self::pinel_defaults()
    }
}

/// Whether an incentive started in `first_year` still applies in `year`
pub fn incentive_active(incentive: &TaxIncentive, first_year: i32, year: i32) -> bool {
    year >= first_year && year < first_year.saturating_add(year_span(incentive.duration_years))
}
