//! Yearly revaluation of the patrimony and cash placement

use crate::household::{Asset, AssetCategory, AssetId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the account opened when no financial asset can receive cash
pub const CASH_RESERVE_NAME: &str = "Trésorerie";

/// Amounts split by asset category
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotals {
    pub financial: f64,
    pub owner_occupied: f64,
    pub income_property: f64,
}

impl CategoryTotals {
    pub fn get(&self, category: AssetCategory) -> f64 {
        match category {
            AssetCategory::Financial => self.financial,
            AssetCategory::OwnerOccupied => self.owner_occupied,
            AssetCategory::IncomeProperty => self.income_property,
        }
    }

    fn add(&mut self, category: AssetCategory, amount: f64) {
        match category {
            AssetCategory::Financial => self.financial += amount,
            AssetCategory::OwnerOccupied => self.owner_occupied += amount,
            AssetCategory::IncomeProperty => self.income_property += amount,
        }
    }

    pub fn total(&self) -> f64 {
        self.financial + self.owner_occupied + self.income_property
    }
}

/// Patrimony at the end of a year
#[derive(Debug, Clone, PartialEq)]
pub struct PatrimonySnapshot {
    pub gross: CategoryTotals,
    /// Gross minus the outstanding loans financing each category
    pub net: CategoryTotals,
    pub total_assets: f64,
    pub total_liabilities: f64,
    pub net_worth: f64,
    /// Asset that received the year's cash flow
    pub cash_account: Option<AssetId>,
    /// A cash reserve had to be opened this year
    pub reserve_opened: bool,
}

/// Appreciate assets, place the year's cash and total everything
///
/// Cash (possibly negative) goes to the first financial asset. When the
/// household holds none, a non-appreciating cash reserve is opened in the
/// financial category under `reserve_id`. A zero cash flow never opens a
/// reserve.
pub fn advance_patrimony(
    year: i32,
    assets: &mut Vec<Asset>,
    net_cash_flow: f64,
    liabilities: &BTreeMap<AssetId, f64>,
    reserve_id: AssetId,
) -> PatrimonySnapshot {
    for asset in assets.iter_mut() {
        asset.gross_value *= 1.0 + asset.appreciation_rate_pct / 100.0;
    }

    let mut reserve_opened = false;
    let cash_account = match assets.iter_mut().find(|a| a.category == AssetCategory::Financial) {
        Some(account) => {
            account.gross_value += net_cash_flow;
            Some(account.id)
        }
        None if net_cash_flow != 0.0 => {
            let opened = NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or_default();
            assets.push(Asset::new(reserve_id, CASH_RESERVE_NAME, AssetCategory::Financial, net_cash_flow, 0.0, 0.0, opened));
            reserve_opened = true;
            Some(reserve_id)
        }
        None => None,
    };

    let mut gross = CategoryTotals::default();
    let mut net = CategoryTotals::default();
    for asset in assets.iter() {
        gross.add(asset.category, asset.gross_value);
        let debt = liabilities.get(&asset.id).copied().unwrap_or(0.0);
        net.add(asset.category, asset.gross_value - debt);
    }

    let total_assets = gross.total();
    let total_liabilities: f64 = liabilities.values().sum();
    let net_worth = total_assets - total_liabilities;
    if net_worth < 0.0 {
        log::warn!("{}: net worth is negative ({:.0})", year, net_worth);
    }

    PatrimonySnapshot {
        gross,
        net,
        total_assets,
        total_liabilities,
        net_worth,
        cash_account,
        reserve_opened,
    }
}
