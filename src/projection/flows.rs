//! Yearly income and expense aggregation

use crate::household::Household;
use super::state::SimulationState;
use super::timeline::{PersonStatus, Timeline};
use serde::{Deserialize, Serialize};

/// Income and expenses of one year, before loans and tax
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnualFlows {
    // Income
    pub salaries: f64,
    pub pensions: f64,
    pub rents: f64,
    pub other_incomes: f64,

    // Expenses
    pub living_expenses: f64,
    /// Charges and property tax of held income properties
    pub property_costs: f64,
    pub study_costs: f64,
}

impl AnnualFlows {
    pub fn total_income(&self) -> f64 {
        self.salaries + self.pensions + self.rents + self.other_incomes
    }

    pub fn total_expenses(&self) -> f64 {
        self.living_expenses + self.property_costs + self.study_costs
    }
}

/// Aggregate the household's flows for the timeline's year
///
/// Salaries come from the state's indexed salary table and stop at
/// retirement, replaced by the fixed pension. Every other amount is scaled by
/// the cumulative inflation index. Rents and property costs only count assets
/// still held.
pub fn compute_flows(timeline: &Timeline, state: &SimulationState, household: &Household) -> AnnualFlows {
    let index = state.inflation_index;
    let mut flows = AnnualFlows::default();

    for adult in &timeline.adults {
        match adult.status {
            PersonStatus::Retired => flows.pensions += adult.pension,
            _ => flows.salaries += state.salary_of(&adult.name),
        }
    }

    for asset in &state.assets {
        flows.rents += asset.annual_rent() * index;
        flows.property_costs += asset.annual_running_costs() * index;
    }

    flows.other_incomes = household.incomes.iter().map(|i| i.annual_amount).sum::<f64>() * index;
    flows.living_expenses = household.expenses.iter().map(|e| e.annual_amount).sum::<f64>() * index;
    flows.study_costs = timeline
        .children
        .iter()
        .filter(|c| c.status == PersonStatus::Student)
        .map(|c| c.annual_study_cost)
        .sum::<f64>()
        * index;

    flows
}
