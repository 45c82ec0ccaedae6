//! Scenario runner for batch projections
//!
//! Pre-loads assumptions once, then runs many projections with different
//! configurations without re-reading CSV files. Scenarios run in parallel;
//! each projection stays sequential internally.

use crate::assumptions::{AssumptionsError, Assumptions};
use crate::household::{EconomicHypotheses, Household};
use crate::projection::{ProjectionConfig, ProjectionEngine, ProjectionResult};
use rayon::prelude::*;

/// Pre-loaded scenario runner for batch projections
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::from_csv()?;
/// let configs = economic_grid(&ProjectionConfig::default(), &[1.0, 2.0, 3.0], &[1.5]);
/// let results = runner.run_scenarios(&household, &configs);
/// ```
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    /// Pre-loaded base assumptions
    base_assumptions: Assumptions,
}

impl ScenarioRunner {
    /// Create runner with default in-memory assumptions
    pub fn new() -> Self {
        Self {
            base_assumptions: Assumptions::default_2024(),
        }
    }

    /// Create runner by loading assumptions from CSV files
    pub fn from_csv() -> Result<Self, AssumptionsError> {
        Ok(Self {
            base_assumptions: Assumptions::from_csv()?,
        })
    }

    /// Create runner from specific assumptions directory
    pub fn from_csv_path(path: &std::path::Path) -> Result<Self, AssumptionsError> {
        Ok(Self {
            base_assumptions: Assumptions::from_csv_path(path)?,
        })
    }

    /// Create runner with pre-built assumptions
    pub fn with_assumptions(assumptions: Assumptions) -> Self {
        Self {
            base_assumptions: assumptions,
        }
    }

    /// Run a single projection with the given config
    pub fn run(&self, household: &Household, config: ProjectionConfig) -> ProjectionResult {
        let engine = ProjectionEngine::new(self.base_assumptions.clone(), config);
        engine.project_household(household)
    }

    /// Run projections for several households with the same config
    pub fn run_batch(&self, households: &[Household], config: &ProjectionConfig) -> Vec<ProjectionResult> {
        households
            .par_iter()
            .map(|household| self.run(household, config.clone()))
            .collect()
    }

    /// Run multiple scenarios (different configs) for a single household
    ///
    /// Results come back in the order of `configs`.
    pub fn run_scenarios(&self, household: &Household, configs: &[ProjectionConfig]) -> Vec<ProjectionResult> {
        configs
            .par_iter()
            .map(|config| self.run(household, config.clone()))
            .collect()
    }

    /// Get reference to base assumptions for inspection/modification
    pub fn assumptions(&self) -> &Assumptions {
        &self.base_assumptions
    }

    /// Get mutable reference to base assumptions for customization
    pub fn assumptions_mut(&mut self) -> &mut Assumptions {
        &mut self.base_assumptions
    }
}

impl Default for ScenarioRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Every combination of inflation and wage growth (percent) over a base config
pub fn economic_grid(base: &ProjectionConfig, inflation_pcts: &[f64], wage_growth_pcts: &[f64]) -> Vec<ProjectionConfig> {
    inflation_pcts
        .iter()
        .flat_map(|&inflation_pct| {
            wage_growth_pcts.iter().map(move |&wage_growth_pct| ProjectionConfig {
                economics_override: Some(EconomicHypotheses {
                    inflation_pct,
                    wage_growth_pct,
                }),
                ..base.clone()
            })
        })
        .collect()
}
