//! Run one household under a grid of economic scenarios
//!
//! Writes one summary line per (inflation, wage growth) pair as CSV

use anyhow::{Context, Result};
use chrono::Datelike;
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use wealth_projection::household::{load_household, Household};
use wealth_projection::scenario::{economic_grid, ScenarioRunner};
use wealth_projection::ProjectionConfig;

#[derive(Parser)]
#[command(name = "compare_scenarios")]
#[command(about = "Compare a household's projection across inflation and wage-growth scenarios")]
struct Args {
    /// Household save file (JSON); the sample household otherwise
    #[arg(short = 'f', long)]
    household: Option<PathBuf>,

    #[arg(short, long, default_value_t = 25)]
    years: u32,

    /// Inflation rates to test, in percent
    #[arg(long, value_delimiter = ',', default_value = "1,2,3,4")]
    inflation: Vec<f64>,

    /// Wage growth rates to test, in percent
    #[arg(long, value_delimiter = ',', default_value = "0,1,2")]
    wage_growth: Vec<f64>,

    /// Directory of CSV assumption tables
    #[arg(long)]
    assumptions: Option<PathBuf>,

    #[arg(short, long, default_value = "scenario_comparison.csv")]
    output: PathBuf,
}

#[derive(Serialize)]
struct ScenarioLine {
    inflation_pct: f64,
    wage_growth_pct: f64,
    final_net_worth: f64,
    lowest_net_worth: f64,
    first_negative_year: Option<i32>,
    total_income_tax: f64,
    total_loan_payments: f64,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let start_year = chrono::Local::now().year();
    let household = match &args.household {
        Some(path) => load_household(path, start_year)
            .with_context(|| format!("Failed to load household from {}", path.display()))?,
        None => Household::sample(start_year),
    };

    let runner = match &args.assumptions {
        Some(dir) => ScenarioRunner::from_csv_path(dir)
            .with_context(|| format!("Failed to load assumptions from {}", dir.display()))?,
        None => ScenarioRunner::new(),
    };

    let base = ProjectionConfig {
        duration_years: args.years,
        start_year,
        ..Default::default()
    };
    let configs = economic_grid(&base, &args.inflation, &args.wage_growth);

    println!("Running {} scenarios over {} years...", configs.len(), args.years);
    let started = Instant::now();
    let results = runner.run_scenarios(&household, &configs);
    println!("Completed in {:?}", started.elapsed());

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("Unable to create {}", args.output.display()))?;

    println!("{:>10} {:>10} {:>16} {:>16} {:>10}", "Inflation", "Wages", "Final NW", "Lowest NW", "Negative");
    println!("{}", "-".repeat(66));
    for (config, result) in configs.iter().zip(&results) {
        let economics = config.economics_override.unwrap_or(household.economics);
        let summary = result.summary();
        let line = ScenarioLine {
            inflation_pct: economics.inflation_pct,
            wage_growth_pct: economics.wage_growth_pct,
            final_net_worth: summary.final_net_worth,
            lowest_net_worth: summary.lowest_net_worth,
            first_negative_year: summary.first_negative_year,
            total_income_tax: summary.total_income_tax,
            total_loan_payments: summary.total_loan_payments,
        };
        println!("{:>9.1}% {:>9.1}% {:>16.0} {:>16.0} {:>10}",
            line.inflation_pct,
            line.wage_growth_pct,
            line.final_net_worth,
            line.lowest_net_worth,
            line.first_negative_year.map(|y| y.to_string()).unwrap_or_else(|| "-".to_string()),
        );
        writer.serialize(&line)?;
    }
    writer.flush()?;

    println!("\nResults written to: {}", args.output.display());
    Ok(())
}
