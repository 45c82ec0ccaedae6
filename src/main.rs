//! Wealth Projection CLI
//!
//! Command-line interface for projecting a saved household

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::path::{Path, PathBuf};
use wealth_projection::household::{load_household, save_household, EconomicHypotheses, Household};
use wealth_projection::loans::{analyze_debt_ratio, debt_ratio::DEFAULT_TARGET_PCT};
use wealth_projection::{Assumptions, ProjectionConfig, ProjectionEngine, TaxMethod};

#[derive(Parser)]
#[command(name = "wealth-projection")]
#[command(about = "Year-by-year projection of household income, debt and net worth")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TaxOption {
    /// Progressive scale with quotient familial
    Brackets,
    /// Single rate on total income (approximation)
    Flat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a projection and write the yearly rows as CSV
    Project {
        /// Household save file (JSON); the sample household otherwise
        #[arg(short = 'f', long)]
        household: Option<PathBuf>,

        /// Number of years to project
        #[arg(short, long, default_value_t = 25)]
        years: u32,

        /// First projected year (defaults to the current year)
        #[arg(long)]
        start_year: Option<i32>,

        #[arg(long, value_enum, default_value_t = TaxOption::Brackets)]
        tax: TaxOption,

        /// Rate used with --tax flat, in percent
        #[arg(long, default_value_t = 15.0)]
        flat_rate_pct: f64,

        /// Override the household's inflation, in percent
        #[arg(long)]
        inflation: Option<f64>,

        /// Override the household's wage growth, in percent
        #[arg(long)]
        wage_growth: Option<f64>,

        /// Directory of CSV assumption tables (built-in 2024 rules otherwise)
        #[arg(long)]
        assumptions: Option<PathBuf>,

        #[arg(short, long, default_value = "projection_output.csv")]
        output: PathBuf,

        /// Print the full result as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show the debt ratio of a household at a date
    DebtRatio {
        #[arg(short = 'f', long)]
        household: PathBuf,

        /// Date of the analysis, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        as_of: Option<NaiveDate>,

        /// Acceptable ratio in percent
        #[arg(long, default_value_t = DEFAULT_TARGET_PCT)]
        target_pct: f64,
    },
    /// Write a sample household to start from
    Init {
        #[arg(short, long, default_value = "household.json")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let today = chrono::Local::now().date_naive();

    match cli.command {
        Commands::Project {
            household,
            years,
            start_year,
            tax,
            flat_rate_pct,
            inflation,
            wage_growth,
            assumptions,
            output,
            json,
        } => {
            let start_year = start_year.unwrap_or(today.year());
            let household = match &household {
                Some(path) => load_household(path, start_year)
                    .with_context(|| format!("Failed to load household from {}", path.display()))?,
                None => Household::sample(start_year),
            };
            let assumptions = load_assumptions(assumptions.as_deref())?;

            let economics_override = (inflation.is_some() || wage_growth.is_some()).then(|| EconomicHypotheses {
                inflation_pct: inflation.unwrap_or(household.economics.inflation_pct),
                wage_growth_pct: wage_growth.unwrap_or(household.economics.wage_growth_pct),
            });
            let config = ProjectionConfig {
                duration_years: years,
                start_year,
                tax_method: match tax {
                    TaxOption::Brackets => TaxMethod::Brackets,
                    TaxOption::Flat => TaxMethod::FlatRate(flat_rate_pct / 100.0),
                },
                economics_override,
            };

            let engine = ProjectionEngine::new(assumptions, config);
            let result = engine.project_household(&household);

            let file = File::create(&output)
                .with_context(|| format!("Unable to create {}", output.display()))?;
            result.write_csv(file)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
                return Ok(());
            }

            println!("Projection Results ({} years):", result.rows.len());
            println!("{:>5} {:>12} {:>12} {:>12} {:>10} {:>12} {:>14} {:>14}",
                "Year", "Income", "Expenses", "Loans", "Tax", "Cash flow", "Liabilities", "Net worth");
            println!("{}", "-".repeat(100));
            for row in &result.rows {
                println!("{:>5} {:>12.0} {:>12.0} {:>12.0} {:>10.0} {:>12.0} {:>14.0} {:>14.0}",
                    row.year,
                    row.total_income + row.sale_proceeds,
                    row.total_expenses,
                    row.loan_payments,
                    row.income_tax,
                    row.net_cash_flow,
                    row.total_liabilities,
                    row.net_worth,
                );
            }

            if !result.events.is_empty() {
                println!("\nEvents:");
                for event in &result.events {
                    println!("  - {}", event);
                }
            }

            let summary = result.summary();
            println!("\nSummary:");
            println!("  Total Income: {:.0}", summary.total_income);
            println!("  Total Income Tax: {:.0}", summary.total_income_tax);
            println!("  Total Loan Payments: {:.0}", summary.total_loan_payments);
            println!("  Final Net Worth: {:.0}", summary.final_net_worth);
            if let Some(year) = summary.first_negative_year {
                println!("  Net worth first negative in {}", year);
            }
            println!("\nFull results written to: {}", output.display());
        }

        Commands::DebtRatio { household, as_of, target_pct } => {
            let as_of = as_of.unwrap_or(today);
            let household = load_household(&household, as_of.year())
                .with_context(|| format!("Failed to load household from {}", household.display()))?;
            let report = analyze_debt_ratio(&household, as_of, target_pct);

            println!("Debt ratio as of {}", report.as_of);
            for charge in &report.charges {
                println!("  {:<30} {:>10.2} / month  ({})",
                    charge.description, charge.monthly_payment, charge.status.describe());
            }
            println!("  Monthly charges: {:.2}", report.monthly_charges);
            println!("  Monthly income:  {:.2}", report.monthly_income);
            match report.ratio_pct {
                Some(ratio) => println!("  Ratio: {:.1}% (target {:.1}%)", ratio, report.target_pct),
                None => println!("  Ratio: n/a (no income)"),
            }
            println!("  Level: {}", report.level().describe());
            println!("  Remaining capacity: {:.2} / month", report.remaining_capacity());
        }

        Commands::Init { output } => {
            save_household(&output, &Household::sample(today.year()))
                .with_context(|| format!("Unable to write {}", output.display()))?;
            println!("Sample household written to: {}", output.display());
        }
    }

    Ok(())
}

fn load_assumptions(path: Option<&Path>) -> Result<Assumptions> {
    match path {
        Some(dir) => Assumptions::from_csv_path(dir)
            .with_context(|| format!("Failed to load assumptions from {}", dir.display())),
        None => Ok(Assumptions::default_2024()),
    }
}
