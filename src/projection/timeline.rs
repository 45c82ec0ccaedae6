//! Household timeline: status of each person in a simulated year

use crate::household::{year_span, Adult, Child, PensionHypothesis};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PersonStatus {
    Active,
    Retired,
    Schooled,
    Student,
    PostStudies,
}

impl fmt::Display for PersonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PersonStatus::Active => "Active",
            PersonStatus::Retired => "Retired",
            PersonStatus::Schooled => "Schooled",
            PersonStatus::Student => "Student",
            PersonStatus::PostStudies => "Post-studies",
        };
        f.write_str(label)
    }
}

/// Status of an adult and the pension they draw if retired
#[derive(Debug, Clone, PartialEq)]
pub struct AdultStatus {
    pub name: String,
    pub age: i32,
    pub status: PersonStatus,
    /// Annual pension of the retained hypothesis, 0 while active
    pub pension: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChildStatus {
    pub name: String,
    pub age: i32,
    pub status: PersonStatus,
    /// Counts for half a fiscal part
    pub dependent: bool,
    pub annual_study_cost: f64,
}

/// Statuses of every household member for one year
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    pub year: i32,
    pub adults: Vec<AdultStatus>,
    pub children: Vec<ChildStatus>,
}

impl Timeline {
    pub fn dependents(&self) -> usize {
        self.children.iter().filter(|c| c.dependent).count()
    }

    pub fn status_of(&self, name: &str) -> Option<PersonStatus> {
        self.adults
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.status)
            .or_else(|| self.children.iter().find(|c| c.name == name).map(|c| c.status))
    }

    /// One-line summary, e.g. "Jean: Active (52), Léo: Student (19)"
    pub fn describe(&self) -> String {
        self.adults
            .iter()
            .map(|a| format!("{}: {} ({})", a.name, a.status, a.age))
            .chain(self.children.iter().map(|c| format!("{}: {} ({})", c.name, c.status, c.age)))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Retained pension hypothesis for an adult
///
/// Among active hypotheses the lowest retirement age wins; ties keep the first
/// declared.
pub fn retained_pension<'a>(adult: &str, pensions: &'a [PensionHypothesis]) -> Option<&'a PensionHypothesis> {
    pensions
        .iter()
        .filter(|p| p.active && p.adult == adult)
        .min_by_key(|p| p.retirement_age)
}

/// Diagnostics for adults with more than one active pension hypothesis
pub fn pension_diagnostics(adults: &[Adult], pensions: &[PensionHypothesis]) -> Vec<String> {
    adults
        .iter()
        .filter_map(|adult| {
            let active = pensions.iter().filter(|p| p.active && p.adult == adult.name).count();
            if active < 2 {
                return None;
            }
            let retained = retained_pension(&adult.name, pensions)?;
            Some(format!(
                "{} has {} active pension hypotheses; retiring at {} with {:.0} per year",
                adult.name, active, retained.retirement_age, retained.annual_pension
            ))
        })
        .collect()
}

fn adult_status(year: i32, adult: &Adult, pensions: &[PensionHypothesis]) -> AdultStatus {
    let retired = retained_pension(&adult.name, pensions)
        .filter(|p| p.retirement_year(adult.birth_year) <= year);
    AdultStatus {
        name: adult.name.clone(),
        age: adult.age_in(year),
        status: if retired.is_some() { PersonStatus::Retired } else { PersonStatus::Active },
        pension: retired.map(|p| p.annual_pension).unwrap_or(0.0),
    }
}

fn child_status(year: i32, child: &Child) -> ChildStatus {
    let age = child.age_in(year);
    let start = year_span(child.study_start_age);
    let end = start.saturating_add(year_span(child.study_duration_years));
    let status = if age < start {
        PersonStatus::Schooled
    } else if age < end {
        PersonStatus::Student
    } else {
        PersonStatus::PostStudies
    };
    ChildStatus {
        name: child.name.clone(),
        age,
        status,
        dependent: age < end,
        annual_study_cost: child.annual_study_cost,
    }
}

/// Resolve every member's status for `year`
pub fn resolve_statuses(
    year: i32,
    adults: &[Adult],
    children: &[Child],
    pensions: &[PensionHypothesis],
) -> Timeline {
    Timeline {
        year,
        adults: adults.iter().map(|a| adult_status(year, a, pensions)).collect(),
        children: children.iter().map(|c| child_status(year, c)).collect(),
    }
}
