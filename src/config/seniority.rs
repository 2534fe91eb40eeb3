//! Seniority step table for leave accrual.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One step of the seniority table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeniorityStep {
    /// Minimum full years of service for the step to apply.
    pub years: u32,
    /// Bonus leave days granted at this step.
    pub bonus_days: Decimal,
}

/// The seniority bonus table, sorted by years ascending.
///
/// Lookup returns the bonus of the highest step whose threshold the
/// employee has reached, or zero below the first step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeniorityTable {
    steps: Vec<SeniorityStep>,
}

impl SeniorityTable {
    /// Builds a table from steps, sorting them by threshold.
    pub fn new(mut steps: Vec<SeniorityStep>) -> Self {
        steps.sort_by_key(|s| s.years);
        Self { steps }
    }

    /// Bonus days for the given full years of service.
    pub fn bonus_for(&self, years_of_service: u32) -> Decimal {
        self.steps
            .iter()
            .rev()
            .find(|s| years_of_service >= s.years)
            .map(|s| s.bonus_days)
            .unwrap_or(Decimal::ZERO)
    }
}
