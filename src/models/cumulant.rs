//! Annual cumulant model.
//!
//! Per-(employee, year) running totals, updated atomically on slip
//! creation and cancellation. Only the bulletin generator mutates them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-(employee, year) running payroll totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualCumulant {
    /// The employee these totals belong to.
    pub employee_id: Uuid,
    /// The calendar year.
    pub year: i32,
    /// Cumulative gross.
    pub gross: Decimal,
    /// Cumulative taxable base.
    pub taxable: Decimal,
    /// Cumulative net.
    pub net: Decimal,
    /// Cumulative employee-side social contributions.
    pub social_employee: Decimal,
    /// Cumulative employer-side social contributions.
    pub social_employer: Decimal,
    /// Cumulative income tax withheld.
    pub tax: Decimal,
    /// Number of live (non-cancelled) slips contributing to the totals.
    pub slip_count: u32,
}

impl AnnualCumulant {
    /// An empty cumulant for the given employee and year.
    pub fn zero(employee_id: Uuid, year: i32) -> Self {
        Self {
            employee_id,
            year,
            gross: Decimal::ZERO,
            taxable: Decimal::ZERO,
            net: Decimal::ZERO,
            social_employee: Decimal::ZERO,
            social_employer: Decimal::ZERO,
            tax: Decimal::ZERO,
            slip_count: 0,
        }
    }

    /// Returns a copy with one slip's totals added.
    pub fn plus(
        &self,
        gross: Decimal,
        taxable: Decimal,
        net: Decimal,
        social_employee: Decimal,
        social_employer: Decimal,
        tax: Decimal,
    ) -> Self {
        Self {
            employee_id: self.employee_id,
            year: self.year,
            gross: self.gross + gross,
            taxable: self.taxable + taxable,
            net: self.net + net,
            social_employee: self.social_employee + social_employee,
            social_employer: self.social_employer + social_employer,
            tax: self.tax + tax,
            slip_count: self.slip_count + 1,
        }
    }

    /// Returns a copy with one slip's totals removed (cancellation).
    pub fn minus(
        &self,
        gross: Decimal,
        taxable: Decimal,
        net: Decimal,
        social_employee: Decimal,
        social_employer: Decimal,
        tax: Decimal,
    ) -> Self {
        Self {
            employee_id: self.employee_id,
            year: self.year,
            gross: self.gross - gross,
            taxable: self.taxable - taxable,
            net: self.net - net,
            social_employee: self.social_employee - social_employee,
            social_employer: self.social_employer - social_employer,
            tax: self.tax - tax,
            slip_count: self.slip_count.saturating_sub(1),
        }
    }
}
