//! Rubric catalog and salary element models.
//!
//! A rubric is a catalog entry identifying a gain or a deduction; a salary
//! element is the standing attachment of one rubric to one employee, with
//! either a fixed amount or a rate applied to a named base.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a rubric is a gain or a deduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RubricKind {
    /// The rubric adds to gross pay.
    Gain,
    /// The rubric subtracts from net pay.
    Deduction,
}

/// A catalog entry identifying a component of pay.
///
/// Rubrics are tenant-global. The capability flags decide whether a line
/// computed from this rubric enters the social-contribution base and the
/// taxable base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rubric {
    /// Stable catalog code (e.g. "SAL_BASE", "PRIME_TRANSPORT").
    pub code: String,
    /// Human-readable label shown on the pay slip line.
    pub label: String,
    /// Whether the rubric is a gain or a deduction.
    pub kind: RubricKind,
    /// True when amounts under this rubric enter the social-contribution base.
    pub subject_to_social: bool,
    /// True when amounts under this rubric enter the taxable base.
    pub subject_to_tax: bool,
    /// Position of the line on the rendered slip.
    pub display_order: u32,
    /// Position in the calculation sequence; rate-based elements that
    /// reference the running gross are resolved in this order.
    pub computation_order: u32,
    /// Start of the effective window (inclusive).
    pub effective_from: NaiveDate,
    /// End of the effective window (exclusive); `None` means open-ended.
    #[serde(default)]
    pub effective_to: Option<NaiveDate>,
}

impl Rubric {
    /// Returns true if the rubric's effective window contains the date.
    pub fn effective_at(&self, date: NaiveDate) -> bool {
        if date < self.effective_from {
            return false;
        }
        match self.effective_to {
            Some(to) => date < to,
            None => true,
        }
    }
}

/// The named base a rate-based salary element applies its rate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputationBase {
    /// The amount of the employee's base-salary element.
    BaseSalary,
    /// The running gross at the element's position in the computation
    /// sequence.
    Gross,
    /// The running social-contribution base at the element's position.
    SocialBase,
}

/// How a salary element's amount is computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum ElementBasis {
    /// A fixed monthly amount.
    Fixed {
        /// The amount in local currency.
        amount: Decimal,
    },
    /// A rate applied to a named base. The rate is a fraction
    /// (0.2000 = 20%), carried with up to four fractional digits.
    RateOn {
        /// The rate as a decimal fraction.
        rate: Decimal,
        /// The base the rate applies to.
        base: ComputationBase,
    },
}

/// A standing attachment of one rubric to one employee.
///
/// At most one element per (employee, rubric) is active at any date;
/// the store enforces this on insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryElement {
    /// Unique identifier.
    pub id: Uuid,
    /// The employee this element belongs to.
    pub employee_id: Uuid,
    /// The rubric code this element instantiates.
    pub rubric_code: String,
    /// How the line amount is computed.
    pub basis: ElementBasis,
    /// Start of the effective window (inclusive).
    pub effective_from: NaiveDate,
    /// End of the effective window (exclusive); `None` means open-ended.
    #[serde(default)]
    pub effective_to: Option<NaiveDate>,
}

impl SalaryElement {
    /// Returns true if the element's effective window contains the date.
    pub fn effective_at(&self, date: NaiveDate) -> bool {
        if date < self.effective_from {
            return false;
        }
        match self.effective_to {
            Some(to) => date < to,
            None => true,
        }
    }
}
