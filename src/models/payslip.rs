//! Pay slip and pay slip line models.
//!
//! The pay slip is the monthly artifact computed per employee: headline
//! totals plus an ordered, auditable line-by-line breakdown. Line amounts
//! are stored as magnitudes; the `kind` tag carries the sign.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

/// Whether a slip line adds to or subtracts from net pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    /// The line adds to gross pay.
    Gain,
    /// The line subtracts from net pay.
    Deduction,
}

/// The lifecycle state of a pay slip.
///
/// `calculated → validated → paid`; `cancelled` is terminal and reachable
/// from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlipState {
    /// Freshly generated.
    Calculated,
    /// Approved by the payroll manager.
    Validated,
    /// Disbursed.
    Paid,
    /// Reversed; cumulants have been rolled back.
    Cancelled,
}

impl SlipState {
    /// Human-readable name used in error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            SlipState::Calculated => "calculated",
            SlipState::Validated => "validated",
            SlipState::Paid => "paid",
            SlipState::Cancelled => "cancelled",
        }
    }
}

/// One line of a pay slip's breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaySlipLine {
    /// The rubric code this line instantiates.
    pub rubric_code: String,
    /// Human-readable label.
    pub label: String,
    /// Gain or deduction; the stored amount is a magnitude.
    pub kind: LineKind,
    /// The base the line was computed from.
    pub base: Decimal,
    /// The rate applied to the base, when the line is rate-based.
    pub rate: Option<Decimal>,
    /// The quantity (days, hours, units) the line covers.
    pub quantity: Decimal,
    /// The line amount (magnitude, two fractional digits).
    pub amount: Decimal,
    /// Position of the line on the rendered slip.
    pub display_order: u32,
}

/// The computed monthly pay slip of one employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaySlip {
    /// Unique identifier.
    pub id: Uuid,
    /// The tenant this slip belongs to.
    pub tenant_id: Uuid,
    /// The employee this slip belongs to.
    pub employee_id: Uuid,
    /// The period this slip was generated for.
    pub period_id: Uuid,
    /// Lifecycle state.
    pub state: SlipState,
    /// Sum of all gain lines.
    pub gross: Decimal,
    /// The taxable base the slip was computed from; feeds the annual
    /// cumulant and its reversal on cancellation.
    pub taxable_base: Decimal,
    /// Employee-side social contribution (CNSS).
    pub social_employee: Decimal,
    /// Employer-side social contribution; recorded on the slip but not
    /// shown as a deduction line.
    pub social_employer: Decimal,
    /// Progressive income-tax withholding (RTS).
    pub tax: Decimal,
    /// Employer-side flat surcharge (Versement Forfaitaire).
    pub vf: Decimal,
    /// Employer-side apprenticeship levy (Taxe d'Apprentissage).
    pub ta: Decimal,
    /// Sum of all deduction lines.
    pub total_deductions: Decimal,
    /// `gross - total_deductions`, never negative.
    pub net: Decimal,
    /// ISO 4217 code of the employee's payment currency.
    pub currency: String,
    /// Net converted into the employee currency, when it differs from
    /// the local currency.
    pub net_employee_currency: Option<Decimal>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Ordered line breakdown, sorted by `display_order`.
    pub lines: Vec<PaySlipLine>,
}

impl PaySlip {
    /// Returns true unless the slip has been cancelled.
    pub fn is_live(&self) -> bool {
        self.state != SlipState::Cancelled
    }

    /// Requests a state transition.
    ///
    /// Forward moves go one step at a time; `Cancelled` is reachable from
    /// any non-terminal state.
    pub fn transition_to(&mut self, target: SlipState) -> EngineResult<()> {
        let allowed = matches!(
            (self.state, target),
            (SlipState::Calculated, SlipState::Validated)
                | (SlipState::Validated, SlipState::Paid)
                | (SlipState::Calculated, SlipState::Cancelled)
                | (SlipState::Validated, SlipState::Cancelled)
        );
        if !allowed {
            return Err(EngineError::InvalidTransition {
                entity: "PaySlip".to_string(),
                from: self.state.as_str().to_string(),
                to: target.as_str().to_string(),
            });
        }
        self.state = target;
        Ok(())
    }

    /// Sum of gain lines, for invariant checks.
    pub fn gain_line_total(&self) -> Decimal {
        self.lines
            .iter()
            .filter(|l| l.kind == LineKind::Gain)
            .map(|l| l.amount)
            .sum()
    }

    /// Sum of deduction lines, for invariant checks.
    pub fn deduction_line_total(&self) -> Decimal {
        self.lines
            .iter()
            .filter(|l| l.kind == LineKind::Deduction)
            .map(|l| l.amount)
            .sum()
    }
}
