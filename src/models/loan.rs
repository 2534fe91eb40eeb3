//! Loan and installment models.
//!
//! A loan carries an amortization schedule of exactly `term_months`
//! installments; the schedule is generated on approval and installments
//! are settled by pay slip generation.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The lifecycle state of a loan.
///
/// `pending → approved → active → settled`; `cancelled` is reachable from
/// `pending` or `approved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanState {
    /// Requested, awaiting approval.
    Pending,
    /// Approved; the schedule exists but no installment is paid yet.
    Approved,
    /// At least one installment has been paid.
    Active,
    /// All installments are paid.
    Settled,
    /// Cancelled before any repayment.
    Cancelled,
}

impl LoanState {
    /// Human-readable name used in error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            LoanState::Pending => "pending",
            LoanState::Approved => "approved",
            LoanState::Active => "active",
            LoanState::Settled => "settled",
            LoanState::Cancelled => "cancelled",
        }
    }
}

/// The state of one installment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentState {
    /// Not yet paid.
    Pending,
    /// Paid through a pay slip.
    Paid,
    /// Due date passed without payment.
    Overdue,
}

/// One row of a loan's amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanInstallment {
    /// The loan this installment belongs to.
    pub loan_id: Uuid,
    /// 1-based index within the schedule.
    pub index: u32,
    /// The date the installment falls due.
    pub due_date: NaiveDate,
    /// The installment amount.
    pub amount: Decimal,
    /// Outstanding balance before this installment.
    pub opening_balance: Decimal,
    /// Outstanding balance after this installment.
    pub closing_balance: Decimal,
    /// Payment state.
    pub state: InstallmentState,
    /// The pay slip that settled this installment, when paid.
    pub paid_via_slip: Option<Uuid>,
}

/// An employee loan repaid through payroll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    /// Unique identifier.
    pub id: Uuid,
    /// The tenant this loan belongs to.
    pub tenant_id: Uuid,
    /// The borrowing employee.
    pub employee_id: Uuid,
    /// The borrowed principal.
    pub principal: Decimal,
    /// Annual simple-interest rate in percent (0 for interest-free).
    pub rate: Decimal,
    /// Number of monthly installments.
    pub term_months: u32,
    /// The regular installment amount (the final installment absorbs
    /// rounding drift).
    pub installment_amount: Decimal,
    /// Lifecycle state.
    pub state: LoanState,
    /// The date the first installment is due.
    pub start_date: NaiveDate,
    /// The amortization schedule, exactly `term_months` rows once the
    /// loan is approved.
    pub schedule: Vec<LoanInstallment>,
}

impl Loan {
    /// Sum of unpaid installment amounts.
    pub fn remaining_balance(&self) -> Decimal {
        self.schedule
            .iter()
            .filter(|i| i.state != InstallmentState::Paid)
            .map(|i| i.amount)
            .sum()
    }

    /// Returns true once every installment is paid.
    pub fn fully_repaid(&self) -> bool {
        !self.schedule.is_empty()
            && self
                .schedule
                .iter()
                .all(|i| i.state == InstallmentState::Paid)
    }
}
