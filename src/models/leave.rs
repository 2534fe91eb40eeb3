//! Leave request and leave balance models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of a leave request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveKind {
    /// Annual paid leave, drawn against the accrued balance.
    Annual,
    /// Sick leave.
    Sick,
    /// Maternity leave.
    Maternity,
    /// Exceptional leave (family events).
    Exceptional,
    /// Unpaid leave.
    Unpaid,
}

/// The lifecycle state of a leave request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveState {
    /// Awaiting a decision.
    Pending,
    /// Approved; the days are debited from the balance.
    Approved,
    /// Rejected.
    Rejected,
    /// Cancelled after approval; the days are credited back.
    Cancelled,
}

/// A request to take leave over a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveRequest {
    /// Unique identifier.
    pub id: Uuid,
    /// The employee this request belongs to.
    pub employee_id: Uuid,
    /// The kind of leave.
    pub kind: LeaveKind,
    /// First day of leave (inclusive).
    pub date_start: NaiveDate,
    /// Last day of leave (inclusive).
    pub date_end: NaiveDate,
    /// Number of days requested.
    pub days: Decimal,
    /// Lifecycle state.
    pub state: LeaveState,
    /// The entitlement year this leave draws against.
    pub reference_year: i32,
}

impl LeaveRequest {
    /// Number of days (inclusive) in the intersection of this request
    /// with `[from, to]`, or zero when disjoint.
    pub fn days_within(&self, from: NaiveDate, to: NaiveDate) -> Decimal {
        let start = self.date_start.max(from);
        let end = self.date_end.min(to);
        if start > end {
            return Decimal::ZERO;
        }
        Decimal::from((end - start).num_days() + 1)
    }
}

/// The per-(employee, year) leave account.
///
/// Invariant: `remaining = accrued + carry_over - taken` at all times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveBalance {
    /// The employee this balance belongs to.
    pub employee_id: Uuid,
    /// The entitlement year.
    pub year: i32,
    /// Days accrued for the year (base accrual plus seniority bonus).
    pub accrued: Decimal,
    /// Days carried over from the previous year, capped.
    pub carry_over: Decimal,
    /// Days taken through approved requests.
    pub taken: Decimal,
    /// Days remaining.
    pub remaining: Decimal,
}

impl LeaveBalance {
    /// Recomputes `remaining` from the other three fields.
    pub fn rebalance(&mut self) {
        self.remaining = self.accrued + self.carry_over - self.taken;
    }
}
