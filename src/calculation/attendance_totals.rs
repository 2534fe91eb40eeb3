//! Attendance aggregation.
//!
//! Reduces raw clock records, absence declarations and approved leave
//! requests for one period into the totals the calculator consumes.

use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::models::{Absence, AttendanceRecord, LeaveRequest, LeaveState, PayPeriod};

/// Per-period attendance totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceTotals {
    /// Count of weekdays (Mon-Fri) in the period.
    pub working_days: u32,
    /// Count of days with a present or late clock record.
    pub worked_days: u32,
    /// Total overtime hours across the period.
    pub overtime_hours: Decimal,
    /// Unpaid-absence days, including the unpaid share of partially
    /// paid absences.
    pub absence_days_unpaid: Decimal,
    /// Approved leave days falling inside the period.
    pub leave_days: Decimal,
}

/// Aggregates attendance inputs for one (employee, period).
///
/// Records and declarations are pre-filtered to the employee by the
/// caller; this function filters by date.
pub fn aggregate_attendance(
    period: &PayPeriod,
    records: &[AttendanceRecord],
    absences: &[Absence],
    leaves: &[LeaveRequest],
) -> AttendanceTotals {
    let working_days = period.working_days();

    let mut worked_days = 0;
    let mut overtime_hours = Decimal::ZERO;
    for record in records {
        if !period.contains_date(record.date) {
            continue;
        }
        if record.counts_as_worked() {
            worked_days += 1;
        }
        overtime_hours += record.overtime_hours;
    }

    let mut absence_days_unpaid = Decimal::ZERO;
    for absence in absences {
        if absence_intersects(absence, period) {
            absence_days_unpaid += absence.unpaid_days();
        }
    }

    let mut leave_days = Decimal::ZERO;
    for leave in leaves {
        if leave.state == LeaveState::Approved {
            leave_days += leave.days_within(period.date_start, period.date_end);
        }
    }

    AttendanceTotals {
        working_days,
        worked_days,
        overtime_hours,
        absence_days_unpaid,
        leave_days,
    }
}

/// An absence spans `duration_days` starting at its date; fractional
/// durations occupy the ceiling number of calendar days.
fn absence_intersects(absence: &Absence, period: &PayPeriod) -> bool {
    let span_days = absence.duration_days.ceil().to_i64().unwrap_or(1).max(1);
    let end = absence.date + Duration::days(span_days - 1);
    absence.date <= period.date_end && end >= period.date_start
}
