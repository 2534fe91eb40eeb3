//! Attendance and absence models.
//!
//! Daily clock records and absence declarations are the raw material the
//! attendance aggregator reduces into per-period totals.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The status of one daily attendance record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    /// Present for the full day.
    Present,
    /// Present but arrived late.
    Late,
    /// Absent without a declared absence.
    Absent,
    /// Absent with a justification on file.
    JustifiedAbsent,
}

/// One daily clock record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Unique identifier.
    pub id: Uuid,
    /// The employee this record belongs to.
    pub employee_id: Uuid,
    /// The day the record covers.
    pub date: NaiveDate,
    /// Clock-in time, when recorded.
    pub clock_in: Option<NaiveTime>,
    /// Clock-out time, when recorded.
    pub clock_out: Option<NaiveTime>,
    /// Hours worked, as computed by the clock pipeline.
    pub worked_hours: Decimal,
    /// Overtime hours beyond the daily schedule.
    pub overtime_hours: Decimal,
    /// Day status.
    pub status: AttendanceStatus,
}

impl AttendanceRecord {
    /// Returns true if the day counts as worked (present or late).
    pub fn counts_as_worked(&self) -> bool {
        matches!(
            self.status,
            AttendanceStatus::Present | AttendanceStatus::Late
        )
    }
}

/// The kind of a declared absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsenceKind {
    /// Sick leave.
    Illness,
    /// Work accident.
    WorkAccident,
    /// Unjustified absence.
    Unjustified,
    /// Authorized absence.
    Authorized,
}

/// How an absence affects pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayImpact {
    /// Fully paid; no retention.
    Paid,
    /// Fully unpaid; the full duration is retained.
    Unpaid,
    /// Partially paid; retention covers `(100 - partial_rate)%` of the
    /// duration.
    Partial,
}

/// A declared absence spanning one or more days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Absence {
    /// Unique identifier.
    pub id: Uuid,
    /// The employee this absence belongs to.
    pub employee_id: Uuid,
    /// First day of the absence.
    pub date: NaiveDate,
    /// The kind of absence.
    pub kind: AbsenceKind,
    /// Duration in days (fractions allowed for half-days).
    pub duration_days: Decimal,
    /// Whether a justification is on file.
    pub justified: bool,
    /// How the absence affects pay.
    pub pay_impact: PayImpact,
    /// Percentage of pay kept when `pay_impact` is `Partial`, in `[0, 100]`.
    pub partial_rate: Decimal,
}

impl Absence {
    /// Days of pay retained for this absence.
    ///
    /// `Unpaid` retains the full duration, `Partial` retains
    /// `duration × (100 − partial_rate) / 100`, `Paid` retains nothing.
    pub fn unpaid_days(&self) -> Decimal {
        match self.pay_impact {
            PayImpact::Paid => Decimal::ZERO,
            PayImpact::Unpaid => self.duration_days,
            PayImpact::Partial => {
                self.duration_days * (Decimal::ONE_HUNDRED - self.partial_rate)
                    / Decimal::ONE_HUNDRED
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn absence(impact: PayImpact, duration: &str, partial_rate: &str) -> Absence {
        Absence {
            id: Uuid::new_v4(),
            employee_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            kind: AbsenceKind::Unjustified,
            duration_days: dec(duration),
            justified: false,
            pay_impact: impact,
            partial_rate: dec(partial_rate),
        }
    }

    #[test]
    fn test_unpaid_absence_retains_full_duration() {
        assert_eq!(absence(PayImpact::Unpaid, "3", "0").unpaid_days(), dec("3"));
    }

    #[test]
    fn test_paid_absence_retains_nothing() {
        assert_eq!(absence(PayImpact::Paid, "3", "0").unpaid_days(), dec("0"));
    }

    #[test]
    fn test_partial_absence_retains_complement() {
        // 4 days at 75% pay: 1 day retained.
        assert_eq!(
            absence(PayImpact::Partial, "4", "75").unpaid_days(),
            dec("1")
        );
    }

    #[test]
    fn test_late_day_counts_as_worked() {
        let record = AttendanceRecord {
            id: Uuid::new_v4(),
            employee_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            clock_in: NaiveTime::from_hms_opt(8, 40, 0),
            clock_out: NaiveTime::from_hms_opt(17, 0, 0),
            worked_hours: dec("7.5"),
            overtime_hours: dec("0"),
            status: AttendanceStatus::Late,
        };
        assert!(record.counts_as_worked());
    }
}
