//! Pay period model and lifecycle.
//!
//! A pay period identifies one (year, month) payroll run for a tenant.
//! At most one period per tenant is open at a time; closing a period
//! freezes all of its slips against mutation.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

/// The lifecycle state of a pay period.
///
/// Transitions go strictly forward: `open → calculating → validated →
/// closed`. Validation rejects regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodState {
    /// The period accepts slip generation.
    Open,
    /// A batch generation is in progress.
    Calculating,
    /// Every active employee has a slip; the period awaits closing.
    Validated,
    /// The period is frozen; its slips are immutable.
    Closed,
}

impl PeriodState {
    fn rank(self) -> u8 {
        match self {
            PeriodState::Open => 0,
            PeriodState::Calculating => 1,
            PeriodState::Validated => 2,
            PeriodState::Closed => 3,
        }
    }

    /// Human-readable name used in error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            PeriodState::Open => "open",
            PeriodState::Calculating => "calculating",
            PeriodState::Validated => "validated",
            PeriodState::Closed => "closed",
        }
    }
}

/// Represents one (year, month) payroll period of a tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayPeriod {
    /// Unique identifier.
    pub id: Uuid,
    /// The tenant this period belongs to.
    pub tenant_id: Uuid,
    /// Calendar year.
    pub year: i32,
    /// Calendar month (1-12).
    pub month: u32,
    /// First day of the period (inclusive).
    pub date_start: NaiveDate,
    /// Last day of the period (inclusive).
    pub date_end: NaiveDate,
    /// Lifecycle state.
    pub state: PeriodState,
}

impl PayPeriod {
    /// Creates an open period covering the full calendar month.
    pub fn for_month(tenant_id: Uuid, year: i32, month: u32) -> EngineResult<Self> {
        let date_start =
            NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| EngineError::Internal {
                message: format!("invalid period month {year}-{month}"),
            })?;
        let next_month = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or_else(|| EngineError::Internal {
            message: format!("invalid period month {year}-{month}"),
        })?;
        Ok(Self {
            id: Uuid::new_v4(),
            tenant_id,
            year,
            month,
            date_start,
            date_end: next_month.pred_opt().unwrap_or(date_start),
            state: PeriodState::Open,
        })
    }

    /// Label used on slips and in error messages (`YYYY-MM`).
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    /// Checks if a given date falls within this period (inclusive).
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.date_start && date <= self.date_end
    }

    /// Count of weekdays (Mon-Fri) in `[date_start, date_end]`.
    pub fn working_days(&self) -> u32 {
        let mut count = 0;
        let mut day = self.date_start;
        while day <= self.date_end {
            if day.weekday().number_from_monday() <= 5 {
                count += 1;
            }
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
        count
    }

    /// Requests a state transition, rejecting regression and skips.
    ///
    /// Returns `PeriodClosed` when the period is already frozen and
    /// `InvalidTransition` for any other rejected move.
    pub fn transition_to(&mut self, target: PeriodState) -> EngineResult<()> {
        if self.state == PeriodState::Closed {
            return Err(EngineError::PeriodClosed {
                period: self.label(),
            });
        }
        let from = self.state.rank();
        let to = target.rank();
        // Reopening from calculating back to open is allowed; everything
        // else must advance by exactly one step.
        let reopening = self.state == PeriodState::Calculating && target == PeriodState::Open;
        if !reopening && to != from + 1 {
            return Err(EngineError::InvalidTransition {
                entity: "PayPeriod".to_string(),
                from: self.state.as_str().to_string(),
                to: target.as_str().to_string(),
            });
        }
        self.state = target;
        Ok(())
    }
}
