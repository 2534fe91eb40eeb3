//! Calculation logic for the payroll engine.
//!
//! This module contains the pure calculation functions for producing a
//! pay slip: attendance aggregation, gain assembly, overtime pay,
//! unpaid-absence retention, social contributions, progressive income
//! tax, employer surcharges, other deductions and the net, orchestrated
//! in strict phase order by [`compute_slip`].

mod absence;
mod attendance_totals;
mod calculator;
mod deductions;
mod gains;
mod overtime;
mod rounding;
mod social;
mod surcharges;
mod tax;

pub use absence::{ABSENCE_RUBRIC, AbsenceResult, compute_absence_retention};
pub use attendance_totals::{AttendanceTotals, aggregate_attendance};
pub use calculator::{
    CalculationInput, CalculationPhase, PhaseFailure, SlipComputation, SlipTotals,
    ZERO_ADJUSTMENT_RUBRIC, check_slip_invariant, compute_slip,
};
pub use deductions::{LOAN_RUBRIC, OtherDeductionsResult, compute_other_deductions};
pub use gains::{BASE_SALARY_RUBRIC, GainsResult, compute_gains};
pub use overtime::{
    OVERTIME_RUBRIC, OvertimeResult, OvertimeTier, compute_overtime, overtime_premium,
};
pub use rounding::round_money;
pub use social::{SOCIAL_RUBRIC, SocialResult, compute_social};
pub use surcharges::{SurchargesResult, compute_surcharges};
pub use tax::{TAX_RUBRIC, TaxResult, compute_tax};
