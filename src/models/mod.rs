//! Domain models for the payroll engine.
//!
//! All entities are plain immutable records; the calculation layer is
//! pure functions over them and mutation happens only at the store
//! boundary.

mod attendance;
mod cumulant;
mod employee;
mod history;
mod leave;
mod loan;
mod pay_period;
mod payslip;
mod rubric;

pub use attendance::{Absence, AbsenceKind, AttendanceRecord, AttendanceStatus, PayImpact};
pub use cumulant::AnnualCumulant;
pub use employee::{ContractKind, Employee, EmployeeStatus, MaritalStatus};
pub use history::{HistoryAction, PayrollHistory};
pub use leave::{LeaveBalance, LeaveKind, LeaveRequest, LeaveState};
pub use loan::{InstallmentState, Loan, LoanInstallment, LoanState};
pub use pay_period::{PayPeriod, PeriodState};
pub use payslip::{LineKind, PaySlip, PaySlipLine, SlipState};
pub use rubric::{ComputationBase, ElementBasis, Rubric, RubricKind, SalaryElement};
