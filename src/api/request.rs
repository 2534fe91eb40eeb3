//! Request types for the payroll API.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

/// Identifies one (employee, period) for slip generation.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateSlipRequest {
    /// The tenant scope.
    pub tenant_id: Uuid,
    /// The employee to pay.
    pub employee_id: Uuid,
    /// The period to pay for.
    pub period_id: Uuid,
}

/// Identifies one slip.
#[derive(Debug, Clone, Deserialize)]
pub struct SlipRequest {
    /// The tenant scope.
    pub tenant_id: Uuid,
    /// The slip.
    pub slip_id: Uuid,
}

/// Identifies one period for batch operations.
#[derive(Debug, Clone, Deserialize)]
pub struct PeriodRequest {
    /// The tenant scope.
    pub tenant_id: Uuid,
    /// The period.
    pub period_id: Uuid,
    /// Optional per-employee soft deadline in seconds (batch only).
    #[serde(default)]
    pub deadline_secs: Option<u64>,
}

/// Identifies one (employee, year) for entitlement and cumulant reads.
#[derive(Debug, Clone, Deserialize)]
pub struct EmployeeYearRequest {
    /// The tenant scope.
    pub tenant_id: Uuid,
    /// The employee.
    pub employee_id: Uuid,
    /// The calendar year.
    pub year: i32,
}

/// Identifies one leave request.
#[derive(Debug, Clone, Deserialize)]
pub struct LeaveActionRequest {
    /// The tenant scope.
    pub tenant_id: Uuid,
    /// The leave request.
    pub leave_request_id: Uuid,
}

/// A new loan request.
#[derive(Debug, Clone, Deserialize)]
pub struct LoanRequest {
    /// The tenant scope.
    pub tenant_id: Uuid,
    /// The borrowing employee.
    pub employee_id: Uuid,
    /// The principal in local currency.
    pub principal: Decimal,
    /// Annual simple-interest rate in percent.
    pub rate: Decimal,
    /// Number of monthly installments.
    pub term_months: u32,
    /// First installment due date.
    pub start_date: NaiveDate,
}

/// Identifies one loan.
#[derive(Debug, Clone, Deserialize)]
pub struct LoanActionRequest {
    /// The tenant scope.
    pub tenant_id: Uuid,
    /// The loan.
    pub loan_id: Uuid,
}
