//! Employee model and related types.
//!
//! This module defines the Employee struct together with the contract,
//! status and civil-status enums that drive payroll computation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The contract kind of an employee.
///
/// Internships and apprenticeships qualify for the stipend tax exemption
/// during their first twelve months, subject to the compensation cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractKind {
    /// Open-ended contract (CDI).
    Indefinite,
    /// Fixed-term contract (CDD).
    FixedTerm,
    /// Contract whose end date is tied to an event rather than a date.
    ImpreciseTerm,
    /// Intermittent work contract.
    Intermittent,
    /// Internship agreement.
    Internship,
    /// Apprenticeship agreement.
    Apprenticeship,
    /// Temporary staffing contract.
    Temporary,
}

/// The administrative status of an employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    /// Active employee, included in batch payroll generation.
    Active,
    /// Suspended employee, excluded from batch generation.
    Suspended,
    /// Employee who resigned.
    Resigned,
    /// Employee whose contract was terminated.
    Terminated,
    /// Retired employee.
    Retired,
}

/// Marital status, which influences the income-tax base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaritalStatus {
    /// Single.
    Single,
    /// Married; the spouse deduction applies to the tax base.
    Married,
    /// Divorced.
    Divorced,
    /// Widowed.
    Widowed,
}

/// Represents an employee subject to payroll computation.
///
/// Every employee is scoped to exactly one tenant; the matricule is
/// unique within that tenant and is the identifier shown on pay slips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier for the employee.
    pub id: Uuid,
    /// The tenant (employer) this employee belongs to.
    pub tenant_id: Uuid,
    /// Tenant-unique employee number.
    pub matricule: String,
    /// Marital status, used for the spouse tax deduction.
    pub marital_status: MaritalStatus,
    /// Number of dependent children, used for the per-child tax deduction.
    pub children_count: u32,
    /// The date the employee was hired.
    pub hiring_date: NaiveDate,
    /// The reference date for seniority computation.
    ///
    /// Usually equals `hiring_date` but may differ when prior service
    /// is carried over.
    pub seniority_date: NaiveDate,
    /// The start date of the current contract.
    pub contract_start: NaiveDate,
    /// The contract kind.
    pub contract_kind: ContractKind,
    /// The administrative status.
    pub status: EmployeeStatus,
    /// ISO 4217 code of the payment currency. Defaults to the local
    /// currency (GNF).
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Optional end date of activity (resignation, termination, retirement).
    #[serde(default)]
    pub departure_date: Option<NaiveDate>,
}

fn default_currency() -> String {
    "GNF".to_string()
}

impl Employee {
    /// Returns true if the employee participates in batch payroll generation.
    pub fn is_active(&self) -> bool {
        self.status == EmployeeStatus::Active
    }

    /// Returns true if the contract kind is an internship or apprenticeship.
    pub fn is_stipendiary(&self) -> bool {
        matches!(
            self.contract_kind,
            ContractKind::Internship | ContractKind::Apprenticeship
        )
    }

    /// Returns true if the employee is paid in the local currency.
    pub fn paid_in_local_currency(&self) -> bool {
        self.currency == "GNF"
    }

    /// Full years of service at the given date, measured from the
    /// seniority reference date.
    pub fn years_of_service_at(&self, date: NaiveDate) -> u32 {
        use chrono::Datelike;
        if date < self.seniority_date {
            return 0;
        }
        let mut years = date.year() - self.seniority_date.year();
        let anniversary_passed = (date.month(), date.day())
            >= (self.seniority_date.month(), self.seniority_date.day());
        if !anniversary_passed {
            years -= 1;
        }
        years.max(0) as u32
    }

    /// Returns true if the employee's active dates intersect the given
    /// `[from, to]` range.
    pub fn active_during(&self, from: NaiveDate, to: NaiveDate) -> bool {
        if self.hiring_date > to {
            return false;
        }
        match self.departure_date {
            Some(departure) => departure >= from,
            None => true,
        }
    }
}
