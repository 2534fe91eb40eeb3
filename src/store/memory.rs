//! In-memory transactional store.
//!
//! Tables are tenant-scoped maps behind one `RwLock`; cumulants carry a
//! version column updated by compare-and-swap; slip generation serializes
//! on a named advisory lock keyed `(tenant, employee, period)`.

use std::collections::{HashMap, HashSet};
use std::sync::{Condvar, Mutex, RwLock};

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    Absence, AnnualCumulant, AttendanceRecord, Employee, LeaveBalance, LeaveRequest, Loan,
    PayPeriod, PayrollHistory, PaySlip, PeriodState, Rubric, SalaryElement, SlipState,
};

/// A cumulant row with its compare-and-swap version.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedCumulant {
    /// The running totals.
    pub totals: AnnualCumulant,
    /// Version column; bumped on every successful swap.
    pub version: u64,
}

type LockKey = (Uuid, Uuid, Uuid);

/// Named advisory locks for slip generation.
#[derive(Debug, Default)]
struct NamedLocks {
    held: Mutex<HashSet<LockKey>>,
    released: Condvar,
}

/// Guard for one held `(tenant, employee, period)` advisory lock.
#[derive(Debug)]
pub struct GenerationLockGuard<'a> {
    locks: &'a NamedLocks,
    key: LockKey,
}

impl Drop for GenerationLockGuard<'_> {
    fn drop(&mut self) {
        let mut held = self.locks.held.lock().expect("lock registry poisoned");
        held.remove(&self.key);
        self.locks.released.notify_all();
    }
}

#[derive(Debug, Default)]
struct State {
    employees: HashMap<Uuid, Employee>,
    rubrics: HashMap<Uuid, HashMap<String, Rubric>>,
    elements: Vec<SalaryElement>,
    periods: HashMap<Uuid, PayPeriod>,
    slips: HashMap<Uuid, PaySlip>,
    attendance: Vec<AttendanceRecord>,
    absences: Vec<Absence>,
    leaves: HashMap<Uuid, LeaveRequest>,
    leave_balances: HashMap<(Uuid, i32), LeaveBalance>,
    loans: HashMap<Uuid, Loan>,
    cumulants: HashMap<(Uuid, i32), VersionedCumulant>,
    history: Vec<PayrollHistory>,
}

/// The in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
    locks: NamedLocks,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&State) -> T) -> T {
        f(&self.state.read().expect("store lock poisoned"))
    }

    fn write<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        f(&mut self.state.write().expect("store lock poisoned"))
    }

    // ------------------------------------------------------------------
    // Advisory locks
    // ------------------------------------------------------------------

    /// Acquires the advisory lock for one `(tenant, employee, period)`.
    ///
    /// Blocks until the lock is free; the guard releases it on drop.
    pub fn lock_generation(
        &self,
        tenant_id: Uuid,
        employee_id: Uuid,
        period_id: Uuid,
    ) -> GenerationLockGuard<'_> {
        let key = (tenant_id, employee_id, period_id);
        let mut held = self.locks.held.lock().expect("lock registry poisoned");
        while held.contains(&key) {
            held = self
                .locks
                .released
                .wait(held)
                .expect("lock registry poisoned");
        }
        held.insert(key);
        GenerationLockGuard {
            locks: &self.locks,
            key,
        }
    }

    // ------------------------------------------------------------------
    // Employees, rubrics, elements
    // ------------------------------------------------------------------

    /// Inserts an employee, rejecting duplicate matricules per tenant.
    pub fn insert_employee(&self, employee: Employee) -> EngineResult<()> {
        self.write(|state| {
            let duplicate = state.employees.values().any(|e| {
                e.tenant_id == employee.tenant_id && e.matricule == employee.matricule
            });
            if duplicate {
                return Err(EngineError::Validation {
                    message: format!(
                        "matricule '{}' already exists for this tenant",
                        employee.matricule
                    ),
                });
            }
            state.employees.insert(employee.id, employee);
            Ok(())
        })
    }

    /// Fetches an employee scoped to a tenant.
    pub fn employee(&self, tenant_id: Uuid, employee_id: Uuid) -> EngineResult<Employee> {
        self.read(|state| {
            state
                .employees
                .get(&employee_id)
                .filter(|e| e.tenant_id == tenant_id)
                .cloned()
                .ok_or_else(|| EngineError::NotFound {
                    entity: "Employee".to_string(),
                    id: employee_id.to_string(),
                })
        })
    }

    /// Active employees of a tenant in matricule order.
    pub fn active_employees(&self, tenant_id: Uuid) -> Vec<Employee> {
        self.read(|state| {
            let mut employees: Vec<Employee> = state
                .employees
                .values()
                .filter(|e| e.tenant_id == tenant_id && e.is_active())
                .cloned()
                .collect();
            employees.sort_by(|a, b| a.matricule.cmp(&b.matricule));
            employees
        })
    }

    /// Inserts or replaces a rubric in a tenant's catalog.
    pub fn upsert_rubric(&self, tenant_id: Uuid, rubric: Rubric) {
        self.write(|state| {
            state
                .rubrics
                .entry(tenant_id)
                .or_default()
                .insert(rubric.code.clone(), rubric);
        });
    }

    /// The rubric catalog of a tenant.
    pub fn rubrics(&self, tenant_id: Uuid) -> HashMap<String, Rubric> {
        self.read(|state| state.rubrics.get(&tenant_id).cloned().unwrap_or_default())
    }

    /// Attaches a salary element, enforcing at most one active element
    /// per (employee, rubric) at any date.
    pub fn insert_element(&self, element: SalaryElement) -> EngineResult<()> {
        self.write(|state| {
            let overlapping = state.elements.iter().any(|existing| {
                existing.employee_id == element.employee_id
                    && existing.rubric_code == element.rubric_code
                    && windows_overlap(
                        existing.effective_from,
                        existing.effective_to,
                        element.effective_from,
                        element.effective_to,
                    )
            });
            if overlapping {
                return Err(EngineError::Validation {
                    message: format!(
                        "an element for rubric '{}' is already active in this window",
                        element.rubric_code
                    ),
                });
            }
            state.elements.push(element);
            Ok(())
        })
    }

    /// All salary elements of an employee.
    pub fn elements_of(&self, employee_id: Uuid) -> Vec<SalaryElement> {
        self.read(|state| {
            state
                .elements
                .iter()
                .filter(|e| e.employee_id == employee_id)
                .cloned()
                .collect()
        })
    }

    // ------------------------------------------------------------------
    // Attendance, absences, leave
    // ------------------------------------------------------------------

    /// Records a daily attendance row.
    pub fn insert_attendance(&self, record: AttendanceRecord) {
        self.write(|state| state.attendance.push(record));
    }

    /// Records an absence declaration.
    pub fn insert_absence(&self, absence: Absence) {
        self.write(|state| state.absences.push(absence));
    }

    /// Attendance rows of an employee.
    pub fn attendance_of(&self, employee_id: Uuid) -> Vec<AttendanceRecord> {
        self.read(|state| {
            state
                .attendance
                .iter()
                .filter(|r| r.employee_id == employee_id)
                .cloned()
                .collect()
        })
    }

    /// Absences of an employee.
    pub fn absences_of(&self, employee_id: Uuid) -> Vec<Absence> {
        self.read(|state| {
            state
                .absences
                .iter()
                .filter(|a| a.employee_id == employee_id)
                .cloned()
                .collect()
        })
    }

    /// Inserts a leave request.
    pub fn insert_leave_request(&self, request: LeaveRequest) {
        self.write(|state| {
            state.leaves.insert(request.id, request);
        });
    }

    /// Fetches a leave request.
    pub fn leave_request(&self, id: Uuid) -> EngineResult<LeaveRequest> {
        self.read(|state| {
            state
                .leaves
                .get(&id)
                .cloned()
                .ok_or_else(|| EngineError::NotFound {
                    entity: "LeaveRequest".to_string(),
                    id: id.to_string(),
                })
        })
    }

    /// Leave requests of an employee.
    pub fn leave_requests_of(&self, employee_id: Uuid) -> Vec<LeaveRequest> {
        self.read(|state| {
            state
                .leaves
                .values()
                .filter(|l| l.employee_id == employee_id)
                .cloned()
                .collect()
        })
    }

    /// Mutates a leave request and its balance in one transaction.
    pub fn with_leave_mut<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut LeaveRequest, &mut HashMap<(Uuid, i32), LeaveBalance>) -> EngineResult<T>,
    ) -> EngineResult<T> {
        self.write(|state| {
            let request = state
                .leaves
                .get_mut(&id)
                .ok_or_else(|| EngineError::NotFound {
                    entity: "LeaveRequest".to_string(),
                    id: id.to_string(),
                })?;
            f(request, &mut state.leave_balances)
        })
    }

    /// Stores a computed leave balance.
    pub fn upsert_leave_balance(&self, balance: LeaveBalance) {
        self.write(|state| {
            state
                .leave_balances
                .insert((balance.employee_id, balance.year), balance);
        });
    }

    /// The stored leave balance for (employee, year), if any.
    pub fn leave_balance(&self, employee_id: Uuid, year: i32) -> Option<LeaveBalance> {
        self.read(|state| state.leave_balances.get(&(employee_id, year)).cloned())
    }

    // ------------------------------------------------------------------
    // Periods
    // ------------------------------------------------------------------

    /// Opens a period, enforcing at most one open period per tenant.
    pub fn insert_period(&self, period: PayPeriod) -> EngineResult<()> {
        self.write(|state| {
            let open_exists = state
                .periods
                .values()
                .any(|p| p.tenant_id == period.tenant_id && p.state == PeriodState::Open);
            if open_exists && period.state == PeriodState::Open {
                return Err(EngineError::Validation {
                    message: "another period is already open for this tenant".to_string(),
                });
            }
            state.periods.insert(period.id, period);
            Ok(())
        })
    }

    /// Fetches a period scoped to a tenant.
    pub fn period(&self, tenant_id: Uuid, period_id: Uuid) -> EngineResult<PayPeriod> {
        self.read(|state| {
            state
                .periods
                .get(&period_id)
                .filter(|p| p.tenant_id == tenant_id)
                .cloned()
                .ok_or_else(|| EngineError::NotFound {
                    entity: "PayPeriod".to_string(),
                    id: period_id.to_string(),
                })
        })
    }

    /// Transitions a period's state.
    pub fn transition_period(
        &self,
        tenant_id: Uuid,
        period_id: Uuid,
        target: PeriodState,
    ) -> EngineResult<PayPeriod> {
        self.write(|state| {
            let period = state
                .periods
                .get_mut(&period_id)
                .filter(|p| p.tenant_id == tenant_id)
                .ok_or_else(|| EngineError::NotFound {
                    entity: "PayPeriod".to_string(),
                    id: period_id.to_string(),
                })?;
            period.transition_to(target)?;
            Ok(period.clone())
        })
    }

    // ------------------------------------------------------------------
    // Slips
    // ------------------------------------------------------------------

    /// The live (non-cancelled) slip for (employee, period), if any.
    pub fn live_slip(&self, employee_id: Uuid, period_id: Uuid) -> Option<PaySlip> {
        self.read(|state| {
            state
                .slips
                .values()
                .find(|s| s.employee_id == employee_id && s.period_id == period_id && s.is_live())
                .cloned()
        })
    }

    /// Fetches a slip scoped to a tenant.
    pub fn slip(&self, tenant_id: Uuid, slip_id: Uuid) -> EngineResult<PaySlip> {
        self.read(|state| {
            state
                .slips
                .get(&slip_id)
                .filter(|s| s.tenant_id == tenant_id)
                .cloned()
                .ok_or_else(|| EngineError::NotFound {
                    entity: "PaySlip".to_string(),
                    id: slip_id.to_string(),
                })
        })
    }

    /// Persists a freshly generated slip.
    pub fn insert_slip(&self, slip: PaySlip) {
        self.write(|state| {
            state.slips.insert(slip.id, slip);
        });
    }

    /// Rolls an uncommitted slip back out of the store. Only the
    /// bulletin generator uses this, when its cumulant swap loses.
    pub(crate) fn remove_slip(&self, slip_id: Uuid) {
        self.write(|state| {
            state.slips.remove(&slip_id);
        });
    }

    /// Transitions a slip's state.
    pub fn transition_slip(
        &self,
        tenant_id: Uuid,
        slip_id: Uuid,
        target: SlipState,
    ) -> EngineResult<PaySlip> {
        self.write(|state| {
            let slip = state
                .slips
                .get_mut(&slip_id)
                .filter(|s| s.tenant_id == tenant_id)
                .ok_or_else(|| EngineError::NotFound {
                    entity: "PaySlip".to_string(),
                    id: slip_id.to_string(),
                })?;
            slip.transition_to(target)?;
            Ok(slip.clone())
        })
    }

    // ------------------------------------------------------------------
    // Loans
    // ------------------------------------------------------------------

    /// Inserts a loan.
    pub fn insert_loan(&self, loan: Loan) {
        self.write(|state| {
            state.loans.insert(loan.id, loan);
        });
    }

    /// Fetches a loan scoped to a tenant.
    pub fn loan(&self, tenant_id: Uuid, loan_id: Uuid) -> EngineResult<Loan> {
        self.read(|state| {
            state
                .loans
                .get(&loan_id)
                .filter(|l| l.tenant_id == tenant_id)
                .cloned()
                .ok_or_else(|| EngineError::NotFound {
                    entity: "Loan".to_string(),
                    id: loan_id.to_string(),
                })
        })
    }

    /// Loans of an employee.
    pub fn loans_of(&self, employee_id: Uuid) -> Vec<Loan> {
        self.read(|state| {
            state
                .loans
                .values()
                .filter(|l| l.employee_id == employee_id)
                .cloned()
                .collect()
        })
    }

    /// Mutates a loan in one transaction.
    pub fn with_loan_mut<T>(
        &self,
        tenant_id: Uuid,
        loan_id: Uuid,
        f: impl FnOnce(&mut Loan) -> EngineResult<T>,
    ) -> EngineResult<T> {
        self.write(|state| {
            let loan = state
                .loans
                .get_mut(&loan_id)
                .filter(|l| l.tenant_id == tenant_id)
                .ok_or_else(|| EngineError::NotFound {
                    entity: "Loan".to_string(),
                    id: loan_id.to_string(),
                })?;
            f(loan)
        })
    }

    // ------------------------------------------------------------------
    // Cumulants
    // ------------------------------------------------------------------

    /// The versioned cumulant for (employee, year); a zero row with
    /// version 0 when none exists yet.
    pub fn cumulant(&self, employee_id: Uuid, year: i32) -> VersionedCumulant {
        self.read(|state| {
            state
                .cumulants
                .get(&(employee_id, year))
                .cloned()
                .unwrap_or_else(|| VersionedCumulant {
                    totals: AnnualCumulant::zero(employee_id, year),
                    version: 0,
                })
        })
    }

    /// Compare-and-swap on the cumulant's version column.
    ///
    /// Returns false when the stored version no longer matches; the
    /// caller re-reads and retries.
    pub fn cas_cumulant(
        &self,
        employee_id: Uuid,
        year: i32,
        expected_version: u64,
        totals: AnnualCumulant,
    ) -> bool {
        self.write(|state| {
            let entry = state.cumulants.entry((employee_id, year)).or_insert_with(|| {
                VersionedCumulant {
                    totals: AnnualCumulant::zero(employee_id, year),
                    version: 0,
                }
            });
            if entry.version != expected_version {
                return false;
            }
            entry.totals = totals;
            entry.version += 1;
            true
        })
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    /// Appends a history row. Rows are never updated or deleted.
    pub fn append_history(&self, row: PayrollHistory) {
        self.write(|state| state.history.push(row));
    }

    /// History rows of a slip, in append order.
    pub fn history_of(&self, slip_id: Uuid) -> Vec<PayrollHistory> {
        self.read(|state| {
            state
                .history
                .iter()
                .filter(|h| h.slip_id == slip_id)
                .cloned()
                .collect()
        })
    }
}

fn windows_overlap(
    a_from: NaiveDate,
    a_to: Option<NaiveDate>,
    b_from: NaiveDate,
    b_to: Option<NaiveDate>,
) -> bool {
    let a_ends_before_b = matches!(a_to, Some(to) if to <= b_from);
    let b_ends_before_a = matches!(b_to, Some(to) if to <= a_from);
    !(a_ends_before_b || b_ends_before_a)
}
