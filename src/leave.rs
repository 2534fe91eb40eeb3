//! Leave accrual engine.
//!
//! Computes the per-year entitlement (base accrual, seniority bonus,
//! capped carry-over) and maintains balances as requests are approved
//! and cancelled.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::config::{ConstantKey, ConstantsStore, ConstantsView};
use crate::error::{EngineError, EngineResult};
use crate::models::{Employee, LeaveBalance, LeaveKind, LeaveRequest, LeaveState};
use crate::store::MemoryStore;

/// Computes the entitlement balance for one (employee, year).
///
/// * `base` accrues `DAYS_PER_MONTH` for every month of the year the
///   employee's active dates intersect.
/// * `seniority_bonus` comes from the step table at years of service on
///   December 31 of the year.
/// * `carried` is the previous year's remaining, capped at
///   `MAX_CARRY_OVER`.
/// * `taken` sums the approved annual-leave days drawn against the year.
pub fn compute_entitlement(
    employee: &Employee,
    year: i32,
    requests: &[LeaveRequest],
    previous_remaining: Decimal,
    constants: &ConstantsView<'_>,
) -> EngineResult<LeaveBalance> {
    let accrual_date = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(|| EngineError::Internal {
        message: format!("invalid entitlement year {year}"),
    })?;
    let days_per_month = constants.lookup(&ConstantKey::DaysPerMonth, accrual_date)?;
    let max_carry_over = constants.lookup(&ConstantKey::MaxCarryOver, accrual_date)?;

    let mut base = Decimal::ZERO;
    for month in 1..=12u32 {
        let month_start = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(accrual_date);
        let month_end = last_day_of_month(year, month).unwrap_or(accrual_date);
        if employee.active_during(month_start, month_end) {
            base += days_per_month;
        }
    }

    let year_end = NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(accrual_date);
    let seniority_bonus = constants
        .seniority()
        .bonus_for(employee.years_of_service_at(year_end));

    let carried = previous_remaining.min(max_carry_over).max(Decimal::ZERO);

    let taken: Decimal = requests
        .iter()
        .filter(|r| {
            r.state == LeaveState::Approved
                && r.kind == LeaveKind::Annual
                && r.reference_year == year
        })
        .map(|r| r.days)
        .sum();

    let mut balance = LeaveBalance {
        employee_id: employee.id,
        year,
        accrued: base + seniority_bonus,
        carry_over: carried,
        taken,
        remaining: Decimal::ZERO,
    };
    balance.rebalance();
    Ok(balance)
}

/// Debits an approval against a balance.
///
/// Fails with `InsufficientBalance` when the request exceeds the days
/// remaining; the balance is untouched on failure.
pub fn apply_approval(
    balance: &mut LeaveBalance,
    request: &LeaveRequest,
    matricule: &str,
) -> EngineResult<()> {
    if request.days > balance.remaining {
        return Err(EngineError::InsufficientBalance {
            matricule: matricule.to_string(),
            requested: request.days.to_string(),
            remaining: balance.remaining.to_string(),
        });
    }
    balance.taken += request.days;
    balance.rebalance();
    Ok(())
}

/// Credits a cancellation back to a balance.
pub fn apply_cancellation(balance: &mut LeaveBalance, request: &LeaveRequest) {
    balance.taken = (balance.taken - request.days).max(Decimal::ZERO);
    balance.rebalance();
}

/// Computes and stores the entitlement balance for (employee, year).
///
/// The previous year's stored remaining feeds the carry-over.
pub fn entitlement(
    store: &MemoryStore,
    constants: &ConstantsStore,
    tenant_id: Uuid,
    employee_id: Uuid,
    year: i32,
) -> EngineResult<LeaveBalance> {
    let employee = store.employee(tenant_id, employee_id)?;
    let requests = store.leave_requests_of(employee_id);
    let previous_remaining = store
        .leave_balance(employee_id, year - 1)
        .map(|b| b.remaining)
        .unwrap_or(Decimal::ZERO);
    let view = constants.view();
    let balance = compute_entitlement(&employee, year, &requests, previous_remaining, &view)?;
    store.upsert_leave_balance(balance.clone());
    Ok(balance)
}

/// Approves a pending leave request, debiting the balance in one
/// transaction. Fails with `InsufficientBalance` when the request
/// exceeds the days remaining.
pub fn approve(
    store: &MemoryStore,
    constants: &ConstantsStore,
    tenant_id: Uuid,
    request_id: Uuid,
) -> EngineResult<LeaveBalance> {
    let request = store.leave_request(request_id)?;
    let employee = store.employee(tenant_id, request.employee_id)?;

    if store
        .leave_balance(employee.id, request.reference_year)
        .is_none()
    {
        entitlement(store, constants, tenant_id, employee.id, request.reference_year)?;
    }

    store.with_leave_mut(request_id, |request, balances| {
        if request.state != LeaveState::Pending {
            return Err(EngineError::InvalidTransition {
                entity: "LeaveRequest".to_string(),
                from: format!("{:?}", request.state).to_lowercase(),
                to: "approved".to_string(),
            });
        }
        let balance = balances
            .get_mut(&(employee.id, request.reference_year))
            .ok_or_else(|| EngineError::Internal {
                message: "leave balance vanished during approval".to_string(),
            })?;
        apply_approval(balance, request, &employee.matricule)?;
        request.state = LeaveState::Approved;
        Ok(balance.clone())
    })
}

/// Rejects a pending leave request. Balances are untouched.
pub fn reject(store: &MemoryStore, tenant_id: Uuid, request_id: Uuid) -> EngineResult<LeaveRequest> {
    let request = store.leave_request(request_id)?;
    store.employee(tenant_id, request.employee_id)?;
    store.with_leave_mut(request_id, |request, _| {
        if request.state != LeaveState::Pending {
            return Err(EngineError::InvalidTransition {
                entity: "LeaveRequest".to_string(),
                from: format!("{:?}", request.state).to_lowercase(),
                to: "rejected".to_string(),
            });
        }
        request.state = LeaveState::Rejected;
        Ok(request.clone())
    })
}

/// Cancels an approved leave request, crediting the days back.
pub fn cancel(store: &MemoryStore, tenant_id: Uuid, request_id: Uuid) -> EngineResult<LeaveBalance> {
    let request = store.leave_request(request_id)?;
    let employee = store.employee(tenant_id, request.employee_id)?;
    store.with_leave_mut(request_id, |request, balances| {
        if request.state != LeaveState::Approved {
            return Err(EngineError::InvalidTransition {
                entity: "LeaveRequest".to_string(),
                from: format!("{:?}", request.state).to_lowercase(),
                to: "cancelled".to_string(),
            });
        }
        let balance = balances
            .get_mut(&(employee.id, request.reference_year))
            .ok_or_else(|| EngineError::Internal {
                message: "leave balance missing on cancellation".to_string(),
            })?;
        apply_cancellation(balance, request);
        request.state = LeaveState::Cancelled;
        Ok(balance.clone())
    })
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.and_then(|d| d.pred_opt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConstantRow, ConstantsStore, SeniorityStep, SeniorityTable};
    use crate::models::{ContractKind, EmployeeStatus, MaritalStatus};
    use chrono::DateTime;
    use std::collections::HashMap;
    use std::str::FromStr;
    use uuid::Uuid;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn store() -> ConstantsStore {
        let row = |key, value: &str| ConstantRow {
            key,
            value: dec(value),
            effective_from: date(2015, 1, 1),
            effective_to: None,
            created_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        };
        ConstantsStore::new(
            vec![
                row(ConstantKey::DaysPerMonth, "2.5"),
                row(ConstantKey::MaxCarryOver, "15"),
            ],
            HashMap::new(),
            SeniorityTable::new(vec![
                SeniorityStep {
                    years: 5,
                    bonus_days: Decimal::ONE,
                },
                SeniorityStep {
                    years: 10,
                    bonus_days: Decimal::from(2),
                },
            ]),
        )
    }

    fn employee(hired: NaiveDate) -> Employee {
        Employee {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            matricule: "EMP-0001".to_string(),
            marital_status: MaritalStatus::Single,
            children_count: 0,
            hiring_date: hired,
            seniority_date: hired,
            contract_start: hired,
            contract_kind: ContractKind::Indefinite,
            status: EmployeeStatus::Active,
            currency: "GNF".to_string(),
            departure_date: None,
        }
    }

    fn annual_request(employee_id: Uuid, year: i32, days: &str, state: LeaveState) -> LeaveRequest {
        LeaveRequest {
            id: Uuid::new_v4(),
            employee_id,
            kind: LeaveKind::Annual,
            date_start: date(year, 7, 1),
            date_end: date(year, 7, 15),
            days: dec(days),
            state,
            reference_year: year,
        }
    }

    #[test]
    fn test_full_year_accrual_without_seniority() {
        let store = store();
        let view = store.view();
        let emp = employee(date(2023, 1, 1));
        let balance = compute_entitlement(&emp, 2025, &[], Decimal::ZERO, &view).unwrap();
        // 12 x 2.5, two years of service, no bonus step reached.
        assert_eq!(balance.accrued, dec("30"));
        assert_eq!(balance.remaining, dec("30"));
    }

    #[test]
    fn test_mid_year_hire_accrues_partially() {
        let store = store();
        let view = store.view();
        let emp = employee(date(2025, 7, 10));
        let balance = compute_entitlement(&emp, 2025, &[], Decimal::ZERO, &view).unwrap();
        // July through December: 6 months.
        assert_eq!(balance.accrued, dec("15"));
    }

    #[test]
    fn test_seniority_bonus_at_year_end() {
        let store = store();
        let view = store.view();
        let emp = employee(date(2015, 3, 1));
        let balance = compute_entitlement(&emp, 2025, &[], Decimal::ZERO, &view).unwrap();
        // Ten full years by Dec 31, 2025.
        assert_eq!(balance.accrued, dec("32"));
    }

    #[test]
    fn test_carry_over_is_capped() {
        let store = store();
        let view = store.view();
        let emp = employee(date(2023, 1, 1));
        let balance = compute_entitlement(&emp, 2025, &[], dec("22"), &view).unwrap();
        assert_eq!(balance.carry_over, dec("15"));
        assert_eq!(balance.remaining, dec("45"));
    }

    #[test]
    fn test_taken_counts_only_approved_annual_of_the_year() {
        let store = store();
        let view = store.view();
        let emp = employee(date(2023, 1, 1));
        let requests = vec![
            annual_request(emp.id, 2025, "5", LeaveState::Approved),
            annual_request(emp.id, 2025, "3", LeaveState::Pending),
            annual_request(emp.id, 2024, "4", LeaveState::Approved),
        ];
        let balance = compute_entitlement(&emp, 2025, &requests, Decimal::ZERO, &view).unwrap();
        assert_eq!(balance.taken, dec("5"));
        assert_eq!(balance.remaining, dec("25"));
    }

    #[test]
    fn test_approval_debits_and_respects_balance() {
        let emp = employee(date(2023, 1, 1));
        let mut balance = LeaveBalance {
            employee_id: emp.id,
            year: 2025,
            accrued: dec("30"),
            carry_over: Decimal::ZERO,
            taken: dec("28"),
            remaining: dec("2"),
        };
        let request = annual_request(emp.id, 2025, "5", LeaveState::Pending);
        let err = apply_approval(&mut balance, &request, &emp.matricule).unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_BALANCE");
        assert_eq!(balance.taken, dec("28"));

        let small = annual_request(emp.id, 2025, "2", LeaveState::Pending);
        apply_approval(&mut balance, &small, &emp.matricule).unwrap();
        assert_eq!(balance.remaining, Decimal::ZERO);
    }

    #[test]
    fn test_cancellation_credits_back() {
        let emp = employee(date(2023, 1, 1));
        let mut balance = LeaveBalance {
            employee_id: emp.id,
            year: 2025,
            accrued: dec("30"),
            carry_over: Decimal::ZERO,
            taken: dec("10"),
            remaining: dec("20"),
        };
        let request = annual_request(emp.id, 2025, "4", LeaveState::Cancelled);
        apply_cancellation(&mut balance, &request);
        assert_eq!(balance.taken, dec("6"));
        assert_eq!(balance.remaining, dec("24"));
    }
}
