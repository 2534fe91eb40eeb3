//! Bulletin generation.
//!
//! Transactional wrapper around the calculator: persists the slip and
//! its lines, updates the annual cumulant by compare-and-swap, settles
//! the loan installments the slip repaid and appends the audit history.
//! Generation for one (employee, period) runs under the advisory triple
//! lock; lost cumulant updates retry the whole generation, bounded at
//! three attempts.

use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::{
    CalculationInput, CalculationPhase, SlipComputation, check_slip_invariant, compute_slip,
};
use crate::config::ConstantsStore;
use crate::error::{EngineError, EngineResult};
use crate::loans;
use crate::models::{
    HistoryAction, LoanInstallment, PayPeriod, PayrollHistory, PaySlip, PeriodState, SlipState,
};
use crate::store::MemoryStore;

/// Bounded compare-and-swap retries before reporting a conflict.
const CAS_ATTEMPTS: u32 = 3;

/// A generation failure with the calculation phase it occurred in, when
/// the failure happened inside the calculator.
#[derive(Debug)]
pub struct GenerationError {
    /// The failing phase, absent for failures outside the calculator.
    pub phase: Option<CalculationPhase>,
    /// The underlying error.
    pub error: EngineError,
}

impl From<EngineError> for GenerationError {
    fn from(error: EngineError) -> Self {
        Self { phase: None, error }
    }
}

impl From<GenerationError> for EngineError {
    fn from(failure: GenerationError) -> Self {
        failure.error
    }
}

/// Generates the pay slip for one (employee, period).
///
/// Steps, in order, under the `(tenant, employee, period)` advisory
/// lock: duplicate check, calculator run, slip persistence, cumulant
/// compare-and-swap, installment settlement, history append. The
/// optional soft deadline, measured from entry, aborts with `Timeout`
/// before anything is persisted.
pub fn generate_slip(
    store: &MemoryStore,
    constants: &ConstantsStore,
    tenant_id: Uuid,
    employee_id: Uuid,
    period_id: Uuid,
    deadline: Option<Duration>,
) -> Result<PaySlip, GenerationError> {
    let deadline = deadline.map(|d| (Instant::now() + d, d.as_secs()));
    let _guard = store.lock_generation(tenant_id, employee_id, period_id);

    let employee = store.employee(tenant_id, employee_id)?;
    let period = store.period(tenant_id, period_id)?;
    check_period_accepts_generation(&period)?;

    if store.live_slip(employee_id, period_id).is_some() {
        return Err(EngineError::DuplicateSlip {
            matricule: employee.matricule.clone(),
            period: period.label(),
        }
        .into());
    }

    let elements = store.elements_of(employee_id);
    let rubrics = store.rubrics(tenant_id);
    let attendance = store.attendance_of(employee_id);
    let absences = store.absences_of(employee_id);
    let leaves = store.leave_requests_of(employee_id);

    let mut attempts = 0;
    loop {
        attempts += 1;

        // Installments due this period, re-read on every attempt so a
        // concurrent settlement is observed.
        let due_installments: Vec<LoanInstallment> = store
            .loans_of(employee_id)
            .iter()
            .filter_map(|loan| loans::next_due(loan, &period).cloned())
            .collect();

        let view = constants.view();
        let computation = compute_slip(&CalculationInput {
            employee: &employee,
            period: &period,
            elements: &elements,
            rubrics: &rubrics,
            attendance: &attendance,
            absences: &absences,
            leaves: &leaves,
            due_installments: &due_installments,
            constants: &view,
        })
        .map_err(|failure| GenerationError {
            phase: Some(failure.phase),
            error: failure.error,
        })?;

        check_slip_invariant(&computation)?;

        if let Some((at, seconds)) = deadline {
            if Instant::now() > at {
                return Err(EngineError::Timeout {
                    matricule: employee.matricule.clone(),
                    seconds,
                }
                .into());
            }
        }

        let slip = build_slip(tenant_id, employee_id, &period, &employee.currency, &computation);
        store.insert_slip(slip.clone());

        let current = store.cumulant(employee_id, period.year);
        let updated = current.totals.plus(
            computation.totals.gross,
            computation.totals.taxable_base,
            computation.totals.net,
            computation.totals.social_employee,
            computation.totals.social_employer,
            computation.totals.tax,
        );
        let before = serde_json::to_value(&current.totals).unwrap_or_default();
        let after = serde_json::to_value(&updated).unwrap_or_default();

        if !store.cas_cumulant(employee_id, period.year, current.version, updated) {
            store.remove_slip(slip.id);
            if attempts >= CAS_ATTEMPTS {
                return Err(EngineError::ConflictingUpdate {
                    entity: "AnnualCumulant".to_string(),
                    attempts,
                }
                .into());
            }
            warn!(
                matricule = %employee.matricule,
                period = %period.label(),
                attempt = attempts,
                "cumulant version moved, retrying generation"
            );
            continue;
        }

        for (loan_id, index) in &computation.paid_installments {
            store.with_loan_mut(tenant_id, *loan_id, |loan| {
                loans::record_payment(loan, *index, slip.id)
            })?;
        }

        store.append_history(PayrollHistory {
            id: Uuid::new_v4(),
            tenant_id,
            slip_id: slip.id,
            action: HistoryAction::Create,
            at: Utc::now(),
            cumulant_before: before,
            cumulant_after: after,
        });

        info!(
            matricule = %employee.matricule,
            period = %period.label(),
            gross = %slip.gross,
            net = %slip.net,
            "pay slip generated"
        );
        return Ok(slip);
    }
}

/// Cancels a slip: reverses the cumulant update, reopens the settled
/// installments, marks the slip cancelled and appends history.
pub fn cancel_slip(store: &MemoryStore, tenant_id: Uuid, slip_id: Uuid) -> EngineResult<()> {
    let slip = store.slip(tenant_id, slip_id)?;
    let period = store.period(tenant_id, slip.period_id)?;
    if period.state == PeriodState::Closed {
        return Err(EngineError::PeriodClosed {
            period: period.label(),
        });
    }
    if !matches!(slip.state, SlipState::Calculated | SlipState::Validated) {
        return Err(EngineError::InvalidTransition {
            entity: "PaySlip".to_string(),
            from: slip.state.as_str().to_string(),
            to: SlipState::Cancelled.as_str().to_string(),
        });
    }

    let _guard = store.lock_generation(tenant_id, slip.employee_id, slip.period_id);

    let mut attempts = 0;
    let (before, after) = loop {
        attempts += 1;
        let current = store.cumulant(slip.employee_id, period.year);
        let updated = current.totals.minus(
            slip.gross,
            slip.taxable_base,
            slip.net,
            slip.social_employee,
            slip.social_employer,
            slip.tax,
        );
        let before = serde_json::to_value(&current.totals).unwrap_or_default();
        let after = serde_json::to_value(&updated).unwrap_or_default();
        if store.cas_cumulant(slip.employee_id, period.year, current.version, updated) {
            break (before, after);
        }
        if attempts >= CAS_ATTEMPTS {
            return Err(EngineError::ConflictingUpdate {
                entity: "AnnualCumulant".to_string(),
                attempts,
            });
        }
    };

    for loan in store.loans_of(slip.employee_id) {
        let touched = loan
            .schedule
            .iter()
            .any(|i| i.paid_via_slip == Some(slip.id));
        if touched {
            store.with_loan_mut(tenant_id, loan.id, |loan| {
                loans::revert_payment(loan, slip.id);
                Ok(())
            })?;
        }
    }

    store.transition_slip(tenant_id, slip_id, SlipState::Cancelled)?;

    store.append_history(PayrollHistory {
        id: Uuid::new_v4(),
        tenant_id,
        slip_id,
        action: HistoryAction::Cancel,
        at: Utc::now(),
        cumulant_before: before,
        cumulant_after: after,
    });

    info!(slip_id = %slip_id, "pay slip cancelled");
    Ok(())
}

fn check_period_accepts_generation(period: &PayPeriod) -> EngineResult<()> {
    match period.state {
        PeriodState::Open | PeriodState::Calculating => Ok(()),
        PeriodState::Closed => Err(EngineError::PeriodClosed {
            period: period.label(),
        }),
        PeriodState::Validated => Err(EngineError::PeriodNotOpen {
            period: period.label(),
            state: period.state.as_str().to_string(),
        }),
    }
}

fn build_slip(
    tenant_id: Uuid,
    employee_id: Uuid,
    period: &PayPeriod,
    currency: &str,
    computation: &SlipComputation,
) -> PaySlip {
    let totals = &computation.totals;
    PaySlip {
        id: Uuid::new_v4(),
        tenant_id,
        employee_id,
        period_id: period.id,
        state: SlipState::Calculated,
        gross: totals.gross,
        taxable_base: totals.taxable_base,
        social_employee: totals.social_employee,
        social_employer: totals.social_employer,
        tax: totals.tax,
        vf: totals.vf,
        ta: totals.ta,
        total_deductions: totals.total_deductions,
        net: totals.net,
        currency: currency.to_string(),
        net_employee_currency: totals.net_employee_currency,
        created_at: Utc::now(),
        lines: computation.lines.clone(),
    }
}
