//! Period coordination.
//!
//! Batch generation across all active employees of a tenant, with
//! per-employee transaction boundaries: one employee's failure never
//! rolls back another's slip. The batch honors a cancellation signal
//! between employees and a per-employee soft deadline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::bulletin;
use crate::calculation::CalculationPhase;
use crate::config::ConstantsStore;
use crate::error::{EngineError, EngineResult};
use crate::models::{PeriodState, SlipState};
use crate::store::MemoryStore;

/// Default per-employee soft deadline.
pub const DEFAULT_EMPLOYEE_DEADLINE: Duration = Duration::from_secs(30);

/// One employee's structured failure inside a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeFailure {
    /// The employee matricule.
    pub matricule: String,
    /// The stable error code (see [`EngineError::code`]).
    pub kind: String,
    /// The human-readable message.
    pub message: String,
    /// The calculation phase the failure occurred in, when applicable.
    pub phase: Option<CalculationPhase>,
}

/// The outcome of one batch generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Matricules with a generated slip, in processing order.
    pub successes: Vec<String>,
    /// Structured failures, in processing order.
    pub failures: Vec<EmployeeFailure>,
    /// True when the batch stopped early on the cancellation signal.
    pub cancelled: bool,
    /// The period state after the batch.
    pub period_state: PeriodState,
}

/// Options controlling a batch run.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions<'a> {
    /// Cancellation signal, honored between employees only.
    pub cancel: Option<&'a AtomicBool>,
    /// Per-employee soft deadline; defaults to 30 seconds.
    pub deadline: Option<Duration>,
}

/// Generates slips for every active employee of the tenant.
///
/// Employees are processed in deterministic matricule order. The period
/// moves to `calculating` for the duration of the batch, then to
/// `validated` when every active employee holds a live slip, or back to
/// `open` otherwise.
pub fn generate_period(
    store: &MemoryStore,
    constants: &ConstantsStore,
    tenant_id: Uuid,
    period_id: Uuid,
    options: BatchOptions<'_>,
) -> EngineResult<BatchSummary> {
    let period = store.period(tenant_id, period_id)?;
    if period.state != PeriodState::Open {
        return Err(EngineError::PeriodNotOpen {
            period: period.label(),
            state: period.state.as_str().to_string(),
        });
    }
    store.transition_period(tenant_id, period_id, PeriodState::Calculating)?;

    let deadline = options.deadline.unwrap_or(DEFAULT_EMPLOYEE_DEADLINE);
    let employees = store.active_employees(tenant_id);

    let mut successes = Vec::new();
    let mut failures = Vec::new();
    let mut cancelled = false;

    for employee in &employees {
        if let Some(cancel) = options.cancel {
            if cancel.load(Ordering::SeqCst) {
                cancelled = true;
                break;
            }
        }

        match bulletin::generate_slip(
            store,
            constants,
            tenant_id,
            employee.id,
            period_id,
            Some(deadline),
        ) {
            Ok(_) => successes.push(employee.matricule.clone()),
            Err(failure) => {
                warn!(
                    matricule = %employee.matricule,
                    code = failure.error.code(),
                    phase = ?failure.phase,
                    "slip generation failed"
                );
                failures.push(EmployeeFailure {
                    matricule: employee.matricule.clone(),
                    kind: failure.error.code().to_string(),
                    message: failure.error.to_string(),
                    phase: failure.phase,
                });
            }
        }
    }

    let complete = !cancelled
        && employees.iter().all(|e| {
            store
                .live_slip(e.id, period_id)
                .is_some_and(|s| matches!(s.state, SlipState::Calculated | SlipState::Validated))
        });

    let period_state = if complete && !employees.is_empty() {
        store
            .transition_period(tenant_id, period_id, PeriodState::Validated)?
            .state
    } else {
        store
            .transition_period(tenant_id, period_id, PeriodState::Open)?
            .state
    };

    info!(
        period = %period.label(),
        successes = successes.len(),
        failures = failures.len(),
        cancelled,
        state = period_state.as_str(),
        "batch generation finished"
    );

    Ok(BatchSummary {
        successes,
        failures,
        cancelled,
        period_state,
    })
}

/// Validates a period outside a batch: requires every active employee to
/// hold a live slip in `calculated` or `validated` state.
pub fn validate_period(
    store: &MemoryStore,
    tenant_id: Uuid,
    period_id: Uuid,
) -> EngineResult<PeriodState> {
    let period = store.period(tenant_id, period_id)?;
    let employees = store.active_employees(tenant_id);
    let missing: Vec<String> = employees
        .iter()
        .filter(|e| {
            !store
                .live_slip(e.id, period_id)
                .is_some_and(|s| matches!(s.state, SlipState::Calculated | SlipState::Validated))
        })
        .map(|e| e.matricule.clone())
        .collect();
    if !missing.is_empty() {
        return Err(EngineError::Validation {
            message: format!(
                "period {} is missing slips for: {}",
                period.label(),
                missing.join(", ")
            ),
        });
    }
    store.transition_period(tenant_id, period_id, PeriodState::Calculating)?;
    Ok(store
        .transition_period(tenant_id, period_id, PeriodState::Validated)?
        .state)
}

/// Closes a validated period, freezing its slips against mutation.
pub fn close_period(
    store: &MemoryStore,
    tenant_id: Uuid,
    period_id: Uuid,
) -> EngineResult<PeriodState> {
    Ok(store
        .transition_period(tenant_id, period_id, PeriodState::Closed)?
        .state)
}
