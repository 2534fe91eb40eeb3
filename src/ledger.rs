//! Cumulant ledger.
//!
//! Read-only access to the per-(employee, year) running totals. Writes
//! happen exclusively inside bulletin generation and cancellation; no
//! other code mutates a cumulant.

use uuid::Uuid;

use crate::error::EngineResult;
use crate::models::AnnualCumulant;
use crate::store::MemoryStore;

/// Returns the annual totals for an employee, zero when no slip has
/// contributed yet.
pub fn get_cumulant(
    store: &MemoryStore,
    tenant_id: Uuid,
    employee_id: Uuid,
    year: i32,
) -> EngineResult<AnnualCumulant> {
    // Resolving the employee enforces tenant scoping.
    store.employee(tenant_id, employee_id)?;
    Ok(store.cumulant(employee_id, year).totals)
}
