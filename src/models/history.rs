//! Append-only payroll history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The action a history row records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    /// A slip was generated.
    Create,
    /// A slip was validated.
    Validate,
    /// A slip was marked paid.
    Pay,
    /// A slip was cancelled and its cumulant contribution reversed.
    Cancel,
}

/// One material state transition of a pay slip.
///
/// Rows are append-only; the before/after cumulant snapshots make the
/// ledger auditable without replaying slips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollHistory {
    /// Unique identifier.
    pub id: Uuid,
    /// The tenant the transition belongs to.
    pub tenant_id: Uuid,
    /// The slip that transitioned.
    pub slip_id: Uuid,
    /// The recorded action.
    pub action: HistoryAction,
    /// When the transition happened.
    pub at: DateTime<Utc>,
    /// Cumulant snapshot before the transition.
    pub cumulant_before: serde_json::Value,
    /// Cumulant snapshot after the transition.
    pub cumulant_after: serde_json::Value,
}
