//! Error types for the payroll engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur during payroll computation.

use chrono::NaiveDate;
use thiserror::Error;

/// The main error type for the payroll engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently throughout the application.
///
/// # Example
///
/// ```
/// use payroll_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/file.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/file.yaml");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// No constant row is effective for the requested key and date.
    #[error("No active constant '{key}' on date {date}")]
    NoActiveConstant {
        /// The constant key that was requested.
        key: String,
        /// The date for which the lookup was performed.
        date: NaiveDate,
    },

    /// The tax bracket table does not tile the non-negative line,
    /// even after gap normalization.
    #[error("Tax table for year {year} is incoherent: {message}")]
    TaxTableIncoherent {
        /// The tax year of the offending table.
        year: i32,
        /// A description of the coherence violation.
        message: String,
    },

    /// A non-cancelled pay slip already exists for the employee and period.
    #[error("A pay slip already exists for employee '{matricule}' in period {period}")]
    DuplicateSlip {
        /// The employee matricule.
        matricule: String,
        /// The period label (YYYY-MM).
        period: String,
    },

    /// A leave request exceeds the available balance.
    #[error("Insufficient leave balance for employee '{matricule}': requested {requested}, remaining {remaining}")]
    InsufficientBalance {
        /// The employee matricule.
        matricule: String,
        /// The number of days requested.
        requested: String,
        /// The number of days remaining.
        remaining: String,
    },

    /// A payment was attempted against a loan that is already settled
    /// or otherwise terminated.
    #[error("Loan {loan_id} is already settled")]
    LoanAlreadySettled {
        /// The loan identifier.
        loan_id: String,
    },

    /// The operation requires the pay period to be in the `open` state.
    #[error("Period {period} is not open (state: {state})")]
    PeriodNotOpen {
        /// The period label (YYYY-MM).
        period: String,
        /// The actual state of the period.
        state: String,
    },

    /// A mutation was attempted against a closed (frozen) period.
    #[error("Period {period} is closed")]
    PeriodClosed {
        /// The period label (YYYY-MM).
        period: String,
    },

    /// A compare-and-swap update lost against a concurrent writer and
    /// the bounded retry budget was exhausted.
    #[error("Conflicting update on {entity} after {attempts} attempts")]
    ConflictingUpdate {
        /// The entity whose version check failed.
        entity: String,
        /// How many attempts were made before giving up.
        attempts: u32,
    },

    /// The per-employee soft deadline was exceeded during generation.
    #[error("Generation for employee '{matricule}' exceeded the {seconds}s deadline")]
    Timeout {
        /// The employee matricule.
        matricule: String,
        /// The deadline in seconds.
        seconds: u64,
    },

    /// A requested entity does not exist in the store.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "Employee", "Loan").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// An entity state transition was rejected.
    #[error("Invalid {entity} transition from '{from}' to '{to}'")]
    InvalidTransition {
        /// The kind of entity.
        entity: String,
        /// The current state.
        from: String,
        /// The requested state.
        to: String,
    },

    /// An input record was rejected before any state changed.
    #[error("Validation failed: {message}")]
    Validation {
        /// A description of the rejected input.
        message: String,
    },

    /// An internal invariant check failed. Never recovered locally.
    #[error("Internal invariant violated: {message}")]
    Internal {
        /// A description of the violated invariant.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// Returns the stable error code used at the API surface.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. } => {
                "CONFIG_ERROR"
            }
            EngineError::NoActiveConstant { .. } => "NO_ACTIVE_CONSTANT",
            EngineError::TaxTableIncoherent { .. } => "TAX_TABLE_INCOHERENT",
            EngineError::DuplicateSlip { .. } => "DUPLICATE_SLIP",
            EngineError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            EngineError::LoanAlreadySettled { .. } => "LOAN_ALREADY_SETTLED",
            EngineError::PeriodNotOpen { .. } => "PERIOD_NOT_OPEN",
            EngineError::PeriodClosed { .. } => "PERIOD_CLOSED",
            EngineError::ConflictingUpdate { .. } => "CONFLICTING_UPDATE",
            EngineError::Timeout { .. } => "TIMEOUT",
            EngineError::NotFound { .. } => "NOT_FOUND",
            EngineError::InvalidTransition { .. } => "INVALID_TRANSITION",
            EngineError::Validation { .. } => "VALIDATION_ERROR",
            EngineError::Internal { .. } => "INTERNAL",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_displays_path() {
        let error = EngineError::ConfigNotFound {
            path: "/missing/file.yaml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found: /missing/file.yaml"
        );
    }

    #[test]
    fn test_no_active_constant_displays_key_and_date() {
        let error = EngineError::NoActiveConstant {
            key: "SOC_CEILING".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        };
        assert_eq!(
            error.to_string(),
            "No active constant 'SOC_CEILING' on date 2025-03-01"
        );
        assert_eq!(error.code(), "NO_ACTIVE_CONSTANT");
    }

    #[test]
    fn test_tax_table_incoherent_displays_year() {
        let error = EngineError::TaxTableIncoherent {
            year: 2025,
            message: "gap of 5 between ranks 2 and 3".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Tax table for year 2025 is incoherent: gap of 5 between ranks 2 and 3"
        );
    }

    #[test]
    fn test_duplicate_slip_displays_matricule_and_period() {
        let error = EngineError::DuplicateSlip {
            matricule: "EMP-0042".to_string(),
            period: "2025-03".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "A pay slip already exists for employee 'EMP-0042' in period 2025-03"
        );
        assert_eq!(error.code(), "DUPLICATE_SLIP");
    }

    #[test]
    fn test_conflicting_update_displays_attempts() {
        let error = EngineError::ConflictingUpdate {
            entity: "AnnualCumulant".to_string(),
            attempts: 3,
        };
        assert_eq!(
            error.to_string(),
            "Conflicting update on AnnualCumulant after 3 attempts"
        );
    }

    #[test]
    fn test_timeout_displays_matricule_and_deadline() {
        let error = EngineError::Timeout {
            matricule: "EMP-0001".to_string(),
            seconds: 30,
        };
        assert_eq!(
            error.to_string(),
            "Generation for employee 'EMP-0001' exceeded the 30s deadline"
        );
        assert_eq!(error.code(), "TIMEOUT");
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<EngineError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_period_closed() -> EngineResult<()> {
            Err(EngineError::PeriodClosed {
                period: "2025-01".to_string(),
            })
        }

        fn propagates_error() -> EngineResult<()> {
            returns_period_closed()?;
            Ok(())
        }

        assert!(propagates_error().is_err());
    }
}
